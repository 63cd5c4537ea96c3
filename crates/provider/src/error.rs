//! Provider error types and transient/fatal classification.

use thiserror::Error;

/// Errors surfaced by the scheduling provider client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure: connect error, timeout, broken stream.
    #[error("transport error calling scheduling provider: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status. Carries the raw
    /// body so operators can reconcile manually.
    #[error("scheduling provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded as the expected shape.
    #[error("failed to decode scheduling provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Whether a failed call is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient failure; a retry may succeed.
    Transient,
    /// The provider rejected the request; retrying cannot help.
    Fatal,
}

impl ProviderError {
    /// Classifies the error for retry purposes. Transport failures and
    /// 5xx (plus 429) statuses are transient; other statuses and
    /// decode failures are fatal.
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::Transport(_) => ErrorClass::Transient,
            ProviderError::Status { status, .. } if *status >= 500 || *status == 429 => {
                ErrorClass::Transient
            }
            ProviderError::Status { .. } | ProviderError::Decode(_) => ErrorClass::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = ProviderError::Status {
            status: 503,
            body: "upstream down".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn rate_limit_is_transient() {
        let err = ProviderError::Status {
            status: 429,
            body: String::new(),
        };
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn client_errors_are_fatal() {
        let err = ProviderError::Status {
            status: 404,
            body: "no such booking".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Fatal);
    }

    #[test]
    fn decode_errors_are_fatal() {
        let err: ProviderError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.class(), ErrorClass::Fatal);
    }
}
