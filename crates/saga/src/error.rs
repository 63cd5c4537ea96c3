//! Saga error taxonomy.

use thiserror::Error;

use common::{ExternalBookingId, GuestId};
use provider::{ErrorClass, ProviderError};
use store::StoreError;

/// Errors that can occur during booking saga operations.
///
/// Every variant reaches the caller with an HTTP-level status and
/// message; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Caller's guest identity does not match the booking's guest
    /// list. Fails fast; no remote call is made.
    #[error("caller guest {0} is not part of the booking request")]
    Unauthorized(GuestId),

    /// Network failure or 5xx from the provider, surfaced outside the
    /// reservation retry loop.
    #[error("scheduling provider unreachable: {0}")]
    UpstreamTransport(String),

    /// Well-formed provider response indicating a business rejection
    /// (invalid booking id, double booking). Never retried.
    #[error("scheduling provider rejected the request: {0}")]
    UpstreamSemantic(String),

    /// Structurally incomplete provider payload. Raised before any
    /// persistence, so no partial rows are ever written.
    #[error("malformed scheduling provider response: {0}")]
    MalformedUpstreamResponse(String),

    /// Reservation retry budget exhausted. Carries the last observed
    /// error for operator diagnosis.
    #[error("slot reservation failed after {attempts} attempts: {last_error}")]
    ReservationFailed { attempts: u32, last_error: String },

    /// New booking creation rejected upstream during reschedule; the
    /// old booking and all local state are untouched.
    #[error("reschedule rejected upstream: {0}")]
    RescheduleFailed(String),

    /// The remote booking was created but the local shell write
    /// failed. Carries the upstream id so operators can reconcile the
    /// orphaned remote record.
    #[error("booking {booking_id} exists upstream but local persistence failed: {source}")]
    OrphanedRemoteBooking {
        booking_id: ExternalBookingId,
        source: StoreError,
    },

    /// Local store failure.
    #[error("booking store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ProviderError> for SagaError {
    fn from(err: ProviderError) -> Self {
        match err.class() {
            ErrorClass::Transient => SagaError::UpstreamTransport(err.to_string()),
            ErrorClass::Fatal => match err {
                ProviderError::Decode(e) => SagaError::MalformedUpstreamResponse(e.to_string()),
                other => SagaError::UpstreamSemantic(other.to_string()),
            },
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_provider_errors_map_to_transport() {
        let err: SagaError = ProviderError::Status {
            status: 503,
            body: "down".to_string(),
        }
        .into();
        assert!(matches!(err, SagaError::UpstreamTransport(_)));
    }

    #[test]
    fn fatal_status_maps_to_semantic() {
        let err: SagaError = ProviderError::Status {
            status: 422,
            body: "double booking".to_string(),
        }
        .into();
        assert!(matches!(err, SagaError::UpstreamSemantic(_)));
    }

    #[test]
    fn orphaned_remote_message_carries_the_upstream_id() {
        let source: StoreError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        let err = SagaError::OrphanedRemoteBooking {
            booking_id: ExternalBookingId::new("B123"),
            source,
        };
        assert!(err.to_string().contains("B123"));
    }

    #[test]
    fn decode_failures_map_to_malformed() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SagaError = ProviderError::Decode(decode).into();
        assert!(matches!(err, SagaError::MalformedUpstreamResponse(_)));
    }
}
