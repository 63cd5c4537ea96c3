//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Request is syntactically invalid (bad path or body).
    BadRequest(String),
    /// Caller identity header is missing or unreadable.
    Unauthenticated(String),
    /// Saga execution error.
    Saga(SagaError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match &err {
        SagaError::Unauthorized(_) => (StatusCode::FORBIDDEN, err.to_string()),
        SagaError::MalformedUpstreamResponse(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SagaError::UpstreamSemantic(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        SagaError::UpstreamTransport(_)
        | SagaError::ReservationFailed { .. }
        | SagaError::RescheduleFailed(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        SagaError::OrphanedRemoteBooking { .. } | SagaError::Store(_) => {
            tracing::error!(error = %err, "booking store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::GuestId;

    fn status_of(err: SagaError) -> StatusCode {
        saga_error_to_response(err).0
    }

    #[test]
    fn unauthorized_maps_to_forbidden() {
        assert_eq!(
            status_of(SagaError::Unauthorized(GuestId::new("G1"))),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn semantic_rejections_map_to_unprocessable() {
        assert_eq!(
            status_of(SagaError::UpstreamSemantic("double booking".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn upstream_failures_map_to_bad_gateway() {
        assert_eq!(
            status_of(SagaError::UpstreamTransport("connect refused".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SagaError::ReservationFailed {
                attempts: 3,
                last_error: "503".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SagaError::RescheduleFailed("rejected".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn orphaned_remote_maps_to_internal_error_with_the_remote_id() {
        let source: store::StoreError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        let err = SagaError::OrphanedRemoteBooking {
            booking_id: common::ExternalBookingId::new("B123"),
            source,
        };
        let (status, message) = saga_error_to_response(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(message.contains("B123"));
    }

    #[test]
    fn malformed_upstream_maps_to_bad_request() {
        assert_eq!(
            status_of(SagaError::MalformedUpstreamResponse("missing id".into())),
            StatusCode::BAD_REQUEST
        );
    }
}
