//! Liveness endpoint for the booking service.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health — liveness probe. Reports the process as up; it does
/// not reach out to the scheduling provider or the store.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "booking-api",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_the_service_as_up() {
        let response = check().await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.service, "booking-api");
    }
}
