//! `reqwest`-backed implementation of [`SchedulingProvider`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use serde_json::Value;

use common::{ExternalBookingId, InvoiceId};

use crate::error::ProviderError;
use crate::types::{ConfirmResponse, CreateBookingRequest, CreateBookingResponse, ReserveSlotRequest};
use crate::SchedulingProvider;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the scheduling provider.
///
/// Holds a pooled `reqwest::Client` with request and connect timeouts
/// fixed at construction. No retries happen at this layer.
#[derive(Debug, Clone)]
pub struct HttpSchedulingProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSchedulingProvider {
    /// Creates a provider client with default timeouts (30s request,
    /// 10s connect).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeouts(
            base_url,
            api_key,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Creates a provider client with explicit timeouts.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("apikey {}", self.api_key))
            .header(ACCEPT, "application/json")
    }

    /// Surfaces non-2xx responses as [`ProviderError::Status`] with the
    /// raw body text attached.
    async fn check_status(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_json(response: Response) -> Result<Value, ProviderError> {
        let response = Self::check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl SchedulingProvider for HttpSchedulingProvider {
    #[tracing::instrument(skip(self, request), fields(center_id = %request.center_id))]
    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreateBookingResponse, ProviderError> {
        let payload = request.wire_payload()?;
        let response = self
            .request(Method::POST, "/v1/bookings?is_double_booking_enabled=true")
            .json(&payload)
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        Ok(serde_json::from_value(body)?)
    }

    #[tracing::instrument(skip(self))]
    async fn available_slots(
        &self,
        booking_id: &ExternalBookingId,
        check_future_day_availability: bool,
    ) -> Result<Value, ProviderError> {
        let response = self
            .request(Method::GET, &format!("/v1/bookings/{booking_id}/slots"))
            .query(&[(
                "check_future_day_availability",
                check_future_day_availability.to_string(),
            )])
            .send()
            .await?;
        Self::read_json(response).await
    }

    #[tracing::instrument(skip(self, request))]
    async fn reserve_slot(
        &self,
        booking_id: &ExternalBookingId,
        request: &ReserveSlotRequest,
    ) -> Result<Value, ProviderError> {
        let response = self
            .request(
                Method::POST,
                &format!("/v1/bookings/{booking_id}/slots/reserve"),
            )
            .json(&request.wire_payload())
            .send()
            .await?;
        Self::read_json(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn confirm_slot(
        &self,
        booking_id: &ExternalBookingId,
    ) -> Result<ConfirmResponse, ProviderError> {
        let response = self
            .request(
                Method::POST,
                &format!("/v1/bookings/{booking_id}/slots/confirm"),
            )
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        Ok(serde_json::from_value(body)?)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_invoice(
        &self,
        invoice_id: &InvoiceId,
        comments: &str,
    ) -> Result<Value, ProviderError> {
        let response = self
            .request(Method::PUT, &format!("/v1/invoices/{invoice_id}/cancel"))
            .json(&serde_json::json!({ "comments": comments }))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
