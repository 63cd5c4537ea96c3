//! Client for the upstream scheduling provider.
//!
//! This crate is a thin wrapper around the provider's HTTP/JSON API:
//! request construction, api-key header injection, and raw error
//! surfacing. It performs no retries and no interpretation of
//! business-level error payloads; classification of failures as
//! transient or fatal is exposed via [`ErrorClass`] for callers that
//! retry.

pub mod error;
pub mod fake;
pub mod http;
pub mod types;

pub use error::{ErrorClass, ProviderError};
pub use fake::InMemorySchedulingProvider;
pub use http::HttpSchedulingProvider;
pub use types::{
    ConfirmResponse, CreateBookingRequest, CreateBookingResponse, GuestSelection, Invoice,
    InvoiceGuest, InvoiceItem, ItemDetail, ItemSelection, ReserveSlotRequest, RoomDetail,
    TherapistDetail, upstream_error_message,
};

use async_trait::async_trait;
use common::{ExternalBookingId, InvoiceId};

/// Access to the upstream scheduling provider.
///
/// One method per upstream endpoint; rescheduling reuses
/// [`create_booking`](SchedulingProvider::create_booking) because the
/// provider has no update primitive for bookings.
#[async_trait]
pub trait SchedulingProvider: Send + Sync {
    /// Creates a remote booking and returns the provider's response.
    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreateBookingResponse, ProviderError>;

    /// Lists available slots for a booking. The payload is returned
    /// unmodified; this subsystem does not reinterpret it.
    async fn available_slots(
        &self,
        booking_id: &ExternalBookingId,
        check_future_day_availability: bool,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Reserves a slot on a booking. Returns the raw response body so
    /// the caller can inspect embedded business errors and persist a
    /// snapshot.
    async fn reserve_slot(
        &self,
        booking_id: &ExternalBookingId,
        request: &ReserveSlotRequest,
    ) -> Result<serde_json::Value, ProviderError>;

    /// Confirms a reserved booking, returning the invoice payload.
    async fn confirm_slot(
        &self,
        booking_id: &ExternalBookingId,
    ) -> Result<ConfirmResponse, ProviderError>;

    /// Cancels an invoice with the given comment.
    async fn cancel_invoice(
        &self,
        invoice_id: &InvoiceId,
        comments: &str,
    ) -> Result<serde_json::Value, ProviderError>;
}
