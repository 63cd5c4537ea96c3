//! Persisted record types for the booking saga.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use common::{
    CenterId, ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ReservationId, ServiceItemId,
    ShellId,
};

/// Local record of a booking intent before remote confirmation.
///
/// The external booking id is absent until the provider's create call
/// returns, and is overwritten only by a reschedule (which leaves an
/// audit entry in [`RescheduleLogEntry`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingShell {
    pub id: ShellId,
    pub external_booking_id: Option<ExternalBookingId>,
    pub guest_id: GuestId,
    pub center_id: CenterId,
    pub requested_date: NaiveDate,
    /// First guest's first item, kept for display.
    pub service_item_id: Option<ServiceItemId>,
    pub is_couple_service: bool,
    pub is_only_catalog_employees: bool,
    pub use_online_booking_template: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of the one successful slot-reservation outcome.
///
/// Failed attempts below the retry ceiling are logged but never
/// persisted; the reservation id is generated fresh on the attempt
/// that succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationAttempt {
    pub reservation_id: ReservationId,
    pub booking_id: ExternalBookingId,
    pub slot_time: DateTime<Utc>,
    pub create_invoice: bool,
    pub response_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Normalized projection of a confirmed upstream invoice.
///
/// Written all-or-nothing: the confirmation parser rejects the
/// upstream payload before any field lands here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub appointment_id: String,
    pub booking_id: ExternalBookingId,
    pub invoice_id: InvoiceId,
    pub guest_id: GuestId,
    pub guest_first_name: String,
    pub guest_last_name: String,
    pub item_id: ServiceItemId,
    pub item_name: String,
    pub item_type: String,
    pub item_display_name: String,
    pub therapist_id: String,
    pub therapist_full_name: String,
    pub therapist_first_name: String,
    pub therapist_last_name: String,
    pub therapist_request_type: String,
    pub room_id: String,
    pub room_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub invoice_item_id: InvoiceItemId,
    pub join_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit entry mapping a rescheduled booking's old
/// external id to its new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleLogEntry {
    pub id: uuid::Uuid,
    pub old_booking_id: ExternalBookingId,
    pub new_booking_id: ExternalBookingId,
    pub invoice_id: InvoiceId,
    pub invoice_item_id: InvoiceItemId,
    pub created_at: DateTime<Utc>,
}
