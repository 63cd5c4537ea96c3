//! Shared identifier types used across the booking service crates.

pub mod types;

pub use types::{
    CenterId, ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ReservationId, ServiceItemId,
    ShellId, TherapistId,
};
