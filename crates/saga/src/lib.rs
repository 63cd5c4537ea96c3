//! Booking reservation & fulfillment saga.
//!
//! Drives the multi-step booking process against the upstream
//! scheduling provider: create a booking shell, reserve a slot under a
//! bounded retry policy, confirm the booking into a billable invoice,
//! and handle the alternate terminal transitions: cancel (the
//! compensating action) and reschedule.
//!
//! Each step commits exactly one local row on success. Remote side
//! effects are at-least-once by design: a local write failing after a
//! remote call succeeded is surfaced, never rolled back upstream.

pub mod confirm;
pub mod coordinator;
pub mod error;
pub mod locks;
pub mod retry;

pub use confirm::parse_confirmation;
pub use coordinator::{BookingSaga, CancelOutcome, RescheduleOutcome, RescheduleRequest};
pub use error::SagaError;
pub use locks::BookingLocks;
pub use retry::RetryPolicy;
