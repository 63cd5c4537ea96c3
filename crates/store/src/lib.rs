//! Local persistence for the booking saga.
//!
//! Four tables, matching the saga's locally owned state: booking
//! shells, reservation attempts, confirmed bookings, and the
//! append-only reschedule log. Every write is a single-row atomic
//! operation; the saga never needs multi-row transactions because
//! each step commits exactly one row before returning.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use records::{BookingShell, ConfirmedBooking, RescheduleLogEntry, ReservationAttempt};
pub use store::BookingStore;
