use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use common::{ExternalBookingId, InvoiceId};

use crate::Result;
use crate::records::{BookingShell, ConfirmedBooking, RescheduleLogEntry, ReservationAttempt};

/// Core trait for booking store implementations.
///
/// Every method maps to a single-row insert, update, or delete and
/// must be atomic at that granularity. Implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persists a new booking shell.
    async fn insert_shell(&self, shell: &BookingShell) -> Result<()>;

    /// Looks up a shell by the provider's booking id.
    async fn shell_by_external_id(
        &self,
        external_id: &ExternalBookingId,
    ) -> Result<Option<BookingShell>>;

    /// Repoints a shell from one external booking id to another,
    /// updating its requested date and bumping `updated_at`.
    ///
    /// Returns `true` if a matching shell was updated.
    async fn repoint_shell(
        &self,
        old_external_id: &ExternalBookingId,
        new_external_id: &ExternalBookingId,
        new_date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Persists the successful outcome of a slot reservation.
    async fn insert_attempt(&self, attempt: &ReservationAttempt) -> Result<()>;

    /// Persists a confirmed booking projection.
    async fn insert_confirmed(&self, confirmed: &ConfirmedBooking) -> Result<()>;

    /// Looks up a confirmed booking by invoice id.
    async fn confirmed_by_invoice(&self, invoice_id: &InvoiceId)
    -> Result<Option<ConfirmedBooking>>;

    /// Deletes the confirmed booking matching the invoice id.
    ///
    /// Returns `true` if a row was removed; absence is not an error.
    async fn delete_confirmed_by_invoice(&self, invoice_id: &InvoiceId) -> Result<bool>;

    /// Appends an entry to the reschedule audit log.
    async fn append_reschedule_log(&self, entry: &RescheduleLogEntry) -> Result<()>;

    /// Returns the audit trail for an invoice, oldest entry first.
    async fn reschedule_log_for_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Vec<RescheduleLogEntry>>;
}
