use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use common::{ExternalBookingId, InvoiceId};

use crate::Result;
use crate::records::{BookingShell, ConfirmedBooking, RescheduleLogEntry, ReservationAttempt};
use crate::store::BookingStore;

/// In-memory booking store for testing.
///
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    shells: Arc<RwLock<Vec<BookingShell>>>,
    attempts: Arc<RwLock<Vec<ReservationAttempt>>>,
    confirmed: Arc<RwLock<Vec<ConfirmedBooking>>>,
    log: Arc<RwLock<Vec<RescheduleLogEntry>>>,
    fail_shell_inserts: Arc<RwLock<bool>>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory booking store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted shells.
    pub async fn shell_count(&self) -> usize {
        self.shells.read().await.len()
    }

    /// Returns the number of persisted reservation attempts.
    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.len()
    }

    /// Returns the number of confirmed booking rows.
    pub async fn confirmed_count(&self) -> usize {
        self.confirmed.read().await.len()
    }

    /// Returns the number of reschedule log entries.
    pub async fn log_count(&self) -> usize {
        self.log.read().await.len()
    }

    /// Makes subsequent shell inserts fail, for exercising the
    /// local-write-after-remote-success path.
    pub async fn set_fail_shell_inserts(&self, fail: bool) {
        *self.fail_shell_inserts.write().await = fail;
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        self.shells.write().await.clear();
        self.attempts.write().await.clear();
        self.confirmed.write().await.clear();
        self.log.write().await.clear();
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_shell(&self, shell: &BookingShell) -> Result<()> {
        if *self.fail_shell_inserts.read().await {
            return Err(crate::StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.shells.write().await.push(shell.clone());
        Ok(())
    }

    async fn shell_by_external_id(
        &self,
        external_id: &ExternalBookingId,
    ) -> Result<Option<BookingShell>> {
        let shells = self.shells.read().await;
        Ok(shells
            .iter()
            .find(|s| s.external_booking_id.as_ref() == Some(external_id))
            .cloned())
    }

    async fn repoint_shell(
        &self,
        old_external_id: &ExternalBookingId,
        new_external_id: &ExternalBookingId,
        new_date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut shells = self.shells.write().await;
        if let Some(shell) = shells
            .iter_mut()
            .find(|s| s.external_booking_id.as_ref() == Some(old_external_id))
        {
            shell.external_booking_id = Some(new_external_id.clone());
            shell.requested_date = new_date;
            shell.updated_at = updated_at;
            return Ok(true);
        }
        Ok(false)
    }

    async fn insert_attempt(&self, attempt: &ReservationAttempt) -> Result<()> {
        self.attempts.write().await.push(attempt.clone());
        Ok(())
    }

    async fn insert_confirmed(&self, confirmed: &ConfirmedBooking) -> Result<()> {
        self.confirmed.write().await.push(confirmed.clone());
        Ok(())
    }

    async fn confirmed_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<ConfirmedBooking>> {
        let confirmed = self.confirmed.read().await;
        Ok(confirmed
            .iter()
            .find(|c| &c.invoice_id == invoice_id)
            .cloned())
    }

    async fn delete_confirmed_by_invoice(&self, invoice_id: &InvoiceId) -> Result<bool> {
        let mut confirmed = self.confirmed.write().await;
        let before = confirmed.len();
        confirmed.retain(|c| &c.invoice_id != invoice_id);
        Ok(confirmed.len() < before)
    }

    async fn append_reschedule_log(&self, entry: &RescheduleLogEntry) -> Result<()> {
        self.log.write().await.push(entry.clone());
        Ok(())
    }

    async fn reschedule_log_for_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Vec<RescheduleLogEntry>> {
        let log = self.log.read().await;
        Ok(log
            .iter()
            .filter(|e| &e.invoice_id == invoice_id)
            .cloned()
            .collect())
    }
}
