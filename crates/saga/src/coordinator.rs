//! Saga coordinator for the booking lifecycle.

use chrono::{NaiveDate, Utc};
use serde_json::Value;

use common::{
    CenterId, ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ReservationId, ServiceItemId,
    ShellId, TherapistId,
};
use provider::types::{ItemRef, TherapistRef};
use provider::{
    CreateBookingRequest, ErrorClass, GuestSelection, ItemSelection, ReserveSlotRequest,
    SchedulingProvider, upstream_error_message,
};
use store::{BookingShell, BookingStore, ConfirmedBooking, RescheduleLogEntry, ReservationAttempt};

use crate::confirm::parse_confirmation;
use crate::error::SagaError;
use crate::locks::BookingLocks;
use crate::retry::{AttemptError, RetryPolicy, run_with_retry};

const DEFAULT_CANCEL_COMMENT: &str = "Cancelled by user";

/// Result of a cancellation: the remote cancel succeeded; the local
/// projection may or may not have existed.
#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub invoice_id: InvoiceId,
    /// Whether a local confirmed row was removed. Absence is still
    /// success; local deletion is best-effort cleanup.
    pub removed_local: bool,
}

/// Input for rescheduling a confirmed booking into a new slot.
#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub center_id: CenterId,
    pub date: NaiveDate,
    pub is_only_catalog_employees: bool,
    pub guest_id: GuestId,
    pub invoice_id: InvoiceId,
    pub service_id: ServiceItemId,
    pub therapist_id: Option<TherapistId>,
    pub invoice_item_id: InvoiceItemId,
}

impl RescheduleRequest {
    /// The provider has no update primitive for bookings, so a
    /// reschedule goes over the wire as a fresh booking creation
    /// carrying the old invoice and invoice-line ids.
    fn to_create_request(&self) -> CreateBookingRequest {
        CreateBookingRequest {
            center_id: self.center_id.clone(),
            date: self.date,
            is_only_catalog_employees: self.is_only_catalog_employees,
            use_online_booking_template: true,
            is_couple_service: false,
            guests: vec![GuestSelection {
                id: self.guest_id.clone(),
                invoice_id: Some(self.invoice_id.clone()),
                items: vec![ItemSelection {
                    item: ItemRef {
                        id: self.service_id.clone(),
                    },
                    therapist: self
                        .therapist_id
                        .clone()
                        .map(|id| TherapistRef { id }),
                    invoice_item_id: Some(self.invoice_item_id.clone()),
                }],
            }],
        }
    }
}

/// Result of a successful reschedule.
#[derive(Debug, Clone)]
pub struct RescheduleOutcome {
    pub new_booking_id: ExternalBookingId,
    /// Whether a local shell was found and repointed. The audit log
    /// entry is written either way.
    pub shell_updated: bool,
}

/// Orchestrates the booking reservation & fulfillment saga.
///
/// Holds the provider client, the local store, the injectable retry
/// policy, and the per-booking lock registry that strictly orders
/// reserve → confirm → cancel/reschedule on one booking id.
pub struct BookingSaga<P, S>
where
    P: SchedulingProvider,
    S: BookingStore,
{
    provider: P,
    store: S,
    retry: RetryPolicy,
    locks: BookingLocks,
}

impl<P, S> BookingSaga<P, S>
where
    P: SchedulingProvider,
    S: BookingStore,
{
    /// Creates a new saga coordinator.
    pub fn new(provider: P, store: S, retry: RetryPolicy) -> Self {
        Self {
            provider,
            store,
            retry,
            locks: BookingLocks::new(),
        }
    }

    /// Creates a booking shell: validates the caller against the guest
    /// list, creates the remote booking, and persists the shell with
    /// the returned external id.
    ///
    /// The remote booking exists even if the local insert then fails;
    /// that at-least-once exposure is surfaced as a store error
    /// carrying no rollback.
    #[tracing::instrument(skip(self, request), fields(center_id = %request.center_id))]
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        caller: &GuestId,
    ) -> Result<BookingShell, SagaError> {
        if !request.guests.iter().any(|guest| &guest.id == caller) {
            metrics::counter!("booking_create_unauthorized_total").increment(1);
            return Err(SagaError::Unauthorized(caller.clone()));
        }

        let response = self.provider.create_booking(&request).await?;
        let external_id = response.id.map(ExternalBookingId::new).ok_or_else(|| {
            SagaError::MalformedUpstreamResponse(
                "create response carried no booking id".to_string(),
            )
        })?;

        // First guest's first item, kept for display.
        let service_item_id = request
            .guests
            .first()
            .and_then(|guest| guest.items.first())
            .map(|selection| selection.item.id.clone());

        let now = Utc::now();
        let shell = BookingShell {
            id: ShellId::new(),
            external_booking_id: Some(external_id.clone()),
            guest_id: caller.clone(),
            center_id: request.center_id.clone(),
            requested_date: request.date,
            service_item_id,
            is_couple_service: request.is_couple_service,
            is_only_catalog_employees: request.is_only_catalog_employees,
            use_online_booking_template: request.use_online_booking_template,
            created_at: now,
            updated_at: now,
        };
        // The remote booking already exists at this point; a failed
        // local write surfaces the upstream id for reconciliation.
        self.store
            .insert_shell(&shell)
            .await
            .map_err(|source| SagaError::OrphanedRemoteBooking {
                booking_id: external_id,
                source,
            })?;

        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(shell_id = %shell.id, external_id = ?shell.external_booking_id, "booking shell created");
        Ok(shell)
    }

    /// Pure proxy to the provider's slot listing; no local state.
    #[tracing::instrument(skip(self))]
    pub async fn available_slots(
        &self,
        booking_id: &ExternalBookingId,
        check_future_day_availability: bool,
    ) -> Result<Value, SagaError> {
        Ok(self
            .provider
            .available_slots(booking_id, check_future_day_availability)
            .await?)
    }

    /// Reserves a slot under the bounded retry policy.
    ///
    /// Transport errors and 5xx consume the attempt budget with a
    /// fixed delay between tries; an embedded business error in a 200
    /// body, or any 4xx, is fatal and short-circuits immediately. One
    /// `ReservationAttempt` is persisted on success, with a freshly
    /// generated reservation id; exhaustion persists nothing.
    #[tracing::instrument(skip(self, request))]
    pub async fn reserve_slot(
        &self,
        booking_id: &ExternalBookingId,
        request: ReserveSlotRequest,
    ) -> Result<ReservationAttempt, SagaError> {
        let _guard = self.locks.acquire(booking_id.as_str()).await;
        let started = std::time::Instant::now();

        let snapshot = run_with_retry(&self.retry, |attempt| {
            let provider = &self.provider;
            let request = &request;
            async move {
                metrics::counter!("slot_reserve_attempts_total").increment(1);
                match provider.reserve_slot(booking_id, request).await {
                    Ok(body) => {
                        if let Some(message) = upstream_error_message(&body) {
                            tracing::warn!(attempt, %message, "provider rejected reservation");
                            return Err(AttemptError::Fatal(SagaError::UpstreamSemantic(
                                message.to_string(),
                            )));
                        }
                        Ok(body)
                    }
                    Err(err) => match err.class() {
                        ErrorClass::Transient => Err(AttemptError::Transient(err.to_string())),
                        ErrorClass::Fatal => Err(AttemptError::Fatal(err.into())),
                    },
                }
            }
        })
        .await
        .inspect_err(|_| {
            metrics::counter!("slot_reservations_failed_total").increment(1);
        })?;

        let attempt = ReservationAttempt {
            reservation_id: ReservationId::new(),
            booking_id: booking_id.clone(),
            slot_time: request.slot_time,
            create_invoice: request.create_invoice,
            response_snapshot: snapshot,
            created_at: Utc::now(),
        };
        self.store.insert_attempt(&attempt).await?;

        metrics::histogram!("slot_reservation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(reservation_id = %attempt.reservation_id, "slot reserved");
        Ok(attempt)
    }

    /// Confirms a booking into a billable appointment.
    ///
    /// The upstream invoice is validated in full before the single
    /// persistence write; a malformed payload leaves no partial row.
    /// This operation is not retried; callers re-invoke it after
    /// resolving the inconsistency.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_booking(
        &self,
        booking_id: &ExternalBookingId,
    ) -> Result<ConfirmedBooking, SagaError> {
        let _guard = self.locks.acquire(booking_id.as_str()).await;

        let response = self.provider.confirm_slot(booking_id).await?;
        let confirmed = parse_confirmation(booking_id, response, Utc::now())?;
        self.store.insert_confirmed(&confirmed).await?;

        metrics::counter!("bookings_confirmed_total").increment(1);
        tracing::info!(
            appointment_id = %confirmed.appointment_id,
            invoice_id = %confirmed.invoice_id,
            "booking confirmed"
        );
        Ok(confirmed)
    }

    async fn cancel_lock_key(&self, invoice_id: &InvoiceId) -> Result<String, SagaError> {
        Ok(match self.store.confirmed_by_invoice(invoice_id).await? {
            Some(row) => row.booking_id.as_str().to_string(),
            None => invoice_id.as_str().to_string(),
        })
    }

    /// Compensating action: cancels the invoice upstream and, only on
    /// remote success, deletes the local confirmed projection.
    ///
    /// A missing local row is still success: the remote cancel went
    /// through and there is nothing left to clean up. On remote
    /// failure the upstream body is surfaced verbatim and no local
    /// mutation occurs.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_invoice(
        &self,
        invoice_id: &InvoiceId,
        comment: Option<&str>,
    ) -> Result<CancelOutcome, SagaError> {
        // Serialize against reserve/confirm on the same booking when
        // the local projection knows which booking this invoice is.
        // A confirm can land between the lookup and the acquisition,
        // so the key is re-checked under the lock until it is stable.
        let mut lock_key = self.cancel_lock_key(invoice_id).await?;
        let _guard = loop {
            let guard = self.locks.acquire(&lock_key).await;
            let current = self.cancel_lock_key(invoice_id).await?;
            if current == lock_key {
                break guard;
            }
            lock_key = current;
        };

        let comment = match comment {
            Some(text) if !text.trim().is_empty() => text,
            _ => DEFAULT_CANCEL_COMMENT,
        };

        self.provider.cancel_invoice(invoice_id, comment).await?;
        let removed_local = self.store.delete_confirmed_by_invoice(invoice_id).await?;

        metrics::counter!("invoices_cancelled_total").increment(1);
        tracing::info!(%invoice_id, removed_local, "invoice cancelled");
        Ok(CancelOutcome {
            invoice_id: invoice_id.clone(),
            removed_local,
        })
    }

    /// Reschedules by creating a fresh remote booking, repointing the
    /// local shell (the upstream reuses the invoice id as the shell's
    /// external id in this flow), and appending the audit entry.
    ///
    /// The log entry is written even when no local shell matched; on
    /// upstream failure nothing local is written at all.
    #[tracing::instrument(skip(self, request), fields(invoice_id = %request.invoice_id))]
    pub async fn reschedule_booking(
        &self,
        request: RescheduleRequest,
    ) -> Result<RescheduleOutcome, SagaError> {
        let old_booking_id = ExternalBookingId::new(request.invoice_id.as_str());
        let _guard = self.locks.acquire(old_booking_id.as_str()).await;

        let response = self
            .provider
            .create_booking(&request.to_create_request())
            .await
            .map_err(|err| SagaError::RescheduleFailed(err.to_string()))?;
        let new_booking_id = ExternalBookingId::new(response.id.ok_or_else(|| {
            SagaError::RescheduleFailed("no booking id returned".to_string())
        })?);

        let now = Utc::now();
        let shell_updated = self
            .store
            .repoint_shell(&old_booking_id, &new_booking_id, request.date, now)
            .await?;

        self.store
            .append_reschedule_log(&RescheduleLogEntry {
                id: uuid::Uuid::new_v4(),
                old_booking_id: old_booking_id.clone(),
                new_booking_id: new_booking_id.clone(),
                invoice_id: request.invoice_id.clone(),
                invoice_item_id: request.invoice_item_id.clone(),
                created_at: now,
            })
            .await?;

        metrics::counter!("bookings_rescheduled_total").increment(1);
        tracing::info!(%old_booking_id, %new_booking_id, shell_updated, "booking rescheduled");
        Ok(RescheduleOutcome {
            new_booking_id,
            shell_updated,
        })
    }
}
