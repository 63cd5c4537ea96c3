//! Booking lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::{
    CenterId, ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ServiceItemId, TherapistId,
};
use provider::types::{ItemRef, TherapistRef};
use provider::{
    CreateBookingRequest, GuestSelection, ItemSelection, ReserveSlotRequest, SchedulingProvider,
};
use saga::{BookingSaga, RescheduleRequest};
use store::{BookingStore, ReservationAttempt};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<P: SchedulingProvider, S: BookingStore> {
    pub saga: BookingSaga<P, S>,
}

/// Caller identity taken from the `X-Guest-Id` header. Authentication
/// itself lives upstream of this subsystem; the header carries the
/// already-resolved guest id.
pub struct CallerGuest(pub GuestId);

impl<St> FromRequestParts<St> for CallerGuest
where
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-guest-id")
            .ok_or_else(|| ApiError::Unauthenticated("missing X-Guest-Id header".to_string()))?;
        let id = header
            .to_str()
            .map_err(|_| ApiError::Unauthenticated("unreadable X-Guest-Id header".to_string()))?
            .trim();
        if id.is_empty() {
            return Err(ApiError::Unauthenticated(
                "empty X-Guest-Id header".to_string(),
            ));
        }
        Ok(CallerGuest(GuestId::new(id)))
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateBookingHttpRequest {
    pub center_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_only_catalog_employees: bool,
    #[serde(default = "default_true")]
    pub use_online_booking_template: bool,
    #[serde(default)]
    pub is_couple_service: bool,
    pub guests: Vec<GuestHttpRequest>,
}

#[derive(Deserialize)]
pub struct GuestHttpRequest {
    pub id: String,
    pub invoice_id: Option<String>,
    pub items: Vec<ItemHttpRequest>,
}

#[derive(Deserialize)]
pub struct ItemHttpRequest {
    pub item_id: String,
    pub therapist_id: Option<String>,
    pub invoice_item_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    #[serde(default)]
    pub check_future_day_availability: bool,
}

#[derive(Deserialize)]
pub struct ReserveSlotHttpRequest {
    pub slot_time: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub create_invoice: bool,
}

#[derive(Deserialize)]
pub struct CancelQuery {
    pub comments: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleHttpRequest {
    pub center_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_only_catalog_employees: bool,
    pub guest_id: String,
    pub invoice_id: String,
    pub service_id: String,
    pub therapist_id: Option<String>,
    pub invoice_item_id: String,
}

fn default_true() -> bool {
    true
}

impl CreateBookingHttpRequest {
    fn into_saga_request(self) -> CreateBookingRequest {
        CreateBookingRequest {
            center_id: CenterId::new(self.center_id),
            date: self.date,
            is_only_catalog_employees: self.is_only_catalog_employees,
            use_online_booking_template: self.use_online_booking_template,
            is_couple_service: self.is_couple_service,
            guests: self
                .guests
                .into_iter()
                .map(|guest| GuestSelection {
                    id: GuestId::new(guest.id),
                    invoice_id: guest.invoice_id.map(InvoiceId::new),
                    items: guest
                        .items
                        .into_iter()
                        .map(|item| ItemSelection {
                            item: ItemRef {
                                id: ServiceItemId::new(item.item_id),
                            },
                            therapist: item
                                .therapist_id
                                .map(|id| TherapistRef {
                                    id: TherapistId::new(id),
                                }),
                            invoice_item_id: item.invoice_item_id.map(InvoiceItemId::new),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl RescheduleHttpRequest {
    fn into_saga_request(self) -> RescheduleRequest {
        RescheduleRequest {
            center_id: CenterId::new(self.center_id),
            date: self.date,
            is_only_catalog_employees: self.is_only_catalog_employees,
            guest_id: GuestId::new(self.guest_id),
            invoice_id: InvoiceId::new(self.invoice_id),
            service_id: ServiceItemId::new(self.service_id),
            therapist_id: self.therapist_id.map(TherapistId::new),
            invoice_item_id: InvoiceItemId::new(self.invoice_item_id),
        }
    }
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingCreatedResponse {
    pub booking_id: String,
    pub status: String,
    pub cancelled_at: Option<String>,
    pub cancel_comments: Option<String>,
}

#[derive(Serialize)]
pub struct ConfirmedResponse {
    pub status: String,
    pub appointment_id: String,
}

#[derive(Serialize)]
pub struct CancelledResponse {
    pub status: String,
    pub invoice_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct RescheduledResponse {
    pub new_booking_id: String,
    pub message: String,
}

// -- Handlers --

/// POST /booking/create — open a booking shell for the caller.
#[tracing::instrument(skip(state, req, caller))]
pub async fn create<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    caller: CallerGuest,
    Json(req): Json<CreateBookingHttpRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), ApiError>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let shell = state
        .saga
        .create_booking(req.into_saga_request(), &caller.0)
        .await?;

    let booking_id = shell
        .external_booking_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            booking_id,
            status: "created".to_string(),
            cancelled_at: None,
            cancel_comments: None,
        }),
    ))
}

/// GET /booking/:id/slots — list available slots for a booking.
#[tracing::instrument(skip(state))]
pub async fn slots<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Path(id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, ApiError>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let body = state
        .saga
        .available_slots(
            &ExternalBookingId::new(id),
            query.check_future_day_availability,
        )
        .await?;
    Ok(Json(body))
}

/// POST /booking/:id/slots/reserve — reserve a slot with retry.
#[tracing::instrument(skip(state, req))]
pub async fn reserve<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Path(id): Path<String>,
    Json(req): Json<ReserveSlotHttpRequest>,
) -> Result<Json<ReservationAttempt>, ApiError>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let attempt = state
        .saga
        .reserve_slot(
            &ExternalBookingId::new(id),
            ReserveSlotRequest {
                slot_time: req.slot_time,
                create_invoice: req.create_invoice,
            },
        )
        .await?;
    Ok(Json(attempt))
}

/// POST /booking/:id/slots/confirm — confirm the reserved slot.
#[tracing::instrument(skip(state))]
pub async fn confirm<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmedResponse>, ApiError>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let confirmed = state
        .saga
        .confirm_booking(&ExternalBookingId::new(id))
        .await?;
    Ok(Json(ConfirmedResponse {
        status: "confirmed".to_string(),
        appointment_id: confirmed.appointment_id,
    }))
}

/// PUT /booking/invoices/:id/cancel — cancel an invoice upstream and
/// drop the local projection.
#[tracing::instrument(skip(state, query))]
pub async fn cancel<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Path(id): Path<String>,
    Query(query): Query<CancelQuery>,
) -> Result<Json<CancelledResponse>, ApiError>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let outcome = state
        .saga
        .cancel_invoice(&InvoiceId::new(id), query.comments.as_deref())
        .await?;
    let message = if outcome.removed_local {
        "invoice cancelled".to_string()
    } else {
        "invoice cancelled; no local booking was recorded".to_string()
    };
    Ok(Json(CancelledResponse {
        status: "cancelled".to_string(),
        invoice_id: outcome.invoice_id.to_string(),
        message,
    }))
}

/// POST /booking/reschedule — move a confirmed booking to a new slot.
#[tracing::instrument(skip(state, req))]
pub async fn reschedule<P, S>(
    State(state): State<Arc<AppState<P, S>>>,
    Json(req): Json<RescheduleHttpRequest>,
) -> Result<Json<RescheduledResponse>, ApiError>
where
    P: SchedulingProvider + 'static,
    S: BookingStore + 'static,
{
    let outcome = state.saga.reschedule_booking(req.into_saga_request()).await?;
    Ok(Json(RescheduledResponse {
        new_booking_id: outcome.new_booking_id.to_string(),
        message: "booking rescheduled".to_string(),
    }))
}
