//! Validation and flattening of the provider's confirmation payload.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use common::{ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ServiceItemId};
use provider::ConfirmResponse;
use store::ConfirmedBooking;

use crate::error::SagaError;

/// Flattens a confirmation response into a [`ConfirmedBooking`] row.
///
/// All-or-nothing: the response must carry a non-empty `invoice` with
/// at least one item, and every required leaf of the first item must
/// be present, or the whole confirmation is rejected with
/// [`SagaError::MalformedUpstreamResponse`] before anything is
/// persisted. Only the first invoice item is mapped.
pub fn parse_confirmation(
    booking_id: &ExternalBookingId,
    response: ConfirmResponse,
    now: DateTime<Utc>,
) -> Result<ConfirmedBooking, SagaError> {
    let invoice = require(response.invoice, "invoice")?;

    let mut items = invoice.items;
    if items.is_empty() {
        return Err(SagaError::MalformedUpstreamResponse(
            "invoice has no items".to_string(),
        ));
    }
    let item = items.swap_remove(0);

    let guest = require(invoice.guest, "invoice.guest")?;
    let detail = require(item.item, "item")?;
    let therapist = require(item.therapist, "item.therapist")?;
    let room = require(item.room, "item.room")?;

    Ok(ConfirmedBooking {
        appointment_id: require(item.appointment_id, "item.appointment_id")?,
        booking_id: booking_id.clone(),
        invoice_id: InvoiceId::new(require(invoice.invoice_id, "invoice.invoice_id")?),
        guest_id: GuestId::new(require(guest.id, "guest.Id")?),
        guest_first_name: require(guest.first_name, "guest.FirstName")?,
        guest_last_name: require(guest.last_name, "guest.LastName")?,
        item_id: ServiceItemId::new(require(detail.id, "item.id")?),
        item_name: require(detail.name, "item.name")?,
        item_type: stringify(require(detail.item_type, "item.item_type")?),
        item_display_name: require(detail.item_display_name, "item.item_display_name")?,
        therapist_id: require(therapist.id, "therapist.id")?,
        therapist_full_name: require(therapist.full_name, "therapist.full_name")?,
        therapist_first_name: require(therapist.first_name, "therapist.first_name")?,
        therapist_last_name: require(therapist.last_name, "therapist.last_name")?,
        therapist_request_type: stringify(require(
            therapist.therapist_request_type,
            "therapist.therapist_request_type",
        )?),
        room_id: require(room.id, "room.id")?,
        room_name: require(room.name, "room.name")?,
        start_time: parse_invoice_time(&require(item.start_time, "item.start_time")?, "start_time")?,
        end_time: parse_invoice_time(&require(item.end_time, "item.end_time")?, "end_time")?,
        invoice_item_id: InvoiceItemId::new(require(item.invoice_item_id, "item.invoice_item_id")?),
        join_link: item.join_link,
        created_at: now,
    })
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, SagaError> {
    value.ok_or_else(|| SagaError::MalformedUpstreamResponse(format!("missing {field}")))
}

/// The provider is inconsistent about enum-ish fields: sometimes a
/// string, sometimes a bare number. Normalize both to a string.
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Invoice timestamps arrive either as RFC 3339 or as naive local
/// ISO-8601 without an offset; naive values are taken as UTC.
fn parse_invoice_time(raw: &str, field: &'static str) -> Result<DateTime<Utc>, SagaError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| SagaError::MalformedUpstreamResponse(format!("unparseable {field}: {raw}")))
}
