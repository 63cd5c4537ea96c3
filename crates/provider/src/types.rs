//! Request and response payloads for the scheduling provider API.
//!
//! Response types are deliberately Option-heavy: the provider's
//! invoice payload is deeply nested and sometimes incomplete, so every
//! leaf is optional here and validated by the confirmation parser
//! before anything is persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use common::{CenterId, GuestId, InvoiceId, InvoiceItemId, ServiceItemId, TherapistId};

/// Reference to a catalog item inside a booking payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSelection {
    pub item: ItemRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub therapist: Option<TherapistRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_item_id: Option<InvoiceItemId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ServiceItemId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TherapistRef {
    pub id: TherapistId,
}

/// One guest and the items they are booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestSelection {
    pub id: GuestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<InvoiceId>,
    pub items: Vec<ItemSelection>,
}

/// Payload for the provider's booking-creation endpoint. Reused for
/// rescheduling, which creates a fresh booking carrying the old
/// invoice and invoice-line ids.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub center_id: CenterId,
    pub date: NaiveDate,
    pub is_only_catalog_employees: bool,
    pub use_online_booking_template: bool,
    pub is_couple_service: bool,
    pub guests: Vec<GuestSelection>,
}

impl CreateBookingRequest {
    /// Builds the JSON body the provider expects. Booleans go over the
    /// wire as lowercase strings and the date as ISO-8601, matching
    /// the provider's contract.
    pub fn wire_payload(&self) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "center_id": self.center_id.as_str(),
            "date": self.date.format("%Y-%m-%d").to_string(),
            "is_only_catalog_employees": self.is_only_catalog_employees.to_string(),
            "use_online_booking_template": self.use_online_booking_template.to_string(),
            "is_couple_service": self.is_couple_service.to_string(),
            "guests": serde_json::to_value(&self.guests)?,
        }))
    }
}

/// Provider response to booking creation. The id is optional because
/// the provider has been observed to answer 200 without one; callers
/// must treat its absence as a malformed response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingResponse {
    pub id: Option<String>,
}

/// Payload for the slot-reservation endpoint.
#[derive(Debug, Clone)]
pub struct ReserveSlotRequest {
    pub slot_time: DateTime<Utc>,
    pub create_invoice: bool,
}

impl ReserveSlotRequest {
    /// Builds the JSON body for the reserve call (stringly-typed
    /// boolean, ISO-8601 timestamp).
    pub fn wire_payload(&self) -> Value {
        json!({
            "slot_time": self.slot_time.to_rfc3339(),
            "create_invoice": self.create_invoice.to_string(),
        })
    }
}

/// Extracts the provider's embedded business-error message from a raw
/// response body, if any. The provider reports some rejections inside
/// a 200 response as `{"Error": {"Message": "..."}}`.
pub fn upstream_error_message(body: &Value) -> Option<&str> {
    body.get("Error")?.get("Message")?.as_str()
}

// -- Confirmation payload --

/// Response of the confirm endpoint. An absent or null invoice means
/// the confirmation did not produce a billable appointment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmResponse {
    pub invoice: Option<Invoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Invoice {
    pub invoice_id: Option<String>,
    pub guest: Option<InvoiceGuest>,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
}

/// Guest block inside the invoice. The provider capitalizes these
/// field names, unlike the rest of its schema.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceGuest {
    #[serde(rename = "Id")]
    pub id: Option<String>,
    #[serde(rename = "FirstName")]
    pub first_name: Option<String>,
    #[serde(rename = "LastName")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceItem {
    pub appointment_id: Option<String>,
    pub item: Option<ItemDetail>,
    pub therapist: Option<TherapistDetail>,
    pub room: Option<RoomDetail>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub invoice_item_id: Option<String>,
    pub join_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDetail {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Sometimes a string, sometimes a number; normalized to a string
    /// by the confirmation parser.
    pub item_type: Option<Value>,
    pub item_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TherapistDetail {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub therapist_request_type: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomDetail {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_stringifies_flags_and_date() {
        let request = CreateBookingRequest {
            center_id: CenterId::new("C1"),
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            is_only_catalog_employees: false,
            use_online_booking_template: true,
            is_couple_service: false,
            guests: vec![GuestSelection {
                id: GuestId::new("G1"),
                invoice_id: None,
                items: vec![ItemSelection {
                    item: ItemRef {
                        id: ServiceItemId::new("I1"),
                    },
                    therapist: None,
                    invoice_item_id: None,
                }],
            }],
        };

        let payload = request.wire_payload().unwrap();
        assert_eq!(payload["date"], "2025-07-01");
        assert_eq!(payload["is_couple_service"], "false");
        assert_eq!(payload["use_online_booking_template"], "true");
        assert_eq!(payload["guests"][0]["id"], "G1");
        assert_eq!(payload["guests"][0]["items"][0]["item"]["id"], "I1");
        // Optional fields stay off the wire entirely.
        assert!(payload["guests"][0].get("invoice_id").is_none());
    }

    #[test]
    fn reserve_payload_uses_rfc3339() {
        let request = ReserveSlotRequest {
            slot_time: "2025-07-01T10:00:00Z".parse().unwrap(),
            create_invoice: true,
        };
        let payload = request.wire_payload();
        assert_eq!(payload["slot_time"], "2025-07-01T10:00:00+00:00");
        assert_eq!(payload["create_invoice"], "true");
    }

    #[test]
    fn embedded_error_message_is_extracted() {
        let body = serde_json::json!({"Error": {"Message": "Invalid booking id"}});
        assert_eq!(upstream_error_message(&body), Some("Invalid booking id"));

        let clean = serde_json::json!({"reservation": {}});
        assert_eq!(upstream_error_message(&clean), None);
    }

    #[test]
    fn confirm_response_tolerates_missing_pieces() {
        let resp: ConfirmResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(resp.invoice.is_none());

        let resp: ConfirmResponse =
            serde_json::from_value(serde_json::json!({"invoice": {"invoice_id": "INV1"}}))
                .unwrap();
        let invoice = resp.invoice.unwrap();
        assert_eq!(invoice.invoice_id.as_deref(), Some("INV1"));
        assert!(invoice.items.is_empty());
    }
}
