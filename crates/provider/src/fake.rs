//! In-memory scheduling provider for tests.
//!
//! Responses are scripted per endpoint and every call is counted, so
//! tests can assert both outcomes and the exact number of remote
//! attempts (retry ceilings, zero-call authorization failures).

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Value, json};

use common::{ExternalBookingId, InvoiceId};

use crate::SchedulingProvider;
use crate::error::ProviderError;
use crate::types::{
    ConfirmResponse, CreateBookingRequest, CreateBookingResponse, ReserveSlotRequest,
};

#[derive(Debug)]
struct FakeState {
    next_booking: u32,
    scripted_booking_id: Option<String>,
    create_without_id: bool,
    create_error: Option<(u16, String)>,
    slots_body: Value,
    reserve_transient_failures: u32,
    reserve_body: Value,
    confirm_body: Value,
    cancel_error: Option<(u16, String)>,
    last_cancel_comment: Option<String>,
    create_calls: u32,
    slots_calls: u32,
    reserve_calls: u32,
    confirm_calls: u32,
    cancel_calls: u32,
    created_requests: Vec<CreateBookingRequest>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            next_booking: 0,
            scripted_booking_id: None,
            create_without_id: false,
            create_error: None,
            slots_body: json!({ "slots": [], "future_days": [], "next_available_day": null }),
            reserve_transient_failures: 0,
            reserve_body: json!({ "is_reserved": true }),
            confirm_body: sample_invoice_body(),
            cancel_error: None,
            last_cancel_comment: None,
            create_calls: 0,
            slots_calls: 0,
            reserve_calls: 0,
            confirm_calls: 0,
            cancel_calls: 0,
            created_requests: Vec::new(),
        }
    }
}

/// In-memory scheduling provider for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchedulingProvider {
    state: Arc<RwLock<FakeState>>,
}

impl InMemorySchedulingProvider {
    /// Creates a fake provider with well-formed default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the booking id returned by create calls instead of the
    /// sequential `BK-0001` default.
    pub fn set_booking_id(&self, id: impl Into<String>) {
        self.state.write().unwrap().scripted_booking_id = Some(id.into());
    }

    /// Makes create calls answer 200 with no booking id in the body.
    pub fn set_create_without_id(&self, missing: bool) {
        self.state.write().unwrap().create_without_id = missing;
    }

    /// Makes create calls fail with the given status and body.
    pub fn set_create_error(&self, status: u16, body: impl Into<String>) {
        self.state.write().unwrap().create_error = Some((status, body.into()));
    }

    /// Scripts the raw slot-listing body.
    pub fn set_slots_body(&self, body: Value) {
        self.state.write().unwrap().slots_body = body;
    }

    /// Injects `n` transient (503) failures before reserve calls
    /// start succeeding.
    pub fn set_transient_reserve_failures(&self, n: u32) {
        self.state.write().unwrap().reserve_transient_failures = n;
    }

    /// Scripts the raw reserve response body, e.g. one carrying an
    /// embedded `Error.Message`.
    pub fn set_reserve_body(&self, body: Value) {
        self.state.write().unwrap().reserve_body = body;
    }

    /// Scripts the raw confirm response body.
    pub fn set_confirm_body(&self, body: Value) {
        self.state.write().unwrap().confirm_body = body;
    }

    /// Makes cancel calls fail with the given status and body.
    pub fn set_cancel_error(&self, status: u16, body: impl Into<String>) {
        self.state.write().unwrap().cancel_error = Some((status, body.into()));
    }

    pub fn create_calls(&self) -> u32 {
        self.state.read().unwrap().create_calls
    }

    pub fn slots_calls(&self) -> u32 {
        self.state.read().unwrap().slots_calls
    }

    pub fn reserve_calls(&self) -> u32 {
        self.state.read().unwrap().reserve_calls
    }

    pub fn confirm_calls(&self) -> u32 {
        self.state.read().unwrap().confirm_calls
    }

    pub fn cancel_calls(&self) -> u32 {
        self.state.read().unwrap().cancel_calls
    }

    /// Returns the number of create payloads received.
    pub fn created_request_count(&self) -> usize {
        self.state.read().unwrap().created_requests.len()
    }

    /// Returns the last create payload received, if any.
    pub fn last_created_request(&self) -> Option<CreateBookingRequest> {
        self.state.read().unwrap().created_requests.last().cloned()
    }

    /// Returns the comment sent with the last cancel call, if any.
    pub fn last_cancel_comment(&self) -> Option<String> {
        self.state.read().unwrap().last_cancel_comment.clone()
    }
}

#[async_trait]
impl SchedulingProvider for InMemorySchedulingProvider {
    async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreateBookingResponse, ProviderError> {
        let mut state = self.state.write().unwrap();
        state.create_calls += 1;

        if let Some((status, body)) = state.create_error.clone() {
            return Err(ProviderError::Status { status, body });
        }

        state.created_requests.push(request.clone());

        if state.create_without_id {
            return Ok(CreateBookingResponse { id: None });
        }

        let id = state.scripted_booking_id.clone().unwrap_or_else(|| {
            state.next_booking += 1;
            format!("BK-{:04}", state.next_booking)
        });
        Ok(CreateBookingResponse { id: Some(id) })
    }

    async fn available_slots(
        &self,
        _booking_id: &ExternalBookingId,
        _check_future_day_availability: bool,
    ) -> Result<Value, ProviderError> {
        let mut state = self.state.write().unwrap();
        state.slots_calls += 1;
        Ok(state.slots_body.clone())
    }

    async fn reserve_slot(
        &self,
        _booking_id: &ExternalBookingId,
        _request: &ReserveSlotRequest,
    ) -> Result<Value, ProviderError> {
        let mut state = self.state.write().unwrap();
        state.reserve_calls += 1;

        if state.reserve_transient_failures > 0 {
            state.reserve_transient_failures -= 1;
            return Err(ProviderError::Status {
                status: 503,
                body: "slot service unavailable".to_string(),
            });
        }

        Ok(state.reserve_body.clone())
    }

    async fn confirm_slot(
        &self,
        _booking_id: &ExternalBookingId,
    ) -> Result<ConfirmResponse, ProviderError> {
        let mut state = self.state.write().unwrap();
        state.confirm_calls += 1;
        Ok(serde_json::from_value(state.confirm_body.clone())?)
    }

    async fn cancel_invoice(
        &self,
        invoice_id: &InvoiceId,
        comments: &str,
    ) -> Result<Value, ProviderError> {
        let mut state = self.state.write().unwrap();
        state.cancel_calls += 1;
        state.last_cancel_comment = Some(comments.to_string());

        if let Some((status, body)) = state.cancel_error.clone() {
            return Err(ProviderError::Status { status, body });
        }

        Ok(json!({ "success": true, "invoice_id": invoice_id.as_str() }))
    }
}

/// A structurally complete confirm response body, usable as-is or as
/// a base for tests that knock individual fields out.
pub fn sample_invoice_body() -> Value {
    json!({
        "invoice": {
            "invoice_id": "INV-0001",
            "guest": { "Id": "G1", "FirstName": "Ada", "LastName": "Moreno" },
            "items": [{
                "appointment_id": "APT-0001",
                "item": {
                    "id": "I1",
                    "name": "Deep Tissue Massage",
                    "item_type": 0,
                    "item_display_name": "Deep Tissue Massage (60 min)"
                },
                "therapist": {
                    "id": "T1",
                    "full_name": "Sam Ortiz",
                    "first_name": "Sam",
                    "last_name": "Ortiz",
                    "therapist_request_type": "AnyAvailable"
                },
                "room": { "id": "R1", "name": "Room 4" },
                "start_time": "2025-07-01T10:00:00",
                "end_time": "2025-07-01T11:00:00",
                "invoice_item_id": "LINE-0001",
                "join_link": null
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::{CenterId, GuestId, ServiceItemId};
    use crate::types::{GuestSelection, ItemRef, ItemSelection};

    fn sample_request() -> CreateBookingRequest {
        CreateBookingRequest {
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
        }
    }

    #[tokio::test]
    async fn sequential_booking_ids() {
        let provider = InMemorySchedulingProvider::new();
        let r1 = provider.create_booking(&sample_request()).await.unwrap();
        let r2 = provider.create_booking(&sample_request()).await.unwrap();
        assert_eq!(r1.id.as_deref(), Some("BK-0001"));
        assert_eq!(r2.id.as_deref(), Some("BK-0002"));
        assert_eq!(provider.create_calls(), 2);
    }

    #[tokio::test]
    async fn transient_failures_are_consumed_in_order() {
        let provider = InMemorySchedulingProvider::new();
        provider.set_transient_reserve_failures(2);

        let booking = ExternalBookingId::new("BK-0001");
        let request = ReserveSlotRequest {
            slot_time: "2025-07-01T10:00:00Z".parse().unwrap(),
            create_invoice: true,
        };

        assert!(provider.reserve_slot(&booking, &request).await.is_err());
        assert!(provider.reserve_slot(&booking, &request).await.is_err());
        assert!(provider.reserve_slot(&booking, &request).await.is_ok());
        assert_eq!(provider.reserve_calls(), 3);
    }

    #[tokio::test]
    async fn cancel_comment_is_recorded() {
        let provider = InMemorySchedulingProvider::new();
        assert_eq!(provider.last_cancel_comment(), None);

        provider
            .cancel_invoice(&InvoiceId::new("INV1"), "changed plans")
            .await
            .unwrap();
        assert_eq!(
            provider.last_cancel_comment().as_deref(),
            Some("changed plans")
        );
    }

    #[tokio::test]
    async fn default_confirm_body_is_well_formed() {
        let provider = InMemorySchedulingProvider::new();
        let response = provider
            .confirm_slot(&ExternalBookingId::new("BK-0001"))
            .await
            .unwrap();
        let invoice = response.invoice.unwrap();
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.invoice_id.as_deref(), Some("INV-0001"));
    }
}
