//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use common::{
    CenterId, ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ReservationId, ServiceItemId,
    ShellId,
};
use store::{
    BookingShell, BookingStore, ConfirmedBooking, PostgresBookingStore, RescheduleLogEntry,
    ReservationAttempt,
};

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Run migrations using raw_sql to execute multiple statements
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_booking_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresBookingStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query(
        "TRUNCATE TABLE booking_shells, reservation_attempts, confirmed_bookings, reschedule_log",
    )
    .execute(&pool)
    .await
    .unwrap();

    PostgresBookingStore::new(pool)
}

fn sample_shell(external_id: Option<&str>) -> BookingShell {
    BookingShell {
        id: ShellId::new(),
        external_booking_id: external_id.map(ExternalBookingId::new),
        guest_id: GuestId::new("G1"),
        center_id: CenterId::new("C1"),
        requested_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        service_item_id: Some(ServiceItemId::new("I1")),
        is_couple_service: false,
        is_only_catalog_employees: false,
        use_online_booking_template: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn sample_confirmed(invoice_id: &str) -> ConfirmedBooking {
    ConfirmedBooking {
        appointment_id: format!("APT-{invoice_id}"),
        booking_id: ExternalBookingId::new("B123"),
        invoice_id: InvoiceId::new(invoice_id),
        guest_id: GuestId::new("G1"),
        guest_first_name: "Ada".to_string(),
        guest_last_name: "Moreno".to_string(),
        item_id: ServiceItemId::new("I1"),
        item_name: "Massage".to_string(),
        item_type: "0".to_string(),
        item_display_name: "Massage (60 min)".to_string(),
        therapist_id: "T1".to_string(),
        therapist_full_name: "Sam Ortiz".to_string(),
        therapist_first_name: "Sam".to_string(),
        therapist_last_name: "Ortiz".to_string(),
        therapist_request_type: "AnyAvailable".to_string(),
        room_id: "R1".to_string(),
        room_name: "Room 4".to_string(),
        start_time: Utc::now(),
        end_time: Utc::now(),
        invoice_item_id: InvoiceItemId::new("LINE1"),
        join_link: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[serial]
async fn shell_roundtrip_by_external_id() {
    let store = get_test_store().await;

    store.insert_shell(&sample_shell(Some("B123"))).await.unwrap();

    let found = store
        .shell_by_external_id(&ExternalBookingId::new("B123"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.guest_id, GuestId::new("G1"));
    assert_eq!(found.service_item_id, Some(ServiceItemId::new("I1")));
    assert!(found.use_online_booking_template);

    assert!(
        store
            .shell_by_external_id(&ExternalBookingId::new("B999"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
#[serial]
async fn repoint_shell_moves_external_id() {
    let store = get_test_store().await;
    store.insert_shell(&sample_shell(Some("B123"))).await.unwrap();

    let new_date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    let updated = store
        .repoint_shell(
            &ExternalBookingId::new("B123"),
            &ExternalBookingId::new("B456"),
            new_date,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(updated);

    assert!(
        store
            .shell_by_external_id(&ExternalBookingId::new("B123"))
            .await
            .unwrap()
            .is_none()
    );
    let shell = store
        .shell_by_external_id(&ExternalBookingId::new("B456"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shell.requested_date, new_date);

    let missing = store
        .repoint_shell(
            &ExternalBookingId::new("B123"),
            &ExternalBookingId::new("B789"),
            new_date,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(!missing);
}

#[tokio::test]
#[serial]
async fn attempt_snapshot_persists_as_jsonb() {
    let store = get_test_store().await;

    let attempt = ReservationAttempt {
        reservation_id: ReservationId::new(),
        booking_id: ExternalBookingId::new("B123"),
        slot_time: "2025-07-01T10:00:00Z".parse().unwrap(),
        create_invoice: true,
        response_snapshot: serde_json::json!({ "is_reserved": true, "warnings": [] }),
        created_at: Utc::now(),
    };
    store.insert_attempt(&attempt).await.unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reservation_attempts WHERE booking_id = 'B123'",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[serial]
async fn confirmed_booking_roundtrip_and_delete() {
    let store = get_test_store().await;
    store.insert_confirmed(&sample_confirmed("INV1")).await.unwrap();

    let found = store
        .confirmed_by_invoice(&InvoiceId::new("INV1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.appointment_id, "APT-INV1");
    assert_eq!(found.booking_id, ExternalBookingId::new("B123"));
    assert_eq!(found.join_link, None);

    assert!(
        store
            .delete_confirmed_by_invoice(&InvoiceId::new("INV1"))
            .await
            .unwrap()
    );
    assert!(
        !store
            .delete_confirmed_by_invoice(&InvoiceId::new("INV1"))
            .await
            .unwrap()
    );
}

#[tokio::test]
#[serial]
async fn reschedule_log_preserves_order() {
    let store = get_test_store().await;

    for (old, new) in [("B123", "B456"), ("B456", "B789")] {
        store
            .append_reschedule_log(&RescheduleLogEntry {
                id: uuid::Uuid::new_v4(),
                old_booking_id: ExternalBookingId::new(old),
                new_booking_id: ExternalBookingId::new(new),
                invoice_id: InvoiceId::new("INV1"),
                invoice_item_id: InvoiceItemId::new("LINE1"),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let trail = store
        .reschedule_log_for_invoice(&InvoiceId::new("INV1"))
        .await
        .unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].old_booking_id, ExternalBookingId::new("B123"));
    assert_eq!(trail[1].new_booking_id, ExternalBookingId::new("B789"));
}
