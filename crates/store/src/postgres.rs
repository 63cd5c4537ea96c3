use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use common::{
    CenterId, ExternalBookingId, GuestId, InvoiceId, InvoiceItemId, ReservationId, ServiceItemId,
    ShellId,
};

use crate::Result;
use crate::records::{BookingShell, ConfirmedBooking, RescheduleLogEntry, ReservationAttempt};
use crate::store::BookingStore;

/// PostgreSQL-backed booking store implementation.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` with a small default pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_shell(row: PgRow) -> Result<BookingShell> {
        Ok(BookingShell {
            id: ShellId::from_uuid(row.try_get::<Uuid, _>("id")?),
            external_booking_id: row
                .try_get::<Option<String>, _>("external_booking_id")?
                .map(ExternalBookingId::new),
            guest_id: GuestId::new(row.try_get::<String, _>("guest_id")?),
            center_id: CenterId::new(row.try_get::<String, _>("center_id")?),
            requested_date: row.try_get::<NaiveDate, _>("requested_date")?,
            service_item_id: row
                .try_get::<Option<String>, _>("service_item_id")?
                .map(ServiceItemId::new),
            is_couple_service: row.try_get("is_couple_service")?,
            is_only_catalog_employees: row.try_get("is_only_catalog_employees")?,
            use_online_booking_template: row.try_get("use_online_booking_template")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_confirmed(row: PgRow) -> Result<ConfirmedBooking> {
        Ok(ConfirmedBooking {
            appointment_id: row.try_get("appointment_id")?,
            booking_id: ExternalBookingId::new(row.try_get::<String, _>("booking_id")?),
            invoice_id: InvoiceId::new(row.try_get::<String, _>("invoice_id")?),
            guest_id: GuestId::new(row.try_get::<String, _>("guest_id")?),
            guest_first_name: row.try_get("guest_first_name")?,
            guest_last_name: row.try_get("guest_last_name")?,
            item_id: ServiceItemId::new(row.try_get::<String, _>("item_id")?),
            item_name: row.try_get("item_name")?,
            item_type: row.try_get("item_type")?,
            item_display_name: row.try_get("item_display_name")?,
            therapist_id: row.try_get("therapist_id")?,
            therapist_full_name: row.try_get("therapist_full_name")?,
            therapist_first_name: row.try_get("therapist_first_name")?,
            therapist_last_name: row.try_get("therapist_last_name")?,
            therapist_request_type: row.try_get("therapist_request_type")?,
            room_id: row.try_get("room_id")?,
            room_name: row.try_get("room_name")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            invoice_item_id: InvoiceItemId::new(row.try_get::<String, _>("invoice_item_id")?),
            join_link: row.try_get("join_link")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_log_entry(row: PgRow) -> Result<RescheduleLogEntry> {
        Ok(RescheduleLogEntry {
            id: row.try_get::<Uuid, _>("id")?,
            old_booking_id: ExternalBookingId::new(row.try_get::<String, _>("old_booking_id")?),
            new_booking_id: ExternalBookingId::new(row.try_get::<String, _>("new_booking_id")?),
            invoice_id: InvoiceId::new(row.try_get::<String, _>("invoice_id")?),
            invoice_item_id: InvoiceItemId::new(row.try_get::<String, _>("invoice_item_id")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert_shell(&self, shell: &BookingShell) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO booking_shells
                (id, external_booking_id, guest_id, center_id, requested_date,
                 service_item_id, is_couple_service, is_only_catalog_employees,
                 use_online_booking_template, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(shell.id.as_uuid())
        .bind(shell.external_booking_id.as_ref().map(|id| id.as_str()))
        .bind(shell.guest_id.as_str())
        .bind(shell.center_id.as_str())
        .bind(shell.requested_date)
        .bind(shell.service_item_id.as_ref().map(|id| id.as_str()))
        .bind(shell.is_couple_service)
        .bind(shell.is_only_catalog_employees)
        .bind(shell.use_online_booking_template)
        .bind(shell.created_at)
        .bind(shell.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn shell_by_external_id(
        &self,
        external_id: &ExternalBookingId,
    ) -> Result<Option<BookingShell>> {
        let row = sqlx::query("SELECT * FROM booking_shells WHERE external_booking_id = $1")
            .bind(external_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_shell).transpose()
    }

    async fn repoint_shell(
        &self,
        old_external_id: &ExternalBookingId,
        new_external_id: &ExternalBookingId,
        new_date: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE booking_shells
            SET external_booking_id = $1, requested_date = $2, updated_at = $3
            WHERE external_booking_id = $4
            "#,
        )
        .bind(new_external_id.as_str())
        .bind(new_date)
        .bind(updated_at)
        .bind(old_external_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_attempt(&self, attempt: &ReservationAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservation_attempts
                (reservation_id, booking_id, slot_time, create_invoice,
                 response_snapshot, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attempt.reservation_id.as_uuid())
        .bind(attempt.booking_id.as_str())
        .bind(attempt.slot_time)
        .bind(attempt.create_invoice)
        .bind(&attempt.response_snapshot)
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_confirmed(&self, confirmed: &ConfirmedBooking) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO confirmed_bookings
                (appointment_id, booking_id, invoice_id, guest_id,
                 guest_first_name, guest_last_name, item_id, item_name,
                 item_type, item_display_name, therapist_id, therapist_full_name,
                 therapist_first_name, therapist_last_name, therapist_request_type,
                 room_id, room_name, start_time, end_time, invoice_item_id,
                 join_link, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(&confirmed.appointment_id)
        .bind(confirmed.booking_id.as_str())
        .bind(confirmed.invoice_id.as_str())
        .bind(confirmed.guest_id.as_str())
        .bind(&confirmed.guest_first_name)
        .bind(&confirmed.guest_last_name)
        .bind(confirmed.item_id.as_str())
        .bind(&confirmed.item_name)
        .bind(&confirmed.item_type)
        .bind(&confirmed.item_display_name)
        .bind(&confirmed.therapist_id)
        .bind(&confirmed.therapist_full_name)
        .bind(&confirmed.therapist_first_name)
        .bind(&confirmed.therapist_last_name)
        .bind(&confirmed.therapist_request_type)
        .bind(&confirmed.room_id)
        .bind(&confirmed.room_name)
        .bind(confirmed.start_time)
        .bind(confirmed.end_time)
        .bind(confirmed.invoice_item_id.as_str())
        .bind(confirmed.join_link.as_deref())
        .bind(confirmed.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn confirmed_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<ConfirmedBooking>> {
        let row = sqlx::query("SELECT * FROM confirmed_bookings WHERE invoice_id = $1")
            .bind(invoice_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_confirmed).transpose()
    }

    async fn delete_confirmed_by_invoice(&self, invoice_id: &InvoiceId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM confirmed_bookings WHERE invoice_id = $1")
            .bind(invoice_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_reschedule_log(&self, entry: &RescheduleLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reschedule_log
                (id, old_booking_id, new_booking_id, invoice_id,
                 invoice_item_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.old_booking_id.as_str())
        .bind(entry.new_booking_id.as_str())
        .bind(entry.invoice_id.as_str())
        .bind(entry.invoice_item_id.as_str())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reschedule_log_for_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Vec<RescheduleLogEntry>> {
        let rows =
            sqlx::query("SELECT * FROM reschedule_log WHERE invoice_id = $1 ORDER BY created_at")
                .bind(invoice_id.as_str())
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Self::row_to_log_entry).collect()
    }
}
