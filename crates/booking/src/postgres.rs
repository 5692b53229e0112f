use async_trait::async_trait;
use common::{BookingId, RequestId, RoomId, UserId, Version};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    BookingStoreError, Result,
    booking::{Booking, NewBooking, Page},
    status::BookingStatus,
    store::BookingStore,
};

const BOOKING_COLUMNS: &str =
    "id, user_id, room_id, start_date, end_date, status, request_id, version, created_at";

const UNIQUE_REQUEST_ID: &str = "unique_booking_request_id";

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/booking")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let status: String = row.try_get("status")?;
        let status: BookingStatus = status
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

        Ok(Booking {
            id: BookingId::new(row.try_get("id")?),
            user_id: UserId::new(row.try_get("user_id")?),
            room_id: RoomId::new(row.try_get("room_id")?),
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status,
            request_id: RequestId::new(row.try_get::<String, _>("request_id")?),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        let sql = format!(
            r#"
            INSERT INTO bookings (user_id, room_id, start_date, end_date, status, request_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(booking.user_id.as_i64())
            .bind(booking.room_id.as_i64())
            .bind(booking.dates.start_date)
            .bind(booking.dates.end_date)
            .bind(booking.status.as_str())
            .bind(booking.request_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(UNIQUE_REQUEST_ID)
                {
                    return BookingStoreError::DuplicateRequestId(booking.request_id.clone());
                }
                BookingStoreError::Database(e)
            })?;

        Self::row_to_booking(row)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn find_by_request_id(&self, request_id: &RequestId) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE request_id = $1");
        let row = sqlx::query(&sql)
            .bind(request_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        expected_version: Version,
    ) -> Result<Booking> {
        let sql = format!(
            r#"
            UPDATE bookings
            SET status = $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {BOOKING_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(expected_version.as_i64())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Self::row_to_booking(row);
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM bookings WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        match actual {
            Some(actual) => Err(BookingStoreError::ConcurrencyConflict {
                booking_id: id,
                expected: expected_version,
                actual: Version::new(actual),
            }),
            None => Err(BookingStoreError::NotFound(id)),
        }
    }

    async fn list_for_user(&self, user_id: UserId, page: Page) -> Result<Vec<Booking>> {
        let sql = format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_i64())
            .bind(i64::from(page.limit))
            .bind(i64::from(page.offset))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}
