use async_trait::async_trait;
use common::{HotelId, RoomId, RoomType, Version};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    InventoryError, Result,
    room::{NewRoom, Room, RoomDetails},
    store::RoomStore,
};

const ROOM_COLUMNS: &str =
    "id, hotel_id, room_number, room_type, price_cents, available, times_booked, version";

const UNIQUE_ROOM_NUMBER: &str = "unique_hotel_room_number";

/// PostgreSQL-backed room store.
///
/// The in-flight request marker of a room is not persisted; rooms loaded from
/// the database never carry one.
#[derive(Clone)]
pub struct PostgresRoomStore {
    pool: PgPool,
}

impl PostgresRoomStore {
    /// Creates a new PostgreSQL room store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations/inventory")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_room(row: PgRow) -> Result<Room> {
        let room_type: String = row.try_get("room_type")?;
        let room_type: RoomType = room_type
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let times_booked: i32 = row.try_get("times_booked")?;
        let times_booked =
            u32::try_from(times_booked).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let new = NewRoom {
            hotel_id: HotelId::new(row.try_get("hotel_id")?),
            room_number: row.try_get("room_number")?,
            room_type,
            price_cents: row.try_get("price_cents")?,
            available: row.try_get("available")?,
        };
        Ok(Room::from_parts(
            RoomId::new(row.try_get("id")?),
            new,
            times_booked,
            Version::new(row.try_get("version")?),
        ))
    }

    fn map_unique_violation(
        e: sqlx::Error,
        hotel_id: HotelId,
        room_number: &str,
    ) -> InventoryError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.constraint() == Some(UNIQUE_ROOM_NUMBER)
        {
            return InventoryError::InvalidRoom(format!(
                "room number {room_number} already exists in hotel {hotel_id}"
            ));
        }
        InventoryError::Database(e)
    }

    /// Explains why a version-guarded update matched no row.
    async fn conflict_or_missing(&self, id: RoomId, expected: Version) -> InventoryError {
        let current: std::result::Result<Option<i64>, sqlx::Error> =
            sqlx::query_scalar("SELECT version FROM rooms WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&self.pool)
                .await;
        match current {
            Ok(Some(actual)) => InventoryError::ConcurrencyConflict {
                room_id: id,
                expected,
                actual: Version::new(actual),
            },
            Ok(None) => InventoryError::RoomNotFound(id),
            Err(e) => InventoryError::Database(e),
        }
    }
}

#[async_trait]
impl RoomStore for PostgresRoomStore {
    async fn insert(&self, room: NewRoom) -> Result<Room> {
        room.validate()?;
        let sql = format!(
            r#"
            INSERT INTO rooms (hotel_id, room_number, room_type, price_cents, available)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ROOM_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(room.hotel_id.as_i64())
            .bind(&room.room_number)
            .bind(room.room_type.as_str())
            .bind(room.price_cents)
            .bind(room.available)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::map_unique_violation(e, room.hotel_id, &room.room_number))?;

        Self::row_to_room(row)
    }

    async fn get(&self, id: RoomId) -> Result<Option<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_room).transpose()
    }

    async fn list(&self) -> Result<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_room).collect()
    }

    async fn list_available(&self) -> Result<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE available ORDER BY id ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_room).collect()
    }

    async fn update_details(
        &self,
        id: RoomId,
        details: RoomDetails,
        expected_version: Version,
    ) -> Result<Room> {
        details.validate()?;
        let sql = format!(
            r#"
            UPDATE rooms
            SET room_number = $3, room_type = $4, price_cents = $5, available = $6,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {ROOM_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(expected_version.as_i64())
            .bind(&details.room_number)
            .bind(details.room_type.as_str())
            .bind(details.price_cents)
            .bind(details.available)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(UNIQUE_ROOM_NUMBER)
                {
                    return InventoryError::InvalidRoom(format!(
                        "room number {} already exists in this hotel",
                        details.room_number
                    ));
                }
                InventoryError::Database(e)
            })?;

        match row {
            Some(row) => Self::row_to_room(row),
            None => Err(self.conflict_or_missing(id, expected_version).await),
        }
    }

    async fn save_load(&self, room: &Room, expected_version: Version) -> Result<Room> {
        let sql = format!(
            r#"
            UPDATE rooms
            SET times_booked = $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {ROOM_COLUMNS}
            "#
        );
        let times_booked = i32::try_from(room.times_booked()).map_err(|_| {
            InventoryError::InvalidRoom("times_booked exceeds storage range".to_string())
        })?;
        let row = sqlx::query(&sql)
            .bind(room.id().as_i64())
            .bind(expected_version.as_i64())
            .bind(times_booked)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_room(row),
            None => Err(self.conflict_or_missing(room.id(), expected_version).await),
        }
    }
}
