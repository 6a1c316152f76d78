use chrono::NaiveDate;
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::{
    db::DbPool,
    error::{AppError, Result, is_foreign_key_violation, is_unique_violation},
    models::event::{Event, EventFields},
};

const EVENT_COLUMNS: &str = "id, name, description, date, time, location, owner_username";

/// Event store for database operations.
///
/// Reads go straight to the pool. Every statement also has an `*_in` form that
/// runs on a caller-supplied connection, so several of them can share one
/// transaction.
#[derive(Clone)]
pub struct EventStore {
    pool: DbPool,
}

impl EventStore {
    /// Create a new EventStore with the provided database pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Start a write transaction on a pooled connection.
    ///
    /// `BEGIN IMMEDIATE` takes the write lock up front, so a transaction that
    /// reads before it writes waits on `busy_timeout` instead of failing with
    /// BUSY when another writer got there first.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Get all events in insertion order
    pub async fn get_all(&self) -> Result<Vec<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY id");
        let events = sqlx::query_as::<_, Event>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Get the events created by one user
    pub async fn get_by_owner(&self, username: &str) -> Result<Vec<Event>> {
        let query =
            format!("SELECT {EVENT_COLUMNS} FROM events WHERE owner_username = ? ORDER BY id");
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(username)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Get the events booked on a date
    pub async fn get_by_date(&self, date: NaiveDate) -> Result<Vec<Event>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_date_in(&mut conn, date).await
    }

    /// Get an event by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Event>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_in(&mut conn, id).await
    }

    /// Insert an event and return its new ID
    pub async fn insert(&self, fields: &EventFields, owner_username: &str) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in(&mut conn, fields, owner_username).await
    }

    /// Replace the mutable fields of an event
    pub async fn update(&self, id: i64, fields: &EventFields) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::update_in(&mut conn, id, fields).await
    }

    /// Delete an event; deleting a missing ID is not an error
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::delete_in(&mut conn, id).await
    }

    pub async fn get_by_date_in(
        conn: &mut SqliteConnection,
        date: NaiveDate,
    ) -> Result<Vec<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE date = ? ORDER BY id");
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(date)
            .fetch_all(&mut *conn)
            .await?;

        Ok(events)
    }

    pub async fn get_by_id_in(conn: &mut SqliteConnection, id: i64) -> Result<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?");
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(event)
    }

    pub async fn insert_in(
        conn: &mut SqliteConnection,
        fields: &EventFields,
        owner_username: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (name, description, date, time, location, owner_username)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.date)
        .bind(fields.time)
        .bind(&fields.location)
        .bind(owner_username)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, fields.date))?;

        let id = result.last_insert_rowid();
        tracing::info!("Inserted event {} on {} for {}", id, fields.date, owner_username);
        Ok(id)
    }

    pub async fn update_in(
        conn: &mut SqliteConnection,
        id: i64,
        fields: &EventFields,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET name = ?, description = ?, date = ?, time = ?, location = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.date)
        .bind(fields.time)
        .bind(&fields.location)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, fields.date))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(id));
        }

        tracing::info!("Updated event {}", id);
        Ok(())
    }

    pub async fn delete_in(conn: &mut SqliteConnection, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() > 0 {
            tracing::info!("Deleted event {}", id);
        }
        Ok(())
    }
}

/// Map constraint failures of an event write onto booking errors
fn write_error(err: sqlx::Error, date: NaiveDate) -> AppError {
    if is_unique_violation(&err) {
        AppError::DateConflict(date)
    } else if is_foreign_key_violation(&err) {
        AppError::Validation("event owner does not exist".into())
    } else {
        AppError::from(err)
    }
}
