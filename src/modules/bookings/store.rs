//! SQLite access for bookings and the date occupancy index.
//!
//! Every function issues a single statement against any executor, so callers choose
//! between the pool (point-in-time reads) and an open transaction (check-then-act writes).

use chrono::NaiveDate;
use lodge_kernel::Migration;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::models::{Booking, BookingRecord, BookingStatus};
use crate::utils::date_key;

pub const MIGRATIONS: &[Migration] = &[Migration {
    id: "001_init",
    up: r#"
        CREATE TABLE booking (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            created_time INTEGER NOT NULL,
            updated_time INTEGER NOT NULL DEFAULT 0,
            deleted_time INTEGER NOT NULL DEFAULT 0,
            email        TEXT    NOT NULL,
            full_name    TEXT    NOT NULL,
            check_in     TEXT    NOT NULL,
            check_out    TEXT    NOT NULL,
            status       TEXT    NOT NULL CHECK (status IN ('CONFIRMED', 'DELETED'))
        );
        CREATE TABLE booking_date (
            date       TEXT    PRIMARY KEY NOT NULL,
            booking_id INTEGER NOT NULL REFERENCES booking(id)
        );
        CREATE INDEX booking_id_index ON booking_date(booking_id);
    "#,
}];

const SELECT_BOOKING: &str = "SELECT id, created_time, updated_time, deleted_time, email, \
     full_name, check_in, check_out, status FROM booking WHERE id = ?";

pub async fn find_booking<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<Option<BookingRecord>, sqlx::Error> {
    sqlx::query_as::<_, BookingRecord>(SELECT_BOOKING)
        .bind(id)
        .fetch_optional(exec)
        .await
}

/// Insert a confirmed booking and return its id.
pub async fn insert_booking<'e>(
    exec: impl SqliteExecutor<'e>,
    booking: &Booking,
    created_time: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO booking (created_time, email, full_name, check_in, check_out, status) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(created_time)
    .bind(&booking.email)
    .bind(&booking.full_name)
    .bind(date_key(booking.check_in))
    .bind(date_key(booking.check_out))
    .bind(BookingStatus::Confirmed)
    .execute(exec)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Move a booking to a new stay. Identity, status and the other timestamps are untouched.
pub async fn update_stay<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    booking: &Booking,
    updated_time: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE booking SET check_in = ?, check_out = ?, updated_time = ? WHERE id = ?")
        .bind(date_key(booking.check_in))
        .bind(date_key(booking.check_out))
        .bind(updated_time)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn mark_deleted<'e>(
    exec: impl SqliteExecutor<'e>,
    id: i64,
    deleted_time: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE booking SET status = ?, deleted_time = ? WHERE id = ?")
        .bind(BookingStatus::Deleted)
        .bind(deleted_time)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Claim `dates` for `booking_id`. Fails with a unique violation if any date is already owned.
pub async fn insert_dates<'e>(
    exec: impl SqliteExecutor<'e>,
    booking_id: i64,
    dates: &[NaiveDate],
) -> Result<(), sqlx::Error> {
    if dates.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO booking_date (date, booking_id) ");
    builder.push_values(dates, |mut row, date| {
        row.push_bind(date_key(*date)).push_bind(booking_id);
    });
    builder.build().execute(exec).await?;
    Ok(())
}

/// Occupied dates in `[from, to)`, ascending.
pub async fn occupied_between<'e>(
    exec: impl SqliteExecutor<'e>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM booking_date WHERE date >= ? AND date < ? ORDER BY date",
    )
    .bind(date_key(from))
    .bind(date_key(to))
    .fetch_all(exec)
    .await
}

pub async fn dates_of_booking<'e>(
    exec: impl SqliteExecutor<'e>,
    booking_id: i64,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "SELECT date FROM booking_date WHERE booking_id = ? ORDER BY date",
    )
    .bind(booking_id)
    .fetch_all(exec)
    .await
}

pub async fn delete_dates_of_booking<'e>(
    exec: impl SqliteExecutor<'e>,
    booking_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM booking_date WHERE booking_id = ?")
        .bind(booking_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_all_dates<'e>(exec: impl SqliteExecutor<'e>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM booking_date").execute(exec).await?;
    Ok(result.rows_affected())
}
