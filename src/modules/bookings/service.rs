//! Booking lifecycle: create, update, delete, and availability reads.
//!
//! Each mutation runs in one SQLite transaction. The occupancy check and the writes that
//! depend on it commit together or not at all; a transaction dropped on an error path
//! rolls back. Write transactions start with `BEGIN IMMEDIATE`, so concurrent writers
//! queue on the database write lock instead of failing halfway through.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::availability;
use super::clock::Clock;
use super::error::BookingError;
use super::horizon::{BookingPolicy, Horizon};
use super::models::{Availability, Booking, BookingRecord, BookingRequest};
use super::store;
use super::validator::validate_request;

pub struct BookingService {
    pool: SqlitePool,
    policy: BookingPolicy,
    clock: Arc<dyn Clock>,
}

impl BookingService {
    pub fn new(pool: SqlitePool, policy: BookingPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            policy,
            clock,
        }
    }

    pub fn horizon(&self) -> Result<Horizon, BookingError> {
        self.policy.horizon(self.clock.now())
    }

    /// Per-date availability for the window described by the optional bounds.
    pub async fn availability(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Availability, BookingError> {
        let range = self.horizon()?.resolve(from, to)?;
        let occupied: HashSet<NaiveDate> = store::occupied_between(&self.pool, range.from, range.to)
            .await?
            .into_iter()
            .collect();

        Ok(availability::resolve(&range, &occupied))
    }

    pub async fn get(&self, id: i64) -> Result<BookingRecord, BookingError> {
        store::find_booking(&self.pool, id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    pub async fn create(&self, request: &BookingRequest) -> Result<BookingRecord, BookingError> {
        let booking = validate_request(request, self.policy.max_nights)?;

        let mut tx = self.begin_write().await?;
        ensure_dates_free(&mut tx, &booking).await?;

        let id = store::insert_booking(&mut *tx, &booking, self.timestamp())
            .await
            .map_err(|err| write_conflict(err, &booking))?;
        store::insert_dates(&mut *tx, id, &booking.dates)
            .await
            .map_err(|err| write_conflict(err, &booking))?;
        let record = store::find_booking(&mut *tx, id)
            .await?
            .ok_or(BookingError::NotFound(id))?;

        tx.commit()
            .await
            .map_err(|err| write_conflict(err, &booking))?;

        tracing::info!(
            booking_id = id,
            check_in = %booking.check_in,
            check_out = %booking.check_out,
            nights = booking.dates.len(),
            "booking created"
        );
        Ok(record)
    }

    /// Move an existing booking to new dates.
    ///
    /// Only the guest who made the booking (same email and full name) may move it. The
    /// booking's own dates are released before the new ones are checked, inside the same
    /// transaction, so a rejected update keeps its previous dates.
    pub async fn update(
        &self,
        id: i64,
        request: &BookingRequest,
    ) -> Result<BookingRecord, BookingError> {
        let booking = validate_request(request, self.policy.max_nights)?;

        let mut tx = self.begin_write().await?;
        let existing = store::find_booking(&mut *tx, id)
            .await?
            .ok_or(BookingError::NotFound(id))?;

        if !existing.is_owned_by(&booking.email, &booking.full_name) {
            return Err(BookingError::NotAllowed(
                "Email and full name don't match existing record".to_string(),
            ));
        }
        if existing.is_deleted() {
            return Err(BookingError::NotAllowed(format!(
                "Booking {id} is deleted and cannot be changed"
            )));
        }

        let released = store::delete_dates_of_booking(&mut *tx, id)
            .await
            .map_err(|err| write_conflict(err, &booking))?;
        ensure_dates_free(&mut tx, &booking).await?;

        store::update_stay(&mut *tx, id, &booking, self.timestamp())
            .await
            .map_err(|err| write_conflict(err, &booking))?;
        store::insert_dates(&mut *tx, id, &booking.dates)
            .await
            .map_err(|err| write_conflict(err, &booking))?;
        let record = store::find_booking(&mut *tx, id)
            .await?
            .ok_or(BookingError::NotFound(id))?;

        tx.commit()
            .await
            .map_err(|err| write_conflict(err, &booking))?;

        tracing::info!(
            booking_id = id,
            released,
            check_in = %booking.check_in,
            check_out = %booking.check_out,
            "booking updated"
        );
        Ok(record)
    }

    /// Soft-delete a booking and free its dates.
    ///
    /// Deleting an already deleted booking succeeds and keeps the first deletion time.
    pub async fn delete(&self, id: i64) -> Result<(), BookingError> {
        let mut tx = self.begin_write().await?;
        let existing = store::find_booking(&mut *tx, id)
            .await?
            .ok_or(BookingError::NotFound(id))?;

        if existing.is_deleted() {
            tracing::info!(booking_id = id, "booking already deleted");
            return Ok(());
        }

        store::mark_deleted(&mut *tx, id, self.timestamp()).await?;
        let released = store::delete_dates_of_booking(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(booking_id = id, released, "booking deleted");
        Ok(())
    }

    /// Maintenance reset of the occupancy index. Booking rows are left as they are.
    pub async fn delete_all_dates(&self) -> Result<u64, BookingError> {
        let removed = store::delete_all_dates(&self.pool).await?;
        tracing::warn!(removed, "occupancy index cleared");
        Ok(removed)
    }

    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, BookingError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    fn timestamp(&self) -> i64 {
        self.clock.now().timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

async fn ensure_dates_free(
    tx: &mut Transaction<'_, Sqlite>,
    booking: &Booking,
) -> Result<(), BookingError> {
    let taken = store::occupied_between(&mut **tx, booking.check_in, booking.check_out).await?;
    if taken.is_empty() {
        Ok(())
    } else {
        tracing::warn!(dates = ?taken, "requested dates already occupied");
        Err(BookingError::Conflict { dates: taken })
    }
}

/// Classify a failed write: a duplicate date key means another booking holds the night,
/// anything else (including a lock wait that outlasted the busy timeout) is a storage failure.
fn write_conflict(err: sqlx::Error, booking: &Booking) -> BookingError {
    let contested = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if contested {
        tracing::warn!(dates = ?booking.dates, "concurrent writer claimed requested dates");
        BookingError::Conflict {
            dates: booking.dates.clone(),
        }
    } else {
        BookingError::Storage(err)
    }
}
