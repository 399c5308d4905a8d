use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a stored booking. Only `Confirmed -> Deleted` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Deleted,
}

/// A booking row as persisted and returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: i64,
    /// Nanoseconds since the Unix epoch
    pub created_time: i64,
    /// `0` until the first update
    pub updated_time: i64,
    /// `0` until deleted
    pub deleted_time: i64,
    pub email: String,
    pub full_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatus,
}

impl BookingRecord {
    pub fn is_deleted(&self) -> bool {
        self.status == BookingStatus::Deleted
    }

    /// Whether `email` and `full_name` identify the guest who made this booking.
    pub fn is_owned_by(&self, email: &str, full_name: &str) -> bool {
        self.email == email && self.full_name == full_name
    }
}

/// Raw create/update payload. Absent fields are treated as blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
}

/// A structurally valid stay, ready to be checked against the occupancy index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    /// Occupied nights, `check_in` inclusive to `check_out` exclusive
    pub dates: Vec<NaiveDate>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub email: String,
    pub full_name: String,
}

/// Resolved availability window: `from` inclusive, `to` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDate {
    pub date: NaiveDate,
    pub status: DateStatus,
}

/// Per-date availability over a window; `count == dates.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub dates: Vec<AvailabilityDate>,
    pub count: usize,
}
