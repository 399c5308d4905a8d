//! Booking horizon and availability-window resolution.

use anyhow::anyhow;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use lodge_kernel::settings::BookingSettings;

use super::error::BookingError;
use super::models::BookingRange;
use crate::utils::dates_between;

/// Property rules: which calendar the day is counted in, how far ahead, how long a stay.
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub time_zone: Tz,
    pub max_nights: usize,
    pub horizon_months: u32,
}

impl BookingPolicy {
    pub fn from_settings(settings: &BookingSettings) -> anyhow::Result<Self> {
        let time_zone: Tz = settings
            .time_zone
            .parse()
            .map_err(|err| anyhow!("unknown time zone '{}': {}", settings.time_zone, err))?;

        if settings.max_nights == 0 {
            return Err(anyhow!("booking.max_nights must be at least 1"));
        }
        if settings.horizon_months == 0 {
            return Err(anyhow!("booking.horizon_months must be at least 1"));
        }

        Ok(Self {
            time_zone,
            max_nights: settings.max_nights as usize,
            horizon_months: settings.horizon_months,
        })
    }

    /// The property's calendar date at `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.time_zone).date_naive()
    }

    pub fn horizon(&self, now: DateTime<Utc>) -> Result<Horizon, BookingError> {
        Horizon::after(self.today(now), self.horizon_months)
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Atlantic::Bermuda,
            max_nights: 3,
            horizon_months: 1,
        }
    }
}

/// Bookable window relative to `today`: `first = today + 1 day`, `last = today + N months`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl Horizon {
    /// Month arithmetic clamps to the end of shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn after(today: NaiveDate, months: u32) -> Result<Self, BookingError> {
        let first = today.checked_add_days(Days::new(1));
        let last = today.checked_add_months(Months::new(months));
        match (first, last) {
            (Some(first), Some(last)) => Ok(Self { first, last }),
            _ => Err(BookingError::validation(
                "from",
                "Booking horizon is outside the supported calendar",
            )),
        }
    }

    /// Turn optional `from`/`to` query values into a validated window.
    ///
    /// Blank or absent bounds default to the horizon edges. Checks run in order and
    /// the first failure wins. `from == to` widens to a single day.
    pub fn resolve(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<BookingRange, BookingError> {
        let from = parse_bound("from", from)?.unwrap_or(self.first);
        let mut to = parse_bound("to", to)?.unwrap_or(self.last);

        if from < self.first {
            return Err(BookingError::validation(
                "from",
                "From-date must be >= today + 1 day",
            ));
        }
        if from > self.last {
            return Err(BookingError::validation(
                "from",
                "From-date must be <= today + 1 month",
            ));
        }
        if from > to {
            return Err(BookingError::validation(
                "to",
                "To-date required to be after from-date",
            ));
        }
        if to > self.last {
            return Err(BookingError::validation(
                "to",
                "To-date must be <= today + 1 month",
            ));
        }
        if from == to {
            to = to
                .succ_opt()
                .ok_or_else(|| BookingError::validation("to", "To-date is out of range"))?;
        }

        Ok(BookingRange {
            from,
            to,
            dates: dates_between(from, to),
        })
    }
}

/// `None` for absent or blank input.
fn parse_bound(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, BookingError> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_date(field, value).map(Some),
        _ => Ok(None),
    }
}

/// Strict ISO `YYYY-MM-DD`.
pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, BookingError> {
    let well_formed = value.len() == 10
        && value
            .bytes()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });

    well_formed
        .then(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .flatten()
        .ok_or_else(|| BookingError::Parse {
            field,
            value: value.to_string(),
        })
}
