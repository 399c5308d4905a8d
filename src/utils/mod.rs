//! Calendar helpers shared by the booking components.

use chrono::NaiveDate;

/// Every date from `from` (inclusive) up to `to` (exclusive).
pub fn dates_between(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days().take_while(|date| *date < to).collect()
}

/// Storage key for a calendar date.
///
/// Fixed-width `YYYY-MM-DD`, so lexicographic order equals chronological order
/// and range scans over the key column are date ranges.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
