use std::collections::HashSet;

use chrono::NaiveDate;

use super::models::{Availability, AvailabilityDate, BookingRange, DateStatus};

/// Classify every date of `range` against the occupied set, preserving order.
pub fn resolve(range: &BookingRange, occupied: &HashSet<NaiveDate>) -> Availability {
    let dates: Vec<AvailabilityDate> = range
        .dates
        .iter()
        .map(|&date| AvailabilityDate {
            date,
            status: if occupied.contains(&date) {
                DateStatus::Unavailable
            } else {
                DateStatus::Available
            },
        })
        .collect();

    Availability {
        from: range.from,
        to: range.to,
        count: dates.len(),
        dates,
    }
}
