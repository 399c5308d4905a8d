use super::error::BookingError;
use super::horizon::parse_date;
use super::models::{Booking, BookingRequest};
use crate::utils::dates_between;

/// Structural checks on a booking request, first failure wins.
///
/// Occupancy is not consulted here; that check belongs to the write transaction.
pub fn validate_request(
    request: &BookingRequest,
    max_nights: usize,
) -> Result<Booking, BookingError> {
    let check_in = parse_date("checkIn", request.check_in.as_deref().unwrap_or_default())?;
    let check_out = parse_date("checkOut", request.check_out.as_deref().unwrap_or_default())?;

    if check_out <= check_in {
        return Err(BookingError::validation(
            "checkOut",
            "Check-in needs to be before check-out",
        ));
    }

    let dates = dates_between(check_in, check_out);
    if dates.is_empty() || dates.len() > max_nights {
        return Err(BookingError::validation(
            "checkOut",
            format!("Stay needs to be between 1 up to {max_nights} days"),
        ));
    }

    let full_name = required(request.full_name.as_deref())
        .ok_or_else(|| BookingError::validation("fullName", "Full name required"))?;
    let email = required(request.email.as_deref())
        .ok_or_else(|| BookingError::validation("email", "Email required"))?;

    Ok(Booking {
        dates,
        check_in,
        check_out,
        email: email.to_string(),
        full_name: full_name.to_string(),
    })
}

fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
