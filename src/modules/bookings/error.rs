use chrono::NaiveDate;
use lodge_http::error::AppError;
use serde_json::json;
use thiserror::Error;

/// Failures raised by the booking components.
#[derive(Debug, Error)]
pub enum BookingError {
    /// A value could not be parsed (malformed date, non-numeric id).
    #[error("invalid {field} '{value}'")]
    Parse { field: &'static str, value: String },

    /// A range, length-of-stay, or required-field rule was broken.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("booking {0} not found")]
    NotFound(i64),

    /// The caller may not modify this booking.
    #[error("{0}")]
    NotAllowed(String),

    /// Some requested dates are already occupied, or were claimed by a concurrent writer.
    #[error("Dates are not available: {}", join_dates(.dates))]
    Conflict { dates: Vec<NaiveDate> },

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl BookingError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// `true` when the request itself was at fault, `false` when the system failed.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BookingError::Storage(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            BookingError::Parse { .. } => "bad_parameters",
            BookingError::Validation { .. } => "validation_error",
            BookingError::NotFound(_) => "not_found",
            BookingError::NotAllowed(_) => "not_allowed",
            BookingError::Conflict { .. } => "date_conflict",
            BookingError::Storage(_) => "storage_error",
        }
    }
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|date| date.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every booking failure answers `400`; the `code` tells the kinds apart.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let code = err.code();
        if !err.is_client_error() {
            tracing::error!(error = %err, "booking storage failure");
        }
        match err {
            BookingError::Parse { field, ref value } => AppError::Validation {
                details: vec![json!({ "field": field, "error": "unparseable", "value": value })],
                code: code.to_string(),
                message: err.to_string(),
            },
            BookingError::Validation { field, ref message } => AppError::Validation {
                details: vec![json!({ "field": field, "error": message })],
                code: code.to_string(),
                message: message.clone(),
            },
            BookingError::Conflict { ref dates } => AppError::Validation {
                details: dates.iter().map(|date| json!({ "date": date })).collect(),
                code: code.to_string(),
                message: err.to_string(),
            },
            BookingError::Storage(_) => {
                AppError::bad_request_with_code(code, "Unable to complete booking operation")
            }
            BookingError::NotFound(_) | BookingError::NotAllowed(_) => {
                AppError::bad_request_with_code(code, err.to_string())
            }
        }
    }
}
