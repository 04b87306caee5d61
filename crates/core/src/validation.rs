//! Input validation utilities.
//!
//! Form fields arrive as raw strings. These helpers turn them into the typed values the core
//! operations accept, reporting `HospitalError::Validation` with the field name on failure.

use crate::constants::{DATE_FORMAT, TIME_FORMAT};
use crate::error::{HospitalError, HospitalResult};
use chrono::{NaiveDate, NaiveTime};
use hms_types::{EmailAddress, NonEmptyText};

/// Parses a required `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> HospitalResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        HospitalError::Validation(format!("{field} must be a date in YYYY-MM-DD format"))
    })
}

/// Parses an optional date; blank input yields `None`.
pub fn parse_optional_date(field: &str, value: &str) -> HospitalResult<Option<NaiveDate>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date(field, value).map(Some)
}

/// Parses a required `HH:MM` time.
pub fn parse_time(field: &str, value: &str) -> HospitalResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| HospitalError::Validation(format!("{field} must be a time in HH:MM format")))
}

/// Requires a non-blank text field.
pub fn required(field: &str, value: &str) -> HospitalResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| HospitalError::Validation(format!("{field} is required")))
}

/// Requires a well-formed e-mail address.
pub fn email(field: &str, value: &str) -> HospitalResult<EmailAddress> {
    EmailAddress::parse(value).map_err(|e| HospitalError::Validation(format!("{field}: {e}")))
}

/// Parses an optional non-negative whole number; blank input yields zero.
pub fn parse_count(field: &str, value: &str) -> HospitalResult<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<u32>().map_err(|_| {
        HospitalError::Validation(format!("{field} must be a non-negative whole number"))
    })
}
