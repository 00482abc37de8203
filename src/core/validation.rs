//! Form field validation shared by the create/edit operations.
//!
//! Every check returns the cleaned value or an `Error::Validation` naming the
//! offending field, so callers can surface errors next to the field.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Trims `value` and rejects it when empty.
pub fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional value, mapping blank input to `None`.
#[must_use]
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Checks for a plausible `local@domain.tld` address.
pub fn email(field: &str, value: &str) -> Result<String> {
    let trimmed = required(field, value)?;
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        && !trimmed.chars().any(char::is_whitespace);

    if !valid {
        return Err(Error::validation(field, "must be a valid email address"));
    }
    Ok(trimmed)
}

/// Rejects negative, NaN and infinite amounts.
pub fn non_negative_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Rejects an end date that falls before the start date.
pub fn date_order(start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    if end.is_some_and(|end| end < start) {
        return Err(Error::validation(
            "end_date",
            "must not be before the start date",
        ));
    }
    Ok(())
}
