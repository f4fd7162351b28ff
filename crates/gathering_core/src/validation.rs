//! Field-level checks shared by gathering and attendee services.
//!
//! # Responsibility
//! - Reject blank text, absent or past dates and malformed e-mail addresses.
//!
//! # Invariants
//! - Checks are pure apart from reading the local calendar date.
//! - A failure always names the offending field.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

pub const REASON_BLANK: &str = "cannot be null or empty";
pub const REASON_REQUIRED: &str = "is required";
pub const REASON_PAST: &str = "cannot be in the past";
pub const REASON_EMAIL_FORMAT: &str = "has an invalid format";

pub type ValidationResult = Result<(), ValidationFailure>;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationFailure {
    fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

impl Error for ValidationFailure {}

/// Fails when `value` is empty or whitespace-only.
pub fn require_non_blank_text(value: &str, field: &'static str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationFailure::new(field, REASON_BLANK));
    }
    Ok(())
}

/// Fails when `date` is absent or earlier than the local calendar date.
pub fn require_today_or_future_date(date: Option<NaiveDate>) -> ValidationResult {
    require_on_or_after(date, Local::now().date_naive())
}

/// Fails when `date` is absent or strictly before `today`.
pub fn require_on_or_after(date: Option<NaiveDate>, today: NaiveDate) -> ValidationResult {
    match date {
        None => Err(ValidationFailure::new("date", REASON_REQUIRED)),
        Some(value) if value < today => Err(ValidationFailure::new("date", REASON_PAST)),
        Some(_) => Ok(()),
    }
}

/// Fails when `value` is empty or not exactly shaped like `local@domain.tld`.
///
/// Surrounding whitespace is a format error: e-mails are lookup keys and are
/// stored as given.
pub fn require_valid_email(value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationFailure::new("email", REASON_BLANK));
    }
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationFailure::new("email", REASON_EMAIL_FORMAT));
    }
    Ok(())
}
