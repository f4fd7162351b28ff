//! Storage collaborators for gatherings and attendees.
//!
//! # Responsibility
//! - Define one persistence port per record kind.
//! - Provide in-memory and SQLite implementations of both ports.
//!
//! # Invariants
//! - `add` replaces the `UNSAVED_ID` sentinel with a fresh identifier and keeps
//!   any caller-provided identifier.
//! - `update`/`delete` of an unknown identifier return `RepoError::NotFound`.
//! - Each call is individually atomic; callers sequence multi-step writes.

pub mod attendee_repo;
pub mod gathering_repo;
pub mod memory;

use crate::db::DbError;
use crate::model::UNSAVED_ID;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DB_DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure returned by repository implementations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(Uuid),
    DuplicateId(Uuid),
    DuplicateEmail(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::DuplicateId(id) => write!(f, "record already stored: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already stored: {email}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl RepoError {
    /// Stable, payload-free identifier for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::NotFound(_) => "not_found",
            Self::DuplicateId(_) => "duplicate_id",
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Returns the identifier a newly added record is stored under.
pub(crate) fn assign_id(id: Uuid) -> Uuid {
    if id == UNSAVED_ID {
        Uuid::new_v4()
    } else {
        id
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn date_to_db(date: Option<NaiveDate>) -> Option<String> {
    date.map(|value| value.format(DB_DATE_FORMAT).to_string())
}

pub(crate) fn parse_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(text) => NaiveDate::parse_from_str(&text, DB_DATE_FORMAT)
            .map(Some)
            .map_err(|_| RepoError::InvalidData(format!("invalid date value `{text}` in {column}"))),
    }
}
