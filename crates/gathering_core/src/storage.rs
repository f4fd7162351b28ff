//! Storage backend wiring.
//!
//! Opens the repositories selected by `StorageBackend` as shared handles so
//! that gathering and attendee services observe the same records.

use crate::config::StorageBackend;
use crate::db::{open_db, open_db_in_memory, share};
use crate::repo::attendee_repo::{AttendeeRepository, SqliteAttendeeRepository};
use crate::repo::gathering_repo::{GatheringRepository, SqliteGatheringRepository};
use crate::repo::memory::{InMemoryAttendeeRepository, InMemoryGatheringRepository};
use crate::repo::RepoResult;
use log::info;
use rusqlite::Connection;
use std::sync::Arc;

pub type SharedGatheringRepository = Arc<dyn GatheringRepository>;
pub type SharedAttendeeRepository = Arc<dyn AttendeeRepository>;

/// Pair of repositories backed by one storage backend.
#[derive(Clone)]
pub struct Storage {
    pub gatherings: SharedGatheringRepository,
    pub attendees: SharedAttendeeRepository,
}

impl Storage {
    /// Opens the configured backend, applying migrations for SQLite.
    pub fn open(backend: &StorageBackend) -> RepoResult<Self> {
        let storage = match backend {
            StorageBackend::InMemory => Self::in_memory(),
            StorageBackend::Sqlite { path } => Self::sqlite(open_db(path)?),
        };
        info!(
            "event=storage_open module=storage status=ok backend={}",
            backend_label(backend)
        );
        Ok(storage)
    }

    pub fn in_memory() -> Self {
        Self {
            gatherings: Arc::new(InMemoryGatheringRepository::new()),
            attendees: Arc::new(InMemoryAttendeeRepository::new()),
        }
    }

    /// Opens a migrated in-memory SQLite database.
    pub fn sqlite_in_memory() -> RepoResult<Self> {
        Ok(Self::sqlite(open_db_in_memory()?))
    }

    /// Wraps a migrated connection shared by both repositories.
    pub fn sqlite(conn: Connection) -> Self {
        let conn = share(conn);
        Self {
            gatherings: Arc::new(SqliteGatheringRepository::new(Arc::clone(&conn))),
            attendees: Arc::new(SqliteAttendeeRepository::new(conn)),
        }
    }
}

fn backend_label(backend: &StorageBackend) -> &'static str {
    match backend {
        StorageBackend::InMemory => "memory",
        StorageBackend::Sqlite { .. } => "sqlite",
    }
}
