//! Core relationship management for gatherings and attendees.
//! This crate is the single source of truth for association invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod storage;
pub mod validation;

pub use config::{ConfigError, CoreConfig, StorageBackend};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::association::{is_linked, link, unlink};
pub use model::attendee::{Attendee, AttendeeId};
pub use model::gathering::{Gathering, GatheringId};
pub use model::UNSAVED_ID;
pub use notify::{AttendeeNotifier, GatheringNotifier, LogNotifier, Notification, RecordingNotifier};
pub use repo::attendee_repo::{AttendeeRepository, SqliteAttendeeRepository};
pub use repo::gathering_repo::{GatheringRepository, SqliteGatheringRepository};
pub use repo::memory::{InMemoryAttendeeRepository, InMemoryGatheringRepository};
pub use repo::{RepoError, RepoResult};
pub use service::attendee_service::AttendeeService;
pub use service::gathering_service::GatheringService;
pub use service::rejection::{Rejection, RejectionCategory};
pub use storage::{SharedAttendeeRepository, SharedGatheringRepository, Storage};
pub use validation::ValidationFailure;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
