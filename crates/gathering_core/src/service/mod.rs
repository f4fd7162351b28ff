//! Relationship-management services.
//!
//! # Responsibility
//! - Enforce gathering/attendee invariants above the repository layer.
//! - Report every business outcome through a notifier, exactly once.
//!
//! # Invariants
//! - Mutating operations of one service instance are serialized by its
//!   write lock; listings do not take it.
//! - Business rejections never surface as `Err`; only storage failures do.

pub mod attendee_service;
pub mod gathering_service;
pub mod rejection;

use crate::repo::RepoError;
use log::error;

fn log_storage_failure(event: &str, err: &RepoError) {
    error!(
        "event={event} module=service status=error error_code=storage_failed cause={}",
        err.code()
    );
}
