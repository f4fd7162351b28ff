//! Domain records for gatherings, attendees and the link between them.
//!
//! # Responsibility
//! - Define the canonical records handled by services and repositories.
//! - Own the only mutation path for the gathering/attendee association.
//!
//! # Invariants
//! - A record carrying `UNSAVED_ID` has never been persisted.
//! - Every association edge is present on both endpoints or on neither.

pub mod association;
pub mod attendee;
pub mod gathering;

use uuid::Uuid;

/// Sentinel identifier for records that storage has not assigned yet.
pub const UNSAVED_ID: Uuid = Uuid::nil();
