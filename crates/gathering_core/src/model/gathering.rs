//! Gathering domain record.
//!
//! # Responsibility
//! - Hold the scalar fields of a dated, located event.
//! - Expose the attendee side of the association read-only.
//!
//! # Invariants
//! - `attendee_ids` changes only through `model::association`.
//! - Persisted gatherings compare equal by `id` alone.

use crate::model::attendee::AttendeeId;
use crate::model::UNSAVED_ID;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of a gathering.
pub type GatheringId = Uuid;

/// Named, dated and located event that attendees link to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gathering {
    /// `UNSAVED_ID` until storage assigns a real identifier.
    pub id: GatheringId,
    pub name: String,
    /// `None` only for unvalidated caller input.
    pub date: Option<NaiveDate>,
    pub location: String,
    #[serde(default)]
    pub(super) attendee_ids: BTreeSet<AttendeeId>,
}

impl Gathering {
    /// Creates an unsaved gathering with no attendees.
    pub fn new(
        name: impl Into<String>,
        date: Option<NaiveDate>,
        location: impl Into<String>,
    ) -> Self {
        Self::with_id(UNSAVED_ID, name, date, location)
    }

    /// Creates a gathering with a caller-chosen identifier.
    ///
    /// `add` keeps a non-sentinel id, so concurrent creates of one logical
    /// gathering collide on it; also used to address stored rows in updates.
    pub fn with_id(
        id: GatheringId,
        name: impl Into<String>,
        date: Option<NaiveDate>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            date,
            location: location.into(),
            attendee_ids: BTreeSet::new(),
        }
    }

    /// Returns whether storage has assigned this record an identifier.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Attendees currently linked to this gathering.
    pub fn attendee_ids(&self) -> &BTreeSet<AttendeeId> {
        &self.attendee_ids
    }

    pub fn has_attendees(&self) -> bool {
        !self.attendee_ids.is_empty()
    }

    /// Replaces this record's attendee set with the one stored on `existing`.
    ///
    /// Update payloads only carry scalar fields; the association must survive.
    pub fn carry_attendees_from(&mut self, existing: &Gathering) {
        self.attendee_ids = existing.attendee_ids.clone();
    }

    pub(crate) fn with_attendee_ids(mut self, attendee_ids: BTreeSet<AttendeeId>) -> Self {
        self.attendee_ids = attendee_ids;
        self
    }
}

impl PartialEq for Gathering {
    fn eq(&self, other: &Self) -> bool {
        if self.is_persisted() && other.is_persisted() {
            return self.id == other.id;
        }
        self.id == other.id
            && self.name == other.name
            && self.date == other.date
            && self.location == other.location
            && self.attendee_ids == other.attendee_ids
    }
}

impl Eq for Gathering {}
