//! Attendee domain record.
//!
//! # Invariants
//! - `email` is unique across stored attendees.
//! - `gathering_ids` changes only through `model::association`.
//! - A stored attendee is linked to at least one gathering once its first
//!   association completes.

use crate::model::gathering::GatheringId;
use crate::model::UNSAVED_ID;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier of an attendee.
pub type AttendeeId = Uuid;

/// Named person identified by a unique e-mail address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    /// `UNSAVED_ID` until storage assigns a real identifier.
    pub id: AttendeeId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub(super) gathering_ids: BTreeSet<GatheringId>,
}

impl Attendee {
    /// Creates an unsaved attendee with no gatherings.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::with_id(UNSAVED_ID, name, email)
    }

    pub fn with_id(id: AttendeeId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            gathering_ids: BTreeSet::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Gatherings this attendee is linked to.
    pub fn gathering_ids(&self) -> &BTreeSet<GatheringId> {
        &self.gathering_ids
    }

    pub fn has_gatherings(&self) -> bool {
        !self.gathering_ids.is_empty()
    }

    /// Returns a copy with the same identity and fields but no gatherings.
    pub fn detached(&self) -> Self {
        Self::with_id(self.id, self.name.clone(), self.email.clone())
    }

    /// Adopts the identifier and gathering set of the stored `existing` record.
    ///
    /// Update payloads are matched by e-mail and never alter the association.
    pub fn carry_identity_from(&mut self, existing: &Attendee) {
        self.id = existing.id;
        self.gathering_ids = existing.gathering_ids.clone();
    }

    pub(crate) fn with_gathering_ids(mut self, gathering_ids: BTreeSet<GatheringId>) -> Self {
        self.gathering_ids = gathering_ids;
        self
    }
}

impl PartialEq for Attendee {
    fn eq(&self, other: &Self) -> bool {
        if self.is_persisted() && other.is_persisted() {
            return self.id == other.id;
        }
        self.id == other.id
            && self.name == other.name
            && self.email == other.email
            && self.gathering_ids == other.gathering_ids
    }
}

impl Eq for Attendee {}
