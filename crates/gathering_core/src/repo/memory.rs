//! In-memory repository implementations.
//!
//! Handles are cheap to clone and share one map, so a single backend can serve
//! several services at once.

use crate::model::attendee::{Attendee, AttendeeId};
use crate::model::gathering::{Gathering, GatheringId};
use crate::repo::attendee_repo::AttendeeRepository;
use crate::repo::gathering_repo::GatheringRepository;
use crate::repo::{assign_id, RepoError, RepoResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory gathering storage keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGatheringRepository {
    rows: Arc<RwLock<BTreeMap<GatheringId, Gathering>>>,
}

impl InMemoryGatheringRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored gatherings.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl GatheringRepository for InMemoryGatheringRepository {
    fn add(&self, gathering: &Gathering) -> RepoResult<Gathering> {
        let mut stored = gathering.clone();
        stored.id = assign_id(gathering.id);

        let mut rows = self.rows.write();
        if rows.contains_key(&stored.id) {
            return Err(RepoError::DuplicateId(stored.id));
        }
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, gathering: &Gathering) -> RepoResult<()> {
        let mut rows = self.rows.write();
        let slot = rows
            .get_mut(&gathering.id)
            .ok_or(RepoError::NotFound(gathering.id))?;
        *slot = gathering.clone();
        Ok(())
    }

    fn update_details(&self, gathering: &Gathering) -> RepoResult<()> {
        let mut rows = self.rows.write();
        let slot = rows
            .get_mut(&gathering.id)
            .ok_or(RepoError::NotFound(gathering.id))?;
        let mut stored = gathering.clone();
        stored.carry_attendees_from(slot);
        *slot = stored;
        Ok(())
    }

    fn update_attendees(&self, gathering: &Gathering) -> RepoResult<()> {
        let mut rows = self.rows.write();
        let slot = rows
            .get_mut(&gathering.id)
            .ok_or(RepoError::NotFound(gathering.id))?;
        slot.carry_attendees_from(gathering);
        Ok(())
    }

    fn delete(&self, gathering: &Gathering) -> RepoResult<()> {
        self.rows
            .write()
            .remove(&gathering.id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(gathering.id))
    }

    fn get_by_id(&self, id: GatheringId) -> RepoResult<Option<Gathering>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    fn list_all(&self) -> RepoResult<Vec<Gathering>> {
        Ok(self.rows.read().values().cloned().collect())
    }
}

/// In-memory attendee storage keyed by identifier with unique e-mails.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttendeeRepository {
    rows: Arc<RwLock<BTreeMap<AttendeeId, Attendee>>>,
}

impl InMemoryAttendeeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl AttendeeRepository for InMemoryAttendeeRepository {
    fn add(&self, attendee: &Attendee) -> RepoResult<Attendee> {
        let mut stored = attendee.clone();
        stored.id = assign_id(attendee.id);

        let mut rows = self.rows.write();
        if rows.contains_key(&stored.id) {
            return Err(RepoError::DuplicateId(stored.id));
        }
        if rows.values().any(|row| row.email == stored.email) {
            return Err(RepoError::DuplicateEmail(stored.email));
        }
        rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, attendee: &Attendee) -> RepoResult<()> {
        let mut rows = self.rows.write();
        if rows
            .values()
            .any(|row| row.id != attendee.id && row.email == attendee.email)
        {
            return Err(RepoError::DuplicateEmail(attendee.email.clone()));
        }
        let slot = rows
            .get_mut(&attendee.id)
            .ok_or(RepoError::NotFound(attendee.id))?;
        *slot = attendee.clone();
        Ok(())
    }

    fn delete(&self, attendee: &Attendee) -> RepoResult<()> {
        self.rows
            .write()
            .remove(&attendee.id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(attendee.id))
    }

    fn get_by_id(&self, id: AttendeeId) -> RepoResult<Option<Attendee>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<Attendee>> {
        Ok(self
            .rows
            .read()
            .values()
            .find(|row| row.email == email)
            .cloned())
    }

    fn list_all(&self) -> RepoResult<Vec<Attendee>> {
        Ok(self.rows.read().values().cloned().collect())
    }
}
