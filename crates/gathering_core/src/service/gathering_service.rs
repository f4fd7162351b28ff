//! Gathering use-case service.
//!
//! # Responsibility
//! - Validate and persist gatherings through the gathering repository.
//! - Refuse to delete gatherings that still have attendees.
//!
//! # Invariants
//! - `update` writes scalar fields only and never drops the stored attendee set.
//! - A gathering with attendees is never deleted.

use crate::model::gathering::Gathering;
use crate::notify::GatheringNotifier;
use crate::repo::gathering_repo::GatheringRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::log_storage_failure;
use crate::service::rejection::Rejection;
use crate::validation::{require_non_blank_text, require_today_or_future_date, ValidationResult};
use log::{info, warn};
use parking_lot::Mutex;

/// Gathering service facade over a repository and a notifier.
pub struct GatheringService<G: GatheringRepository, N: GatheringNotifier> {
    repo: G,
    notifier: N,
    write_lock: Mutex<()>,
}

impl<G: GatheringRepository, N: GatheringNotifier> GatheringService<G, N> {
    pub fn new(repo: G, notifier: N) -> Self {
        Self {
            repo,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Lists every stored gathering and notifies the full list.
    pub fn list_all(&self) -> RepoResult<Vec<Gathering>> {
        let gatherings = self
            .repo
            .list_all()
            .inspect_err(|err| log_storage_failure("gathering_list", err))?;
        self.notifier.listed(&gatherings);
        Ok(gatherings)
    }

    /// Stores a new gathering unless it is invalid or its id is taken.
    pub fn create(&self, gathering: &Gathering) -> RepoResult<()> {
        let _guard = self.write_lock.lock();
        self.create_locked(gathering)
            .inspect_err(|err| log_storage_failure("gathering_create", err))
    }

    /// Replaces scalar fields of a stored gathering, keeping its attendees.
    pub fn update(&self, gathering: &Gathering) -> RepoResult<()> {
        let _guard = self.write_lock.lock();
        self.update_locked(gathering)
            .inspect_err(|err| log_storage_failure("gathering_update", err))
    }

    /// Deletes a stored gathering that has no attendees.
    pub fn delete(&self, gathering: &Gathering) -> RepoResult<()> {
        let _guard = self.write_lock.lock();
        self.delete_locked(gathering)
            .inspect_err(|err| log_storage_failure("gathering_delete", err))
    }

    fn create_locked(&self, gathering: &Gathering) -> RepoResult<()> {
        if let Err(failure) = validate_gathering(gathering) {
            self.reject("gathering_create", Rejection::Invalid(failure), Some(gathering));
            return Ok(());
        }

        if let Some(existing) = self.repo.get_by_id(gathering.id)? {
            self.reject(
                "gathering_create",
                Rejection::GatheringAlreadyExists(existing.id),
                Some(&existing),
            );
            return Ok(());
        }

        let stored = self.repo.add(gathering)?;
        info!(
            "event=gathering_create module=service status=ok gathering_id={}",
            stored.id
        );
        self.notifier.added(&stored);
        Ok(())
    }

    fn update_locked(&self, gathering: &Gathering) -> RepoResult<()> {
        if let Err(failure) = validate_gathering(gathering) {
            self.reject("gathering_update", Rejection::Invalid(failure), Some(gathering));
            return Ok(());
        }

        let Some(existing) = self.repo.get_by_id(gathering.id)? else {
            self.reject(
                "gathering_update",
                Rejection::GatheringNotFound(gathering.id),
                Some(gathering),
            );
            return Ok(());
        };

        // Links are owned by the attendee service; only scalars are written here.
        self.repo.update_details(gathering)?;
        let stored = self
            .repo
            .get_by_id(existing.id)?
            .ok_or(RepoError::NotFound(existing.id))?;
        info!(
            "event=gathering_update module=service status=ok gathering_id={} attendees={}",
            stored.id,
            stored.attendee_ids().len()
        );
        self.notifier.updated(&stored);
        Ok(())
    }

    fn delete_locked(&self, gathering: &Gathering) -> RepoResult<()> {
        let Some(existing) = self.repo.get_by_id(gathering.id)? else {
            self.reject(
                "gathering_delete",
                Rejection::GatheringNotFound(gathering.id),
                Some(gathering),
            );
            return Ok(());
        };

        if existing.has_attendees() {
            self.reject(
                "gathering_delete",
                Rejection::GatheringHasAttendees(existing.id),
                Some(&existing),
            );
            return Ok(());
        }

        self.repo.delete(&existing)?;
        info!(
            "event=gathering_delete module=service status=ok gathering_id={}",
            existing.id
        );
        self.notifier.deleted(&existing);
        Ok(())
    }

    fn reject(&self, event: &str, rejection: Rejection, gathering: Option<&Gathering>) {
        warn!(
            "event={event} module=service status=rejected error_code={}",
            rejection.code()
        );
        self.notifier.error(&rejection, gathering);
    }
}

fn validate_gathering(gathering: &Gathering) -> ValidationResult {
    require_non_blank_text(&gathering.name, "name")?;
    require_non_blank_text(&gathering.location, "location")?;
    require_today_or_future_date(gathering.date)
}
