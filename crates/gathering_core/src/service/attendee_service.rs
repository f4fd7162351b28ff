//! Attendee use-case service.
//!
//! # Responsibility
//! - Link attendees to gatherings, reusing stored identities by e-mail.
//! - Unlink attendees and remove those left without any gathering.
//!
//! # Invariants
//! - Both association endpoints are persisted by the same operation.
//! - An attendee whose last link is removed is deleted from storage.
//! - A link change that fails part-way is rolled back on the attendee side.
//! - `update` never alters the stored association set.

use crate::model::association::{is_linked, link, unlink};
use crate::model::attendee::{Attendee, AttendeeId};
use crate::model::gathering::Gathering;
use crate::notify::AttendeeNotifier;
use crate::repo::attendee_repo::AttendeeRepository;
use crate::repo::gathering_repo::GatheringRepository;
use crate::repo::RepoResult;
use crate::service::log_storage_failure;
use crate::service::rejection::Rejection;
use crate::validation::{require_non_blank_text, require_valid_email, ValidationResult};
use log::{error, info, warn};
use parking_lot::Mutex;

/// Attendee service facade over both repositories and a notifier.
pub struct AttendeeService<A, G, N>
where
    A: AttendeeRepository,
    G: GatheringRepository,
    N: AttendeeNotifier,
{
    attendees: A,
    gatherings: G,
    notifier: N,
    write_lock: Mutex<()>,
}

impl<A, G, N> AttendeeService<A, G, N>
where
    A: AttendeeRepository,
    G: GatheringRepository,
    N: AttendeeNotifier,
{
    pub fn new(attendees: A, gatherings: G, notifier: N) -> Self {
        Self {
            attendees,
            gatherings,
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn list_all(&self) -> RepoResult<Vec<Attendee>> {
        let attendees = self
            .attendees
            .list_all()
            .inspect_err(|err| log_storage_failure("attendee_list", err))?;
        self.notifier.listed(&attendees);
        Ok(attendees)
    }

    pub fn list_all_gatherings(&self) -> RepoResult<Vec<Gathering>> {
        let gatherings = self
            .gatherings
            .list_all()
            .inspect_err(|err| log_storage_failure("attendee_list_gatherings", err))?;
        self.notifier.gatherings_listed(&gatherings);
        Ok(gatherings)
    }

    /// Links `attendee` to `gathering`, creating the attendee on first use.
    ///
    /// An attendee already stored under the same e-mail keeps its identity and
    /// gains the new link; the outcome is then `updated` rather than `added`.
    pub fn associate(
        &self,
        attendee: Option<&Attendee>,
        gathering: Option<&Gathering>,
    ) -> RepoResult<()> {
        let _guard = self.write_lock.lock();
        self.associate_locked(attendee, gathering)
            .inspect_err(|err| log_storage_failure("attendee_associate", err))
    }

    /// Replaces the name of the attendee stored under the same e-mail.
    pub fn update(&self, attendee: Option<&Attendee>) -> RepoResult<()> {
        let _guard = self.write_lock.lock();
        self.update_locked(attendee)
            .inspect_err(|err| log_storage_failure("attendee_update", err))
    }

    /// Unlinks `attendee` from `gathering`, deleting it after its last link.
    pub fn delete(
        &self,
        attendee: Option<&Attendee>,
        gathering: Option<&Gathering>,
    ) -> RepoResult<()> {
        let _guard = self.write_lock.lock();
        self.delete_locked(attendee, gathering)
            .inspect_err(|err| log_storage_failure("attendee_delete", err))
    }

    fn associate_locked(
        &self,
        attendee: Option<&Attendee>,
        gathering: Option<&Gathering>,
    ) -> RepoResult<()> {
        let (Some(attendee), Some(gathering)) = (attendee, gathering) else {
            self.reject("attendee_associate", Rejection::MissingSelection, attendee);
            return Ok(());
        };

        if let Err(failure) = validate_attendee(attendee) {
            self.reject("attendee_associate", Rejection::Invalid(failure), Some(attendee));
            return Ok(());
        }

        let Some(mut target) = self.gatherings.get_by_id(gathering.id)? else {
            self.reject(
                "attendee_associate",
                Rejection::GatheringNotFound(gathering.id),
                Some(attendee),
            );
            return Ok(());
        };

        match self.attendees.get_by_email(&attendee.email)? {
            None => {
                let mut created = self.attendees.add(&attendee.detached())?;
                link(&mut target, &mut created);
                if let Err(err) = self.persist_links(&target, &created) {
                    self.roll_back(
                        "attendee_associate",
                        created.id,
                        self.attendees.delete(&created),
                    );
                    return Err(err);
                }
                info!(
                    "event=attendee_associate module=service status=ok outcome=added attendee_id={} gathering_id={}",
                    created.id, target.id
                );
                self.notifier.added(&created);
            }
            Some(existing) if is_linked(&target, &existing) => {
                self.reject(
                    "attendee_associate",
                    Rejection::AlreadyAssociated {
                        email: existing.email.clone(),
                        gathering_id: target.id,
                    },
                    Some(&existing),
                );
            }
            Some(mut existing) => {
                link(&mut target, &mut existing);
                if let Err(err) = self.persist_links(&target, &existing) {
                    unlink(&mut target, &mut existing);
                    self.roll_back(
                        "attendee_associate",
                        existing.id,
                        self.attendees.update(&existing),
                    );
                    return Err(err);
                }
                info!(
                    "event=attendee_associate module=service status=ok outcome=updated attendee_id={} gathering_id={}",
                    existing.id, target.id
                );
                self.notifier.updated(&existing);
            }
        }
        Ok(())
    }

    fn update_locked(&self, attendee: Option<&Attendee>) -> RepoResult<()> {
        let Some(attendee) = attendee else {
            self.reject("attendee_update", Rejection::MissingAttendee, None);
            return Ok(());
        };

        if let Err(failure) = validate_attendee(attendee) {
            self.reject("attendee_update", Rejection::Invalid(failure), Some(attendee));
            return Ok(());
        }

        let Some(existing) = self.attendees.get_by_email(&attendee.email)? else {
            self.reject(
                "attendee_update",
                Rejection::AttendeeNotFound(attendee.email.clone()),
                Some(attendee),
            );
            return Ok(());
        };

        if !existing.has_gatherings() {
            warn!(
                "event=attendee_update module=service status=warn reason=attendee_without_gatherings attendee_id={}",
                existing.id
            );
        }

        let mut incoming = attendee.clone();
        incoming.carry_identity_from(&existing);
        self.attendees.update(&incoming)?;
        info!(
            "event=attendee_update module=service status=ok attendee_id={}",
            incoming.id
        );
        self.notifier.updated(&incoming);
        Ok(())
    }

    fn delete_locked(
        &self,
        attendee: Option<&Attendee>,
        gathering: Option<&Gathering>,
    ) -> RepoResult<()> {
        let (Some(attendee), Some(gathering)) = (attendee, gathering) else {
            self.reject("attendee_delete", Rejection::MissingSelection, attendee);
            return Ok(());
        };

        // Gathering lookup precedes the e-mail lookup.
        let Some(mut target) = self.gatherings.get_by_id(gathering.id)? else {
            self.reject(
                "attendee_delete",
                Rejection::GatheringNotFound(gathering.id),
                Some(attendee),
            );
            return Ok(());
        };

        let Some(mut existing) = self.attendees.get_by_email(&attendee.email)? else {
            self.reject(
                "attendee_delete",
                Rejection::AttendeeNotFound(attendee.email.clone()),
                Some(attendee),
            );
            return Ok(());
        };

        if !is_linked(&target, &existing) {
            self.reject(
                "attendee_delete",
                Rejection::NotAssociated {
                    email: existing.email.clone(),
                    gathering_id: target.id,
                },
                Some(&existing),
            );
            return Ok(());
        }

        unlink(&mut target, &mut existing);
        if let Err(err) = self.persist_links(&target, &existing) {
            link(&mut target, &mut existing);
            self.roll_back(
                "attendee_delete",
                existing.id,
                self.attendees.update(&existing),
            );
            return Err(err);
        }

        if existing.has_gatherings() {
            info!(
                "event=attendee_delete module=service status=ok outcome=updated attendee_id={} gathering_id={}",
                existing.id, target.id
            );
            self.notifier.updated(&existing);
        } else {
            self.attendees.delete(&existing)?;
            info!(
                "event=attendee_delete module=service status=ok outcome=deleted attendee_id={} gathering_id={}",
                existing.id, target.id
            );
            self.notifier.deleted(&existing);
        }
        Ok(())
    }

    /// Writes the attendee side, then the gathering's attendee set.
    ///
    /// Each write is atomic, so on failure only the attendee side can be ahead
    /// of the gathering; callers restore it with `roll_back`.
    fn persist_links(&self, gathering: &Gathering, attendee: &Attendee) -> RepoResult<()> {
        self.attendees.update(attendee)?;
        self.gatherings.update_attendees(gathering)
    }

    fn roll_back(&self, event: &str, attendee_id: AttendeeId, undo: RepoResult<()>) {
        match undo {
            Ok(()) => warn!(
                "event={event} module=service status=rolled_back attendee_id={attendee_id}"
            ),
            Err(err) => error!(
                "event={event} module=service status=error error_code=rollback_failed attendee_id={attendee_id} cause={}",
                err.code()
            ),
        }
    }

    fn reject(&self, event: &str, rejection: Rejection, attendee: Option<&Attendee>) {
        warn!(
            "event={event} module=service status=rejected error_code={}",
            rejection.code()
        );
        self.notifier.error(&rejection, attendee);
    }
}

fn validate_attendee(attendee: &Attendee) -> ValidationResult {
    require_non_blank_text(&attendee.name, "name")?;
    require_valid_email(&attendee.email)
}
