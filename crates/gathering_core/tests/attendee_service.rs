use chrono::{Days, Local};
use gathering_core::{
    Attendee, AttendeeId, AttendeeRepository, AttendeeService, Gathering, GatheringId,
    GatheringRepository, InMemoryAttendeeRepository, InMemoryGatheringRepository, Notification,
    RecordingNotifier, Rejection, RepoError, RepoResult, SharedAttendeeRepository,
    SharedGatheringRepository, Storage,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

type TestAttendeeService = AttendeeService<
    SharedAttendeeRepository,
    SharedGatheringRepository,
    RecordingNotifier<Attendee>,
>;

struct Fixture {
    storage: Storage,
    service: TestAttendeeService,
    notifier: RecordingNotifier<Attendee>,
}

impl Fixture {
    fn new(storage: Storage) -> Self {
        let notifier = RecordingNotifier::new();
        let service = AttendeeService::new(
            storage.attendees.clone(),
            storage.gatherings.clone(),
            notifier.clone(),
        );
        Self {
            storage,
            service,
            notifier,
        }
    }

    fn gathering(&self, name: &str) -> Gathering {
        let date = Local::now().date_naive().checked_add_days(Days::new(10));
        self.storage
            .gatherings
            .add(&Gathering::new(name, date, "Florence"))
            .unwrap()
    }

    fn stored_gathering(&self, gathering: &Gathering) -> Gathering {
        self.storage
            .gatherings
            .get_by_id(gathering.id)
            .unwrap()
            .unwrap()
    }

    fn stored_attendee(&self, email: &str) -> Option<Attendee> {
        self.storage.attendees.get_by_email(email).unwrap()
    }

    fn rejection(&self) -> Rejection {
        self.notifier
            .last()
            .and_then(|event| event.rejection().cloned())
            .expect("expected an error notification")
    }

    /// Every edge stored on one side must be stored on the other.
    fn assert_symmetric(&self) {
        let gatherings = self.storage.gatherings.list_all().unwrap();
        let attendees = self.storage.attendees.list_all().unwrap();
        for attendee in &attendees {
            for gathering_id in attendee.gathering_ids() {
                let gathering = gatherings
                    .iter()
                    .find(|gathering| gathering.id == *gathering_id)
                    .expect("linked gathering must be stored");
                assert!(gathering.attendee_ids().contains(&attendee.id));
            }
        }
        for gathering in &gatherings {
            for attendee_id in gathering.attendee_ids() {
                let attendee = attendees
                    .iter()
                    .find(|attendee| attendee.id == *attendee_id)
                    .expect("linked attendee must be stored");
                assert!(attendee.gathering_ids().contains(&gathering.id));
            }
        }
    }
}

fn fixtures() -> Vec<Fixture> {
    vec![
        Fixture::new(Storage::in_memory()),
        Fixture::new(Storage::sqlite_in_memory().unwrap()),
    ]
}

fn john() -> Attendee {
    Attendee::new("John", "john@x.com")
}

#[test]
fn associate_requires_both_selections() {
    let fx = Fixture::new(Storage::in_memory());
    let gathering = fx.gathering("Fair");

    fx.service.associate(None, Some(&gathering)).unwrap();
    assert_eq!(fx.rejection(), Rejection::MissingSelection);
    assert_eq!(fx.rejection().to_string(), "Selected gathering or attendee is null");

    fx.service.associate(Some(&john()), None).unwrap();
    assert_eq!(fx.rejection(), Rejection::MissingSelection);
    assert!(fx.storage.attendees.list_all().unwrap().is_empty());
}

#[test]
fn associate_validates_name_and_email() {
    let fx = Fixture::new(Storage::in_memory());
    let gathering = fx.gathering("Fair");

    fx.service
        .associate(Some(&Attendee::new(" ", "john@x.com")), Some(&gathering))
        .unwrap();
    assert!(matches!(fx.rejection(), Rejection::Invalid(failure) if failure.field == "name"));

    fx.service
        .associate(Some(&Attendee::new("John", "john.x.com")), Some(&gathering))
        .unwrap();
    assert!(matches!(fx.rejection(), Rejection::Invalid(failure) if failure.field == "email"));
    assert!(fx.storage.attendees.list_all().unwrap().is_empty());
}

#[test]
fn associate_with_unknown_gathering_is_not_found() {
    for fx in fixtures() {
        let ghost = Gathering::with_id(Uuid::new_v4(), "Ghost", None, "Nowhere");

        fx.service.associate(Some(&john()), Some(&ghost)).unwrap();
        assert_eq!(fx.rejection(), Rejection::GatheringNotFound(ghost.id));
        assert!(fx.stored_attendee("john@x.com").is_none());
    }
}

#[test]
fn first_association_adds_attendee_linked_on_both_sides() {
    for fx in fixtures() {
        let gathering = fx.gathering("Fair");

        fx.service.associate(Some(&john()), Some(&gathering)).unwrap();

        let added = match fx.notifier.last() {
            Some(Notification::Added(attendee)) => attendee,
            other => panic!("expected added notification, got {other:?}"),
        };
        assert!(added.is_persisted());
        assert_eq!(added.gathering_ids().len(), 1);

        let stored = fx.stored_attendee("john@x.com").unwrap();
        assert_eq!(stored.id, added.id);
        assert!(stored.gathering_ids().contains(&gathering.id));
        assert!(fx.stored_gathering(&gathering).attendee_ids().contains(&stored.id));
        fx.assert_symmetric();
    }
}

#[test]
fn repeated_association_is_a_conflict() {
    for fx in fixtures() {
        let gathering = fx.gathering("Fair");

        fx.service.associate(Some(&john()), Some(&gathering)).unwrap();
        fx.service.associate(Some(&john()), Some(&gathering)).unwrap();

        let rejection = fx.rejection();
        assert_eq!(
            rejection,
            Rejection::AlreadyAssociated {
                email: "john@x.com".to_string(),
                gathering_id: gathering.id,
            }
        );
        assert!(rejection
            .to_string()
            .contains(&format!("associated with gathering id {}", gathering.id)));
        assert_eq!(
            fx.stored_attendee("john@x.com").unwrap().gathering_ids().len(),
            1
        );
        assert_eq!(fx.storage.attendees.list_all().unwrap().len(), 1);
    }
}

#[test]
fn association_to_second_gathering_reuses_identity() {
    for fx in fixtures() {
        let first = fx.gathering("Fair");
        let second = fx.gathering("Expo");

        fx.service.associate(Some(&john()), Some(&first)).unwrap();
        let original_id = fx.stored_attendee("john@x.com").unwrap().id;
        fx.service
            .associate(Some(&Attendee::new("Johnny", "john@x.com")), Some(&second))
            .unwrap();

        let updated = match fx.notifier.last() {
            Some(Notification::Updated(attendee)) => attendee,
            other => panic!("expected updated notification, got {other:?}"),
        };
        assert_eq!(updated.id, original_id);
        assert_eq!(updated.name, "John");
        assert_eq!(updated.gathering_ids().len(), 2);
        assert_eq!(fx.storage.attendees.list_all().unwrap().len(), 1);
        fx.assert_symmetric();
    }
}

#[test]
fn update_requires_attendee_and_known_email() {
    let fx = Fixture::new(Storage::in_memory());

    fx.service.update(None).unwrap();
    assert_eq!(fx.rejection(), Rejection::MissingAttendee);

    fx.service.update(Some(&john())).unwrap();
    assert_eq!(
        fx.rejection(),
        Rejection::AttendeeNotFound("john@x.com".to_string())
    );
    assert_eq!(
        fx.rejection().to_string(),
        "Attendee doesn't exist with email john@x.com"
    );
}

#[test]
fn update_never_alters_associations() {
    for fx in fixtures() {
        let first = fx.gathering("Fair");
        let second = fx.gathering("Expo");
        fx.service.associate(Some(&john()), Some(&first)).unwrap();
        fx.service.associate(Some(&john()), Some(&second)).unwrap();
        let before = fx.stored_attendee("john@x.com").unwrap();

        fx.service
            .update(Some(&Attendee::new("John Smith", "john@x.com")))
            .unwrap();

        assert!(matches!(fx.notifier.last(), Some(Notification::Updated(_))));
        let after = fx.stored_attendee("john@x.com").unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, "John Smith");
        assert_eq!(after.gathering_ids(), before.gathering_ids());
        fx.assert_symmetric();
    }
}

#[test]
fn delete_requires_both_selections() {
    let fx = Fixture::new(Storage::in_memory());
    let gathering = fx.gathering("Fair");

    fx.service.delete(None, Some(&gathering)).unwrap();
    assert_eq!(fx.rejection(), Rejection::MissingSelection);
    fx.service.delete(Some(&john()), None).unwrap();
    assert_eq!(fx.rejection(), Rejection::MissingSelection);
}

#[test]
fn delete_checks_gathering_before_attendee() {
    let fx = Fixture::new(Storage::in_memory());
    let ghost = Gathering::with_id(Uuid::new_v4(), "Ghost", None, "Nowhere");

    fx.service
        .delete(Some(&Attendee::new("Nobody", "nobody@x.com")), Some(&ghost))
        .unwrap();
    assert_eq!(fx.rejection(), Rejection::GatheringNotFound(ghost.id));

    let gathering = fx.gathering("Fair");
    fx.service
        .delete(Some(&Attendee::new("Nobody", "nobody@x.com")), Some(&gathering))
        .unwrap();
    assert_eq!(
        fx.rejection(),
        Rejection::AttendeeNotFound("nobody@x.com".to_string())
    );
}

#[test]
fn delete_of_unlinked_pair_is_a_conflict() {
    for fx in fixtures() {
        let first = fx.gathering("Fair");
        let second = fx.gathering("Expo");
        fx.service.associate(Some(&john()), Some(&first)).unwrap();

        fx.service.delete(Some(&john()), Some(&second)).unwrap();

        assert_eq!(
            fx.rejection(),
            Rejection::NotAssociated {
                email: "john@x.com".to_string(),
                gathering_id: second.id,
            }
        );
        let stored = fx.stored_attendee("john@x.com").unwrap();
        assert_eq!(stored.gathering_ids().len(), 1);
        assert!(stored.gathering_ids().contains(&first.id));
    }
}

#[test]
fn delete_of_one_link_keeps_attendee_with_remaining_links() {
    for fx in fixtures() {
        let first = fx.gathering("Fair");
        let second = fx.gathering("Expo");
        fx.service.associate(Some(&john()), Some(&first)).unwrap();
        fx.service.associate(Some(&john()), Some(&second)).unwrap();

        fx.service.delete(Some(&john()), Some(&first)).unwrap();

        assert!(matches!(fx.notifier.last(), Some(Notification::Updated(_))));
        let stored = fx.stored_attendee("john@x.com").unwrap();
        assert_eq!(stored.gathering_ids().len(), 1);
        assert!(stored.gathering_ids().contains(&second.id));
        assert!(!fx.stored_gathering(&first).has_attendees());
        fx.assert_symmetric();
    }
}

#[test]
fn delete_of_last_link_removes_attendee() {
    for fx in fixtures() {
        let gathering = fx.gathering("Fair");
        fx.service.associate(Some(&john()), Some(&gathering)).unwrap();

        fx.service.delete(Some(&john()), Some(&gathering)).unwrap();

        match fx.notifier.last() {
            Some(Notification::Deleted(attendee)) => assert!(!attendee.has_gatherings()),
            other => panic!("expected deleted notification, got {other:?}"),
        }
        assert!(fx.stored_attendee("john@x.com").is_none());
        assert!(!fx.stored_gathering(&gathering).has_attendees());
        fx.assert_symmetric();
    }
}

#[test]
fn listings_notify_their_records() {
    let fx = Fixture::new(Storage::in_memory());
    let gathering = fx.gathering("Fair");
    fx.service.associate(Some(&john()), Some(&gathering)).unwrap();

    let attendees = fx.service.list_all().unwrap();
    assert_eq!(fx.notifier.last(), Some(Notification::Listed(attendees)));

    let gatherings = fx.service.list_all_gatherings().unwrap();
    assert_eq!(gatherings.len(), 1);
    assert_eq!(
        fx.notifier.last(),
        Some(Notification::GatheringsListed(gatherings))
    );
}

#[test]
fn each_operation_notifies_exactly_once() {
    let fx = Fixture::new(Storage::in_memory());
    let gathering = fx.gathering("Fair");

    fx.service.associate(Some(&john()), Some(&gathering)).unwrap();
    fx.service.associate(Some(&john()), Some(&gathering)).unwrap();
    fx.service.update(Some(&john())).unwrap();
    fx.service.delete(Some(&john()), Some(&gathering)).unwrap();

    assert_eq!(fx.notifier.len(), 4);
}

#[test]
fn padded_email_does_not_create_a_second_attendee() {
    for fx in fixtures() {
        let first = fx.gathering("Fair");
        let second = fx.gathering("Expo");
        fx.service.associate(Some(&john()), Some(&first)).unwrap();

        fx.service
            .associate(Some(&Attendee::new("John", " john@x.com ")), Some(&second))
            .unwrap();

        assert!(matches!(fx.rejection(), Rejection::Invalid(failure) if failure.field == "email"));
        assert_eq!(fx.storage.attendees.list_all().unwrap().len(), 1);
        assert!(!fx.stored_gathering(&second).has_attendees());
    }
}

fn disk_full() -> RepoError {
    RepoError::InvalidData("disk full".to_string())
}

/// In-memory attendee storage whose `update` can be switched to fail.
#[derive(Default)]
struct FlakyAttendees {
    inner: InMemoryAttendeeRepository,
    fail_updates: AtomicBool,
}

impl AttendeeRepository for FlakyAttendees {
    fn add(&self, attendee: &Attendee) -> RepoResult<Attendee> {
        self.inner.add(attendee)
    }

    fn update(&self, attendee: &Attendee) -> RepoResult<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.update(attendee)
    }

    fn delete(&self, attendee: &Attendee) -> RepoResult<()> {
        self.inner.delete(attendee)
    }

    fn get_by_id(&self, id: AttendeeId) -> RepoResult<Option<Attendee>> {
        self.inner.get_by_id(id)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<Attendee>> {
        self.inner.get_by_email(email)
    }

    fn list_all(&self) -> RepoResult<Vec<Attendee>> {
        self.inner.list_all()
    }
}

/// In-memory gathering storage whose link writes can be switched to fail.
#[derive(Default)]
struct FlakyGatherings {
    inner: InMemoryGatheringRepository,
    fail_link_writes: AtomicBool,
}

impl GatheringRepository for FlakyGatherings {
    fn add(&self, gathering: &Gathering) -> RepoResult<Gathering> {
        self.inner.add(gathering)
    }

    fn update(&self, gathering: &Gathering) -> RepoResult<()> {
        if self.fail_link_writes.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.update(gathering)
    }

    fn update_details(&self, gathering: &Gathering) -> RepoResult<()> {
        self.inner.update_details(gathering)
    }

    fn update_attendees(&self, gathering: &Gathering) -> RepoResult<()> {
        if self.fail_link_writes.load(Ordering::SeqCst) {
            return Err(disk_full());
        }
        self.inner.update_attendees(gathering)
    }

    fn delete(&self, gathering: &Gathering) -> RepoResult<()> {
        self.inner.delete(gathering)
    }

    fn get_by_id(&self, id: GatheringId) -> RepoResult<Option<Gathering>> {
        self.inner.get_by_id(id)
    }

    fn list_all(&self) -> RepoResult<Vec<Gathering>> {
        self.inner.list_all()
    }
}

struct FlakyFixture {
    attendees: Arc<FlakyAttendees>,
    gatherings: Arc<FlakyGatherings>,
    service: AttendeeService<Arc<FlakyAttendees>, Arc<FlakyGatherings>, RecordingNotifier<Attendee>>,
    notifier: RecordingNotifier<Attendee>,
}

impl FlakyFixture {
    fn new() -> Self {
        let attendees = Arc::new(FlakyAttendees::default());
        let gatherings = Arc::new(FlakyGatherings::default());
        let notifier = RecordingNotifier::new();
        let service = AttendeeService::new(
            Arc::clone(&attendees),
            Arc::clone(&gatherings),
            notifier.clone(),
        );
        Self {
            attendees,
            gatherings,
            service,
            notifier,
        }
    }

    fn gathering(&self, name: &str) -> Gathering {
        let date = Local::now().date_naive().checked_add_days(Days::new(10));
        self.gatherings
            .add(&Gathering::new(name, date, "Florence"))
            .unwrap()
    }

    fn stored_gathering(&self, gathering: &Gathering) -> Gathering {
        self.gatherings.get_by_id(gathering.id).unwrap().unwrap()
    }
}

#[test]
fn failed_gathering_write_discards_new_attendee() {
    let fx = FlakyFixture::new();
    let gathering = fx.gathering("Fair");
    fx.gatherings.fail_link_writes.store(true, Ordering::SeqCst);

    let err = fx
        .service
        .associate(Some(&john()), Some(&gathering))
        .unwrap_err();

    assert!(matches!(err, RepoError::InvalidData(_)));
    assert!(fx.notifier.is_empty());
    assert!(fx.attendees.inner.is_empty());
    assert!(!fx.stored_gathering(&gathering).has_attendees());
}

#[test]
fn failed_attendee_write_discards_new_attendee() {
    let fx = FlakyFixture::new();
    let gathering = fx.gathering("Fair");
    fx.attendees.fail_updates.store(true, Ordering::SeqCst);

    assert!(fx.service.associate(Some(&john()), Some(&gathering)).is_err());

    assert!(fx.notifier.is_empty());
    assert!(fx.attendees.inner.is_empty());
    assert!(!fx.stored_gathering(&gathering).has_attendees());
}

#[test]
fn failed_second_association_restores_existing_links() {
    let fx = FlakyFixture::new();
    let first = fx.gathering("Fair");
    let second = fx.gathering("Expo");
    fx.service.associate(Some(&john()), Some(&first)).unwrap();
    fx.notifier.take();
    fx.gatherings.fail_link_writes.store(true, Ordering::SeqCst);

    assert!(fx.service.associate(Some(&john()), Some(&second)).is_err());

    assert!(fx.notifier.is_empty());
    let stored = fx.attendees.get_by_email("john@x.com").unwrap().unwrap();
    assert_eq!(stored.gathering_ids().len(), 1);
    assert!(stored.gathering_ids().contains(&first.id));
    assert!(!fx.stored_gathering(&second).has_attendees());
}

#[test]
fn failed_update_propagates_without_notification() {
    let fx = FlakyFixture::new();
    let gathering = fx.gathering("Fair");
    fx.service.associate(Some(&john()), Some(&gathering)).unwrap();
    fx.notifier.take();
    fx.attendees.fail_updates.store(true, Ordering::SeqCst);

    let err = fx
        .service
        .update(Some(&Attendee::new("John Smith", "john@x.com")))
        .unwrap_err();

    assert!(matches!(err, RepoError::InvalidData(_)));
    assert!(fx.notifier.is_empty());
    let stored = fx.attendees.get_by_email("john@x.com").unwrap().unwrap();
    assert_eq!(stored.name, "John");
}

#[test]
fn failed_delete_keeps_link_on_both_sides() {
    let fx = FlakyFixture::new();
    let gathering = fx.gathering("Fair");
    fx.service.associate(Some(&john()), Some(&gathering)).unwrap();
    fx.notifier.take();
    fx.gatherings.fail_link_writes.store(true, Ordering::SeqCst);

    assert!(fx.service.delete(Some(&john()), Some(&gathering)).is_err());

    assert!(fx.notifier.is_empty());
    let stored = fx.attendees.get_by_email("john@x.com").unwrap().unwrap();
    assert!(stored.gathering_ids().contains(&gathering.id));
    assert!(fx.stored_gathering(&gathering).attendee_ids().contains(&stored.id));
}
