//! Notification collaborators that observe service outcomes.
//!
//! # Responsibility
//! - Define the callback surfaces services report to.
//! - Provide a headless logging notifier and a recording test double.
//!
//! # Invariants
//! - Services invoke exactly one callback per completed operation.

use crate::model::attendee::Attendee;
use crate::model::gathering::Gathering;
use crate::service::rejection::Rejection;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Observer of gathering service outcomes.
pub trait GatheringNotifier: Send + Sync {
    fn added(&self, gathering: &Gathering);
    fn updated(&self, gathering: &Gathering);
    fn deleted(&self, gathering: &Gathering);
    fn listed(&self, gatherings: &[Gathering]);
    fn error(&self, rejection: &Rejection, gathering: Option<&Gathering>);
}

/// Observer of attendee service outcomes.
pub trait AttendeeNotifier: Send + Sync {
    fn added(&self, attendee: &Attendee);
    fn updated(&self, attendee: &Attendee);
    fn deleted(&self, attendee: &Attendee);
    fn listed(&self, attendees: &[Attendee]);
    fn gatherings_listed(&self, gatherings: &[Gathering]);
    fn error(&self, rejection: &Rejection, attendee: Option<&Attendee>);
}

/// Headless notifier that writes metadata-only log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl GatheringNotifier for LogNotifier {
    fn added(&self, gathering: &Gathering) {
        info!("event=gathering_added module=notify gathering_id={}", gathering.id);
    }

    fn updated(&self, gathering: &Gathering) {
        info!("event=gathering_updated module=notify gathering_id={}", gathering.id);
    }

    fn deleted(&self, gathering: &Gathering) {
        info!("event=gathering_deleted module=notify gathering_id={}", gathering.id);
    }

    fn listed(&self, gatherings: &[Gathering]) {
        info!("event=gatherings_listed module=notify count={}", gatherings.len());
    }

    fn error(&self, rejection: &Rejection, gathering: Option<&Gathering>) {
        warn!(
            "event=gathering_rejected module=notify error_code={} gathering_id={}",
            rejection.code(),
            gathering.map_or_else(|| "none".to_string(), |value| value.id.to_string())
        );
    }
}

impl AttendeeNotifier for LogNotifier {
    fn added(&self, attendee: &Attendee) {
        info!(
            "event=attendee_added module=notify attendee_id={} gatherings={}",
            attendee.id,
            attendee.gathering_ids().len()
        );
    }

    fn updated(&self, attendee: &Attendee) {
        info!(
            "event=attendee_updated module=notify attendee_id={} gatherings={}",
            attendee.id,
            attendee.gathering_ids().len()
        );
    }

    fn deleted(&self, attendee: &Attendee) {
        info!("event=attendee_deleted module=notify attendee_id={}", attendee.id);
    }

    fn listed(&self, attendees: &[Attendee]) {
        info!("event=attendees_listed module=notify count={}", attendees.len());
    }

    fn gatherings_listed(&self, gatherings: &[Gathering]) {
        info!("event=gatherings_listed module=notify count={}", gatherings.len());
    }

    fn error(&self, rejection: &Rejection, attendee: Option<&Attendee>) {
        warn!(
            "event=attendee_rejected module=notify error_code={} attendee_id={}",
            rejection.code(),
            attendee.map_or_else(|| "none".to_string(), |value| value.id.to_string())
        );
    }
}

/// One observed service outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<T> {
    Added(T),
    Updated(T),
    Deleted(T),
    Listed(Vec<T>),
    GatheringsListed(Vec<Gathering>),
    Error {
        rejection: Rejection,
        record: Option<T>,
    },
}

impl<T> Notification<T> {
    /// Rejection carried by an `Error` notification.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Error { rejection, .. } => Some(rejection),
            _ => None,
        }
    }
}

/// Test double that records every notification; clones share one log.
#[derive(Debug)]
pub struct RecordingNotifier<T> {
    events: Arc<Mutex<Vec<Notification<T>>>>,
}

impl<T> Clone for RecordingNotifier<T> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<T> Default for RecordingNotifier<T> {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> RecordingNotifier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded notifications in arrival order.
    pub fn events(&self) -> Vec<Notification<T>> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<Notification<T>> {
        self.events.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drains recorded notifications.
    pub fn take(&self) -> Vec<Notification<T>> {
        std::mem::take(&mut *self.events.lock())
    }

    fn push(&self, notification: Notification<T>) {
        self.events.lock().push(notification);
    }
}

impl GatheringNotifier for RecordingNotifier<Gathering> {
    fn added(&self, gathering: &Gathering) {
        self.push(Notification::Added(gathering.clone()));
    }

    fn updated(&self, gathering: &Gathering) {
        self.push(Notification::Updated(gathering.clone()));
    }

    fn deleted(&self, gathering: &Gathering) {
        self.push(Notification::Deleted(gathering.clone()));
    }

    fn listed(&self, gatherings: &[Gathering]) {
        self.push(Notification::Listed(gatherings.to_vec()));
    }

    fn error(&self, rejection: &Rejection, gathering: Option<&Gathering>) {
        self.push(Notification::Error {
            rejection: rejection.clone(),
            record: gathering.cloned(),
        });
    }
}

impl AttendeeNotifier for RecordingNotifier<Attendee> {
    fn added(&self, attendee: &Attendee) {
        self.push(Notification::Added(attendee.clone()));
    }

    fn updated(&self, attendee: &Attendee) {
        self.push(Notification::Updated(attendee.clone()));
    }

    fn deleted(&self, attendee: &Attendee) {
        self.push(Notification::Deleted(attendee.clone()));
    }

    fn listed(&self, attendees: &[Attendee]) {
        self.push(Notification::Listed(attendees.to_vec()));
    }

    fn gatherings_listed(&self, gatherings: &[Gathering]) {
        self.push(Notification::GatheringsListed(gatherings.to_vec()));
    }

    fn error(&self, rejection: &Rejection, attendee: Option<&Attendee>) {
        self.push(Notification::Error {
            rejection: rejection.clone(),
            record: attendee.cloned(),
        });
    }
}
