//! Symmetric gathering/attendee association.
//!
//! # Responsibility
//! - Provide the single mutation path for the many-to-many link.
//!
//! # Invariants
//! - `link` and `unlink` always touch both endpoints together.
//! - Both endpoints are persisted before they are linked.

use crate::model::attendee::Attendee;
use crate::model::gathering::Gathering;

/// Links `attendee` and `gathering` on both sides.
///
/// Returns `false` when the edge already existed on both endpoints.
pub fn link(gathering: &mut Gathering, attendee: &mut Attendee) -> bool {
    debug_assert!(gathering.is_persisted() && attendee.is_persisted());
    let added_on_gathering = gathering.attendee_ids.insert(attendee.id);
    let added_on_attendee = attendee.gathering_ids.insert(gathering.id);
    added_on_gathering || added_on_attendee
}

/// Removes the edge between `attendee` and `gathering` on both sides.
///
/// Returns `false` when neither endpoint carried the edge.
pub fn unlink(gathering: &mut Gathering, attendee: &mut Attendee) -> bool {
    let removed_on_gathering = gathering.attendee_ids.remove(&attendee.id);
    let removed_on_attendee = attendee.gathering_ids.remove(&gathering.id);
    removed_on_gathering || removed_on_attendee
}

/// Returns whether either endpoint records the edge.
pub fn is_linked(gathering: &Gathering, attendee: &Attendee) -> bool {
    attendee.gathering_ids.contains(&gathering.id) || gathering.attendee_ids.contains(&attendee.id)
}
