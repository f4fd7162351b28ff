//! Business-rule outcomes reported to notifiers instead of returned as errors.

use crate::model::gathering::GatheringId;
use crate::validation::ValidationFailure;
use std::fmt::{Display, Formatter};

/// Coarse class of a rejected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionCategory {
    /// Malformed or absent input.
    Validation,
    /// Target identifier or e-mail is not stored.
    NotFound,
    /// Well-formed request that would break an invariant.
    Conflict,
}

/// Reason a service operation stopped without mutating storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(ValidationFailure),
    /// Gathering or attendee argument was absent.
    MissingSelection,
    /// Attendee argument was absent.
    MissingAttendee,
    GatheringAlreadyExists(GatheringId),
    GatheringNotFound(GatheringId),
    GatheringHasAttendees(GatheringId),
    AttendeeNotFound(String),
    AlreadyAssociated {
        email: String,
        gathering_id: GatheringId,
    },
    NotAssociated {
        email: String,
        gathering_id: GatheringId,
    },
}

impl Rejection {
    pub fn category(&self) -> RejectionCategory {
        match self {
            Self::Invalid(_) | Self::MissingSelection | Self::MissingAttendee => {
                RejectionCategory::Validation
            }
            Self::GatheringNotFound(_) | Self::AttendeeNotFound(_) => RejectionCategory::NotFound,
            Self::GatheringAlreadyExists(_)
            | Self::GatheringHasAttendees(_)
            | Self::AlreadyAssociated { .. }
            | Self::NotAssociated { .. } => RejectionCategory::Conflict,
        }
    }

    /// Stable metadata-only code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_input",
            Self::MissingSelection => "missing_selection",
            Self::MissingAttendee => "missing_attendee",
            Self::GatheringAlreadyExists(_) => "gathering_exists",
            Self::GatheringNotFound(_) => "gathering_not_found",
            Self::GatheringHasAttendees(_) => "gathering_has_attendees",
            Self::AttendeeNotFound(_) => "attendee_not_found",
            Self::AlreadyAssociated { .. } => "already_associated",
            Self::NotAssociated { .. } => "not_associated",
        }
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(failure) => write!(f, "{failure}"),
            Self::MissingSelection => write!(f, "Selected gathering or attendee is null"),
            Self::MissingAttendee => write!(f, "Attendee is null"),
            Self::GatheringAlreadyExists(id) => write!(f, "Gathering already exists with id {id}"),
            Self::GatheringNotFound(id) => write!(f, "Gathering doesn't exist with id {id}"),
            Self::GatheringHasAttendees(id) => write!(
                f,
                "Gathering with id {id} cannot be deleted: attendees are associated with it"
            ),
            Self::AttendeeNotFound(email) => write!(f, "Attendee doesn't exist with email {email}"),
            Self::AlreadyAssociated {
                email,
                gathering_id,
            } => write!(
                f,
                "Attendee already exists with email {email} and associated with gathering id {gathering_id}"
            ),
            Self::NotAssociated {
                email,
                gathering_id,
            } => write!(
                f,
                "Attendee with email {email} is not associated with gathering id {gathering_id}"
            ),
        }
    }
}
