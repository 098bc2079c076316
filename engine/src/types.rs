//! Domain types for the Doorlist registration engine.
//!
//! Value objects and entities shared across the engine: typed identifiers,
//! the registration lifecycle status, the registration record itself, and
//! the catalog/registry summaries the engine consumes from its
//! collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an attendee
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttendeeId(Uuid);

impl AttendeeId {
    /// Creates a new random `AttendeeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `AttendeeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttendeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity Value Object
// ============================================================================

/// Maximum number of active registrations an event admits.
///
/// Always positive; an event with no room is expressed by a full ledger,
/// not a zero capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a `Capacity`, rejecting zero.
    #[must_use]
    pub const fn new(limit: u32) -> Option<Self> {
        if limit == 0 {
            None
        } else {
            Some(Self(limit))
        }
    }

    /// The raw seat limit.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.0
    }

    /// Whether `active_count` leaves room for one more admission.
    #[must_use]
    pub const fn admits(&self, active_count: usize) -> bool {
        active_count < self.0 as usize
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Registration Lifecycle
// ============================================================================

/// Lifecycle status of a registration.
///
/// The set is closed: `Pending → Confirmed → CheckedIn`, with `Cancelled`
/// reachable from any of the three active statuses. A cancelled
/// registration can re-enter `Pending` or `Confirmed` through
/// re-registration; `CheckedIn` never moves backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Submitted but not yet confirmed
    Pending,
    /// Confirmed attendance
    Confirmed,
    /// Arrived at the event
    CheckedIn,
    /// Withdrawn; does not count against capacity
    Cancelled,
}

impl RegistrationStatus {
    /// Active statuses occupy a capacity slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked_in",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

/// Status a submitter may request.
///
/// Check-in and cancellation have dedicated commands; a submission can only
/// land in one of the two pre-arrival statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedStatus {
    /// Hold a slot without committing
    Pending,
    /// Commit to attending
    Confirmed,
}

impl From<RequestedStatus> for RegistrationStatus {
    fn from(requested: RequestedStatus) -> Self {
        match requested {
            RequestedStatus::Pending => Self::Pending,
            RequestedStatus::Confirmed => Self::Confirmed,
        }
    }
}

/// Free-form detail attached to a registration; opaque to the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationMetadata {
    /// Dietary requirements
    pub dietary: Option<String>,
    /// Organizer-facing notes
    pub notes: Option<String>,
}

/// A single attendee's registration for a single event.
///
/// At most one exists per (event, attendee) pair; resubmission updates the
/// existing record in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Event this registration belongs to
    pub event_id: EventId,
    /// Registered attendee
    pub attendee_id: AttendeeId,
    /// Current lifecycle status
    pub status: RegistrationStatus,
    /// When the registration was first created; never rewritten
    pub registered_at: DateTime<Utc>,
    /// When the attendee first checked in; written at most once, kept
    /// through later cancellation
    pub checked_in_at: Option<DateTime<Utc>>,
    /// When the registration was last cancelled; cleared on re-registration
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Submitter-provided detail
    pub metadata: RegistrationMetadata,
}

impl Registration {
    /// Creates a fresh registration in the requested status.
    #[must_use]
    pub const fn new(
        event_id: EventId,
        attendee_id: AttendeeId,
        status: RegistrationStatus,
        registered_at: DateTime<Utc>,
        metadata: RegistrationMetadata,
    ) -> Self {
        Self {
            event_id,
            attendee_id,
            status,
            registered_at,
            checked_in_at: None,
            cancelled_at: None,
            metadata,
        }
    }
}

// ============================================================================
// Collaborator-owned summaries
// ============================================================================

/// Publication status of an event, owned by the Event Catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Not yet open for registration
    Draft,
    /// Accepting registrations and check-ins
    Active,
    /// No longer accepting registrations
    Closed,
}

/// Attendee summary owned by the Attendee Registry.
///
/// The ledger stores only ids; this shape appears in ambiguous-resolution
/// candidate lists and registry lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Attendee identifier
    pub id: AttendeeId,
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rejects_zero() {
        assert!(Capacity::new(0).is_none());
        assert_eq!(Capacity::new(25).unwrap().limit(), 25);
    }

    #[test]
    fn capacity_admits_below_limit() {
        let capacity = Capacity::new(2).unwrap();
        assert!(capacity.admits(0));
        assert!(capacity.admits(1));
        assert!(!capacity.admits(2));
        assert!(!capacity.admits(3));
    }

    #[test]
    fn cancelled_is_not_active() {
        assert!(RegistrationStatus::Pending.is_active());
        assert!(RegistrationStatus::Confirmed.is_active());
        assert!(RegistrationStatus::CheckedIn.is_active());
        assert!(!RegistrationStatus::Cancelled.is_active());
    }

    #[test]
    fn requested_status_maps_onto_lifecycle() {
        assert_eq!(
            RegistrationStatus::from(RequestedStatus::Pending),
            RegistrationStatus::Pending
        );
        assert_eq!(
            RegistrationStatus::from(RequestedStatus::Confirmed),
            RegistrationStatus::Confirmed
        );
    }
}
