//! Registration ledger aggregate.
//!
//! One instance per event. Owns every registration for that event and is
//! the single admission point: capacity checks, uniqueness per attendee,
//! and the lifecycle state machine all live here.
//!
//! # State Machine
//!
//! ```text
//! (absent) → Pending → Confirmed → CheckedIn
//!               ↓          ↓           ↓
//!               └────→ Cancelled ←─────┘
//!                          ↓
//!                  Pending | Confirmed   (re-registration)
//! ```
//!
//! `CheckedIn` never moves backwards. Cancellation frees the capacity slot
//! immediately; re-registration re-checks capacity and keeps the original
//! `registered_at` and any earlier `checked_in_at`.
//!
//! Commands validate and apply the full transition inline; the event
//! variants they emit are broadcast-only notifications for observers and
//! never mutate state, so a late-arriving event can never overwrite a newer
//! transition.

use crate::types::{
    AttendeeId, Capacity, EventId, Registration, RegistrationMetadata, RegistrationStatus,
    RequestedStatus,
};
use chrono::{DateTime, Utc};
use doorlist_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};
use doorlist_macros::Action;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Outcomes
// ============================================================================

/// Why a submission was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The event's active registrations already fill its capacity
    CapacityExceeded {
        /// Capacity that was enforced
        capacity: Capacity,
    },
    /// The requested status is not reachable from the current one
    InvalidTransition {
        /// Status the registration currently holds
        from: RegistrationStatus,
        /// Status the submission asked for
        to: RegistrationStatus,
    },
}

/// Outcome of a `SubmitRegistration` command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// A capacity slot was consumed (new registration or re-registration)
    Admitted(Registration),
    /// An existing active registration was refreshed or upgraded
    Updated(Registration),
    /// Nothing changed; the reason says why
    Rejected(RejectReason),
}

/// Outcome of a `CheckInRegistration` command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckInOutcome {
    /// Transitioned into `CheckedIn`
    Success(Registration),
    /// Was already checked in; `checked_in_at` untouched
    AlreadyCheckedIn(Registration),
    /// Registration is cancelled and cannot check in
    Cancelled(Registration),
    /// No registration exists for this attendee at this event
    NotFound,
}

/// Outcome of a `CancelRegistration` command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelOutcome {
    /// An active registration was cancelled
    Cancelled(Registration),
    /// Already cancelled or never registered; nothing to do
    NoOp,
}

// ============================================================================
// State
// ============================================================================

/// Registration ledger for one event.
///
/// The `last_*` slots hold the typed outcome of the most recent command of
/// each kind; callers read them through `Store::send_and_read` under the
/// same write lock that ran the reducer, so the slot always reflects
/// exactly their dispatch.
#[derive(Clone, Debug)]
pub struct RegistrationState {
    /// Event this ledger belongs to
    pub event_id: EventId,
    /// All registrations, keyed by attendee - at most one per attendee
    pub registrations: HashMap<AttendeeId, Registration>,
    /// Outcome of the most recent submit
    pub last_submit: Option<SubmitOutcome>,
    /// Outcome of the most recent check-in
    pub last_check_in: Option<CheckInOutcome>,
    /// Outcome of the most recent cancel
    pub last_cancel: Option<CancelOutcome>,
}

impl RegistrationState {
    /// Creates an empty ledger for `event_id`.
    #[must_use]
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            registrations: HashMap::new(),
            last_submit: None,
            last_check_in: None,
            last_cancel: None,
        }
    }

    /// Look up an attendee's registration.
    #[must_use]
    pub fn get(&self, attendee_id: &AttendeeId) -> Option<&Registration> {
        self.registrations.get(attendee_id)
    }

    /// Number of registrations occupying a capacity slot.
    #[must_use]
    pub fn count_active(&self) -> usize {
        self.registrations
            .values()
            .filter(|r| r.status.is_active())
            .count()
    }

    /// All registrations ordered by (`registered_at`, `attendee_id`).
    ///
    /// The ordering is stable across calls, which makes it safe to page or
    /// export.
    #[must_use]
    pub fn roster(&self) -> Vec<Registration> {
        let mut rows: Vec<Registration> = self.registrations.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.attendee_id.cmp(&b.attendee_id))
        });
        rows
    }
}

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the registration ledger.
///
/// Commands carry their pre-resolved inputs (capacity comes from the Event
/// Catalog before dispatch) so the reducer never needs to await.
#[derive(Action, Clone, Debug, Serialize, Deserialize)]
pub enum RegistrationAction {
    // Commands
    /// Register or update an attendee for this event
    #[command]
    SubmitRegistration {
        /// Attendee to register
        attendee_id: AttendeeId,
        /// Status the submitter asks for
        requested: RequestedStatus,
        /// Event capacity, resolved from the catalog before dispatch
        capacity: Capacity,
        /// Submitter-provided detail
        metadata: RegistrationMetadata,
    },

    /// Mark an attendee as arrived
    #[command]
    CheckInRegistration {
        /// Attendee to check in
        attendee_id: AttendeeId,
    },

    /// Withdraw an attendee's registration
    #[command]
    CancelRegistration {
        /// Attendee to cancel
        attendee_id: AttendeeId,
    },

    // Events (broadcast-only; state was already transitioned by the command)
    /// A capacity slot was consumed
    #[event]
    RegistrationAdmitted {
        /// Registration after the transition
        registration: Registration,
    },

    /// An active registration was refreshed or upgraded
    #[event]
    RegistrationUpdated {
        /// Registration after the transition
        registration: Registration,
    },

    /// A submission was rejected
    #[event]
    SubmissionRejected {
        /// Attendee whose submission was rejected
        attendee_id: AttendeeId,
        /// Why it was rejected
        reason: RejectReason,
    },

    /// An attendee arrived
    #[event]
    AttendeeCheckedIn {
        /// Registration after the transition
        registration: Registration,
    },

    /// A registration was withdrawn
    #[event]
    RegistrationCancelled {
        /// Registration after the transition
        registration: Registration,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the registration ledger.
#[derive(Clone)]
pub struct RegistrationEnvironment {
    /// Clock for `registered_at` / `checked_in_at` / `cancelled_at` stamps
    pub clock: Arc<dyn Clock>,
}

impl RegistrationEnvironment {
    /// Creates a new `RegistrationEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the registration ledger.
///
/// Every path either applies a complete transition or records a rejection
/// and leaves the ledger untouched; there is no partial write to observe.
#[derive(Clone, Debug)]
pub struct RegistrationReducer;

impl RegistrationReducer {
    /// Creates a new `RegistrationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn submit(
        state: &mut RegistrationState,
        attendee_id: AttendeeId,
        requested: RequestedStatus,
        capacity: Capacity,
        metadata: RegistrationMetadata,
        now: DateTime<Utc>,
    ) -> SmallVec<[Effect<RegistrationAction>; 4]> {
        let target = RegistrationStatus::from(requested);

        let outcome = match state.registrations.get(&attendee_id) {
            // First registration for this attendee
            None => {
                if capacity.admits(state.count_active()) {
                    let registration =
                        Registration::new(state.event_id, attendee_id, target, now, metadata);
                    state
                        .registrations
                        .insert(attendee_id, registration.clone());
                    SubmitOutcome::Admitted(registration)
                } else {
                    SubmitOutcome::Rejected(RejectReason::CapacityExceeded { capacity })
                }
            }

            Some(existing) => match existing.status {
                // Re-registration after cancellation: capacity is re-checked
                // because the slot was freed; registered_at and any earlier
                // checked_in_at survive.
                RegistrationStatus::Cancelled => {
                    if capacity.admits(state.count_active()) {
                        let mut registration = existing.clone();
                        registration.status = target;
                        registration.cancelled_at = None;
                        registration.metadata = metadata;
                        state
                            .registrations
                            .insert(attendee_id, registration.clone());
                        SubmitOutcome::Admitted(registration)
                    } else {
                        SubmitOutcome::Rejected(RejectReason::CapacityExceeded { capacity })
                    }
                }

                // Idempotent resubmission: refresh metadata only
                from if from == target => {
                    let mut registration = existing.clone();
                    registration.metadata = metadata;
                    state
                        .registrations
                        .insert(attendee_id, registration.clone());
                    SubmitOutcome::Updated(registration)
                }

                // Upgrade within active statuses; no capacity re-check, the
                // registration already holds a slot
                RegistrationStatus::Pending if target == RegistrationStatus::Confirmed => {
                    let mut registration = existing.clone();
                    registration.status = target;
                    registration.metadata = metadata;
                    state
                        .registrations
                        .insert(attendee_id, registration.clone());
                    SubmitOutcome::Updated(registration)
                }

                // Downgrades and anything out of CheckedIn are rejected with
                // the record left exactly as it was
                from => SubmitOutcome::Rejected(RejectReason::InvalidTransition {
                    from,
                    to: target,
                }),
            },
        };

        state.last_submit = Some(outcome.clone());

        let event = match outcome {
            SubmitOutcome::Admitted(registration) => {
                RegistrationAction::RegistrationAdmitted { registration }
            }
            SubmitOutcome::Updated(registration) => {
                RegistrationAction::RegistrationUpdated { registration }
            }
            SubmitOutcome::Rejected(reason) => RegistrationAction::SubmissionRejected {
                attendee_id,
                reason,
            },
        };
        smallvec![Effect::Future(Box::pin(async move { Some(event) }))]
    }

    fn check_in(
        state: &mut RegistrationState,
        attendee_id: AttendeeId,
        now: DateTime<Utc>,
    ) -> SmallVec<[Effect<RegistrationAction>; 4]> {
        let Some(existing) = state.registrations.get(&attendee_id) else {
            state.last_check_in = Some(CheckInOutcome::NotFound);
            return SmallVec::new();
        };

        match existing.status {
            RegistrationStatus::Cancelled => {
                state.last_check_in = Some(CheckInOutcome::Cancelled(existing.clone()));
                SmallVec::new()
            }

            // Repeat check-in is acknowledged, never an error, and the
            // original checked_in_at stands
            RegistrationStatus::CheckedIn => {
                state.last_check_in = Some(CheckInOutcome::AlreadyCheckedIn(existing.clone()));
                SmallVec::new()
            }

            RegistrationStatus::Pending | RegistrationStatus::Confirmed => {
                let mut registration = existing.clone();
                registration.status = RegistrationStatus::CheckedIn;
                // Written at most once per lifetime, even across a
                // cancel-and-resubmit cycle
                if registration.checked_in_at.is_none() {
                    registration.checked_in_at = Some(now);
                }
                state
                    .registrations
                    .insert(attendee_id, registration.clone());
                state.last_check_in = Some(CheckInOutcome::Success(registration.clone()));

                let event = RegistrationAction::AttendeeCheckedIn { registration };
                smallvec![Effect::Future(Box::pin(async move { Some(event) }))]
            }
        }
    }

    fn cancel(
        state: &mut RegistrationState,
        attendee_id: AttendeeId,
        now: DateTime<Utc>,
    ) -> SmallVec<[Effect<RegistrationAction>; 4]> {
        let Some(existing) = state.registrations.get(&attendee_id) else {
            state.last_cancel = Some(CancelOutcome::NoOp);
            return SmallVec::new();
        };

        if existing.status == RegistrationStatus::Cancelled {
            state.last_cancel = Some(CancelOutcome::NoOp);
            return SmallVec::new();
        }

        let mut registration = existing.clone();
        registration.status = RegistrationStatus::Cancelled;
        registration.cancelled_at = Some(now);
        // checked_in_at survives cancellation (audit trail)
        state
            .registrations
            .insert(attendee_id, registration.clone());
        state.last_cancel = Some(CancelOutcome::Cancelled(registration.clone()));

        let event = RegistrationAction::RegistrationCancelled { registration };
        smallvec![Effect::Future(Box::pin(async move { Some(event) }))]
    }
}

impl Default for RegistrationReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for RegistrationReducer {
    type State = RegistrationState;
    type Action = RegistrationAction;
    type Environment = RegistrationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RegistrationAction::SubmitRegistration {
                attendee_id,
                requested,
                capacity,
                metadata,
            } => Self::submit(
                state,
                attendee_id,
                requested,
                capacity,
                metadata,
                env.clock.now(),
            ),

            RegistrationAction::CheckInRegistration { attendee_id } => {
                Self::check_in(state, attendee_id, env.clock.now())
            }

            RegistrationAction::CancelRegistration { attendee_id } => {
                Self::cancel(state, attendee_id, env.clock.now())
            }

            // Events arriving through the feedback loop are notifications
            // only; the command that emitted them already transitioned state
            RegistrationAction::RegistrationAdmitted { .. }
            | RegistrationAction::RegistrationUpdated { .. }
            | RegistrationAction::SubmissionRejected { .. }
            | RegistrationAction::AttendeeCheckedIn { .. }
            | RegistrationAction::RegistrationCancelled { .. } => SmallVec::new(),
        }
    }
}
