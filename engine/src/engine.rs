//! The registration engine facade.
//!
//! [`RegistrationEngine`] is the protocol-agnostic surface the HTTP binding
//! (and any other binding) calls into. It resolves collaborator data
//! first, then dispatches a synchronous command to the per-event ledger
//! store; the store's write lock is the per-event serialization point and
//! is never held across an await.

use crate::aggregates::{
    CancelOutcome, CheckInOutcome, RegistrationAction, RegistrationEnvironment,
    RegistrationReducer, RegistrationState, SubmitOutcome,
};
use crate::collaborators::{
    CollaboratorError, Resolution, SharedAttendeeRegistry, SharedEventCatalog,
};
use crate::reporting::AttendanceReport;
use crate::types::{
    Attendee, AttendeeId, EventId, EventStatus, Registration, RegistrationMetadata,
    RequestedStatus,
};
use doorlist_core::environment::Clock;
use doorlist_runtime::{Store, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ledger store for one event.
type LedgerStore =
    Store<RegistrationState, RegistrationAction, RegistrationEnvironment, RegistrationReducer>;

/// Infrastructure failures of engine operations.
///
/// Domain outcomes (rejections, ambiguity, idempotent no-ops) are *values*
/// in [`SubmitOutcome`], [`CheckInResult`] and [`CancelOutcome`]; this enum
/// only carries the cases where the operation itself could not run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The event is not in the catalog
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The attendee is not in the registry
    #[error("attendee {0} not found")]
    AttendeeNotFound(AttendeeId),

    /// The event exists but is not accepting registrations
    #[error("event {event_id} is not open for registration (status: {status:?})")]
    EventNotOpen {
        /// Event that was targeted
        event_id: EventId,
        /// Its current catalog status
        status: EventStatus,
    },

    /// A collaborator could not be reached
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// The ledger store rejected the dispatch
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A command completed without recording its outcome
    #[error("command completed without recording an outcome")]
    MissingOutcome,
}

/// Result of a check-in attempt, after identifier resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckInResult {
    /// Transitioned into `CheckedIn`
    Success(Registration),
    /// Identifier resolved to nobody, or the attendee is not registered
    NotFound,
    /// Identifier matched several attendees; candidates for the operator
    Ambiguous(Vec<Attendee>),
    /// Was already checked in; timestamp untouched
    AlreadyCheckedIn(Registration),
    /// Registration is cancelled
    Cancelled(Registration),
}

/// Registration and check-in engine.
///
/// Holds one ledger store per event, created lazily. Operations on the
/// same event serialize at that event's store; operations on different
/// events never contend.
pub struct RegistrationEngine {
    catalog: SharedEventCatalog,
    registry: SharedAttendeeRegistry,
    clock: Arc<dyn Clock>,
    stores: RwLock<HashMap<EventId, Arc<LedgerStore>>>,
}

impl RegistrationEngine {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub fn new(
        catalog: SharedEventCatalog,
        registry: SharedAttendeeRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            registry,
            clock,
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Get or lazily create the ledger store for an event.
    async fn store_for(&self, event_id: EventId) -> Arc<LedgerStore> {
        if let Some(store) = self.stores.read().await.get(&event_id) {
            return Arc::clone(store);
        }

        let mut stores = self.stores.write().await;
        // Another caller may have created it between the two locks
        Arc::clone(stores.entry(event_id).or_insert_with(|| {
            tracing::debug!(%event_id, "creating ledger store");
            Arc::new(Store::new(
                RegistrationState::new(event_id),
                RegistrationReducer::new(),
                RegistrationEnvironment::new(Arc::clone(&self.clock)),
            ))
        }))
    }

    /// Register (or update the registration of) an attendee for an event.
    ///
    /// Rejections are [`SubmitOutcome::Rejected`] values; only unknown
    /// events/attendees, closed events and infrastructure failures are
    /// errors.
    ///
    /// # Errors
    ///
    /// [`EngineError::EventNotFound`] / [`EngineError::AttendeeNotFound`]
    /// for unknown ids, [`EngineError::EventNotOpen`] unless the event is
    /// `Active`, plus collaborator/store failures.
    #[tracing::instrument(skip(self, metadata), fields(%event_id, %attendee_id))]
    pub async fn submit(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
        requested: RequestedStatus,
        metadata: RegistrationMetadata,
    ) -> Result<SubmitOutcome, EngineError> {
        let status = self
            .catalog
            .get_status(event_id)
            .await?
            .ok_or(EngineError::EventNotFound(event_id))?;
        if status != EventStatus::Active {
            return Err(EngineError::EventNotOpen { event_id, status });
        }

        let capacity = self
            .catalog
            .get_capacity(event_id)
            .await?
            .ok_or(EngineError::EventNotFound(event_id))?;

        if !self.registry.contains(attendee_id).await? {
            return Err(EngineError::AttendeeNotFound(attendee_id));
        }

        let store = self.store_for(event_id).await;
        let outcome = store
            .send_and_read(
                RegistrationAction::SubmitRegistration {
                    attendee_id,
                    requested,
                    capacity,
                    metadata,
                },
                |state| state.last_submit.clone(),
            )
            .await?
            .ok_or(EngineError::MissingOutcome)?;

        tracing::info!(outcome = ?outcome_label(&outcome), "submission processed");
        Ok(outcome)
    }

    /// Cancel an attendee's registration.
    ///
    /// Idempotent: cancelling an absent or already-cancelled registration
    /// is a [`CancelOutcome::NoOp`], never an error. The catalog is not
    /// consulted, so cancellation works even for events the catalog no
    /// longer knows.
    ///
    /// # Errors
    ///
    /// Only store failures (shutdown in progress).
    #[tracing::instrument(skip(self), fields(%event_id, %attendee_id))]
    pub async fn cancel(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<CancelOutcome, EngineError> {
        let store = self.store_for(event_id).await;
        let outcome = store
            .send_and_read(
                RegistrationAction::CancelRegistration { attendee_id },
                |state| state.last_cancel.clone(),
            )
            .await?
            .ok_or(EngineError::MissingOutcome)?;

        tracing::info!(
            cancelled = matches!(outcome, CancelOutcome::Cancelled(_)),
            "cancellation processed"
        );
        Ok(outcome)
    }

    /// Check in whoever the free-form identifier resolves to.
    ///
    /// Resolution (id, then email, then name substring) happens in the
    /// registry before the ledger lock is taken. Ambiguity is surfaced to
    /// the operator, never resolved by picking arbitrarily.
    ///
    /// # Errors
    ///
    /// [`EngineError::EventNotFound`] for unknown events, plus
    /// collaborator/store failures.
    #[tracing::instrument(skip(self), fields(%event_id, identifier))]
    pub async fn check_in(
        &self,
        event_id: EventId,
        identifier: &str,
    ) -> Result<CheckInResult, EngineError> {
        // Check-in stays possible after registration closes (front desk
        // operates during the event), so only existence is required here.
        self.catalog
            .get_status(event_id)
            .await?
            .ok_or(EngineError::EventNotFound(event_id))?;

        let attendee_id = match self.registry.resolve(identifier).await? {
            Resolution::Resolved(id) => id,
            Resolution::NotFound => return Ok(CheckInResult::NotFound),
            Resolution::Ambiguous(candidates) => {
                tracing::info!(candidates = candidates.len(), "identifier is ambiguous");
                return Ok(CheckInResult::Ambiguous(candidates));
            }
        };

        self.check_in_by_id(event_id, attendee_id).await
    }

    /// Check in a batch of already-resolved attendees, best-effort.
    ///
    /// Each id is processed independently under the single-check-in rule;
    /// one failed entry never aborts or rolls back the others. Results come
    /// back in input order.
    ///
    /// # Errors
    ///
    /// [`EngineError::EventNotFound`] for unknown events, plus
    /// collaborator/store failures.
    #[tracing::instrument(skip(self, attendee_ids), fields(%event_id, batch = attendee_ids.len()))]
    pub async fn check_in_many(
        &self,
        event_id: EventId,
        attendee_ids: Vec<AttendeeId>,
    ) -> Result<Vec<(AttendeeId, CheckInResult)>, EngineError> {
        self.catalog
            .get_status(event_id)
            .await?
            .ok_or(EngineError::EventNotFound(event_id))?;

        let mut results = Vec::with_capacity(attendee_ids.len());
        for attendee_id in attendee_ids {
            let result = self.check_in_by_id(event_id, attendee_id).await?;
            results.push((attendee_id, result));
        }
        Ok(results)
    }

    /// Single check-in against the ledger, identifier already resolved.
    async fn check_in_by_id(
        &self,
        event_id: EventId,
        attendee_id: AttendeeId,
    ) -> Result<CheckInResult, EngineError> {
        let store = self.store_for(event_id).await;
        let outcome = store
            .send_and_read(
                RegistrationAction::CheckInRegistration { attendee_id },
                |state| state.last_check_in.clone(),
            )
            .await?
            .ok_or(EngineError::MissingOutcome)?;

        Ok(match outcome {
            CheckInOutcome::Success(registration) => CheckInResult::Success(registration),
            CheckInOutcome::AlreadyCheckedIn(registration) => {
                CheckInResult::AlreadyCheckedIn(registration)
            }
            CheckInOutcome::Cancelled(registration) => CheckInResult::Cancelled(registration),
            CheckInOutcome::NotFound => CheckInResult::NotFound,
        })
    }

    /// All registrations for an event, ordered by registration time.
    ///
    /// A consistent snapshot; does not block writers longer than the copy.
    pub async fn list_by_event(&self, event_id: EventId) -> Vec<Registration> {
        match self.stores.read().await.get(&event_id) {
            Some(store) => store.state(RegistrationState::roster).await,
            None => Vec::new(),
        }
    }

    /// Number of registrations currently occupying a capacity slot.
    pub async fn count_active(&self, event_id: EventId) -> usize {
        match self.stores.read().await.get(&event_id) {
            Some(store) => store.state(RegistrationState::count_active).await,
            None => 0,
        }
    }

    /// Attendance aggregates from one consistent ledger snapshot.
    pub async fn report(&self, event_id: EventId) -> AttendanceReport {
        match self.stores.read().await.get(&event_id) {
            Some(store) => {
                store
                    .state(|state| AttendanceReport::from_registrations(state.registrations.values()))
                    .await
            }
            None => AttendanceReport::default(),
        }
    }

    /// Gracefully shut down every ledger store.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError::ShutdownTimeout`] encountered;
    /// remaining stores are still asked to shut down.
    pub async fn shutdown(&self, timeout: std::time::Duration) -> Result<(), EngineError> {
        // Clone the handles out so the map lock is not held across the
        // drain awaits; a slow drain must not block new ledger creation.
        let stores: Vec<(EventId, Arc<LedgerStore>)> = self
            .stores
            .read()
            .await
            .iter()
            .map(|(event_id, store)| (*event_id, Arc::clone(store)))
            .collect();

        let mut first_error = None;
        for (event_id, store) in stores {
            if let Err(error) = store.shutdown(timeout).await {
                tracing::error!(%event_id, %error, "ledger store failed to drain");
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

/// Short label for structured logs.
const fn outcome_label(outcome: &SubmitOutcome) -> &'static str {
    match outcome {
        SubmitOutcome::Admitted(_) => "admitted",
        SubmitOutcome::Updated(_) => "updated",
        SubmitOutcome::Rejected(_) => "rejected",
    }
}
