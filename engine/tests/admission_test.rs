//! Engine-level admission tests: capacity, uniqueness, lifecycle,
//! re-registration after cancellation.

#![allow(clippy::unwrap_used, clippy::panic)]

use doorlist_core::environment::SystemClock;
use doorlist_engine::aggregates::{CancelOutcome, RejectReason, SubmitOutcome};
use doorlist_engine::collaborators::{InMemoryAttendeeRegistry, InMemoryEventCatalog};
use doorlist_engine::engine::{EngineError, RegistrationEngine};
use doorlist_engine::types::{
    Attendee, Capacity, EventId, EventStatus, RegistrationMetadata, RegistrationStatus,
    RequestedStatus,
};
use std::sync::Arc;

struct Fixture {
    engine: RegistrationEngine,
    catalog: Arc<InMemoryEventCatalog>,
    registry: Arc<InMemoryAttendeeRegistry>,
}

fn fixture() -> Fixture {
    let catalog = Arc::new(InMemoryEventCatalog::new());
    let registry = Arc::new(InMemoryAttendeeRegistry::new());
    let engine = RegistrationEngine::new(
        catalog.clone(),
        registry.clone(),
        Arc::new(SystemClock),
    );
    Fixture {
        engine,
        catalog,
        registry,
    }
}

impl Fixture {
    async fn active_event(&self, capacity: u32) -> EventId {
        self.catalog
            .add(
                "Test Event".to_string(),
                Capacity::new(capacity).unwrap(),
                EventStatus::Active,
            )
            .await
    }

    async fn attendee(&self, name: &str) -> Attendee {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        self.registry.add(name.to_string(), email).await
    }

    async fn submit(
        &self,
        event_id: EventId,
        attendee: &Attendee,
        requested: RequestedStatus,
    ) -> SubmitOutcome {
        self.engine
            .submit(
                event_id,
                attendee.id,
                requested,
                RegistrationMetadata::default(),
            )
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn admits_up_to_capacity_then_rejects() {
    let fx = fixture();
    let event_id = fx.active_event(2).await;

    let first = fx.attendee("Ada Lovelace").await;
    let second = fx.attendee("Grace Hopper").await;
    let third = fx.attendee("Katherine Johnson").await;

    assert!(matches!(
        fx.submit(event_id, &first, RequestedStatus::Confirmed).await,
        SubmitOutcome::Admitted(_)
    ));
    assert!(matches!(
        fx.submit(event_id, &second, RequestedStatus::Confirmed).await,
        SubmitOutcome::Admitted(_)
    ));
    assert!(matches!(
        fx.submit(event_id, &third, RequestedStatus::Confirmed).await,
        SubmitOutcome::Rejected(RejectReason::CapacityExceeded { .. })
    ));

    assert_eq!(fx.engine.count_active(event_id).await, 2);
    // The rejected attendee left no trace in the ledger
    let roster = fx.engine.list_by_event(event_id).await;
    assert!(roster.iter().all(|r| r.attendee_id != third.id));
}

#[tokio::test]
async fn resubmission_never_duplicates() {
    let fx = fixture();
    let event_id = fx.active_event(5).await;
    let attendee = fx.attendee("Ada Lovelace").await;

    assert!(matches!(
        fx.submit(event_id, &attendee, RequestedStatus::Pending).await,
        SubmitOutcome::Admitted(_)
    ));
    assert!(matches!(
        fx.submit(event_id, &attendee, RequestedStatus::Pending).await,
        SubmitOutcome::Updated(_)
    ));
    assert!(matches!(
        fx.submit(event_id, &attendee, RequestedStatus::Confirmed).await,
        SubmitOutcome::Updated(_)
    ));

    let roster = fx.engine.list_by_event(event_id).await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].status, RegistrationStatus::Confirmed);
}

#[tokio::test]
async fn confirmed_to_pending_is_rejected_with_record_unchanged() {
    let fx = fixture();
    let event_id = fx.active_event(5).await;
    let attendee = fx.attendee("Ada Lovelace").await;

    fx.submit(event_id, &attendee, RequestedStatus::Confirmed).await;
    let before = fx.engine.list_by_event(event_id).await;

    let outcome = fx.submit(event_id, &attendee, RequestedStatus::Pending).await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Rejected(RejectReason::InvalidTransition { .. })
    ));

    let after = fx.engine.list_by_event(event_id).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn cancellation_frees_slot_for_waitlisted_attendee() {
    // Scenario: event at capacity, one attendee cancels, another registers
    let fx = fixture();
    let event_id = fx.active_event(1).await;
    let holder = fx.attendee("Ada Lovelace").await;
    let waiter = fx.attendee("Grace Hopper").await;

    fx.submit(event_id, &holder, RequestedStatus::Confirmed).await;
    assert!(matches!(
        fx.submit(event_id, &waiter, RequestedStatus::Confirmed).await,
        SubmitOutcome::Rejected(RejectReason::CapacityExceeded { .. })
    ));

    fx.engine.cancel(event_id, holder.id).await.unwrap();
    assert_eq!(fx.engine.count_active(event_id).await, 0);

    assert!(matches!(
        fx.submit(event_id, &waiter, RequestedStatus::Confirmed).await,
        SubmitOutcome::Admitted(_)
    ));
    assert_eq!(fx.engine.count_active(event_id).await, 1);
}

#[tokio::test]
async fn re_registration_after_cancel_preserves_original_timestamps() {
    let fx = fixture();
    let event_id = fx.active_event(5).await;
    let attendee = fx.attendee("Ada Lovelace").await;

    fx.submit(event_id, &attendee, RequestedStatus::Confirmed).await;
    let original = fx.engine.list_by_event(event_id).await[0].clone();

    fx.engine.cancel(event_id, attendee.id).await.unwrap();
    let outcome = fx.submit(event_id, &attendee, RequestedStatus::Pending).await;
    assert!(matches!(outcome, SubmitOutcome::Admitted(_)));

    let current = fx.engine.list_by_event(event_id).await[0].clone();
    assert_eq!(current.status, RegistrationStatus::Pending);
    assert_eq!(current.registered_at, original.registered_at);
    assert!(current.cancelled_at.is_none());
}

#[tokio::test]
async fn draft_and_closed_events_reject_submissions() {
    let fx = fixture();
    let attendee = fx.attendee("Ada Lovelace").await;

    for status in [EventStatus::Draft, EventStatus::Closed] {
        let event_id = fx
            .catalog
            .add("Gated".to_string(), Capacity::new(5).unwrap(), status)
            .await;
        let result = fx
            .engine
            .submit(
                event_id,
                attendee.id,
                RequestedStatus::Pending,
                RegistrationMetadata::default(),
            )
            .await;
        assert!(matches!(result, Err(EngineError::EventNotOpen { .. })));
    }
}

#[tokio::test]
async fn unknown_event_and_attendee_are_typed_errors() {
    let fx = fixture();
    let event_id = fx.active_event(5).await;
    let attendee = fx.attendee("Ada Lovelace").await;

    let unknown_event = fx
        .engine
        .submit(
            EventId::new(),
            attendee.id,
            RequestedStatus::Pending,
            RegistrationMetadata::default(),
        )
        .await;
    assert!(matches!(unknown_event, Err(EngineError::EventNotFound(_))));

    let unknown_attendee = fx
        .engine
        .submit(
            event_id,
            doorlist_engine::types::AttendeeId::new(),
            RequestedStatus::Pending,
            RegistrationMetadata::default(),
        )
        .await;
    assert!(matches!(
        unknown_attendee,
        Err(EngineError::AttendeeNotFound(_))
    ));
}

#[tokio::test]
async fn cancel_is_idempotent_even_for_unknown_events() {
    let fx = fixture();
    let attendee = fx.attendee("Ada Lovelace").await;

    // No catalog entry at all; cancellation still answers, never errors
    let outcome = fx.engine.cancel(EventId::new(), attendee.id).await.unwrap();
    assert!(matches!(outcome, CancelOutcome::NoOp));
}

#[tokio::test]
async fn shutdown_drains_ledgers_without_blocking_new_ones() {
    let fx = fixture();
    let event_id = fx.active_event(5).await;
    let attendee = fx.attendee("Ada Lovelace").await;
    fx.submit(event_id, &attendee, RequestedStatus::Confirmed).await;

    fx.engine
        .shutdown(std::time::Duration::from_secs(5))
        .await
        .unwrap();

    // Drained ledgers reject further commands
    assert!(matches!(
        fx.engine.cancel(event_id, attendee.id).await,
        Err(EngineError::Store(_))
    ));

    // The drain left the store map usable: a ledger created afterwards
    // answers normally
    let outcome = fx.engine.cancel(EventId::new(), attendee.id).await.unwrap();
    assert!(matches!(outcome, CancelOutcome::NoOp));
}

#[tokio::test]
async fn report_reflects_lifecycle() {
    let fx = fixture();
    let event_id = fx.active_event(10).await;
    let a = fx.attendee("Ada Lovelace").await;
    let b = fx.attendee("Grace Hopper").await;
    let c = fx.attendee("Katherine Johnson").await;

    fx.submit(event_id, &a, RequestedStatus::Pending).await;
    fx.submit(event_id, &b, RequestedStatus::Confirmed).await;
    fx.submit(event_id, &c, RequestedStatus::Confirmed).await;
    fx.engine
        .check_in(event_id, &b.id.to_string())
        .await
        .unwrap();
    fx.engine.cancel(event_id, c.id).await.unwrap();

    let report = fx.engine.report(event_id).await;
    assert_eq!(report.total, 3);
    assert_eq!(report.pending, 1);
    assert_eq!(report.confirmed, 0);
    assert_eq!(report.checked_in, 1);
    assert_eq!(report.cancelled, 1);
    assert_eq!(report.active(), 2);
}
