//! Concurrency tests: capacity under racing submissions, single check-in
//! per attendee under racing operators, uniqueness under duplicate
//! submissions.
//!
//! All tasks hit the same event, so they contend on that event's ledger
//! store; the counts below only hold if the capacity check and the write
//! are atomic per event.

#![allow(clippy::unwrap_used, clippy::panic)]

use doorlist_core::environment::SystemClock;
use doorlist_engine::aggregates::SubmitOutcome;
use doorlist_engine::collaborators::{InMemoryAttendeeRegistry, InMemoryEventCatalog};
use doorlist_engine::engine::{CheckInResult, RegistrationEngine};
use doorlist_engine::types::{
    Capacity, EventId, EventStatus, RegistrationMetadata, RequestedStatus,
};
use std::sync::Arc;

async fn engine_with_active_event(capacity: u32) -> (Arc<RegistrationEngine>, Arc<InMemoryAttendeeRegistry>, EventId) {
    let catalog = Arc::new(InMemoryEventCatalog::new());
    let registry = Arc::new(InMemoryAttendeeRegistry::new());
    let engine = Arc::new(RegistrationEngine::new(
        catalog.clone(),
        registry.clone(),
        Arc::new(SystemClock),
    ));
    let event_id = catalog
        .add(
            "Stress Night".to_string(),
            Capacity::new(capacity).unwrap(),
            EventStatus::Active,
        )
        .await;
    (engine, registry, event_id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_submissions_admit_exactly_capacity() {
    const CAPACITY: u32 = 5;
    const CONTENDERS: usize = 20;

    let (engine, registry, event_id) = engine_with_active_event(CAPACITY).await;

    let mut attendee_ids = Vec::with_capacity(CONTENDERS);
    for i in 0..CONTENDERS {
        let attendee = registry
            .add(format!("Attendee {i}"), format!("attendee{i}@example.com"))
            .await;
        attendee_ids.push(attendee.id);
    }

    let mut handles = Vec::with_capacity(CONTENDERS);
    for attendee_id in attendee_ids {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .submit(
                    event_id,
                    attendee_id,
                    RequestedStatus::Confirmed,
                    RegistrationMetadata::default(),
                )
                .await
                .unwrap()
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            SubmitOutcome::Admitted(_) => admitted += 1,
            SubmitOutcome::Rejected(_) => rejected += 1,
            SubmitOutcome::Updated(_) => panic!("distinct attendees cannot update"),
        }
    }

    assert_eq!(admitted, CAPACITY as usize);
    assert_eq!(rejected, CONTENDERS - CAPACITY as usize);
    assert_eq!(engine.count_active(event_id).await, CAPACITY as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_duplicate_submissions_create_one_registration() {
    const RACERS: usize = 10;

    let (engine, registry, event_id) = engine_with_active_event(50).await;
    let attendee = registry
        .add("Ada Lovelace".to_string(), "ada@example.com".to_string())
        .await;

    let mut handles = Vec::with_capacity(RACERS);
    for _ in 0..RACERS {
        let engine = Arc::clone(&engine);
        let attendee_id = attendee.id;
        handles.push(tokio::spawn(async move {
            engine
                .submit(
                    event_id,
                    attendee_id,
                    RequestedStatus::Pending,
                    RegistrationMetadata::default(),
                )
                .await
                .unwrap()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if matches!(handle.await.unwrap(), SubmitOutcome::Admitted(_)) {
            admitted += 1;
        }
    }

    // Exactly one dispatch created the record; the rest were updates
    assert_eq!(admitted, 1);
    assert_eq!(engine.list_by_event(event_id).await.len(), 1);
    assert_eq!(engine.count_active(event_id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_operators_check_in_an_attendee_once() {
    const OPERATORS: usize = 8;

    let (engine, registry, event_id) = engine_with_active_event(10).await;
    let attendee = registry
        .add("Ada Lovelace".to_string(), "ada@example.com".to_string())
        .await;
    engine
        .submit(
            event_id,
            attendee.id,
            RequestedStatus::Confirmed,
            RegistrationMetadata::default(),
        )
        .await
        .unwrap();

    let identifier = attendee.id.to_string();
    let mut handles = Vec::with_capacity(OPERATORS);
    for _ in 0..OPERATORS {
        let engine = Arc::clone(&engine);
        let identifier = identifier.clone();
        handles.push(tokio::spawn(async move {
            engine.check_in(event_id, &identifier).await.unwrap()
        }));
    }

    let mut successes = 0;
    let mut repeats = 0;
    let mut stamps = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            CheckInResult::Success(registration) => {
                successes += 1;
                stamps.push(registration.checked_in_at);
            }
            CheckInResult::AlreadyCheckedIn(registration) => {
                repeats += 1;
                stamps.push(registration.checked_in_at);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(repeats, OPERATORS - 1);
    // Every observer saw the same arrival timestamp
    stamps.dedup();
    assert_eq!(stamps.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn churn_of_cancels_and_submits_never_exceeds_capacity() {
    const CAPACITY: u32 = 3;
    const ATTENDEES: usize = 6;
    const ROUNDS: usize = 20;

    let (engine, registry, event_id) = engine_with_active_event(CAPACITY).await;

    let mut attendee_ids = Vec::with_capacity(ATTENDEES);
    for i in 0..ATTENDEES {
        let attendee = registry
            .add(format!("Attendee {i}"), format!("attendee{i}@example.com"))
            .await;
        attendee_ids.push(attendee.id);
    }

    let mut handles = Vec::new();
    for attendee_id in attendee_ids {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            for round in 0..ROUNDS {
                if round % 2 == 0 {
                    let _ = engine
                        .submit(
                            event_id,
                            attendee_id,
                            RequestedStatus::Confirmed,
                            RegistrationMetadata::default(),
                        )
                        .await
                        .unwrap();
                } else {
                    engine.cancel(event_id, attendee_id).await.unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Steady state after the churn still honors the cap
    assert!(engine.count_active(event_id).await <= CAPACITY as usize);

    // And the ledger never grew past one row per attendee
    let roster = engine.list_by_event(event_id).await;
    assert!(roster.len() <= ATTENDEES);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn different_events_do_not_contend() {
    const EVENTS: usize = 4;
    const PER_EVENT: usize = 10;

    let catalog = Arc::new(InMemoryEventCatalog::new());
    let registry = Arc::new(InMemoryAttendeeRegistry::new());
    let engine = Arc::new(RegistrationEngine::new(
        catalog.clone(),
        registry.clone(),
        Arc::new(SystemClock),
    ));

    let mut event_ids = Vec::with_capacity(EVENTS);
    for i in 0..EVENTS {
        event_ids.push(
            catalog
                .add(
                    format!("Event {i}"),
                    Capacity::new(PER_EVENT as u32).unwrap(),
                    EventStatus::Active,
                )
                .await,
        );
    }

    let mut handles = Vec::new();
    for event_id in event_ids.clone() {
        for i in 0..PER_EVENT {
            let engine = Arc::clone(&engine);
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let attendee = registry
                    .add(
                        format!("Guest {event_id} {i}"),
                        format!("guest.{i}.{event_id}@example.com"),
                    )
                    .await;
                engine
                    .submit(
                        event_id,
                        attendee.id,
                        RequestedStatus::Confirmed,
                        RegistrationMetadata::default(),
                    )
                    .await
                    .unwrap()
            }));
        }
    }

    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            SubmitOutcome::Admitted(_)
        ));
    }
    for event_id in event_ids {
        assert_eq!(engine.count_active(event_id).await, PER_EVENT);
    }
}
