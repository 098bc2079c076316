//! # Doorlist Engine
//!
//! Event registration (RSVP) and front-desk check-in lifecycle engine.
//!
//! The engine enforces three guarantees under concurrent access:
//!
//! - **Capacity**: active registrations per event never exceed the event's
//!   capacity, checked and written atomically per event.
//! - **Uniqueness**: at most one registration per (event, attendee) pair;
//!   resubmission updates, never duplicates.
//! - **Monotonic check-in**: the first arrival timestamp is written once
//!   and survives everything after it, including cancellation.
//!
//! Architecture: each event gets its own [`aggregates::RegistrationState`]
//! ledger behind a runtime store; reducers are synchronous, so collaborator
//! I/O (capacity lookup, identifier resolution) is resolved before dispatch
//! and the per-event critical section never spans an await. The
//! [`engine::RegistrationEngine`] facade is protocol-agnostic; `api` and
//! `server` are one HTTP realization of it.

pub mod aggregates;
pub mod api;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod reporting;
pub mod server;
pub mod types;

pub use engine::{CheckInResult, EngineError, RegistrationEngine};
