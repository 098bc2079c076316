//! Aggregates for the Doorlist engine.
//!
//! One aggregate: the per-event registration ledger. Each event gets its
//! own aggregate instance (and its own store), which is what serializes
//! admissions per event without cross-event contention.

pub mod registration;

pub use registration::{
    CancelOutcome, CheckInOutcome, RegistrationAction, RegistrationEnvironment,
    RegistrationReducer, RegistrationState, RejectReason, SubmitOutcome,
};
