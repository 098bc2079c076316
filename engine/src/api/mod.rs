//! HTTP API handlers.
//!
//! Each module owns the typed request/response structs for its endpoints.
//! Engine errors map to [`AppError`] here; domain outcomes carry their own
//! status codes in the handlers.

pub mod catalog;
pub mod checkins;
pub mod registrations;
pub mod reports;

use crate::engine::EngineError;
use doorlist_web::AppError;

/// Map an engine failure onto the HTTP error surface.
///
/// Expected rejections never reach this function; they are values in the
/// engine's outcome types and the handlers map them directly.
pub(crate) fn map_engine_error(error: EngineError) -> AppError {
    match error {
        EngineError::EventNotFound(event_id) => AppError::not_found("Event", event_id),
        EngineError::AttendeeNotFound(attendee_id) => AppError::not_found("Attendee", attendee_id),
        EngineError::EventNotOpen { event_id, status } => AppError::conflict(
            "EVENT_NOT_OPEN",
            format!("event {event_id} is not open for registration (status: {status:?})"),
        ),
        EngineError::Collaborator(source) => {
            AppError::unavailable("a required collaborator is unavailable")
                .with_source(source.into())
        }
        EngineError::Store(source) => {
            AppError::unavailable("the registration ledger is shutting down")
                .with_source(source.into())
        }
        EngineError::MissingOutcome => AppError::internal("An internal error occurred"),
    }
}
