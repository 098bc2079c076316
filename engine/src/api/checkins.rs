//! Front-desk check-in endpoints.
//!
//! - `POST /api/events/:id/check-ins` - check in by free-form identifier
//! - `POST /api/events/:id/check-ins/batch` - check in pre-resolved ids
//!
//! The single endpoint resolves id, then email, then name substring; an
//! ambiguous identifier answers `409 AMBIGUOUS_IDENTIFIER` with the
//! candidate list so the operator can pick. The batch endpoint is
//! best-effort: every id gets its own tagged result and nothing rolls back.

use super::map_engine_error;
use crate::engine::CheckInResult;
use crate::server::state::AppState;
use crate::types::{Attendee, AttendeeId, EventId, Registration};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use doorlist_web::{AppError, WebResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to check in one attendee by free-form identifier.
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    /// Attendee id, email or name fragment
    pub identifier: String,
}

/// Response after a successful (or repeated) check-in.
#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    /// `checked_in` on the first arrival, `already_checked_in` after
    pub result: String,
    /// Attendee that was checked in
    pub attendee_id: Uuid,
    /// First arrival timestamp
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Request to check in a batch of already-resolved attendees.
#[derive(Debug, Deserialize)]
pub struct CheckInBatchRequest {
    /// Attendee ids, processed independently in order
    pub attendee_ids: Vec<Uuid>,
}

/// Per-attendee entry of a batch check-in.
#[derive(Debug, Serialize)]
pub struct CheckInBatchEntry {
    /// Attendee this entry belongs to
    pub attendee_id: Uuid,
    /// `checked_in`, `already_checked_in`, `cancelled` or `not_found`
    pub result: String,
    /// First arrival timestamp, when the attendee has one
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Response of a batch check-in, entries in input order.
#[derive(Debug, Serialize)]
pub struct CheckInBatchResponse {
    /// One entry per requested id
    pub results: Vec<CheckInBatchEntry>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Check in one attendee by free-form identifier.
pub async fn check_in(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> WebResult<Json<CheckInResponse>> {
    let event_id = EventId::from_uuid(event_id);
    let identifier = request.identifier.trim();
    if identifier.is_empty() {
        return Err(AppError::validation("identifier must not be empty"));
    }

    let result = state
        .engine
        .check_in(event_id, identifier)
        .await
        .map_err(map_engine_error)?;

    match result {
        CheckInResult::Success(registration) => Ok(Json(success_body(&registration, "checked_in"))),
        CheckInResult::AlreadyCheckedIn(registration) => {
            Ok(Json(success_body(&registration, "already_checked_in")))
        }
        CheckInResult::NotFound => Err(AppError::not_found("Registration", identifier)),
        CheckInResult::Ambiguous(candidates) => Err(ambiguous_error(identifier, &candidates)),
        CheckInResult::Cancelled(registration) => Err(AppError::conflict(
            "REGISTRATION_CANCELLED",
            format!(
                "registration for attendee {} was cancelled",
                registration.attendee_id
            ),
        )),
    }
}

/// Check in a batch of attendees; one failure never aborts the rest.
pub async fn check_in_batch(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CheckInBatchRequest>,
) -> WebResult<Json<CheckInBatchResponse>> {
    let event_id = EventId::from_uuid(event_id);
    let attendee_ids: Vec<AttendeeId> = request
        .attendee_ids
        .into_iter()
        .map(AttendeeId::from_uuid)
        .collect();

    let results = state
        .engine
        .check_in_many(event_id, attendee_ids)
        .await
        .map_err(map_engine_error)?;

    let results = results
        .into_iter()
        .map(|(attendee_id, result)| {
            let (label, checked_in_at) = match result {
                CheckInResult::Success(r) => ("checked_in", r.checked_in_at),
                CheckInResult::AlreadyCheckedIn(r) => ("already_checked_in", r.checked_in_at),
                CheckInResult::Cancelled(r) => ("cancelled", r.checked_in_at),
                // Ambiguity cannot occur for pre-resolved ids
                CheckInResult::NotFound | CheckInResult::Ambiguous(_) => ("not_found", None),
            };
            CheckInBatchEntry {
                attendee_id: *attendee_id.as_uuid(),
                result: label.to_string(),
                checked_in_at,
            }
        })
        .collect();

    Ok(Json(CheckInBatchResponse { results }))
}

fn success_body(registration: &Registration, label: &str) -> CheckInResponse {
    CheckInResponse {
        result: label.to_string(),
        attendee_id: *registration.attendee_id.as_uuid(),
        checked_in_at: registration.checked_in_at,
    }
}

fn ambiguous_error(identifier: &str, candidates: &[Attendee]) -> AppError {
    let listed: Vec<_> = candidates
        .iter()
        .map(|candidate| {
            json!({
                "id": candidate.id,
                "name": candidate.name,
                "email": candidate.email,
            })
        })
        .collect();
    AppError::conflict(
        "AMBIGUOUS_IDENTIFIER",
        format!("'{identifier}' matches {} attendees", candidates.len()),
    )
    .with_details(json!({ "candidates": listed }))
}
