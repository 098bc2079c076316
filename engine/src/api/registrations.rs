//! Registration endpoints.
//!
//! - `POST   /api/events/:id/registrations` - submit (register or update)
//! - `DELETE /api/events/:id/registrations/:attendee_id` - cancel
//! - `GET    /api/events/:id/registrations` - ordered roster
//!
//! Submission outcomes map onto status codes: `201` for a new admission,
//! `200` for an update, `409 CAPACITY_EXCEEDED` / `400 INVALID_TRANSITION`
//! for rejections. Cancellation is idempotent and always answers `200`.

use super::map_engine_error;
use crate::aggregates::{CancelOutcome, RejectReason, SubmitOutcome};
use crate::reporting::{roster_rows, RosterRow};
use crate::server::state::AppState;
use crate::types::{AttendeeId, EventId, RegistrationMetadata, RequestedStatus};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use doorlist_web::{AppError, WebResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to register (or update the registration of) an attendee.
#[derive(Debug, Deserialize)]
pub struct SubmitRegistrationRequest {
    /// Attendee to register
    pub attendee_id: Uuid,
    /// Requested status (`pending` or `confirmed`)
    pub status: RequestedStatus,
    /// Optional submitter-provided detail
    #[serde(default)]
    pub metadata: RegistrationMetadata,
}

/// Response after a submission was admitted or updated.
#[derive(Debug, Serialize)]
pub struct SubmitRegistrationResponse {
    /// Attendee the registration belongs to
    pub attendee_id: Uuid,
    /// Status after the transition
    pub status: String,
    /// `admitted` for a new capacity slot, `updated` otherwise
    pub outcome: String,
    /// When the registration was first created
    pub registered_at: DateTime<Utc>,
}

/// Response after a cancellation request.
#[derive(Debug, Serialize)]
pub struct CancelRegistrationResponse {
    /// Attendee the request targeted
    pub attendee_id: Uuid,
    /// Whether an active registration was actually cancelled
    pub cancelled: bool,
}

/// Ordered roster of an event's registrations.
#[derive(Debug, Serialize)]
pub struct ListRegistrationsResponse {
    /// Rows ordered by (`registered_at`, `attendee_id`)
    pub registrations: Vec<RosterRow>,
    /// Total row count, cancelled included
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register an attendee for an event, or update an existing registration.
pub async fn submit_registration(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<SubmitRegistrationRequest>,
) -> WebResult<(StatusCode, Json<SubmitRegistrationResponse>)> {
    let event_id = EventId::from_uuid(event_id);
    let attendee_id = AttendeeId::from_uuid(request.attendee_id);

    let outcome = state
        .engine
        .submit(event_id, attendee_id, request.status, request.metadata)
        .await
        .map_err(map_engine_error)?;

    match outcome {
        SubmitOutcome::Admitted(registration) => Ok((
            StatusCode::CREATED,
            Json(SubmitRegistrationResponse {
                attendee_id: *registration.attendee_id.as_uuid(),
                status: registration.status.to_string(),
                outcome: "admitted".to_string(),
                registered_at: registration.registered_at,
            }),
        )),
        SubmitOutcome::Updated(registration) => Ok((
            StatusCode::OK,
            Json(SubmitRegistrationResponse {
                attendee_id: *registration.attendee_id.as_uuid(),
                status: registration.status.to_string(),
                outcome: "updated".to_string(),
                registered_at: registration.registered_at,
            }),
        )),
        SubmitOutcome::Rejected(RejectReason::CapacityExceeded { capacity }) => {
            Err(AppError::conflict(
                "CAPACITY_EXCEEDED",
                format!("event is full (capacity: {capacity})"),
            ))
        }
        SubmitOutcome::Rejected(RejectReason::InvalidTransition { from, to }) => {
            Err(AppError::bad_request(
                "INVALID_TRANSITION",
                format!("cannot move a {from} registration to {to}"),
            ))
        }
    }
}

/// Cancel an attendee's registration.
///
/// Idempotent: cancelling an absent or already-cancelled registration
/// answers `200` with `cancelled: false`.
pub async fn cancel_registration(
    Path((event_id, attendee_id)): Path<(Uuid, Uuid)>,
    State(state): State<AppState>,
) -> WebResult<Json<CancelRegistrationResponse>> {
    let event_id = EventId::from_uuid(event_id);
    let attendee_id = AttendeeId::from_uuid(attendee_id);

    let outcome = state
        .engine
        .cancel(event_id, attendee_id)
        .await
        .map_err(map_engine_error)?;

    Ok(Json(CancelRegistrationResponse {
        attendee_id: *attendee_id.as_uuid(),
        cancelled: matches!(outcome, CancelOutcome::Cancelled(_)),
    }))
}

/// List an event's registrations in stable roster order.
pub async fn list_registrations(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<Json<ListRegistrationsResponse>> {
    let event_id = EventId::from_uuid(event_id);

    if state.catalog.get(event_id).await.is_none() {
        return Err(AppError::not_found("Event", event_id));
    }

    let roster = state.engine.list_by_event(event_id).await;
    let registrations = roster_rows(&roster);
    let total = registrations.len();

    Ok(Json(ListRegistrationsResponse {
        registrations,
        total,
    }))
}
