//! Catalog and registry scaffolding endpoints.
//!
//! Thin CRUD over the in-memory collaborators so the engine can be driven
//! end to end without an external catalog service:
//!
//! - `POST /api/events` / `GET /api/events/:id` / `PUT /api/events/:id/status`
//! - `POST /api/attendees`

use crate::collaborators::CatalogEvent;
use crate::server::state::AppState;
use crate::types::{Attendee, Capacity, EventId, EventStatus};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use doorlist_web::{AppError, WebResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Display name
    pub name: String,
    /// Admission capacity; must be positive
    pub capacity: u32,
    /// Initial status; defaults to `active` so demo flows work immediately
    #[serde(default = "default_event_status")]
    pub status: EventStatus,
}

const fn default_event_status() -> EventStatus {
    EventStatus::Active
}

/// Request to change an event's publication status.
#[derive(Debug, Deserialize)]
pub struct SetEventStatusRequest {
    /// New status
    pub status: EventStatus,
}

/// Request to create an attendee.
#[derive(Debug, Deserialize)]
pub struct CreateAttendeeRequest {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
}

/// Created event response.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Admission capacity
    pub capacity: u32,
    /// Publication status
    pub status: EventStatus,
}

impl From<CatalogEvent> for EventResponse {
    fn from(event: CatalogEvent) -> Self {
        Self {
            id: *event.id.as_uuid(),
            name: event.name,
            capacity: event.capacity.limit(),
            status: event.status,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create an event in the in-memory catalog.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> WebResult<(StatusCode, Json<EventResponse>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::validation("event name must not be empty"));
    }
    let capacity = Capacity::new(request.capacity)
        .ok_or_else(|| AppError::validation("capacity must be positive"))?;

    let event_id = state
        .catalog
        .add(request.name.clone(), capacity, request.status)
        .await;
    tracing::info!(%event_id, capacity = %capacity, "event created");

    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            id: *event_id.as_uuid(),
            name: request.name,
            capacity: capacity.limit(),
            status: request.status,
        }),
    ))
}

/// Fetch a catalog entry.
pub async fn get_event(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<Json<EventResponse>> {
    let event_id = EventId::from_uuid(event_id);
    let event = state
        .catalog
        .get(event_id)
        .await
        .ok_or_else(|| AppError::not_found("Event", event_id))?;
    Ok(Json(event.into()))
}

/// Change an event's publication status.
pub async fn set_event_status(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<SetEventStatusRequest>,
) -> WebResult<Json<EventResponse>> {
    let event_id = EventId::from_uuid(event_id);
    if !state.catalog.set_status(event_id, request.status).await {
        return Err(AppError::not_found("Event", event_id));
    }
    let event = state
        .catalog
        .get(event_id)
        .await
        .ok_or_else(|| AppError::not_found("Event", event_id))?;
    tracing::info!(%event_id, status = ?request.status, "event status changed");
    Ok(Json(event.into()))
}

/// Create an attendee in the in-memory registry.
pub async fn create_attendee(
    State(state): State<AppState>,
    Json(request): Json<CreateAttendeeRequest>,
) -> WebResult<(StatusCode, Json<Attendee>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::validation("attendee name must not be empty"));
    }
    if !request.email.contains('@') {
        return Err(AppError::validation("attendee email must be an address"));
    }

    let attendee = state.registry.add(request.name, request.email).await;
    tracing::info!(attendee_id = %attendee.id, "attendee created");

    Ok((StatusCode::CREATED, Json(attendee)))
}
