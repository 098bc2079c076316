//! Attendance reporting endpoint.
//!
//! `GET /api/events/:id/report` - aggregates from one consistent ledger
//! snapshot.

use crate::reporting::AttendanceReport;
use crate::server::state::AppState;
use crate::types::EventId;
use axum::{
    extract::{Path, State},
    Json,
};
use doorlist_web::{AppError, WebResult};
use serde::Serialize;
use uuid::Uuid;

/// Attendance report for one event.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// Event the report covers
    pub event_id: Uuid,
    /// Event capacity from the catalog
    pub capacity: u32,
    /// Status tallies from one snapshot
    #[serde(flatten)]
    pub report: AttendanceReport,
}

/// Report attendance aggregates for an event.
pub async fn get_report(
    Path(event_id): Path<Uuid>,
    State(state): State<AppState>,
) -> WebResult<Json<ReportResponse>> {
    let event_id = EventId::from_uuid(event_id);

    let event = state
        .catalog
        .get(event_id)
        .await
        .ok_or_else(|| AppError::not_found("Event", event_id))?;

    let report = state.engine.report(event_id).await;

    Ok(Json(ReportResponse {
        event_id: *event_id.as_uuid(),
        capacity: event.capacity.limit(),
        report,
    }))
}
