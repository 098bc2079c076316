//! Router configuration for the Doorlist server.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{catalog, checkins, registrations, reports};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - Health checks (no prefix)
/// - Catalog/registry scaffolding under `/api`
/// - Registration, check-in and report endpoints under `/api`
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog and registry scaffolding
        .route("/events", post(catalog::create_event))
        .route("/events/:id", get(catalog::get_event))
        .route("/events/:id/status", put(catalog::set_event_status))
        .route("/attendees", post(catalog::create_attendee))
        // Registration lifecycle
        .route(
            "/events/:id/registrations",
            post(registrations::submit_registration),
        )
        .route(
            "/events/:id/registrations",
            get(registrations::list_registrations),
        )
        .route(
            "/events/:id/registrations/:attendee_id",
            delete(registrations::cancel_registration),
        )
        // Front desk
        .route("/events/:id/check-ins", post(checkins::check_in))
        .route("/events/:id/check-ins/batch", post(checkins::check_in_batch))
        // Reporting
        .route("/events/:id/report", get(reports::get_report));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
