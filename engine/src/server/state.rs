//! Shared application state for HTTP handlers.

use crate::collaborators::{InMemoryAttendeeRegistry, InMemoryEventCatalog};
use crate::engine::RegistrationEngine;
use doorlist_core::environment::Clock;
use std::sync::Arc;

/// State shared across all handlers.
///
/// The engine sees the catalog and registry as trait objects; the handlers
/// keep the concrete in-memory handles so the scaffolding CRUD endpoints
/// can write to them.
#[derive(Clone)]
pub struct AppState {
    /// Registration and check-in engine
    pub engine: Arc<RegistrationEngine>,
    /// Event catalog (concrete handle for CRUD)
    pub catalog: Arc<InMemoryEventCatalog>,
    /// Attendee registry (concrete handle for CRUD)
    pub registry: Arc<InMemoryAttendeeRegistry>,
}

impl AppState {
    /// Build the state graph: collaborators first, engine on top.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let catalog = Arc::new(InMemoryEventCatalog::new());
        let registry = Arc::new(InMemoryAttendeeRegistry::new());
        let engine = Arc::new(RegistrationEngine::new(
            catalog.clone(),
            registry.clone(),
            clock,
        ));
        Self {
            engine,
            catalog,
            registry,
        }
    }
}
