//! External collaborators of the registration engine.
//!
//! The engine owns registrations only; events and attendees are mastered
//! elsewhere and reached through these traits. Both are consulted *before*
//! an action is dispatched to a ledger store, so collaborator latency never
//! extends the per-event critical section.

use crate::types::{Attendee, AttendeeId, Capacity, EventId, EventStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Failure reaching a collaborator.
///
/// These are infrastructure failures, not domain outcomes; the engine
/// propagates them as-is.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or answered abnormally
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Result of resolving a free-form check-in identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one attendee matched
    Resolved(AttendeeId),
    /// Nothing matched
    NotFound,
    /// More than one attendee matched; the operator must disambiguate
    Ambiguous(Vec<Attendee>),
}

/// Read-only view of the event catalog.
#[async_trait]
pub trait EventCatalog: Send + Sync {
    /// Capacity of an event, `None` if the event is unknown.
    async fn get_capacity(&self, event_id: EventId) -> Result<Option<Capacity>, CollaboratorError>;

    /// Publication status of an event, `None` if the event is unknown.
    async fn get_status(&self, event_id: EventId) -> Result<Option<EventStatus>, CollaboratorError>;
}

/// Read-only view of the attendee registry.
#[async_trait]
pub trait AttendeeRegistry: Send + Sync {
    /// Resolve a free-form identifier to at most one attendee.
    ///
    /// Resolution order: exact id match, then case-insensitive exact email
    /// match, then case-insensitive substring match on the name. Multiple
    /// substring candidates are reported as [`Resolution::Ambiguous`] -
    /// never an arbitrary pick.
    async fn resolve(&self, identifier: &str) -> Result<Resolution, CollaboratorError>;

    /// Whether an attendee id is known to the registry.
    async fn contains(&self, attendee_id: AttendeeId) -> Result<bool, CollaboratorError>;

    /// Fetch an attendee summary by id.
    async fn get(&self, attendee_id: AttendeeId) -> Result<Option<Attendee>, CollaboratorError>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Catalog entry held by the in-memory catalog.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogEvent {
    /// Event identifier
    pub id: EventId,
    /// Display name
    pub name: String,
    /// Admission capacity
    pub capacity: Capacity,
    /// Publication status
    pub status: EventStatus,
}

/// In-memory event catalog backing the server binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryEventCatalog {
    events: RwLock<HashMap<EventId, CatalogEvent>>,
}

impl InMemoryEventCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event and return its generated id.
    pub async fn add(&self, name: String, capacity: Capacity, status: EventStatus) -> EventId {
        let id = EventId::new();
        let event = CatalogEvent {
            id,
            name,
            capacity,
            status,
        };
        self.events.write().await.insert(id, event);
        id
    }

    /// Fetch a full catalog entry.
    pub async fn get(&self, event_id: EventId) -> Option<CatalogEvent> {
        self.events.read().await.get(&event_id).cloned()
    }

    /// Change an event's publication status.
    ///
    /// Returns `false` if the event is unknown.
    pub async fn set_status(&self, event_id: EventId, status: EventStatus) -> bool {
        match self.events.write().await.get_mut(&event_id) {
            Some(event) => {
                event.status = status;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl EventCatalog for InMemoryEventCatalog {
    async fn get_capacity(&self, event_id: EventId) -> Result<Option<Capacity>, CollaboratorError> {
        Ok(self.events.read().await.get(&event_id).map(|e| e.capacity))
    }

    async fn get_status(&self, event_id: EventId) -> Result<Option<EventStatus>, CollaboratorError> {
        Ok(self.events.read().await.get(&event_id).map(|e| e.status))
    }
}

/// In-memory attendee registry backing the server binary and tests.
#[derive(Debug, Default)]
pub struct InMemoryAttendeeRegistry {
    attendees: RwLock<HashMap<AttendeeId, Attendee>>,
}

impl InMemoryAttendeeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attendee and return the stored summary.
    pub async fn add(&self, name: String, email: String) -> Attendee {
        let attendee = Attendee {
            id: AttendeeId::new(),
            name,
            email,
        };
        self.attendees
            .write()
            .await
            .insert(attendee.id, attendee.clone());
        attendee
    }
}

#[async_trait]
impl AttendeeRegistry for InMemoryAttendeeRegistry {
    async fn resolve(&self, identifier: &str) -> Result<Resolution, CollaboratorError> {
        let attendees = self.attendees.read().await;
        let needle = identifier.trim();

        // 1. Exact id match
        if let Ok(uuid) = Uuid::parse_str(needle) {
            let id = AttendeeId::from_uuid(uuid);
            if attendees.contains_key(&id) {
                return Ok(Resolution::Resolved(id));
            }
        }

        // 2. Case-insensitive exact email match
        let lowered = needle.to_lowercase();
        let mut email_matches: Vec<&Attendee> = attendees
            .values()
            .filter(|a| a.email.to_lowercase() == lowered)
            .collect();
        if email_matches.len() == 1 {
            return Ok(Resolution::Resolved(email_matches[0].id));
        }
        if email_matches.len() > 1 {
            email_matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
            return Ok(Resolution::Ambiguous(
                email_matches.into_iter().cloned().collect(),
            ));
        }

        // 3. Case-insensitive substring match on the name
        let mut name_matches: Vec<&Attendee> = attendees
            .values()
            .filter(|a| a.name.to_lowercase().contains(&lowered))
            .collect();
        match name_matches.len() {
            0 => Ok(Resolution::NotFound),
            1 => Ok(Resolution::Resolved(name_matches[0].id)),
            _ => {
                name_matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
                Ok(Resolution::Ambiguous(
                    name_matches.into_iter().cloned().collect(),
                ))
            }
        }
    }

    async fn contains(&self, attendee_id: AttendeeId) -> Result<bool, CollaboratorError> {
        Ok(self.attendees.read().await.contains_key(&attendee_id))
    }

    async fn get(&self, attendee_id: AttendeeId) -> Result<Option<Attendee>, CollaboratorError> {
        Ok(self.attendees.read().await.get(&attendee_id).cloned())
    }
}

/// Convenience aliases for injected collaborators.
pub type SharedEventCatalog = Arc<dyn EventCatalog>;
/// Shared attendee registry handle.
pub type SharedAttendeeRegistry = Arc<dyn AttendeeRegistry>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    async fn registry_with(entries: &[(&str, &str)]) -> InMemoryAttendeeRegistry {
        let registry = InMemoryAttendeeRegistry::new();
        for (name, email) in entries {
            registry
                .add((*name).to_string(), (*email).to_string())
                .await;
        }
        registry
    }

    #[tokio::test]
    async fn resolves_exact_id_first() {
        let registry = registry_with(&[("Ada Lovelace", "ada@example.com")]).await;
        let ada = registry.add("Grace Hopper".to_string(), "grace@example.com".to_string()).await;

        let resolution = registry.resolve(&ada.id.to_string()).await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(ada.id));
    }

    #[tokio::test]
    async fn resolves_email_case_insensitively() {
        let registry = registry_with(&[
            ("Ada Lovelace", "ada@example.com"),
            ("Grace Hopper", "grace@example.com"),
        ])
        .await;

        let resolution = registry.resolve("ADA@Example.COM").await.unwrap();
        match resolution {
            Resolution::Resolved(_) => {}
            other => panic!("expected a resolved id, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_name_substring_resolves() {
        let registry = registry_with(&[
            ("Ada Lovelace", "ada@example.com"),
            ("Grace Hopper", "grace@example.com"),
        ])
        .await;

        let resolution = registry.resolve("lovel").await.unwrap();
        assert!(matches!(resolution, Resolution::Resolved(_)));
    }

    #[tokio::test]
    async fn multiple_name_matches_are_ambiguous_never_arbitrary() {
        let registry = registry_with(&[
            ("Alex Chen", "alex.c@example.com"),
            ("Alexandra Smith", "alex.s@example.com"),
        ])
        .await;

        let resolution = registry.resolve("alex").await.unwrap();
        match resolution {
            Resolution::Ambiguous(candidates) => {
                assert_eq!(candidates.len(), 2);
                // candidates come back in a stable order for the operator
                assert_eq!(candidates[0].name, "Alex Chen");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let registry = registry_with(&[("Ada Lovelace", "ada@example.com")]).await;
        let resolution = registry.resolve("nobody@example.com").await.unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn catalog_status_changes_are_visible() {
        let catalog = InMemoryEventCatalog::new();
        let capacity = Capacity::new(10).unwrap();
        let event_id = catalog
            .add("RustConf".to_string(), capacity, EventStatus::Draft)
            .await;

        assert_eq!(
            catalog.get_status(event_id).await.unwrap(),
            Some(EventStatus::Draft)
        );
        assert!(catalog.set_status(event_id, EventStatus::Active).await);
        assert_eq!(
            catalog.get_status(event_id).await.unwrap(),
            Some(EventStatus::Active)
        );
        assert_eq!(catalog.get_capacity(event_id).await.unwrap(), Some(capacity));
    }
}
