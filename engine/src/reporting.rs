//! Read-only reporting over ledger snapshots.
//!
//! Everything here consumes a snapshot the engine took under the ledger's
//! read lock; nothing in this module can mutate a registration.

use crate::types::{Registration, RegistrationStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Attendance aggregates for one event.
///
/// Computed from a single consistent snapshot, so the per-status counts
/// always sum to `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceReport {
    /// All registrations ever made, including cancelled ones
    pub total: usize,
    /// Currently pending
    pub pending: usize,
    /// Currently confirmed
    pub confirmed: usize,
    /// Arrived
    pub checked_in: usize,
    /// Withdrawn
    pub cancelled: usize,
}

impl AttendanceReport {
    /// Tally one snapshot of registrations.
    pub fn from_registrations<'a, I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = &'a Registration>,
    {
        let mut report = Self::default();
        for registration in registrations {
            report.total += 1;
            match registration.status {
                RegistrationStatus::Pending => report.pending += 1,
                RegistrationStatus::Confirmed => report.confirmed += 1,
                RegistrationStatus::CheckedIn => report.checked_in += 1,
                RegistrationStatus::Cancelled => report.cancelled += 1,
            }
        }
        report
    }

    /// Registrations occupying a capacity slot.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.pending + self.confirmed + self.checked_in
    }
}

/// One flattened registration for export.
///
/// The column set mirrors what an organizer expects in a spreadsheet:
/// identifier, status and the three lifecycle timestamps, plus the
/// submitter-provided detail.
#[derive(Clone, Debug, Serialize)]
pub struct RosterRow {
    /// Attendee identifier
    pub attendee_id: Uuid,
    /// Current status label (`pending`, `confirmed`, `checked_in`,
    /// `cancelled`)
    pub status: String,
    /// When the registration was created
    pub registered_at: DateTime<Utc>,
    /// When the attendee first arrived, if ever
    pub checked_in_at: Option<DateTime<Utc>>,
    /// When the registration was last cancelled, if currently cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Dietary requirements
    pub dietary: Option<String>,
    /// Organizer-facing notes
    pub notes: Option<String>,
}

/// Flatten an ordered roster snapshot into export rows.
#[must_use]
pub fn roster_rows(registrations: &[Registration]) -> Vec<RosterRow> {
    registrations
        .iter()
        .map(|registration| RosterRow {
            attendee_id: *registration.attendee_id.as_uuid(),
            status: registration.status.to_string(),
            registered_at: registration.registered_at,
            checked_in_at: registration.checked_in_at,
            cancelled_at: registration.cancelled_at,
            dietary: registration.metadata.dietary.clone(),
            notes: registration.metadata.notes.clone(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{AttendeeId, EventId, RegistrationMetadata};
    use chrono::TimeZone;

    fn registration(status: RegistrationStatus) -> Registration {
        let stamp = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        Registration {
            event_id: EventId::new(),
            attendee_id: AttendeeId::new(),
            status,
            registered_at: stamp,
            checked_in_at: None,
            cancelled_at: None,
            metadata: RegistrationMetadata::default(),
        }
    }

    #[test]
    fn report_counts_sum_to_total() {
        let registrations = vec![
            registration(RegistrationStatus::Pending),
            registration(RegistrationStatus::Confirmed),
            registration(RegistrationStatus::Confirmed),
            registration(RegistrationStatus::CheckedIn),
            registration(RegistrationStatus::Cancelled),
        ];

        let report = AttendanceReport::from_registrations(&registrations);
        assert_eq!(report.total, 5);
        assert_eq!(report.pending, 1);
        assert_eq!(report.confirmed, 2);
        assert_eq!(report.checked_in, 1);
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.active(), 4);
        assert_eq!(
            report.pending + report.confirmed + report.checked_in + report.cancelled,
            report.total
        );
    }

    #[test]
    fn empty_snapshot_reports_zeroes() {
        let none: Vec<Registration> = Vec::new();
        let report = AttendanceReport::from_registrations(&none);
        assert_eq!(report, AttendanceReport::default());
    }

    #[test]
    fn roster_rows_carry_status_labels_and_metadata() {
        let mut cancelled = registration(RegistrationStatus::Cancelled);
        cancelled.cancelled_at = Some(Utc.with_ymd_and_hms(2026, 3, 15, 10, 0, 0).unwrap());
        cancelled.metadata.dietary = Some("gluten-free".to_string());

        let rows = roster_rows(&[cancelled]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "cancelled");
        assert!(rows[0].cancelled_at.is_some());
        assert_eq!(rows[0].dietary.as_deref(), Some("gluten-free"));
    }
}
