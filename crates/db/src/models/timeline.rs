//! Incident timeline entity models.
//!
//! Timeline entries are append-only: there is deliberately no update DTO and
//! the repository exposes no update or delete operations.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `incident_timeline` table. Immutable once created.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TimelineEntry {
    pub id: DbId,
    pub incident_id: DbId,
    pub event_type: String,
    pub event_description: String,
    /// `None` means the entry was produced by the system itself.
    pub performed_by_id: Option<DbId>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending a timeline entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTimelineEntry {
    pub incident_id: DbId,
    pub event_type: String,
    pub event_description: String,
    pub performed_by_id: Option<DbId>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}
