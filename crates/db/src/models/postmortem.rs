//! Postmortem entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `postmortems` table. At most one per incident.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Postmortem {
    pub id: DbId,
    pub incident_id: DbId,
    pub root_cause: String,
    pub resolution_summary: String,
    pub preventive_summary: String,
    pub created_by_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a postmortem.
#[derive(Debug, Deserialize)]
pub struct CreatePostmortem {
    pub incident_id: DbId,
    pub root_cause: String,
    pub resolution_summary: String,
    pub preventive_summary: String,
}

/// DTO for a partial postmortem update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostmortem {
    pub root_cause: Option<String>,
    pub resolution_summary: Option<String>,
    pub preventive_summary: Option<String>,
}
