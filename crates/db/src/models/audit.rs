//! Audit log entity models and DTOs.
//!
//! Audit records are process-wide and append-only (no `updated_at`, no update
//! DTO). They reference entities weakly by type and id, so deleting an entity
//! leaves its audit trail intact.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLog {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub action: String,
    pub description: Option<String>,
    /// `None` means the action was performed by the system itself.
    pub performed_by_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub timestamp: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAuditLog {
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub action: String,
    pub description: Option<String>,
    pub performed_by_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
}

/// Filter parameters for querying audit logs.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub action: Option<String>,
    pub performed_by_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated response for audit log queries.
#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub items: Vec<AuditLog>,
    pub total: i64,
}
