//! Incident entity models, DTOs, and query parameter types.
//!
//! Status and severity are stored as TEXT and validated through the closed
//! enums in `vigil-core`; the row structs keep the string form so the
//! enum-to-string mapping happens only at this boundary.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::status::Severity;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `incidents` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub exception_text: Option<String>,
    pub bank_id: DbId,
    pub severity: String,
    pub status: String,
    pub service_name: String,
    pub incident_manager_id: Option<DbId>,
    pub current_owner_id: Option<DbId>,
    pub created_by_id: DbId,
    pub created_at: Timestamp,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub source: Option<String>,
    pub impact_summary: Option<String>,
    pub downtime: Option<bool>,
    pub financial_impact: Option<bool>,
    pub technical_decline_pct: Option<f64>,
}

/// DTO for creating a new incident.
#[derive(Debug, Deserialize)]
pub struct CreateIncident {
    pub title: String,
    pub description: String,
    pub exception_text: Option<String>,
    pub bank_id: DbId,
    pub severity: Severity,
    pub service_name: String,
    pub incident_manager_id: Option<DbId>,
    pub source: Option<String>,
    pub impact_summary: Option<String>,
}

/// DTO for a partial incident update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateIncident {
    pub title: Option<String>,
    pub description: Option<String>,
    pub exception_text: Option<String>,
    pub severity: Option<Severity>,
    pub service_name: Option<String>,
    pub incident_manager_id: Option<DbId>,
    pub current_owner_id: Option<DbId>,
    pub impact_summary: Option<String>,
    pub downtime: Option<bool>,
    pub financial_impact: Option<bool>,
    pub technical_decline_pct: Option<f64>,
}

impl UpdateIncident {
    /// Whether any of the privileged impact fields are present.
    pub fn touches_impact_fields(&self) -> bool {
        self.downtime.is_some()
            || self.financial_impact.is_some()
            || self.technical_decline_pct.is_some()
    }
}

/// Filter parameters for the basic incident listing.
#[derive(Debug, Default, Deserialize)]
pub struct IncidentListParams {
    pub bank_id: Option<DbId>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Filter parameters for the advanced incident search.
///
/// Text filters are case-insensitive substring matches; enum filters are
/// exact; `tech_decline_min/max` bound `technical_decline_pct`; `date_from/to`
/// bound `created_at`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IncidentSearchParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub exception_text: Option<String>,
    pub service_name: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub bank_id: Option<DbId>,
    pub downtime: Option<bool>,
    pub financial_impact: Option<bool>,
    pub tech_decline_min: Option<f64>,
    pub tech_decline_max: Option<f64>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paginated response for incident listings and searches.
#[derive(Debug, Serialize)]
pub struct IncidentPage {
    pub items: Vec<Incident>,
    pub total: i64,
}
