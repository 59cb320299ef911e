//! Persisted advisory results (similar-incident recommendations).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `similar_incident_advice` table: one stored advisory
/// result for an incident.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SimilarIncidentAdvice {
    pub id: DbId,
    pub incident_id: DbId,
    /// JSON array of similar incident ids.
    pub similar_incident_ids: serde_json::Value,
    /// JSON object mapping incident id to the reason it is similar.
    pub similarity_reasons: serde_json::Value,
    pub recommendation_text: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for storing a new advisory result.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSimilarIncidentAdvice {
    pub incident_id: DbId,
    pub similar_incident_ids: serde_json::Value,
    pub similarity_reasons: serde_json::Value,
    pub recommendation_text: Option<String>,
}
