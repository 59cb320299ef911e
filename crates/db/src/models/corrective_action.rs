//! Corrective action entity models and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `corrective_actions` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CorrectiveAction {
    pub id: DbId,
    pub incident_id: DbId,
    pub title: String,
    pub description: String,
    pub owner_user_id: Option<DbId>,
    pub due_date: NaiveDate,
    pub status: String,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// DTO for creating a corrective action. `due_date` arrives as an ISO date
/// string and is parsed (and rejected) before any write.
#[derive(Debug, Deserialize)]
pub struct CreateCorrectiveAction {
    pub incident_id: DbId,
    pub title: String,
    pub description: String,
    pub owner_user_id: DbId,
    pub due_date: String,
}

/// DTO for a partial corrective action update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCorrectiveAction {
    pub title: Option<String>,
    pub description: Option<String>,
    pub owner_user_id: Option<DbId>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

/// A corrective action joined with its owner contact and incident title,
/// as consumed by the reminder sweep.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderCandidate {
    pub action_id: DbId,
    pub incident_id: DbId,
    pub action_title: String,
    pub action_description: String,
    pub due_date: NaiveDate,
    pub owner_name: String,
    pub owner_email: String,
    pub incident_title: String,
}
