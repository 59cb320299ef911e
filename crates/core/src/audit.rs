//! Audit log vocabulary.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the API/repository layer and the background reminder sweep. Audit records
//! are process-wide and append-only; they reference entities weakly, so
//! deleting an entity leaves its audit trail intact.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Known entity types for audit log entries.
pub mod entity_types {
    pub const USER: &str = "USER";
    pub const BANK: &str = "BANK";
    pub const BANK_OPTION: &str = "BANK_OPTION";
    pub const INCIDENT: &str = "INCIDENT";
    pub const CORRECTIVE_ACTION: &str = "CORRECTIVE_ACTION";
    pub const POSTMORTEM: &str = "POSTMORTEM";
    pub const SEARCH: &str = "SEARCH";
    pub const REPORT: &str = "REPORT";
}

/// The kind of action an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Login,
    Logout,
    Create,
    Update,
    StatusChange,
    Search,
    AiSearch,
    GenerateReport,
    Comment,
    Reminder,
}

impl AuditAction {
    /// The stored string form of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::StatusChange => "STATUS_CHANGE",
            AuditAction::Search => "SEARCH",
            AuditAction::AiSearch => "AI_SEARCH",
            AuditAction::GenerateReport => "GENERATE_REPORT",
            AuditAction::Comment => "COMMENT",
            AuditAction::Reminder => "REMINDER",
        }
    }

    /// Parse a stored action string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "LOGIN" => Ok(AuditAction::Login),
            "LOGOUT" => Ok(AuditAction::Logout),
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "STATUS_CHANGE" => Ok(AuditAction::StatusChange),
            "SEARCH" => Ok(AuditAction::Search),
            "AI_SEARCH" => Ok(AuditAction::AiSearch),
            "GENERATE_REPORT" => Ok(AuditAction::GenerateReport),
            "COMMENT" => Ok(AuditAction::Comment),
            "REMINDER" => Ok(AuditAction::Reminder),
            other => Err(CoreError::Validation(format!(
                "Unknown audit action '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_string_form() {
        for action in [
            AuditAction::Login,
            AuditAction::Logout,
            AuditAction::Create,
            AuditAction::Update,
            AuditAction::StatusChange,
            AuditAction::Search,
            AuditAction::AiSearch,
            AuditAction::GenerateReport,
            AuditAction::Comment,
            AuditAction::Reminder,
        ] {
            assert_eq!(AuditAction::parse(action.as_str()).unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_rejected() {
        assert!(AuditAction::parse("DELETE_EVERYTHING").is_err());
    }
}
