//! User roles and the pure permission policy.
//!
//! Roles are a closed enumeration at the domain layer; they are stored as
//! TEXT in the `users` table and mapped back through [`Role::parse`] at the
//! persistence boundary. The policy predicates take only a role and return a
//! boolean -- no I/O, no side effects. Callers check them synchronously
//! before every gated mutation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A user's role. Determines which workflow actions the user may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    IncidentManager,
    Sme,
    SupportL2,
    SupportExpert,
}

impl Role {
    /// The stored string form of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::IncidentManager => "INCIDENT_MANAGER",
            Role::Sme => "SME",
            Role::SupportL2 => "SUPPORT_L2",
            Role::SupportExpert => "SUPPORT_EXPERT",
        }
    }

    /// Parse a stored role string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "INCIDENT_MANAGER" => Ok(Role::IncidentManager),
            "SME" => Ok(Role::Sme),
            "SUPPORT_L2" => Ok(Role::SupportL2),
            "SUPPORT_EXPERT" => Ok(Role::SupportExpert),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether this role may acknowledge an incident (OPEN -> ACKNOWLEDGED).
pub fn can_acknowledge(role: Role) -> bool {
    matches!(
        role,
        Role::SupportL2 | Role::SupportExpert | Role::IncidentManager | Role::Admin
    )
}

/// Whether this role may resolve or close an incident.
pub fn can_resolve_or_close(role: Role) -> bool {
    matches!(role, Role::IncidentManager | Role::Admin)
}

/// Whether this role may change the impact fields
/// (downtime, financial_impact, technical_decline_pct).
pub fn can_update_impact_fields(role: Role) -> bool {
    matches!(role, Role::IncidentManager | Role::Admin)
}

/// Whether this role may manage banks and their technical architecture
/// records.
pub fn can_manage_architecture(role: Role) -> bool {
    matches!(role, Role::Admin)
}

/// Whether this role may create a bank's technical configuration record.
pub fn can_create_bank_option(role: Role) -> bool {
    matches!(role, Role::Admin)
}

/// Whether this role may create or edit postmortems.
pub fn can_edit_postmortem(role: Role) -> bool {
    matches!(role, Role::IncidentManager | Role::Admin)
}

/// Whether this role may be assigned as an incident manager.
pub fn can_be_incident_manager(role: Role) -> bool {
    matches!(role, Role::IncidentManager | Role::Admin)
}
