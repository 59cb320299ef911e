//! Incident status, severity, and the status transition engine.
//!
//! The lifecycle is a fixed forward chain:
//!
//! ```text
//! OPEN -> ACKNOWLEDGED -> IN_PROGRESS -> RESOLVED -> CLOSED
//! ```
//!
//! CLOSED is terminal. No skipping, no reversal. [`validate_transition`] is
//! the single gate every status change goes through: it checks chain
//! adjacency first, then the role policy for the target state, and on
//! acceptance tells the caller which timestamp column to stamp. The caller
//! must write the stamp in the same transaction as the status update.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::{self, Role};

/// Incident workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Open,
    Acknowledged,
    InProgress,
    Resolved,
    Closed,
}

impl IncidentStatus {
    /// The stored string form of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Acknowledged => "ACKNOWLEDGED",
            IncidentStatus::InProgress => "IN_PROGRESS",
            IncidentStatus::Resolved => "RESOLVED",
            IncidentStatus::Closed => "CLOSED",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "OPEN" => Ok(IncidentStatus::Open),
            "ACKNOWLEDGED" => Ok(IncidentStatus::Acknowledged),
            "IN_PROGRESS" => Ok(IncidentStatus::InProgress),
            "RESOLVED" => Ok(IncidentStatus::Resolved),
            "CLOSED" => Ok(IncidentStatus::Closed),
            other => Err(CoreError::Validation(format!(
                "Unknown incident status '{other}'"
            ))),
        }
    }

    /// The next status in the forward chain, or `None` for CLOSED.
    pub fn next(&self) -> Option<IncidentStatus> {
        match self {
            IncidentStatus::Open => Some(IncidentStatus::Acknowledged),
            IncidentStatus::Acknowledged => Some(IncidentStatus::InProgress),
            IncidentStatus::InProgress => Some(IncidentStatus::Resolved),
            IncidentStatus::Resolved => Some(IncidentStatus::Closed),
            IncidentStatus::Closed => None,
        }
    }

    /// Whether this status counts as settled for gating purposes.
    ///
    /// Corrective actions and postmortems may only be created once the
    /// incident is RESOLVED or CLOSED.
    pub fn is_settled(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Closed)
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident severity, P1 (most urgent) through P4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    P1,
    P2,
    P3,
    P4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::P1 => "P1",
            Severity::P2 => "P2",
            Severity::P3 => "P3",
            Severity::P4 => "P4",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "P1" => Ok(Severity::P1),
            "P2" => Ok(Severity::P2),
            "P3" => Ok(Severity::P3),
            "P4" => Ok(Severity::P4),
            other => Err(CoreError::Validation(format!(
                "Unknown severity '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which timestamp column an accepted transition stamps.
///
/// The caller must write the stamp exactly once, in the same transaction as
/// the status update. `None` (the IN_PROGRESS transition) stamps nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStamp {
    None,
    AcknowledgedAt,
    ResolvedAt,
    ClosedAt,
}

/// Validate a status transition for the given actor role.
///
/// Checks chain adjacency first (invalid transitions are rejected as
/// [`CoreError::Validation`] regardless of role), then the role gate for the
/// target state ([`CoreError::Forbidden`]). The ACKNOWLEDGED -> IN_PROGRESS
/// step is deliberately ungated: any authenticated user may drive it.
pub fn validate_transition(
    current: IncidentStatus,
    target: IncidentStatus,
    role: Role,
) -> Result<TransitionStamp, CoreError> {
    if current.next() != Some(target) {
        return Err(CoreError::Validation(format!(
            "Invalid status transition from {current} to {target}"
        )));
    }

    match target {
        IncidentStatus::Acknowledged => {
            if !roles::can_acknowledge(role) {
                return Err(CoreError::Forbidden(
                    "Only SUPPORT_L2, SUPPORT_EXPERT, INCIDENT_MANAGER, or ADMIN can acknowledge incidents"
                        .into(),
                ));
            }
            Ok(TransitionStamp::AcknowledgedAt)
        }
        IncidentStatus::InProgress => Ok(TransitionStamp::None),
        IncidentStatus::Resolved | IncidentStatus::Closed => {
            if !roles::can_resolve_or_close(role) {
                return Err(CoreError::Forbidden(
                    "Only INCIDENT_MANAGER or ADMIN can resolve or close incidents".into(),
                ));
            }
            Ok(if target == IncidentStatus::Resolved {
                TransitionStamp::ResolvedAt
            } else {
                TransitionStamp::ClosedAt
            })
        }
        IncidentStatus::Open => unreachable!("no status transitions into OPEN"),
    }
}
