//! Corrective action status and validation rules.
//!
//! Corrective actions are remediation tasks created only after the parent
//! incident is RESOLVED or CLOSED. `completed_at` is stamped exactly once,
//! on the first transition into COMPLETED; re-completing an already-completed
//! action must not move the timestamp.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Corrective action status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrectiveActionStatus {
    Open,
    InProgress,
    Completed,
}

impl CorrectiveActionStatus {
    /// The stored string form of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectiveActionStatus::Open => "OPEN",
            CorrectiveActionStatus::InProgress => "IN_PROGRESS",
            CorrectiveActionStatus::Completed => "COMPLETED",
        }
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "OPEN" => Ok(CorrectiveActionStatus::Open),
            "IN_PROGRESS" => Ok(CorrectiveActionStatus::InProgress),
            "COMPLETED" => Ok(CorrectiveActionStatus::Completed),
            other => Err(CoreError::Validation(format!(
                "Unknown corrective action status '{other}'"
            ))),
        }
    }

    /// Statuses for which the reminder sweep still nags the owner.
    pub fn needs_reminder(&self) -> bool {
        matches!(
            self,
            CorrectiveActionStatus::Open | CorrectiveActionStatus::InProgress
        )
    }
}

impl std::fmt::Display for CorrectiveActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a due date in ISO `YYYY-MM-DD` form.
pub fn parse_due_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!("Invalid due_date '{s}' (expected YYYY-MM-DD)"))
    })
}

/// Decide the `completed_at` stamp for a status change.
///
/// Returns `Some(now)` only on the first transition into COMPLETED; an
/// already-set stamp is never moved.
pub fn completion_stamp(
    new_status: CorrectiveActionStatus,
    existing_completed_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match (new_status, existing_completed_at) {
        (CorrectiveActionStatus::Completed, None) => Some(now),
        (_, existing) => existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn status_round_trips_through_string_form() {
        for status in [
            CorrectiveActionStatus::Open,
            CorrectiveActionStatus::InProgress,
            CorrectiveActionStatus::Completed,
        ] {
            assert_eq!(
                CorrectiveActionStatus::parse(status.as_str()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn reminder_set_excludes_completed() {
        assert!(CorrectiveActionStatus::Open.needs_reminder());
        assert!(CorrectiveActionStatus::InProgress.needs_reminder());
        assert!(!CorrectiveActionStatus::Completed.needs_reminder());
    }

    #[test]
    fn valid_due_date_parses() {
        assert_eq!(
            parse_due_date("2026-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
        );
    }

    #[test]
    fn malformed_due_date_rejected() {
        assert!(parse_due_date("15/03/2026").is_err());
        assert!(parse_due_date("2026-13-01").is_err());
        assert!(parse_due_date("soon").is_err());
        assert!(parse_due_date("").is_err());
    }

    #[test]
    fn first_completion_stamps_now() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            completion_stamp(CorrectiveActionStatus::Completed, None, now),
            Some(now)
        );
    }

    #[test]
    fn re_completion_is_idempotent() {
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            completion_stamp(CorrectiveActionStatus::Completed, Some(first), later),
            Some(first)
        );
    }

    #[test]
    fn non_completed_status_preserves_existing_stamp() {
        let first = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            completion_stamp(CorrectiveActionStatus::Open, Some(first), later),
            Some(first)
        );
        assert_eq!(
            completion_stamp(CorrectiveActionStatus::InProgress, None, later),
            None
        );
    }
}
