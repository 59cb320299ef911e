//! Daily reminder sweep for outstanding corrective actions.
//!
//! Runs once a day at the configured UTC time. Each sweep loads every
//! incomplete action and emails its owner. One failed send never stops the
//! sweep; every attempt leaves an audit record whether it succeeded or not.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use vigil_core::audit::{entity_types, AuditAction};
use vigil_db::models::audit::NewAuditLog;
use vigil_db::repositories::{AuditLogRepo, CorrectiveActionRepo};

use crate::notifier::email::EmailNotifier;

/// Run the reminder sweep loop until `cancel` is triggered.
///
/// `hour`/`minute` are the UTC time of day each sweep fires. Without a
/// configured notifier there is nothing to send, so the loop exits
/// immediately.
pub async fn run(
    pool: PgPool,
    notifier: Option<Arc<EmailNotifier>>,
    hour: u32,
    minute: u32,
    cancel: CancellationToken,
) {
    let Some(notifier) = notifier else {
        tracing::info!("Reminder sweep disabled: no SMTP configuration");
        return;
    };

    tracing::info!(hour, minute, "Reminder sweep started");

    loop {
        let wait = until_next_occurrence(hour, minute);
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reminder sweep stopping");
                break;
            }
            _ = tokio::time::sleep(wait) => {
                sweep(&pool, &notifier).await;
            }
        }
    }
}

/// One sweep: load outstanding actions, send reminders, audit every attempt.
pub async fn sweep(pool: &PgPool, notifier: &EmailNotifier) {
    let candidates = match CorrectiveActionRepo::list_needing_reminder(pool).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!(error = %e, "Reminder sweep: failed to load outstanding actions");
            return;
        }
    };

    if candidates.is_empty() {
        tracing::debug!("Reminder sweep: nothing outstanding");
        return;
    }

    let mut sent = 0usize;
    let mut failed = 0usize;

    for candidate in &candidates {
        let result = notifier.send_reminder(candidate).await;
        let ok = result.is_ok();
        if ok {
            sent += 1;
        } else {
            failed += 1;
        }
        if let Err(e) = &result {
            tracing::error!(
                action_id = candidate.action_id,
                to = %candidate.owner_email,
                error = %e,
                "Reminder sweep: send failed"
            );
        }

        let audit = NewAuditLog {
            entity_type: entity_types::CORRECTIVE_ACTION.into(),
            entity_id: Some(candidate.action_id),
            action: AuditAction::Reminder.as_str().into(),
            description: Some(if ok {
                format!("Reminder sent to {}", candidate.owner_email)
            } else {
                format!("Reminder to {} failed", candidate.owner_email)
            }),
            performed_by_id: None, // system action
            details_json: Some(json!({
                "incident_id": candidate.incident_id,
                "due_date": candidate.due_date,
                "sent": ok,
            })),
        };
        if let Err(e) = AuditLogRepo::insert(pool, &audit).await {
            tracing::error!(
                action_id = candidate.action_id,
                error = %e,
                "Reminder sweep: audit insert failed"
            );
        }
    }

    tracing::info!(sent, failed, total = candidates.len(), "Reminder sweep finished");
}

/// Duration until the next `hour:minute` UTC, always in the future.
fn until_next_occurrence(hour: u32, minute: u32) -> Duration {
    let now = Utc::now();
    let target_time = NaiveTime::from_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(9, 0, 0).unwrap());

    let today_target = now.date_naive().and_time(target_time).and_utc();
    let next = if today_target > now {
        today_target
    } else {
        today_target + chrono::Duration::days(1)
    };

    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_occurrence_is_in_the_future_and_within_a_day() {
        for (hour, minute) in [(0, 0), (9, 0), (12, 30), (23, 59)] {
            let wait = until_next_occurrence(hour, minute);
            assert!(wait > Duration::ZERO);
            assert!(wait <= Duration::from_secs(24 * 3600));
        }
    }
}
