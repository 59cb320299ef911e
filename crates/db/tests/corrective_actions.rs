//! Integration tests for corrective actions and the reminder query.

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::status::Severity;
use vigil_core::timeline::event_types;
use vigil_core::types::DbId;
use vigil_db::models::audit::{AuditQuery, NewAuditLog};
use vigil_db::models::bank::CreateBank;
use vigil_db::models::corrective_action::{
    CorrectiveAction, CreateCorrectiveAction, UpdateCorrectiveAction,
};
use vigil_db::models::incident::CreateIncident;
use vigil_db::models::timeline::NewTimelineEntry;
use vigil_db::models::user::CreateUser;
use vigil_db::repositories::{
    AuditLogRepo, BankRepo, CorrectiveActionRepo, IncidentRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            name: username.to_string(),
            email: format!("{username}@example.com"),
            role: "INCIDENT_MANAGER".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_incident(pool: &PgPool, user_id: DbId) -> DbId {
    let bank_id = BankRepo::create(pool, &CreateBank { name: "Acme Bank".to_string() })
        .await
        .unwrap()
        .id;
    let dto = CreateIncident {
        title: "Gateway outage".to_string(),
        description: "Payment gateway returned 502".to_string(),
        exception_text: None,
        bank_id,
        severity: Severity::P2,
        service_name: "payments".to_string(),
        incident_manager_id: None,
        source: None,
        impact_summary: None,
    };
    IncidentRepo::create(
        pool,
        &dto,
        user_id,
        NewTimelineEntry {
            incident_id: 0,
            event_type: event_types::CREATE.to_string(),
            event_description: "Incident created".to_string(),
            performed_by_id: Some(user_id),
            old_value: None,
            new_value: None,
        },
        NewAuditLog {
            entity_type: entity_types::INCIDENT.to_string(),
            entity_id: None,
            action: AuditAction::Create.as_str().to_string(),
            description: None,
            performed_by_id: Some(user_id),
            details_json: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn action_audit(action: AuditAction, user_id: DbId) -> NewAuditLog {
    NewAuditLog {
        entity_type: entity_types::CORRECTIVE_ACTION.to_string(),
        entity_id: None, // filled in by the repo
        action: action.as_str().to_string(),
        description: None,
        performed_by_id: Some(user_id),
        details_json: None,
    }
}

async fn seed_action(
    pool: &PgPool,
    incident_id: DbId,
    owner_id: DbId,
    due_date: NaiveDate,
    title: &str,
) -> CorrectiveAction {
    let dto = CreateCorrectiveAction {
        incident_id,
        title: title.to_string(),
        description: "Add retry with backoff".to_string(),
        owner_user_id: owner_id,
        due_date: due_date.to_string(),
    };
    CorrectiveActionRepo::create(pool, &dto, due_date, action_audit(AuditAction::Create, owner_id))
        .await
        .unwrap()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ---------------------------------------------------------------------------
// Test: Create writes the row and its audit record together
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_writes_row_and_audit(pool: PgPool) {
    let owner = seed_user(&pool, "mallory").await;
    let incident_id = seed_incident(&pool, owner).await;

    let action = seed_action(&pool, incident_id, owner, today(), "Add retries").await;
    assert_eq!(action.status, "OPEN");
    assert_eq!(action.incident_id, incident_id);
    assert!(action.completed_at.is_none());

    let audits = AuditLogRepo::count(
        &pool,
        &AuditQuery {
            entity_type: Some(entity_types::CORRECTIVE_ACTION.to_string()),
            entity_id: Some(action.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(audits, 1);
}

// ---------------------------------------------------------------------------
// Test: Listing is soonest-due first
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_list_orders_by_due_date(pool: PgPool) {
    let owner = seed_user(&pool, "mallory").await;
    let incident_id = seed_incident(&pool, owner).await;

    let later = seed_action(&pool, incident_id, owner, today() + Duration::days(14), "Later").await;
    let sooner = seed_action(&pool, incident_id, owner, today() + Duration::days(3), "Sooner").await;

    let actions = CorrectiveActionRepo::list_for_incident(&pool, incident_id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].id, sooner.id);
    assert_eq!(actions[1].id, later.id);
}

// ---------------------------------------------------------------------------
// Test: completed_at levels of optionality
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_completed_at_set_preserved_and_cleared(pool: PgPool) {
    let owner = seed_user(&pool, "mallory").await;
    let incident_id = seed_incident(&pool, owner).await;
    let action = seed_action(&pool, incident_id, owner, today(), "Add retries").await;

    // Completing stamps completed_at.
    let completed_stamp = Utc::now();
    let dto = UpdateCorrectiveAction {
        status: Some("COMPLETED".to_string()),
        ..Default::default()
    };
    let updated = CorrectiveActionRepo::update(
        &pool,
        action.id,
        &dto,
        None,
        Some(Some(completed_stamp)),
        &action_audit(AuditAction::Update, owner),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.status, "COMPLETED");
    let stamped = updated.completed_at.expect("completed_at should be set");

    // An update that does not touch status leaves the stamp alone.
    let dto = UpdateCorrectiveAction {
        title: Some("Add retries with backoff".to_string()),
        ..Default::default()
    };
    let updated = CorrectiveActionRepo::update(
        &pool,
        action.id,
        &dto,
        None,
        None,
        &action_audit(AuditAction::Update, owner),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.completed_at, Some(stamped));

    // Reopening clears it.
    let dto = UpdateCorrectiveAction {
        status: Some("IN_PROGRESS".to_string()),
        ..Default::default()
    };
    let updated = CorrectiveActionRepo::update(
        &pool,
        action.id,
        &dto,
        None,
        Some(None),
        &action_audit(AuditAction::Update, owner),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.status, "IN_PROGRESS");
    assert!(updated.completed_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_missing_action_returns_none(pool: PgPool) {
    let owner = seed_user(&pool, "mallory").await;

    let result = CorrectiveActionRepo::update(
        &pool,
        9999,
        &UpdateCorrectiveAction::default(),
        None,
        None,
        &action_audit(AuditAction::Update, owner),
    )
    .await
    .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Test: Reminder query selects every incomplete action with an active owner
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_reminder_query_filters(pool: PgPool) {
    let owner = seed_user(&pool, "mallory").await;
    let inactive_owner = seed_user(&pool, "ghost").await;
    let incident_id = seed_incident(&pool, owner).await;

    let overdue = seed_action(&pool, incident_id, owner, today() - Duration::days(2), "Overdue").await;
    let future = seed_action(&pool, incident_id, owner, today() + Duration::days(7), "Future").await;
    let done = seed_action(&pool, incident_id, owner, today() - Duration::days(5), "Done").await;
    let orphaned =
        seed_action(&pool, incident_id, inactive_owner, today() - Duration::days(1), "Orphaned").await;

    CorrectiveActionRepo::update(
        &pool,
        done.id,
        &UpdateCorrectiveAction {
            status: Some("COMPLETED".to_string()),
            ..Default::default()
        },
        None,
        Some(Some(Utc::now())),
        &action_audit(AuditAction::Update, owner),
    )
    .await
    .unwrap();

    sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(inactive_owner)
        .execute(&pool)
        .await
        .unwrap();

    // Not-yet-due actions are still reminded; only completed actions and
    // inactive owners drop out. Soonest due date first.
    let candidates = CorrectiveActionRepo::list_needing_reminder(&pool).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].action_id, overdue.id);
    assert_eq!(candidates[1].action_id, future.id);
    assert_eq!(candidates[0].incident_id, incident_id);
    assert_eq!(candidates[0].owner_email, "mallory@example.com");
    assert!(candidates.iter().all(|c| c.action_id != orphaned.id));
    assert!(candidates.iter().all(|c| c.action_id != done.id));
}
