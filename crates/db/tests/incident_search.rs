//! Integration tests for incident listing and advanced search.

use sqlx::PgPool;
use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::status::{Severity, TransitionStamp};
use vigil_core::timeline::event_types;
use vigil_core::types::DbId;
use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::bank::CreateBank;
use vigil_db::models::incident::{
    CreateIncident, Incident, IncidentListParams, IncidentSearchParams,
};
use vigil_db::models::timeline::NewTimelineEntry;
use vigil_db::models::user::CreateUser;
use vigil_db::repositories::{BankRepo, IncidentRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_bank(pool: &PgPool, name: &str) -> DbId {
    BankRepo::create(pool, &CreateBank { name: name.to_string() })
        .await
        .unwrap()
        .id
}

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            name: username.to_string(),
            email: format!("{username}@example.com"),
            role: "ADMIN".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn seed_incident(
    pool: &PgPool,
    bank_id: DbId,
    user_id: DbId,
    title: &str,
    service: &str,
    severity: Severity,
) -> Incident {
    let dto = CreateIncident {
        title: title.to_string(),
        description: format!("{title} details"),
        exception_text: None,
        bank_id,
        severity,
        service_name: service.to_string(),
        incident_manager_id: None,
        source: None,
        impact_summary: None,
    };
    IncidentRepo::create(
        pool,
        &dto,
        user_id,
        NewTimelineEntry {
            incident_id: 0, // filled in by the repo
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
}

/// Drive an incident through the full chain to RESOLVED.
async fn resolve(pool: &PgPool, incident: &Incident, user_id: DbId) {
    let steps = [
        ("OPEN", "ACKNOWLEDGED", TransitionStamp::AcknowledgedAt),
        ("ACKNOWLEDGED", "IN_PROGRESS", TransitionStamp::None),
        ("IN_PROGRESS", "RESOLVED", TransitionStamp::ResolvedAt),
    ];
    for (from, to, stamp) in steps {
        let timeline = NewTimelineEntry {
            incident_id: incident.id,
            event_type: event_types::STATUS_CHANGE.to_string(),
            event_description: format!("{from} -> {to}"),
            performed_by_id: Some(user_id),
            old_value: Some(from.to_string()),
            new_value: Some(to.to_string()),
        };
        let audit = NewAuditLog {
            entity_type: entity_types::INCIDENT.to_string(),
            entity_id: Some(incident.id),
            action: AuditAction::StatusChange.as_str().to_string(),
            description: None,
            performed_by_id: Some(user_id),
            details_json: None,
        };
        IncidentRepo::change_status(pool, incident.id, from, to, stamp, &timeline, &audit)
            .await
            .unwrap()
            .expect("transition should apply");
    }
}

// ---------------------------------------------------------------------------
// Test: Basic listing filters and counts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_by_bank_and_severity(pool: PgPool) {
    let bank_a = seed_bank(&pool, "Alpha Bank").await;
    let bank_b = seed_bank(&pool, "Beta Bank").await;
    let user_id = seed_user(&pool, "admin").await;

    seed_incident(&pool, bank_a, user_id, "Login outage", "auth", Severity::P1).await;
    seed_incident(&pool, bank_a, user_id, "Slow settlements", "settlement", Severity::P3).await;
    seed_incident(&pool, bank_b, user_id, "Card declines", "cards", Severity::P1).await;

    let params = IncidentListParams {
        bank_id: Some(bank_a),
        ..Default::default()
    };
    let items = IncidentRepo::list(&pool, &params, 50, 0).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.bank_id == bank_a));
    assert_eq!(IncidentRepo::count(&pool, &params).await.unwrap(), 2);

    let params = IncidentListParams {
        severity: Some("P1".to_string()),
        ..Default::default()
    };
    assert_eq!(IncidentRepo::count(&pool, &params).await.unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Test: Search text filters are case-insensitive substring matches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_search_title_is_case_insensitive_substring(pool: PgPool) {
    let bank_id = seed_bank(&pool, "Alpha Bank").await;
    let user_id = seed_user(&pool, "admin").await;

    seed_incident(&pool, bank_id, user_id, "Login outage", "auth", Severity::P1).await;
    seed_incident(&pool, bank_id, user_id, "Slow settlements", "settlement", Severity::P3).await;

    let params = IncidentSearchParams {
        title: Some("LOGIN".to_string()),
        ..Default::default()
    };
    let items = IncidentRepo::search(&pool, &params, 50, 0).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Login outage");
    assert_eq!(IncidentRepo::search_count(&pool, &params).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Test: Combined exact and boolean filters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_search_combines_exact_and_boolean_filters(pool: PgPool) {
    let bank_id = seed_bank(&pool, "Alpha Bank").await;
    let user_id = seed_user(&pool, "admin").await;

    let downtime_incident =
        seed_incident(&pool, bank_id, user_id, "Login outage", "auth", Severity::P1).await;
    seed_incident(&pool, bank_id, user_id, "Card declines", "cards", Severity::P1).await;

    // Flag downtime on one of the two P1 incidents.
    sqlx::query("UPDATE incidents SET downtime = TRUE, technical_decline_pct = 80 WHERE id = $1")
        .bind(downtime_incident.id)
        .execute(&pool)
        .await
        .unwrap();

    let params = IncidentSearchParams {
        severity: Some("P1".to_string()),
        downtime: Some(true),
        tech_decline_min: Some(50.0),
        ..Default::default()
    };
    let items = IncidentRepo::search(&pool, &params, 50, 0).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, downtime_incident.id);
}

// ---------------------------------------------------------------------------
// Test: Search pagination
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_search_paginates_newest_first(pool: PgPool) {
    let bank_id = seed_bank(&pool, "Alpha Bank").await;
    let user_id = seed_user(&pool, "admin").await;

    for i in 0..5 {
        seed_incident(
            &pool,
            bank_id,
            user_id,
            &format!("Incident {i}"),
            "auth",
            Severity::P2,
        )
        .await;
    }

    let params = IncidentSearchParams::default();
    let page1 = IncidentRepo::search(&pool, &params, 2, 0).await.unwrap();
    let page2 = IncidentRepo::search(&pool, &params, 2, 2).await.unwrap();
    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    assert!(page1[0].id > page1[1].id); // newest first
    assert!(page1[1].id > page2[0].id);
    assert_eq!(IncidentRepo::search_count(&pool, &params).await.unwrap(), 5);
}

// ---------------------------------------------------------------------------
// Test: Settled incident history for the advisory
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_settled_history_excludes_open_and_self(pool: PgPool) {
    let bank_id = seed_bank(&pool, "Alpha Bank").await;
    let user_id = seed_user(&pool, "admin").await;

    let current = seed_incident(&pool, bank_id, user_id, "Current", "auth", Severity::P1).await;
    let open = seed_incident(&pool, bank_id, user_id, "Still open", "auth", Severity::P2).await;
    let settled = seed_incident(&pool, bank_id, user_id, "Old outage", "auth", Severity::P2).await;
    resolve(&pool, &settled, user_id).await;

    let history = IncidentRepo::list_recent_settled_for_bank(&pool, bank_id, current.id, 50)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, settled.id);
    assert!(history.iter().all(|i| i.id != open.id && i.id != current.id));
}

// ---------------------------------------------------------------------------
// Test: Grouped counts for reporting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_status_and_severity_counts(pool: PgPool) {
    let bank_id = seed_bank(&pool, "Alpha Bank").await;
    let user_id = seed_user(&pool, "admin").await;

    seed_incident(&pool, bank_id, user_id, "A", "auth", Severity::P1).await;
    seed_incident(&pool, bank_id, user_id, "B", "auth", Severity::P1).await;
    let resolved = seed_incident(&pool, bank_id, user_id, "C", "auth", Severity::P3).await;
    resolve(&pool, &resolved, user_id).await;

    let from = chrono::Utc::now() - chrono::Duration::hours(1);
    let to = chrono::Utc::now() + chrono::Duration::hours(1);

    let by_status = IncidentRepo::status_counts(&pool, Some(bank_id), from, to)
        .await
        .unwrap();
    assert!(by_status.contains(&("OPEN".to_string(), 2)));
    assert!(by_status.contains(&("RESOLVED".to_string(), 1)));

    let by_severity = IncidentRepo::severity_counts(&pool, Some(bank_id), from, to)
        .await
        .unwrap();
    assert!(by_severity.contains(&("P1".to_string(), 2)));
    assert!(by_severity.contains(&("P3".to_string(), 1)));
}
