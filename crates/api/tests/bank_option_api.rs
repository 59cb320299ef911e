//! HTTP-level integration tests for bank technical configuration records.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth, put_json_auth};
use sqlx::PgPool;

/// Creation and edits are ADMIN-only; any authenticated user can read.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_bank_option_admin_gating(pool: PgPool) {
    let bank_id = common::seed_bank(&pool, "Acme Bank").await;
    let manager = common::seed_user(&pool, "manager", "INCIDENT_MANAGER").await;
    let admin = common::seed_user(&pool, "admin", "ADMIN").await;
    let manager_token = common::token_for(&manager);
    let admin_token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "bank_id": bank_id, "db_type": "PostgreSQL" });

    let response =
        post_json_auth(app.clone(), "/api/v1/bank-options", &manager_token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(app.clone(), "/api/v1/bank-options", &admin_token, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/bank-options/{bank_id}"),
        &manager_token,
        serde_json::json!({ "db_type": "Oracle" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reads are open to any authenticated role.
    let response = get_auth(
        app,
        &format!("/api/v1/bank-options/{bank_id}"),
        &manager_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["db_type"], "PostgreSQL");
}

/// Omitted flags default to false, one record per bank is enforced, and a
/// bank without a record reads back as null data.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_bank_option_create_defaults_and_uniqueness(pool: PgPool) {
    let bank_id = common::seed_bank(&pool, "Acme Bank").await;
    let bare_bank_id = common::seed_bank(&pool, "Beta Bank").await;
    let admin = common::seed_user(&pool, "admin", "ADMIN").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/bank-options",
        &token,
        serde_json::json!({
            "bank_id": bank_id,
            "transaction_volume_per_day": 250_000,
            "number_of_app_servers": 4,
            "redis_enabled": true,
            "redis_description": "Session cache",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["bank_id"], bank_id);
    assert_eq!(json["data"]["redis_enabled"], true);
    assert_eq!(json["data"]["aerospike_enabled"], false);
    assert_eq!(json["data"]["recon_enabled"], false);
    assert_eq!(json["data"]["updated_by_id"], admin.id);

    // Second record for the same bank conflicts.
    let response = post_json_auth(
        app.clone(),
        "/api/v1/bank-options",
        &token,
        serde_json::json!({ "bank_id": bank_id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A bank with no record yet reads back as null, not 404.
    let response = get_auth(
        app.clone(),
        &format!("/api/v1/bank-options/{bare_bank_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());

    // An unknown bank is a 404 on every verb.
    let response = get_auth(app.clone(), "/api/v1/bank-options/99999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json_auth(
        app,
        "/api/v1/bank-options",
        &token,
        serde_json::json!({ "bank_id": 99999 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// recon_technology only accepts the known values.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_bank_option_recon_technology_validated(pool: PgPool) {
    let bank_id = common::seed_bank(&pool, "Acme Bank").await;
    let admin = common::seed_user(&pool, "admin", "ADMIN").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/bank-options",
        &token,
        serde_json::json!({
            "bank_id": bank_id,
            "recon_enabled": true,
            "recon_technology": "spark",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app,
        "/api/v1/bank-options",
        &token,
        serde_json::json!({
            "bank_id": bank_id,
            "recon_enabled": true,
            "recon_technology": "pandas",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["recon_technology"], "pandas");
}

/// Partial updates keep untouched fields, stamp the editor, and both writes
/// leave BANK_OPTION audit records.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_bank_option_partial_update_and_audit(pool: PgPool) {
    let bank_id = common::seed_bank(&pool, "Acme Bank").await;
    let admin = common::seed_user(&pool, "admin", "ADMIN").await;
    let second_admin = common::seed_user(&pool, "admin2", "ADMIN").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app.clone(),
        "/api/v1/bank-options",
        &token,
        serde_json::json!({
            "bank_id": bank_id,
            "db_type": "PostgreSQL",
            "number_of_db_instances": 2,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Updating before any record exists is a 404.
    let orphan_bank = common::seed_bank(&pool, "Beta Bank").await;
    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/bank-options/{orphan_bank}"),
        &token,
        serde_json::json!({ "db_type": "Oracle" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/bank-options/{bank_id}"),
        &common::token_for(&second_admin),
        serde_json::json!({ "number_of_db_instances": 3 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["db_type"], "PostgreSQL");
    assert_eq!(json["data"]["number_of_db_instances"], 3);
    assert_eq!(json["data"]["updated_by_id"], second_admin.id);

    let actions: Vec<String> = sqlx::query_scalar(
        "SELECT action FROM audit_logs WHERE entity_type = 'BANK_OPTION' ORDER BY id",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(actions, vec!["CREATE", "UPDATE"]);

    // The list endpoint returns the single record.
    let response = get_auth(app, "/api/v1/bank-options", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["bank_id"], bank_id);
}
