//! HTTP-level integration tests for login, admin user management, bank
//! administration, and the audit log endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json, post_json_auth, put_json_auth};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Successful login returns a token and the user's public view.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let user = common::seed_user(&pool, "alice", "SUPPORT_L2").await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "username": "alice", "password": common::TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["token"].is_string());
    assert_eq!(json["data"]["user"]["id"], user.id);
    assert_eq!(json["data"]["user"]["role"], "SUPPORT_L2");
    // The password hash never appears in a response.
    assert!(json["data"]["user"].get("password_hash").is_none());
}

/// Wrong password, unknown user, and inactive user all get the same 401.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_failures_are_uniform(pool: PgPool) {
    let user = common::seed_user(&pool, "alice", "SUPPORT_L2").await;
    sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let cases = [
        serde_json::json!({ "username": "alice", "password": common::TEST_PASSWORD }), // inactive
        serde_json::json!({ "username": "alice", "password": "wrong" }),
        serde_json::json!({ "username": "ghost", "password": "whatever" }),
    ];
    for body in cases {
        let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid username or password");
    }
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

/// Admins can create users; the new credentials work for login.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_creates_user(pool: PgPool) {
    let admin = common::seed_user(&pool, "root", "ADMIN").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/users",
        &token,
        serde_json::json!({
            "username": "newbie",
            "password": "a_long_enough_password",
            "name": "New Person",
            "email": "newbie@test.com",
            "role": "SME",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "newbie");
    assert_eq!(json["data"]["role"], "SME");

    let response = post_json(
        app,
        "/api/v1/auth/login",
        serde_json::json!({ "username": "newbie", "password": "a_long_enough_password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Non-admins cannot reach the admin endpoints.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_endpoints_forbidden_for_non_admin(pool: PgPool) {
    let manager = common::seed_user(&pool, "manager", "INCIDENT_MANAGER").await;
    let token = common::token_for(&manager);
    let app = common::build_test_app(pool);

    let response = get_auth(app.clone(), "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/admin/audit-logs", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Short passwords and unknown roles are rejected.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_user_validation(pool: PgPool) {
    let admin = common::seed_user(&pool, "root", "ADMIN").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/users",
        &token,
        serde_json::json!({
            "username": "x", "password": "short", "name": "X",
            "email": "x@test.com", "role": "SME",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app,
        "/api/v1/admin/users",
        &token,
        serde_json::json!({
            "username": "x", "password": "a_long_enough_password", "name": "X",
            "email": "x@test.com", "role": "SUPERUSER",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Duplicate usernames surface as 409 via the unique constraint.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_duplicate_username_conflict(pool: PgPool) {
    let admin = common::seed_user(&pool, "root", "ADMIN").await;
    common::seed_user(&pool, "taken", "SME").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/admin/users",
        &token,
        serde_json::json!({
            "username": "taken", "password": "a_long_enough_password", "name": "X",
            "email": "taken2@test.com", "role": "SME",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Banks
// ---------------------------------------------------------------------------

/// Bank creation is admin-only, duplicates conflict, and deactivation works.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_bank_administration(pool: PgPool) {
    let admin = common::seed_user(&pool, "root", "ADMIN").await;
    let support = common::seed_user(&pool, "support", "SUPPORT_L2").await;
    let admin_token = common::token_for(&admin);
    let support_token = common::token_for(&support);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/banks",
        &support_token,
        serde_json::json!({ "name": "Acme Bank" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/banks",
        &admin_token,
        serde_json::json!({ "name": "Acme Bank" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bank = body_json(response).await;
    let bank_id = bank["data"]["id"].as_i64().unwrap();
    assert_eq!(bank["data"]["active"], true);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/banks",
        &admin_token,
        serde_json::json!({ "name": "Acme Bank" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/banks/{bank_id}/active"),
        &admin_token,
        serde_json::json!({ "active": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bank = body_json(response).await;
    assert_eq!(bank["data"]["active"], false);

    // Any authenticated user can list banks.
    let response = get_auth(app, "/api/v1/banks", &support_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Audit log endpoint
// ---------------------------------------------------------------------------

/// Admins can filter the audit trail by action.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_audit_log_query(pool: PgPool) {
    let admin = common::seed_user(&pool, "root", "ADMIN").await;
    let token = common::token_for(&admin);
    let app = common::build_test_app(pool);

    // Log in twice to produce LOGIN audit records.
    for _ in 0..2 {
        let response = post_json(
            app.clone(),
            "/api/v1/auth/login",
            serde_json::json!({ "username": "root", "password": common::TEST_PASSWORD }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get_auth(app, "/api/v1/admin/audit-logs?action=LOGIN", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["items"][0]["action"], "LOGIN");
    assert_eq!(json["data"]["items"][0]["performed_by_id"], admin.id);
}
