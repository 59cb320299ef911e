//! Handlers for login/logout and admin user management.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::error::CoreError;
use vigil_core::roles::Role;
use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::user::{CreateUser, UserView};
use vigil_db::repositories::{AuditLogRepo, UserRepo};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Minimum accepted password length for new accounts.
const MIN_PASSWORD_LENGTH: usize = 12;

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response payload for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// POST /auth/login
///
/// The failure message never distinguishes a missing user from a wrong
/// password.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid username or password".into()));

    let user = UserRepo::find_by_username(&state.pool, &req.username)
        .await?
        .ok_or_else(invalid)?;
    if !user.active {
        return Err(invalid());
    }

    let verified = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))?;
    if !verified {
        return Err(invalid());
    }

    let token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("token generation failed: {e}")))?;

    let audit = NewAuditLog {
        entity_type: entity_types::USER.into(),
        entity_id: Some(user.id),
        action: AuditAction::Login.as_str().into(),
        description: Some(format!("User '{}' logged in", user.username)),
        performed_by_id: Some(user.id),
        details_json: None,
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse {
        data: LoginResponse {
            token,
            user: user.into(),
        },
    }))
}

/// POST /auth/logout
///
/// Tokens are stateless, so logout only leaves an audit record.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<()>>> {
    let audit = NewAuditLog {
        entity_type: entity_types::USER.into(),
        entity_id: Some(user.user_id),
        action: AuditAction::Logout.as_str().into(),
        description: Some(format!("User {} logged out", user.user_id)),
        performed_by_id: Some(user.user_id),
        details_json: None,
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse { data: () }))
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

/// Request body for creating a user. The plaintext password is hashed here
/// and never stored.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// POST /admin/users (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<Json<DataResponse<UserView>>> {
    Role::parse(&req.role)?;
    if req.username.trim().is_empty() {
        return Err(CoreError::Validation("username must not be empty".into()).into());
    }
    if req.password.len() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ))
        .into());
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::InternalError(format!("password hashing failed: {e}")))?;

    let dto = CreateUser {
        username: req.username,
        password_hash,
        name: req.name,
        email: req.email,
        role: req.role,
    };

    // Duplicate usernames surface as 409 via the uq_users_username constraint.
    let user = UserRepo::create(&state.pool, &dto).await?;

    let audit = NewAuditLog {
        entity_type: entity_types::USER.into(),
        entity_id: Some(user.id),
        action: AuditAction::Create.as_str().into(),
        description: Some(format!(
            "Created user '{}' with role {}",
            user.username, user.role
        )),
        performed_by_id: Some(admin.user_id),
        details_json: None,
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse { data: user.into() }))
}

/// GET /admin/users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserView>>>> {
    let users = UserRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse {
        data: users.into_iter().map(UserView::from).collect(),
    }))
}
