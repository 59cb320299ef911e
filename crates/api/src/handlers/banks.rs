//! Handlers for bank management. Creation and deactivation are admin-only.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::error::CoreError;
use vigil_core::types::DbId;
use vigil_db::models::bank::{Bank, CreateBank};
use vigil_db::models::audit::NewAuditLog;
use vigil_db::repositories::{AuditLogRepo, BankRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /banks (admin only)
pub async fn create_bank(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(dto): Json<CreateBank>,
) -> AppResult<Json<DataResponse<Bank>>> {
    if dto.name.trim().is_empty() {
        return Err(CoreError::Validation("Bank name must not be empty".into()).into());
    }

    // Duplicate names surface as 409 via the uq_banks_name constraint.
    let bank = BankRepo::create(&state.pool, &dto).await?;

    let audit = NewAuditLog {
        entity_type: entity_types::BANK.into(),
        entity_id: Some(bank.id),
        action: AuditAction::Create.as_str().into(),
        description: Some(format!("Created bank '{}'", bank.name)),
        performed_by_id: Some(admin.user_id),
        details_json: None,
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse { data: bank }))
}

/// GET /banks
pub async fn list_banks(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Bank>>>> {
    let banks = BankRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: banks }))
}

/// Request body for activating/deactivating a bank.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// PUT /banks/{id}/active (admin only)
pub async fn set_bank_active(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(req): Json<SetActiveRequest>,
) -> AppResult<Json<DataResponse<Bank>>> {
    let bank = BankRepo::set_active(&state.pool, id, req.active)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Bank",
            id,
        })?;

    let audit = NewAuditLog {
        entity_type: entity_types::BANK.into(),
        entity_id: Some(id),
        action: AuditAction::Update.as_str().into(),
        description: Some(format!(
            "Bank '{}' marked {}",
            bank.name,
            if req.active { "active" } else { "inactive" }
        )),
        performed_by_id: Some(admin.user_id),
        details_json: Some(json!({ "active": req.active })),
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse { data: bank }))
}
