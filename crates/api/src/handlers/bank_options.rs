//! Handlers for bank technical configuration. One record per bank with the
//! infrastructure details consulted during incident response; creation and
//! edits are admin-only and audited.

use axum::extract::{Path, State};
use axum::Json;

use vigil_core::architecture::ReconTechnology;
use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::error::CoreError;
use vigil_core::roles;
use vigil_core::types::DbId;
use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::bank_option::{BankOption, CreateBankOption, UpdateBankOption};
use vigil_db::repositories::{BankOptionRepo, BankRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /bank-options
pub async fn list_bank_options(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<BankOption>>>> {
    let options = BankOptionRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: options }))
}

/// GET /bank-options/{bank_id}
///
/// The bank must exist; a bank without a configuration record yet returns
/// null data rather than 404 so clients can render an empty form.
pub async fn get_bank_option(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(bank_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<BankOption>>>> {
    find_bank(&state, bank_id).await?;
    let option = BankOptionRepo::find_by_bank_id(&state.pool, bank_id).await?;
    Ok(Json(DataResponse { data: option }))
}

/// POST /bank-options (admin only)
pub async fn create_bank_option(
    State(state): State<AppState>,
    user: AuthUser,
    Json(dto): Json<CreateBankOption>,
) -> AppResult<Json<DataResponse<BankOption>>> {
    if !roles::can_create_bank_option(user.role) {
        return Err(CoreError::Forbidden("Only ADMIN can create bank options".into()).into());
    }
    find_bank(&state, dto.bank_id).await?;
    if let Some(ref tech) = dto.recon_technology {
        ReconTechnology::parse(tech)?;
    }

    let audit = NewAuditLog {
        entity_type: entity_types::BANK_OPTION.into(),
        entity_id: None, // filled in by the repo
        action: AuditAction::Create.as_str().into(),
        description: Some(format!("Created bank option for bank {}", dto.bank_id)),
        performed_by_id: Some(user.user_id),
        details_json: None,
    };

    // A second record surfaces as 409 via uq_bank_options_bank_id.
    let option = BankOptionRepo::create(&state.pool, &dto, user.user_id, audit).await?;
    Ok(Json(DataResponse { data: option }))
}

/// PUT /bank-options/{bank_id} (admin only)
pub async fn update_bank_option(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bank_id): Path<DbId>,
    Json(dto): Json<UpdateBankOption>,
) -> AppResult<Json<DataResponse<BankOption>>> {
    if !roles::can_manage_architecture(user.role) {
        return Err(CoreError::Forbidden("Only ADMIN can update bank options".into()).into());
    }
    find_bank(&state, bank_id).await?;
    if let Some(ref tech) = dto.recon_technology {
        ReconTechnology::parse(tech)?;
    }

    let audit = NewAuditLog {
        entity_type: entity_types::BANK_OPTION.into(),
        entity_id: None,
        action: AuditAction::Update.as_str().into(),
        description: Some(format!("Updated bank option for bank {bank_id}")),
        performed_by_id: Some(user.user_id),
        details_json: None,
    };

    let option = BankOptionRepo::update_by_bank_id(&state.pool, bank_id, &dto, user.user_id, &audit)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "BankOption",
            id: bank_id,
        })?;
    Ok(Json(DataResponse { data: option }))
}

/// Load a bank or fail with 404.
async fn find_bank(state: &AppState, bank_id: DbId) -> AppResult<()> {
    BankRepo::find_by_id(&state.pool, bank_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Bank",
            id: bank_id,
        })?;
    Ok(())
}
