//! Handlers for corrective actions.
//!
//! Creation is gated on the parent incident being settled (RESOLVED or
//! CLOSED): remediation tasks only make sense once the incident outcome is
//! known.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::corrective::{self, CorrectiveActionStatus};
use vigil_core::error::CoreError;
use vigil_core::status::IncidentStatus;
use vigil_core::types::DbId;

use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::corrective_action::{
    CorrectiveAction, CreateCorrectiveAction, UpdateCorrectiveAction,
};
use vigil_db::repositories::{CorrectiveActionRepo, UserRepo};

use crate::error::AppResult;
use crate::handlers::incidents::find_incident;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /incidents/{id}/corrective-actions
///
/// Create a corrective action for a settled incident. The due date and owner
/// are validated before anything is written.
pub async fn create_action(
    State(state): State<AppState>,
    user: AuthUser,
    Path(incident_id): Path<DbId>,
    Json(mut dto): Json<CreateCorrectiveAction>,
) -> AppResult<Json<DataResponse<CorrectiveAction>>> {
    let incident = find_incident(&state, incident_id).await?;
    let status = IncidentStatus::parse(&incident.status)?;
    if !status.is_settled() {
        return Err(CoreError::Validation(format!(
            "Corrective actions require a RESOLVED or CLOSED incident, current status is {status}"
        ))
        .into());
    }

    // The path is authoritative; the body's incident_id is ignored.
    dto.incident_id = incident_id;

    let due_date = corrective::parse_due_date(&dto.due_date)?;

    let owner = UserRepo::find_by_id(&state.pool, dto.owner_user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: dto.owner_user_id,
        })?;
    if !owner.active {
        return Err(CoreError::Validation(format!(
            "User '{}' is inactive and cannot own corrective actions",
            owner.username
        ))
        .into());
    }

    let audit = NewAuditLog {
        entity_type: entity_types::CORRECTIVE_ACTION.into(),
        entity_id: None, // filled in by the repo
        action: AuditAction::Create.as_str().into(),
        description: Some(format!(
            "Created corrective action '{}' for incident {incident_id}",
            dto.title
        )),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({ "incident_id": incident_id, "due_date": dto.due_date })),
    };

    let action = CorrectiveActionRepo::create(&state.pool, &dto, due_date, audit).await?;
    Ok(Json(DataResponse { data: action }))
}

/// GET /incidents/{id}/corrective-actions
pub async fn list_actions(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(incident_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CorrectiveAction>>>> {
    find_incident(&state, incident_id).await?;
    let actions = CorrectiveActionRepo::list_for_incident(&state.pool, incident_id).await?;
    Ok(Json(DataResponse { data: actions }))
}

/// PUT /corrective-actions/{id}
///
/// Partial update. A status change into COMPLETED stamps `completed_at`
/// exactly once; re-completing keeps the original stamp, and reopening a
/// completed action preserves it too.
pub async fn update_action(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(dto): Json<UpdateCorrectiveAction>,
) -> AppResult<Json<DataResponse<CorrectiveAction>>> {
    let existing = CorrectiveActionRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "CorrectiveAction",
            id,
        })?;

    let due_date = match &dto.due_date {
        Some(raw) => Some(corrective::parse_due_date(raw)?),
        None => None,
    };

    let completed_at = match &dto.status {
        Some(raw) => {
            let new_status = CorrectiveActionStatus::parse(raw)?;
            Some(corrective::completion_stamp(
                new_status,
                existing.completed_at,
                chrono::Utc::now(),
            ))
        }
        None => None,
    };

    if let Some(owner_id) = dto.owner_user_id {
        let owner = UserRepo::find_by_id(&state.pool, owner_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: owner_id,
            })?;
        if !owner.active {
            return Err(CoreError::Validation(format!(
                "User '{}' is inactive and cannot own corrective actions",
                owner.username
            ))
            .into());
        }
    }

    let audit = NewAuditLog {
        entity_type: entity_types::CORRECTIVE_ACTION.into(),
        entity_id: Some(id),
        action: AuditAction::Update.as_str().into(),
        description: Some(format!("Updated corrective action {id}")),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({
            "status": dto.status,
            "due_date": dto.due_date,
        })),
    };

    let action =
        CorrectiveActionRepo::update(&state.pool, id, &dto, due_date, completed_at, &audit)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "CorrectiveAction",
                id,
            })?;

    Ok(Json(DataResponse { data: action }))
}
