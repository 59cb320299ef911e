//! Handlers for postmortems. One per incident, editable only by
//! INCIDENT_MANAGER/ADMIN, and only once the incident is settled.

use axum::extract::{Path, State};
use axum::Json;

use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::error::CoreError;
use vigil_core::status::IncidentStatus;
use vigil_core::types::DbId;
use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::postmortem::{CreatePostmortem, Postmortem, UpdatePostmortem};
use vigil_db::repositories::PostmortemRepo;

use crate::error::AppResult;
use crate::handlers::incidents::find_incident;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireIncidentManager;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /incidents/{id}/postmortem (incident manager or admin)
pub async fn create_postmortem(
    State(state): State<AppState>,
    RequireIncidentManager(user): RequireIncidentManager,
    Path(incident_id): Path<DbId>,
    Json(mut dto): Json<CreatePostmortem>,
) -> AppResult<Json<DataResponse<Postmortem>>> {
    let incident = find_incident(&state, incident_id).await?;
    let status = IncidentStatus::parse(&incident.status)?;
    if !status.is_settled() {
        return Err(CoreError::Validation(format!(
            "Postmortems require a RESOLVED or CLOSED incident, current status is {status}"
        ))
        .into());
    }

    // The path is authoritative; the body's incident_id is ignored.
    dto.incident_id = incident_id;

    let audit = NewAuditLog {
        entity_type: entity_types::POSTMORTEM.into(),
        entity_id: None, // filled in by the repo
        action: AuditAction::Create.as_str().into(),
        description: Some(format!("Created postmortem for incident {incident_id}")),
        performed_by_id: Some(user.user_id),
        details_json: None,
    };

    // A second postmortem surfaces as 409 via uq_postmortems_incident_id.
    let postmortem = PostmortemRepo::create(&state.pool, &dto, user.user_id, audit).await?;
    Ok(Json(DataResponse { data: postmortem }))
}

/// GET /incidents/{id}/postmortem
pub async fn get_postmortem(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(incident_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Postmortem>>> {
    find_incident(&state, incident_id).await?;
    let postmortem = PostmortemRepo::find_by_incident(&state.pool, incident_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Postmortem",
            id: incident_id,
        })?;
    Ok(Json(DataResponse { data: postmortem }))
}

/// PUT /incidents/{id}/postmortem (incident manager or admin)
pub async fn update_postmortem(
    State(state): State<AppState>,
    RequireIncidentManager(user): RequireIncidentManager,
    Path(incident_id): Path<DbId>,
    Json(dto): Json<UpdatePostmortem>,
) -> AppResult<Json<DataResponse<Postmortem>>> {
    find_incident(&state, incident_id).await?;

    let audit = NewAuditLog {
        entity_type: entity_types::POSTMORTEM.into(),
        entity_id: Some(incident_id),
        action: AuditAction::Update.as_str().into(),
        description: Some(format!("Updated postmortem for incident {incident_id}")),
        performed_by_id: Some(user.user_id),
        details_json: None,
    };

    let postmortem = PostmortemRepo::update_by_incident(&state.pool, incident_id, &dto, &audit)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Postmortem",
            id: incident_id,
        })?;
    Ok(Json(DataResponse { data: postmortem }))
}
