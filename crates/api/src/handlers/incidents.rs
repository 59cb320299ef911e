//! Handlers for the incident lifecycle: registration, updates, status
//! transitions, comments, timeline, search, and the similar-incident
//! advisory.
//!
//! Every mutation goes through a repository method that writes the incident
//! row, its timeline entries, and the audit record in one transaction.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::error::CoreError;
use vigil_core::search::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use vigil_core::status::{validate_transition, IncidentStatus};
use vigil_core::timeline::event_types;
use vigil_core::types::DbId;
use vigil_core::{impact, roles};

use vigil_advisory::{IncidentDigest, SimilarFindings};
use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::incident::{
    CreateIncident, Incident, IncidentListParams, IncidentPage, IncidentSearchParams,
    UpdateIncident,
};
use vigil_db::models::timeline::{NewTimelineEntry, TimelineEntry};
use vigil_db::repositories::{
    AdviceRepo, AuditLogRepo, BankRepo, IncidentRepo, TimelineRepo, UserRepo,
};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum number of settled incidents gathered as advisory history.
const ADVISORY_HISTORY_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /incidents
///
/// Register a new incident. The bank must exist and be active; an explicit
/// incident manager must hold an eligible role. The creation timeline entry
/// and audit record commit with the row.
pub async fn create_incident(
    State(state): State<AppState>,
    user: AuthUser,
    Json(dto): Json<CreateIncident>,
) -> AppResult<Json<DataResponse<Incident>>> {
    if dto.title.trim().is_empty() {
        return Err(CoreError::Validation("title must not be empty".into()).into());
    }

    let bank = BankRepo::find_by_id(&state.pool, dto.bank_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Bank",
            id: dto.bank_id,
        })?;
    if !bank.active {
        return Err(CoreError::Validation(format!(
            "Bank '{}' is inactive and cannot receive incidents",
            bank.name
        ))
        .into());
    }

    if let Some(manager_id) = dto.incident_manager_id {
        let eligible = UserRepo::find_eligible_manager(&state.pool, manager_id).await?;
        if eligible.is_none() {
            return Err(CoreError::Validation(format!(
                "User {manager_id} cannot be assigned as incident manager"
            ))
            .into());
        }
    }

    let timeline = NewTimelineEntry {
        incident_id: 0, // filled in by the repo once the row exists
        event_type: event_types::CREATE.into(),
        event_description: format!("Incident '{}' registered", dto.title),
        performed_by_id: Some(user.user_id),
        old_value: None,
        new_value: Some(IncidentStatus::Open.as_str().into()),
    };
    let audit = NewAuditLog {
        entity_type: entity_types::INCIDENT.into(),
        entity_id: None, // filled in by the repo
        action: AuditAction::Create.as_str().into(),
        description: Some(format!("Created incident '{}'", dto.title)),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({ "bank_id": dto.bank_id, "severity": dto.severity })),
    };

    let incident = IncidentRepo::create(&state.pool, &dto, user.user_id, timeline, audit).await?;

    tracing::info!(incident_id = incident.id, bank_id = incident.bank_id, "Incident created");

    // Kick off the similarity advisory after the commit. Best-effort: the
    // create result is already final, so any failure here only gets logged.
    if state.advisory.is_some() {
        let task_state = state.clone();
        let snapshot = incident.clone();
        let actor = user.user_id;
        tokio::spawn(async move {
            let incident_id = snapshot.id;
            if let Err(e) = run_similar_analysis(&task_state, &snapshot, actor).await {
                tracing::warn!(incident_id, error = %e, "Post-create advisory analysis failed");
            }
        });
    }

    Ok(Json(DataResponse { data: incident }))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /incidents/{id}
pub async fn get_incident(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Incident>>> {
    let incident = find_incident(&state, id).await?;
    Ok(Json(DataResponse { data: incident }))
}

/// GET /incidents
pub async fn list_incidents(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<IncidentListParams>,
) -> AppResult<Json<DataResponse<IncidentPage>>> {
    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);

    let items = IncidentRepo::list(&state.pool, &params, limit, offset).await?;
    let total = IncidentRepo::count(&state.pool, &params).await?;

    Ok(Json(DataResponse {
        data: IncidentPage { items, total },
    }))
}

/// GET /incidents/{id}/timeline
///
/// The incident's append-only event history, oldest first.
pub async fn get_timeline(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TimelineEntry>>>> {
    find_incident(&state, id).await?;
    let entries = TimelineRepo::list_for_incident(&state.pool, id).await?;
    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /incidents/{id}
///
/// Partial update. Touching any impact field (downtime, financial_impact,
/// technical_decline_pct) requires INCIDENT_MANAGER/ADMIN and rejects the
/// whole request otherwise; nothing is written. A reassignment to an
/// ineligible manager is skipped silently, matching operator expectations
/// that a bad dropdown choice must not lose the rest of the edit.
pub async fn update_incident(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(mut dto): Json<UpdateIncident>,
) -> AppResult<Json<DataResponse<Incident>>> {
    let existing = find_incident(&state, id).await?;

    if dto.touches_impact_fields() && !roles::can_update_impact_fields(user.role) {
        return Err(CoreError::Forbidden(
            "Only INCIDENT_MANAGER or ADMIN can change impact fields".into(),
        )
        .into());
    }
    if let Some(pct) = dto.technical_decline_pct {
        impact::validate_technical_decline_pct(pct)?;
    }

    let mut timeline_entries = Vec::new();

    if let Some(manager_id) = dto.incident_manager_id {
        if existing.incident_manager_id == Some(manager_id) {
            dto.incident_manager_id = None;
        } else {
            match UserRepo::find_eligible_manager(&state.pool, manager_id).await? {
                Some(manager) => {
                    timeline_entries.push(NewTimelineEntry {
                        incident_id: id,
                        event_type: event_types::ASSIGNMENT.into(),
                        event_description: format!(
                            "Incident manager set to {}",
                            manager.username
                        ),
                        performed_by_id: Some(user.user_id),
                        old_value: existing.incident_manager_id.map(|v| v.to_string()),
                        new_value: Some(manager_id.to_string()),
                    });
                }
                None => {
                    tracing::warn!(
                        incident_id = id,
                        manager_id,
                        "Skipping reassignment to ineligible incident manager"
                    );
                    dto.incident_manager_id = None;
                }
            }
        }
    }

    if let Some(owner_id) = dto.current_owner_id {
        if existing.current_owner_id != Some(owner_id) {
            timeline_entries.push(NewTimelineEntry {
                incident_id: id,
                event_type: event_types::ASSIGNMENT.into(),
                event_description: format!("Current owner set to user {owner_id}"),
                performed_by_id: Some(user.user_id),
                old_value: existing.current_owner_id.map(|v| v.to_string()),
                new_value: Some(owner_id.to_string()),
            });
        }
    }

    let changes = collect_changes(&existing, &dto);
    let audit = NewAuditLog {
        entity_type: entity_types::INCIDENT.into(),
        entity_id: Some(id),
        action: AuditAction::Update.as_str().into(),
        description: Some(format!("Updated incident {id}")),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({ "changes": changes })),
    };

    let incident = IncidentRepo::update(&state.pool, id, &dto, &timeline_entries, &audit)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Incident",
            id,
        })?;

    Ok(Json(DataResponse { data: incident }))
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: IncidentStatus,
    /// Optional free-text note recorded in the timeline entry.
    pub comment: Option<String>,
}

/// POST /incidents/{id}/status
///
/// Drive the incident one step along OPEN -> ACKNOWLEDGED -> IN_PROGRESS ->
/// RESOLVED -> CLOSED. The transition engine decides legality and the role
/// gate; the repository stamps the lifecycle timestamp and writes the
/// timeline entry and audit record in the same transaction, guarded on the
/// status this handler validated against.
pub async fn change_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(req): Json<ChangeStatusRequest>,
) -> AppResult<Json<DataResponse<Incident>>> {
    let existing = find_incident(&state, id).await?;
    let current = IncidentStatus::parse(&existing.status)?;
    let target = req.status;

    let stamp = validate_transition(current, target, user.role)?;

    let mut description = format!("Status changed from {current} to {target}");
    if let Some(comment) = req.comment.as_deref().filter(|c| !c.trim().is_empty()) {
        description.push_str(": ");
        description.push_str(comment.trim());
    }

    let timeline = NewTimelineEntry {
        incident_id: id,
        event_type: event_types::STATUS_CHANGE.into(),
        event_description: description,
        performed_by_id: Some(user.user_id),
        old_value: Some(current.as_str().into()),
        new_value: Some(target.as_str().into()),
    };
    let audit = NewAuditLog {
        entity_type: entity_types::INCIDENT.into(),
        entity_id: Some(id),
        action: AuditAction::StatusChange.as_str().into(),
        description: Some(format!("Status {current} -> {target}")),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({ "from": current, "to": target })),
    };

    let updated = IncidentRepo::change_status(
        &state.pool,
        id,
        current.as_str(),
        target.as_str(),
        stamp,
        &timeline,
        &audit,
    )
    .await?;

    match updated {
        Some(incident) => Ok(Json(DataResponse { data: incident })),
        // The compare-and-set guard missed: another writer moved the incident
        // between our validation read and the update.
        None => Err(CoreError::Conflict(format!(
            "Incident {id} status changed concurrently, re-read and retry"
        ))
        .into()),
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// Request body for adding a comment.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// POST /incidents/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(req): Json<AddCommentRequest>,
) -> AppResult<Json<DataResponse<TimelineEntry>>> {
    if req.text.trim().is_empty() {
        return Err(CoreError::Validation("Comment text must not be empty".into()).into());
    }
    find_incident(&state, id).await?;

    let timeline = NewTimelineEntry {
        incident_id: id,
        event_type: event_types::COMMENT.into(),
        event_description: req.text,
        performed_by_id: Some(user.user_id),
        old_value: None,
        new_value: None,
    };
    let audit = NewAuditLog {
        entity_type: entity_types::INCIDENT.into(),
        entity_id: Some(id),
        action: AuditAction::Comment.as_str().into(),
        description: Some(format!("Comment added to incident {id}")),
        performed_by_id: Some(user.user_id),
        details_json: None,
    };

    let entry = IncidentRepo::add_comment(&state.pool, &timeline, &audit).await?;

    Ok(Json(DataResponse { data: entry }))
}

// ---------------------------------------------------------------------------
// Advanced search
// ---------------------------------------------------------------------------

/// GET /incidents/search
///
/// Advanced multi-criteria search. Every executed search leaves an audit
/// record carrying the filter set, so compliance can reconstruct who looked
/// for what.
pub async fn search_incidents(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<IncidentSearchParams>,
) -> AppResult<Json<DataResponse<IncidentPage>>> {
    if let Some(ref severity) = params.severity {
        vigil_core::status::Severity::parse(severity)?;
    }
    if let Some(ref status) = params.status {
        IncidentStatus::parse(status)?;
    }

    let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let offset = clamp_offset(params.offset);

    let items = IncidentRepo::search(&state.pool, &params, limit, offset).await?;
    let total = IncidentRepo::search_count(&state.pool, &params).await?;

    let audit = NewAuditLog {
        entity_type: entity_types::SEARCH.into(),
        entity_id: None,
        action: AuditAction::Search.as_str().into(),
        description: Some("Advanced incident search".into()),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({ "filters": params, "total": total })),
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse {
        data: IncidentPage { items, total },
    }))
}

// ---------------------------------------------------------------------------
// Similar-incident advisory
// ---------------------------------------------------------------------------

/// Response payload for the advisory analysis.
#[derive(Debug, Serialize)]
pub struct SimilarAnalysisResponse {
    pub findings: SimilarFindings,
    /// False when the advisory endpoint is disabled or failed and the
    /// findings are an empty degraded result.
    pub advisory_used: bool,
}

/// POST /incidents/{id}/similar
///
/// Ask the AI collaborator which settled incidents from the same bank
/// resemble this one. Best-effort: if the advisory endpoint is disabled or
/// errors, the response degrades to empty findings and the request still
/// succeeds. The stored result, the optional timeline entry, and the audit
/// record commit together.
pub async fn analyze_similar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<SimilarAnalysisResponse>>> {
    let incident = find_incident(&state, id).await?;
    let response = run_similar_analysis(&state, &incident, user.user_id).await?;
    Ok(Json(DataResponse { data: response }))
}

/// Gather same-bank settled history, consult the collaborator, and persist
/// the outcome. Shared by the manual trigger and the post-create task.
async fn run_similar_analysis(
    state: &AppState,
    incident: &Incident,
    performed_by: DbId,
) -> AppResult<SimilarAnalysisResponse> {
    let id = incident.id;

    let history = IncidentRepo::list_recent_settled_for_bank(
        &state.pool,
        incident.bank_id,
        id,
        ADVISORY_HISTORY_LIMIT,
    )
    .await?;

    let digests: Vec<IncidentDigest> = history.iter().map(to_digest).collect();
    let current = to_digest(incident);

    let (findings, advisory_used) = match &state.advisory {
        Some(client) => match client.find_similar(&current, &digests).await {
            Ok(findings) => (findings, true),
            Err(e) => {
                tracing::warn!(incident_id = id, error = %e, "Advisory analysis failed, degrading to empty result");
                (SimilarFindings::default(), false)
            }
        },
        None => (SimilarFindings::default(), false),
    };

    let advice = vigil_db::models::advice::NewSimilarIncidentAdvice {
        incident_id: id,
        similar_incident_ids: json!(findings.similar_incident_ids),
        similarity_reasons: json!(findings.similarity_reasons),
        recommendation_text: findings.recommendation_text.clone(),
    };
    let timeline = (!findings.similar_incident_ids.is_empty()).then(|| NewTimelineEntry {
        incident_id: id,
        event_type: event_types::AI_RECOMMENDATION.into(),
        event_description: format!(
            "Advisory found {} similar incident(s)",
            findings.similar_incident_ids.len()
        ),
        performed_by_id: None,
        old_value: None,
        new_value: Some(json!(findings.similar_incident_ids).to_string()),
    });
    let audit = NewAuditLog {
        entity_type: entity_types::INCIDENT.into(),
        entity_id: Some(id),
        action: AuditAction::AiSearch.as_str().into(),
        description: Some("Similar-incident advisory analysis".into()),
        performed_by_id: Some(performed_by),
        details_json: Some(json!({
            "candidates": history.len(),
            "matches": findings.similar_incident_ids.len(),
            "advisory_used": advisory_used,
        })),
    };

    AdviceRepo::store_result(&state.pool, &advice, timeline.as_ref(), &audit).await?;

    Ok(SimilarAnalysisResponse {
        findings,
        advisory_used,
    })
}

/// GET /incidents/{id}/similar
///
/// The most recent stored advisory result for this incident, if any.
pub async fn get_latest_advice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<vigil_db::models::advice::SimilarIncidentAdvice>>>> {
    find_incident(&state, id).await?;
    let advice = AdviceRepo::find_latest_for_incident(&state.pool, id).await?;
    Ok(Json(DataResponse { data: advice }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an incident or fail with 404.
pub(crate) async fn find_incident(state: &AppState, id: DbId) -> AppResult<Incident> {
    IncidentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Incident",
                id,
            }
            .into()
        })
}

fn to_digest(incident: &Incident) -> IncidentDigest {
    IncidentDigest {
        id: incident.id,
        title: incident.title.clone(),
        description: incident.description.clone(),
        service_name: incident.service_name.clone(),
        severity: incident.severity.clone(),
        status: incident.status.clone(),
    }
}

/// Build the old/new change map recorded in the update audit entry.
fn collect_changes(existing: &Incident, dto: &UpdateIncident) -> serde_json::Value {
    let mut changes = serde_json::Map::new();
    let mut record = |field: &str, old: serde_json::Value, new: serde_json::Value| {
        if old != new {
            changes.insert(field.to_string(), json!({ "old": old, "new": new }));
        }
    };

    if let Some(ref v) = dto.title {
        record("title", json!(existing.title), json!(v));
    }
    if let Some(ref v) = dto.description {
        record("description", json!(existing.description), json!(v));
    }
    if let Some(ref v) = dto.exception_text {
        record("exception_text", json!(existing.exception_text), json!(v));
    }
    if let Some(v) = dto.severity {
        record("severity", json!(existing.severity), json!(v.as_str()));
    }
    if let Some(ref v) = dto.service_name {
        record("service_name", json!(existing.service_name), json!(v));
    }
    if let Some(v) = dto.incident_manager_id {
        record(
            "incident_manager_id",
            json!(existing.incident_manager_id),
            json!(v),
        );
    }
    if let Some(v) = dto.current_owner_id {
        record(
            "current_owner_id",
            json!(existing.current_owner_id),
            json!(v),
        );
    }
    if let Some(ref v) = dto.impact_summary {
        record("impact_summary", json!(existing.impact_summary), json!(v));
    }
    if let Some(v) = dto.downtime {
        record("downtime", json!(existing.downtime), json!(v));
    }
    if let Some(v) = dto.financial_impact {
        record("financial_impact", json!(existing.financial_impact), json!(v));
    }
    if let Some(v) = dto.technical_decline_pct {
        record(
            "technical_decline_pct",
            json!(existing.technical_decline_pct),
            json!(v),
        );
    }

    serde_json::Value::Object(changes)
}
