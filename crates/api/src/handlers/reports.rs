//! Handler for period incident reports.
//!
//! The figures are aggregated from the database; the narrative is drafted by
//! the AI collaborator when available and otherwise rendered by the plain
//! fallback template. Either way the caller gets a complete HTML report.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vigil_advisory::{fallback_report, IncidentDigest, ReportInput};
use vigil_core::audit::{entity_types, AuditAction};
use vigil_core::error::CoreError;
use vigil_core::types::{DbId, Timestamp};
use vigil_db::models::audit::NewAuditLog;
use vigil_db::models::incident::IncidentSearchParams;
use vigil_db::repositories::{AuditLogRepo, BankRepo, IncidentRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireIncidentManager;
use crate::response::DataResponse;
use crate::state::AppState;

/// Incidents listed in the "notable" section of a report.
const NOTABLE_LIMIT: i64 = 10;

/// Query parameters for report generation.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub bank_id: Option<DbId>,
    /// Period start, `YYYY-MM-DD`, inclusive.
    pub date_from: String,
    /// Period end, `YYYY-MM-DD`, inclusive.
    pub date_to: String,
}

/// Response payload carrying the rendered report.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub html: String,
    /// False when the narrative came from the fallback template.
    pub advisory_used: bool,
}

/// GET /reports/incidents (incident manager or admin)
pub async fn generate_report(
    State(state): State<AppState>,
    RequireIncidentManager(user): RequireIncidentManager,
    Query(params): Query<ReportParams>,
) -> AppResult<Json<DataResponse<ReportResponse>>> {
    let date_from = parse_date(&params.date_from)?;
    let date_to = parse_date(&params.date_to)?;
    if date_from > date_to {
        return Err(CoreError::Validation("date_from must not be after date_to".into()).into());
    }

    let (from, to) = period_bounds(date_from, date_to);

    let bank_name = match params.bank_id {
        Some(bank_id) => {
            let bank = BankRepo::find_by_id(&state.pool, bank_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Bank",
                    id: bank_id,
                })?;
            Some(bank.name)
        }
        None => None,
    };

    let by_status: BTreeMap<String, i64> =
        IncidentRepo::status_counts(&state.pool, params.bank_id, from, to)
            .await?
            .into_iter()
            .collect();
    let by_severity: BTreeMap<String, i64> =
        IncidentRepo::severity_counts(&state.pool, params.bank_id, from, to)
            .await?
            .into_iter()
            .collect();
    let total_incidents: i64 = by_status.values().sum();

    let search = IncidentSearchParams {
        bank_id: params.bank_id,
        date_from: Some(from),
        date_to: Some(to),
        ..Default::default()
    };
    let notable_incidents: Vec<IncidentDigest> =
        IncidentRepo::search(&state.pool, &search, NOTABLE_LIMIT, 0)
            .await?
            .iter()
            .map(|i| IncidentDigest {
                id: i.id,
                title: i.title.clone(),
                description: i.description.clone(),
                service_name: i.service_name.clone(),
                severity: i.severity.clone(),
                status: i.status.clone(),
            })
            .collect();

    let input = ReportInput {
        bank_name,
        date_from,
        date_to,
        total_incidents,
        by_status,
        by_severity,
        notable_incidents,
    };

    let (html, advisory_used) = match &state.advisory {
        Some(client) => match client.draft_report(&input).await {
            Ok(html) => (html, true),
            Err(e) => {
                tracing::warn!(error = %e, "Report drafting failed, using fallback template");
                (fallback_report(&input), false)
            }
        },
        None => (fallback_report(&input), false),
    };

    let audit = NewAuditLog {
        entity_type: entity_types::REPORT.into(),
        entity_id: None,
        action: AuditAction::GenerateReport.as_str().into(),
        description: Some("Generated incident report".into()),
        performed_by_id: Some(user.user_id),
        details_json: Some(json!({
            "bank_id": params.bank_id,
            "date_from": params.date_from,
            "date_to": params.date_to,
            "total": total_incidents,
            "advisory_used": advisory_used,
        })),
    };
    AuditLogRepo::insert(&state.pool, &audit).await?;

    Ok(Json(DataResponse {
        data: ReportResponse {
            html,
            advisory_used,
        },
    }))
}

fn parse_date(s: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CoreError::Validation(format!("Invalid date '{s}' (expected YYYY-MM-DD)")))
}

/// Expand inclusive dates into the covered timestamp range.
fn period_bounds(from: NaiveDate, to: NaiveDate) -> (Timestamp, Timestamp) {
    let start = from.and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = to.and_hms_opt(23, 59, 59).unwrap().and_utc();
    (start, end)
}
