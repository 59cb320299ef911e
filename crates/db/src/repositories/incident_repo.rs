//! Repository for the `incidents` table.
//!
//! Every mutation runs in a transaction that also appends the timeline entries
//! and audit log rows describing it, so the record of a change can never
//! outlive or predate the change itself. Callers pass the entries as DTOs; the
//! repo fills in the incident id where the caller could not know it yet.

use sqlx::PgPool;
use vigil_core::status::TransitionStamp;
use vigil_core::types::{DbId, Timestamp};

use crate::models::audit::NewAuditLog;
use crate::models::incident::{
    CreateIncident, Incident, IncidentListParams, IncidentSearchParams, UpdateIncident,
};
use crate::models::timeline::{NewTimelineEntry, TimelineEntry};
use crate::repositories::{AuditLogRepo, TimelineRepo};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `incidents` SELECT queries.
const COLUMNS: &str = "\
    id, title, description, exception_text, bank_id, severity, status, \
    service_name, incident_manager_id, current_owner_id, created_by_id, \
    created_at, acknowledged_at, resolved_at, closed_at, source, \
    impact_summary, downtime, financial_impact, technical_decline_pct";

// ---------------------------------------------------------------------------
// IncidentRepo
// ---------------------------------------------------------------------------

/// Provides CRUD, workflow, and search operations for incidents.
pub struct IncidentRepo;

impl IncidentRepo {
    /// Create an incident together with its creation timeline entry and audit
    /// record, all in one transaction.
    ///
    /// The `timeline` and `audit` DTOs are templates; their `incident_id` /
    /// `entity_id` are overwritten with the id of the inserted row.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateIncident,
        created_by_id: DbId,
        mut timeline: NewTimelineEntry,
        mut audit: NewAuditLog,
    ) -> Result<Incident, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO incidents \
                (title, description, exception_text, bank_id, severity, service_name, \
                 incident_manager_id, created_by_id, source, impact_summary) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        let incident = sqlx::query_as::<_, Incident>(&query)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(&dto.exception_text)
            .bind(dto.bank_id)
            .bind(dto.severity.as_str())
            .bind(&dto.service_name)
            .bind(dto.incident_manager_id)
            .bind(created_by_id)
            .bind(dto.source.as_deref().unwrap_or("Manual"))
            .bind(&dto.impact_summary)
            .fetch_one(&mut *tx)
            .await?;

        timeline.incident_id = incident.id;
        TimelineRepo::insert_in_tx(&mut tx, &timeline).await?;

        audit.entity_id = Some(incident.id);
        AuditLogRepo::insert_in_tx(&mut tx, &audit).await?;

        tx.commit().await?;
        Ok(incident)
    }

    /// Find an incident by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Incident>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM incidents WHERE id = $1");
        sqlx::query_as::<_, Incident>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List incidents with basic filtering and pagination, newest first.
    pub async fn list(
        pool: &PgPool,
        params: &IncidentListParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Incident>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_list_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM incidents {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_values_as(sqlx::query_as::<_, Incident>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count incidents matching the basic listing filter.
    pub async fn count(pool: &PgPool, params: &IncidentListParams) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_list_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM incidents {where_clause}");

        let q = bind_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }

    /// Apply a partial update together with the timeline entries and audit
    /// record describing it, all in one transaction.
    ///
    /// Returns `None` when the incident does not exist. A DTO with no fields
    /// set still writes the timeline entries and audit record.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateIncident,
        timeline_entries: &[NewTimelineEntry],
        audit: &NewAuditLog,
    ) -> Result<Option<Incident>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_idx = 2u32; // $1 is the incident id
        let mut bind_values: Vec<BindValue> = Vec::new();

        if let Some(ref title) = dto.title {
            sets.push(format!("title = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(title.clone()));
        }

        if let Some(ref description) = dto.description {
            sets.push(format!("description = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(description.clone()));
        }

        if let Some(ref exception_text) = dto.exception_text {
            sets.push(format!("exception_text = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(exception_text.clone()));
        }

        if let Some(severity) = dto.severity {
            sets.push(format!("severity = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(severity.as_str().to_string()));
        }

        if let Some(ref service_name) = dto.service_name {
            sets.push(format!("service_name = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(service_name.clone()));
        }

        if let Some(manager_id) = dto.incident_manager_id {
            sets.push(format!("incident_manager_id = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::BigInt(manager_id));
        }

        if let Some(owner_id) = dto.current_owner_id {
            sets.push(format!("current_owner_id = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::BigInt(owner_id));
        }

        if let Some(ref impact_summary) = dto.impact_summary {
            sets.push(format!("impact_summary = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(impact_summary.clone()));
        }

        if let Some(downtime) = dto.downtime {
            sets.push(format!("downtime = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Bool(downtime));
        }

        if let Some(financial_impact) = dto.financial_impact {
            sets.push(format!("financial_impact = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Bool(financial_impact));
        }

        if let Some(pct) = dto.technical_decline_pct {
            sets.push(format!("technical_decline_pct = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Float(pct));
        }

        // $1 is the id, the rest line up with bind_values.
        debug_assert_eq!(bind_idx as usize, bind_values.len() + 2);

        let mut tx = pool.begin().await?;

        let incident = if sets.is_empty() {
            let query = format!("SELECT {COLUMNS} FROM incidents WHERE id = $1");
            sqlx::query_as::<_, Incident>(&query)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        } else {
            let query = format!(
                "UPDATE incidents SET {} WHERE id = $1 RETURNING {COLUMNS}",
                sets.join(", ")
            );
            let q = bind_values_as(sqlx::query_as::<_, Incident>(&query).bind(id), &bind_values);
            q.fetch_optional(&mut *tx).await?
        };

        let Some(incident) = incident else {
            return Ok(None);
        };

        for entry in timeline_entries {
            TimelineRepo::insert_in_tx(&mut tx, entry).await?;
        }
        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(Some(incident))
    }

    /// Compare-and-set status transition with its lifecycle timestamp stamp,
    /// timeline entry, and audit record, all in one transaction.
    ///
    /// The UPDATE is guarded on the status the caller validated against
    /// (`expected_current`); if another writer moved the incident first the
    /// guard misses and this returns `Ok(None)` without writing anything.
    pub async fn change_status(
        pool: &PgPool,
        id: DbId,
        expected_current: &str,
        new_status: &str,
        stamp: TransitionStamp,
        timeline: &NewTimelineEntry,
        audit: &NewAuditLog,
    ) -> Result<Option<Incident>, sqlx::Error> {
        let stamp_sql = match stamp {
            TransitionStamp::None => "",
            TransitionStamp::AcknowledgedAt => ", acknowledged_at = NOW()",
            TransitionStamp::ResolvedAt => ", resolved_at = NOW()",
            TransitionStamp::ClosedAt => ", closed_at = NOW()",
        };

        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE incidents SET status = $3{stamp_sql} \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        let incident = sqlx::query_as::<_, Incident>(&query)
            .bind(id)
            .bind(expected_current)
            .bind(new_status)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(incident) = incident else {
            return Ok(None);
        };

        TimelineRepo::insert_in_tx(&mut tx, timeline).await?;
        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(Some(incident))
    }

    /// Append a comment timeline entry and its audit record in one
    /// transaction, returning the stored entry. The incident row itself is
    /// untouched.
    pub async fn add_comment(
        pool: &PgPool,
        timeline: &NewTimelineEntry,
        audit: &NewAuditLog,
    ) -> Result<TimelineEntry, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let entry = TimelineRepo::insert_in_tx(&mut tx, timeline).await?;
        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Recent settled (RESOLVED or CLOSED) incidents for a bank, excluding the
    /// incident under analysis. Feeds the similar-incident advisory.
    pub async fn list_recent_settled_for_bank(
        pool: &PgPool,
        bank_id: DbId,
        exclude_id: DbId,
        limit: i64,
    ) -> Result<Vec<Incident>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM incidents \
             WHERE bank_id = $1 AND id <> $2 AND status IN ('RESOLVED', 'CLOSED') \
             ORDER BY created_at DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, Incident>(&query)
            .bind(bank_id)
            .bind(exclude_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Incident counts per status within a reporting period, optionally
    /// scoped to one bank.
    pub async fn status_counts(
        pool: &PgPool,
        bank_id: Option<DbId>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        Self::grouped_counts(pool, "status", bank_id, from, to).await
    }

    /// Incident counts per severity within a reporting period, optionally
    /// scoped to one bank.
    pub async fn severity_counts(
        pool: &PgPool,
        bank_id: Option<DbId>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        Self::grouped_counts(pool, "severity", bank_id, from, to).await
    }

    async fn grouped_counts(
        pool: &PgPool,
        column: &str,
        bank_id: Option<DbId>,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        // `column` is a fixed identifier supplied by the two callers above,
        // never caller input.
        match bank_id {
            Some(bank_id) => {
                let query = format!(
                    "SELECT {column}, COUNT(*)::BIGINT FROM incidents \
                     WHERE bank_id = $1 AND created_at >= $2 AND created_at <= $3 \
                     GROUP BY {column}"
                );
                sqlx::query_as::<_, (String, i64)>(&query)
                    .bind(bank_id)
                    .bind(from)
                    .bind(to)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {column}, COUNT(*)::BIGINT FROM incidents \
                     WHERE created_at >= $1 AND created_at <= $2 \
                     GROUP BY {column}"
                );
                sqlx::query_as::<_, (String, i64)>(&query)
                    .bind(from)
                    .bind(to)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Advanced search with pagination, newest first.
    pub async fn search(
        pool: &PgPool,
        params: &IncidentSearchParams,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Incident>, sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_search_filter(params);

        let query = format!(
            "SELECT {COLUMNS} FROM incidents {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let q = bind_values_as(sqlx::query_as::<_, Incident>(&query), &bind_values);
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count incidents matching the advanced search filter.
    pub async fn search_count(
        pool: &PgPool,
        params: &IncidentSearchParams,
    ) -> Result<i64, sqlx::Error> {
        let (where_clause, bind_values, _) = build_search_filter(params);

        let query = format!("SELECT COUNT(*)::BIGINT AS count FROM incidents {where_clause}");

        let q = bind_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values);
        q.fetch_one(pool).await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built incident queries.
enum BindValue {
    BigInt(i64),
    Text(String),
    Float(f64),
    Bool(bool),
    Timestamp(Timestamp),
}

/// Build a WHERE clause for the basic incident listing.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
fn build_list_filter(params: &IncidentListParams) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(bank_id) = params.bank_id {
        conditions.push(format!("bank_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(bank_id));
    }

    if let Some(ref status) = params.status {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.clone()));
    }

    if let Some(ref severity) = params.severity {
        conditions.push(format!("severity = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(severity.clone()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Build a WHERE clause for the advanced incident search.
///
/// Text filters become case-insensitive substring matches (ILIKE); enum and
/// boolean filters are exact; numeric and date filters are range bounds.
fn build_search_filter(params: &IncidentSearchParams) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    let ilike = |column: &str,
                 value: &str,
                 conditions: &mut Vec<String>,
                 bind_values: &mut Vec<BindValue>,
                 bind_idx: &mut u32| {
        conditions.push(format!("{column} ILIKE ${bind_idx}"));
        *bind_idx += 1;
        bind_values.push(BindValue::Text(format!("%{value}%")));
    };

    if let Some(ref title) = params.title {
        ilike("title", title, &mut conditions, &mut bind_values, &mut bind_idx);
    }

    if let Some(ref description) = params.description {
        ilike(
            "description",
            description,
            &mut conditions,
            &mut bind_values,
            &mut bind_idx,
        );
    }

    if let Some(ref exception_text) = params.exception_text {
        ilike(
            "exception_text",
            exception_text,
            &mut conditions,
            &mut bind_values,
            &mut bind_idx,
        );
    }

    if let Some(ref service_name) = params.service_name {
        ilike(
            "service_name",
            service_name,
            &mut conditions,
            &mut bind_values,
            &mut bind_idx,
        );
    }

    if let Some(ref severity) = params.severity {
        conditions.push(format!("severity = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(severity.clone()));
    }

    if let Some(ref status) = params.status {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(status.clone()));
    }

    if let Some(bank_id) = params.bank_id {
        conditions.push(format!("bank_id = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(bank_id));
    }

    if let Some(downtime) = params.downtime {
        conditions.push(format!("downtime = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Bool(downtime));
    }

    if let Some(financial_impact) = params.financial_impact {
        conditions.push(format!("financial_impact = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Bool(financial_impact));
    }

    if let Some(min) = params.tech_decline_min {
        conditions.push(format!("technical_decline_pct >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Float(min));
    }

    if let Some(max) = params.tech_decline_max {
        conditions.push(format!("technical_decline_pct <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Float(max));
    }

    if let Some(from) = params.date_from {
        conditions.push(format!("created_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = params.date_to {
        conditions.push(format!("created_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_values_as<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Bool(v) => q = q.bind(*v),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::BigInt(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
            BindValue::Float(v) => q = q.bind(*v),
            BindValue::Bool(v) => q = q.bind(*v),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
