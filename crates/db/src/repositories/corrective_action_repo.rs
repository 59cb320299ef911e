//! Repository for the `corrective_actions` table.

use chrono::NaiveDate;
use sqlx::PgPool;
use vigil_core::types::{DbId, Timestamp};

use crate::models::audit::NewAuditLog;
use crate::models::corrective_action::{
    CorrectiveAction, CreateCorrectiveAction, ReminderCandidate, UpdateCorrectiveAction,
};
use crate::repositories::AuditLogRepo;

/// Column list for `corrective_actions` SELECT queries.
const COLUMNS: &str = "\
    id, incident_id, title, description, owner_user_id, due_date, \
    status, created_at, completed_at";

/// Provides CRUD and reminder-sweep operations for corrective actions.
pub struct CorrectiveActionRepo;

impl CorrectiveActionRepo {
    /// Create a corrective action and its audit record in one transaction.
    ///
    /// `due_date` arrives already parsed; the handler rejects malformed dates
    /// before anything is written. The audit DTO's `entity_id` is overwritten
    /// with the id of the inserted row.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateCorrectiveAction,
        due_date: NaiveDate,
        mut audit: NewAuditLog,
    ) -> Result<CorrectiveAction, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO corrective_actions \
                (incident_id, title, description, owner_user_id, due_date) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let action = sqlx::query_as::<_, CorrectiveAction>(&query)
            .bind(dto.incident_id)
            .bind(&dto.title)
            .bind(&dto.description)
            .bind(dto.owner_user_id)
            .bind(due_date)
            .fetch_one(&mut *tx)
            .await?;

        audit.entity_id = Some(action.id);
        AuditLogRepo::insert_in_tx(&mut tx, &audit).await?;

        tx.commit().await?;
        Ok(action)
    }

    /// Find a corrective action by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CorrectiveAction>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM corrective_actions WHERE id = $1");
        sqlx::query_as::<_, CorrectiveAction>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the corrective actions of an incident, soonest due first.
    pub async fn list_for_incident(
        pool: &PgPool,
        incident_id: DbId,
    ) -> Result<Vec<CorrectiveAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM corrective_actions \
             WHERE incident_id = $1 \
             ORDER BY due_date ASC, id ASC"
        );
        sqlx::query_as::<_, CorrectiveAction>(&query)
            .bind(incident_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update and its audit record in one transaction.
    ///
    /// `due_date` is the parsed form of `dto.due_date`. `completed_at` uses
    /// two levels of optionality: outer `None` leaves the column untouched,
    /// `Some(v)` stores `v` (which may be NULL when a completed action is
    /// reopened). Returns `None` when the action does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        dto: &UpdateCorrectiveAction,
        due_date: Option<NaiveDate>,
        completed_at: Option<Option<Timestamp>>,
        audit: &NewAuditLog,
    ) -> Result<Option<CorrectiveAction>, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_idx = 2u32; // $1 is the action id
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

        if let Some(owner_user_id) = dto.owner_user_id {
            sets.push(format!("owner_user_id = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::BigInt(owner_user_id));
        }

        if let Some(date) = due_date {
            sets.push(format!("due_date = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Date(date));
        }

        if let Some(ref status) = dto.status {
            sets.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::Text(status.clone()));
        }

        if let Some(stamp) = completed_at {
            sets.push(format!("completed_at = ${bind_idx}"));
            bind_idx += 1;
            bind_values.push(BindValue::NullableTimestamp(stamp));
        }

        // $1 is the id, the rest line up with bind_values.
        debug_assert_eq!(bind_idx as usize, bind_values.len() + 2);

        let mut tx = pool.begin().await?;

        let action = if sets.is_empty() {
            let query = format!("SELECT {COLUMNS} FROM corrective_actions WHERE id = $1");
            sqlx::query_as::<_, CorrectiveAction>(&query)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        } else {
            let query = format!(
                "UPDATE corrective_actions SET {} WHERE id = $1 RETURNING {COLUMNS}",
                sets.join(", ")
            );
            let mut q = sqlx::query_as::<_, CorrectiveAction>(&query).bind(id);
            for val in &bind_values {
                match val {
                    BindValue::Text(v) => q = q.bind(v.as_str()),
                    BindValue::BigInt(v) => q = q.bind(*v),
                    BindValue::Date(v) => q = q.bind(*v),
                    BindValue::NullableTimestamp(v) => q = q.bind(*v),
                }
            }
            q.fetch_optional(&mut *tx).await?
        };

        let Some(action) = action else {
            return Ok(None);
        };

        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(Some(action))
    }

    /// All incomplete actions, joined with the contact details the reminder
    /// email needs. Every OPEN/IN_PROGRESS action is reminded regardless of
    /// its due date; actions whose owner is missing or inactive are excluded.
    pub async fn list_needing_reminder(
        pool: &PgPool,
    ) -> Result<Vec<ReminderCandidate>, sqlx::Error> {
        sqlx::query_as::<_, ReminderCandidate>(
            "SELECT ca.id AS action_id, ca.incident_id, ca.title AS action_title, \
                    ca.description AS action_description, ca.due_date, \
                    u.name AS owner_name, u.email AS owner_email, \
                    i.title AS incident_title \
             FROM corrective_actions ca \
             JOIN users u ON u.id = ca.owner_user_id AND u.active \
             JOIN incidents i ON i.id = ca.incident_id \
             WHERE ca.status IN ('OPEN', 'IN_PROGRESS') \
             ORDER BY ca.due_date ASC, ca.id ASC",
        )
        .fetch_all(pool)
        .await
    }
}

/// Typed bind value for the dynamically-built update query.
enum BindValue {
    Text(String),
    BigInt(i64),
    Date(NaiveDate),
    NullableTimestamp(Option<Timestamp>),
}
