//! Repository for the `postmortems` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::audit::NewAuditLog;
use crate::models::postmortem::{CreatePostmortem, Postmortem, UpdatePostmortem};
use crate::repositories::AuditLogRepo;

/// Column list for `postmortems` SELECT queries.
const COLUMNS: &str = "\
    id, incident_id, root_cause, resolution_summary, preventive_summary, \
    created_by_id, created_at, updated_at";

/// Provides CRUD operations for postmortems. One per incident, enforced by
/// the `uq_postmortems_incident_id` constraint.
pub struct PostmortemRepo;

impl PostmortemRepo {
    /// Create a postmortem and its audit record in one transaction.
    pub async fn create(
        pool: &PgPool,
        dto: &CreatePostmortem,
        created_by_id: DbId,
        mut audit: NewAuditLog,
    ) -> Result<Postmortem, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO postmortems \
                (incident_id, root_cause, resolution_summary, preventive_summary, created_by_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let postmortem = sqlx::query_as::<_, Postmortem>(&query)
            .bind(dto.incident_id)
            .bind(&dto.root_cause)
            .bind(&dto.resolution_summary)
            .bind(&dto.preventive_summary)
            .bind(created_by_id)
            .fetch_one(&mut *tx)
            .await?;

        audit.entity_id = Some(postmortem.id);
        AuditLogRepo::insert_in_tx(&mut tx, &audit).await?;

        tx.commit().await?;
        Ok(postmortem)
    }

    /// Find the postmortem of an incident.
    pub async fn find_by_incident(
        pool: &PgPool,
        incident_id: DbId,
    ) -> Result<Option<Postmortem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM postmortems WHERE incident_id = $1");
        sqlx::query_as::<_, Postmortem>(&query)
            .bind(incident_id)
            .fetch_optional(pool)
            .await
    }

    /// Apply a partial update (COALESCE keeps absent fields) and its audit
    /// record in one transaction. Returns `None` when no postmortem exists
    /// for the incident.
    pub async fn update_by_incident(
        pool: &PgPool,
        incident_id: DbId,
        dto: &UpdatePostmortem,
        audit: &NewAuditLog,
    ) -> Result<Option<Postmortem>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE postmortems SET \
                root_cause = COALESCE($2, root_cause), \
                resolution_summary = COALESCE($3, resolution_summary), \
                preventive_summary = COALESCE($4, preventive_summary), \
                updated_at = NOW() \
             WHERE incident_id = $1 \
             RETURNING {COLUMNS}"
        );
        let postmortem = sqlx::query_as::<_, Postmortem>(&query)
            .bind(incident_id)
            .bind(&dto.root_cause)
            .bind(&dto.resolution_summary)
            .bind(&dto.preventive_summary)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(postmortem) = postmortem else {
            return Ok(None);
        };

        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(Some(postmortem))
    }
}
