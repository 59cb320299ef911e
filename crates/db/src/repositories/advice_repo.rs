//! Repository for the `similar_incident_advice` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::advice::{NewSimilarIncidentAdvice, SimilarIncidentAdvice};
use crate::models::audit::NewAuditLog;
use crate::models::timeline::NewTimelineEntry;
use crate::repositories::{AuditLogRepo, TimelineRepo};

/// Column list for `similar_incident_advice` SELECT queries.
const COLUMNS: &str = "\
    id, incident_id, similar_incident_ids, similarity_reasons, \
    recommendation_text, created_at";

/// Provides storage for advisory results.
pub struct AdviceRepo;

impl AdviceRepo {
    /// Store an advisory result with its audit record, and a timeline entry
    /// when the advisory actually found something, all in one transaction.
    pub async fn store_result(
        pool: &PgPool,
        dto: &NewSimilarIncidentAdvice,
        timeline: Option<&NewTimelineEntry>,
        audit: &NewAuditLog,
    ) -> Result<SimilarIncidentAdvice, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO similar_incident_advice \
                (incident_id, similar_incident_ids, similarity_reasons, recommendation_text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let advice = sqlx::query_as::<_, SimilarIncidentAdvice>(&query)
            .bind(dto.incident_id)
            .bind(&dto.similar_incident_ids)
            .bind(&dto.similarity_reasons)
            .bind(&dto.recommendation_text)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(entry) = timeline {
            TimelineRepo::insert_in_tx(&mut tx, entry).await?;
        }
        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(advice)
    }

    /// The most recent stored advisory result for an incident.
    pub async fn find_latest_for_incident(
        pool: &PgPool,
        incident_id: DbId,
    ) -> Result<Option<SimilarIncidentAdvice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM similar_incident_advice \
             WHERE incident_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, SimilarIncidentAdvice>(&query)
            .bind(incident_id)
            .fetch_optional(pool)
            .await
    }
}
