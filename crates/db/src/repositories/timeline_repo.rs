//! Repository for the `incident_timeline` table.
//!
//! Append-only: there are insert and list operations, nothing else. Every
//! state-changing incident operation appends its entry through
//! [`TimelineRepo::insert_in_tx`] so the entry commits (or rolls back) with
//! the mutation that caused it.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::timeline::{NewTimelineEntry, TimelineEntry};
use crate::repositories::PgTx;

/// Column list for `incident_timeline` SELECT queries.
const COLUMNS: &str = "\
    id, incident_id, event_type, event_description, performed_by_id, \
    old_value, new_value, created_at";

/// Provides append and list operations for incident timeline entries.
pub struct TimelineRepo;

impl TimelineRepo {
    /// Append a timeline entry within the caller's transaction.
    pub async fn insert_in_tx(
        tx: &mut PgTx<'_>,
        entry: &NewTimelineEntry,
    ) -> Result<TimelineEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO incident_timeline \
                (incident_id, event_type, event_description, performed_by_id, old_value, new_value) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimelineEntry>(&query)
            .bind(entry.incident_id)
            .bind(&entry.event_type)
            .bind(&entry.event_description)
            .bind(entry.performed_by_id)
            .bind(&entry.old_value)
            .bind(&entry.new_value)
            .fetch_one(&mut **tx)
            .await
    }

    /// Append a timeline entry outside any transaction.
    pub async fn insert(
        pool: &PgPool,
        entry: &NewTimelineEntry,
    ) -> Result<TimelineEntry, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let created = Self::insert_in_tx(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// List all entries for one incident in creation order.
    pub async fn list_for_incident(
        pool: &PgPool,
        incident_id: DbId,
    ) -> Result<Vec<TimelineEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM incident_timeline \
             WHERE incident_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, TimelineEntry>(&query)
            .bind(incident_id)
            .fetch_all(pool)
            .await
    }

    /// Count the entries for one incident.
    pub async fn count_for_incident(
        pool: &PgPool,
        incident_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM incident_timeline WHERE incident_id = $1",
        )
        .bind(incident_id)
        .fetch_one(pool)
        .await
    }
}
