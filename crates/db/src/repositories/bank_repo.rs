//! Repository for the `banks` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::bank::{Bank, CreateBank};

/// Column list for `banks` SELECT queries.
const COLUMNS: &str = "id, name, active";

/// Provides CRUD operations for banks.
pub struct BankRepo;

impl BankRepo {
    /// Create a new bank. The `uq_banks_name` constraint rejects duplicates.
    pub async fn create(pool: &PgPool, dto: &CreateBank) -> Result<Bank, sqlx::Error> {
        let query = format!("INSERT INTO banks (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Bank>(&query)
            .bind(&dto.name)
            .fetch_one(pool)
            .await
    }

    /// Find a bank by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Bank>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM banks WHERE id = $1");
        sqlx::query_as::<_, Bank>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all banks ordered by name.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Bank>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM banks ORDER BY name");
        sqlx::query_as::<_, Bank>(&query).fetch_all(pool).await
    }

    /// List active banks ordered by name.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<Bank>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM banks WHERE active ORDER BY name");
        sqlx::query_as::<_, Bank>(&query).fetch_all(pool).await
    }

    /// Set a bank's active flag. Returns the updated row, or `None` if absent.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        active: bool,
    ) -> Result<Option<Bank>, sqlx::Error> {
        let query = format!("UPDATE banks SET active = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Bank>(&query)
            .bind(id)
            .bind(active)
            .fetch_optional(pool)
            .await
    }
}
