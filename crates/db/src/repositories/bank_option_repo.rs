//! Repository for the `bank_options` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::audit::NewAuditLog;
use crate::models::bank_option::{BankOption, CreateBankOption, UpdateBankOption};
use crate::repositories::AuditLogRepo;

/// Column list for `bank_options` SELECT queries.
const COLUMNS: &str = "\
    id, bank_id, transaction_volume_per_day, transaction_volume_per_month, \
    architecture_diagram_url, number_of_app_servers, app_server_type, \
    db_type, number_of_db_instances, implementation_developer_name, \
    db_developer_name, db_developer_contact, aerospike_enabled, \
    aerospike_version, aerospike_description, redis_enabled, \
    redis_description, recon_enabled, recon_technology, created_at, \
    updated_at, updated_by_id";

/// Provides CRUD operations for bank configuration records. One per bank,
/// enforced by the `uq_bank_options_bank_id` constraint.
pub struct BankOptionRepo;

impl BankOptionRepo {
    /// Create a bank's configuration record and its audit record in one
    /// transaction.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateBankOption,
        updated_by_id: DbId,
        mut audit: NewAuditLog,
    ) -> Result<BankOption, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO bank_options \
                (bank_id, transaction_volume_per_day, transaction_volume_per_month, \
                 architecture_diagram_url, number_of_app_servers, app_server_type, \
                 db_type, number_of_db_instances, implementation_developer_name, \
                 db_developer_name, db_developer_contact, aerospike_enabled, \
                 aerospike_version, aerospike_description, redis_enabled, \
                 redis_description, recon_enabled, recon_technology, updated_by_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     $15, $16, $17, $18, $19) \
             RETURNING {COLUMNS}"
        );
        let option = sqlx::query_as::<_, BankOption>(&query)
            .bind(dto.bank_id)
            .bind(dto.transaction_volume_per_day)
            .bind(dto.transaction_volume_per_month)
            .bind(&dto.architecture_diagram_url)
            .bind(dto.number_of_app_servers)
            .bind(&dto.app_server_type)
            .bind(&dto.db_type)
            .bind(dto.number_of_db_instances)
            .bind(&dto.implementation_developer_name)
            .bind(&dto.db_developer_name)
            .bind(&dto.db_developer_contact)
            .bind(dto.aerospike_enabled)
            .bind(&dto.aerospike_version)
            .bind(&dto.aerospike_description)
            .bind(dto.redis_enabled)
            .bind(&dto.redis_description)
            .bind(dto.recon_enabled)
            .bind(&dto.recon_technology)
            .bind(updated_by_id)
            .fetch_one(&mut *tx)
            .await?;

        audit.entity_id = Some(option.id);
        AuditLogRepo::insert_in_tx(&mut tx, &audit).await?;

        tx.commit().await?;
        Ok(option)
    }

    /// Find the configuration record of a bank.
    pub async fn find_by_bank_id(
        pool: &PgPool,
        bank_id: DbId,
    ) -> Result<Option<BankOption>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bank_options WHERE bank_id = $1");
        sqlx::query_as::<_, BankOption>(&query)
            .bind(bank_id)
            .fetch_optional(pool)
            .await
    }

    /// List all bank configuration records.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<BankOption>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bank_options ORDER BY bank_id ASC");
        sqlx::query_as::<_, BankOption>(&query).fetch_all(pool).await
    }

    /// Apply a partial update (COALESCE keeps absent fields) and its audit
    /// record in one transaction. Returns `None` when the bank has no
    /// configuration record yet.
    pub async fn update_by_bank_id(
        pool: &PgPool,
        bank_id: DbId,
        dto: &UpdateBankOption,
        updated_by_id: DbId,
        audit: &NewAuditLog,
    ) -> Result<Option<BankOption>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE bank_options SET \
                transaction_volume_per_day = COALESCE($2, transaction_volume_per_day), \
                transaction_volume_per_month = COALESCE($3, transaction_volume_per_month), \
                architecture_diagram_url = COALESCE($4, architecture_diagram_url), \
                number_of_app_servers = COALESCE($5, number_of_app_servers), \
                app_server_type = COALESCE($6, app_server_type), \
                db_type = COALESCE($7, db_type), \
                number_of_db_instances = COALESCE($8, number_of_db_instances), \
                implementation_developer_name = COALESCE($9, implementation_developer_name), \
                db_developer_name = COALESCE($10, db_developer_name), \
                db_developer_contact = COALESCE($11, db_developer_contact), \
                aerospike_enabled = COALESCE($12, aerospike_enabled), \
                aerospike_version = COALESCE($13, aerospike_version), \
                aerospike_description = COALESCE($14, aerospike_description), \
                redis_enabled = COALESCE($15, redis_enabled), \
                redis_description = COALESCE($16, redis_description), \
                recon_enabled = COALESCE($17, recon_enabled), \
                recon_technology = COALESCE($18, recon_technology), \
                updated_by_id = $19, \
                updated_at = NOW() \
             WHERE bank_id = $1 \
             RETURNING {COLUMNS}"
        );
        let option = sqlx::query_as::<_, BankOption>(&query)
            .bind(bank_id)
            .bind(dto.transaction_volume_per_day)
            .bind(dto.transaction_volume_per_month)
            .bind(&dto.architecture_diagram_url)
            .bind(dto.number_of_app_servers)
            .bind(&dto.app_server_type)
            .bind(&dto.db_type)
            .bind(dto.number_of_db_instances)
            .bind(&dto.implementation_developer_name)
            .bind(&dto.db_developer_name)
            .bind(&dto.db_developer_contact)
            .bind(dto.aerospike_enabled)
            .bind(&dto.aerospike_version)
            .bind(&dto.aerospike_description)
            .bind(dto.redis_enabled)
            .bind(&dto.redis_description)
            .bind(dto.recon_enabled)
            .bind(&dto.recon_technology)
            .bind(updated_by_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(option) = option else {
            return Ok(None);
        };

        AuditLogRepo::insert_in_tx(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(Some(option))
    }
}
