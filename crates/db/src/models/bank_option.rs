//! Bank technical-configuration models and DTOs.
//!
//! One record per bank, holding the infrastructure details support staff
//! consult during an incident: transaction volumes, server and database
//! topology, developer contacts, and cache/reconciliation setup.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `bank_options` table. At most one per bank.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BankOption {
    pub id: DbId,
    pub bank_id: DbId,
    pub transaction_volume_per_day: Option<i64>,
    pub transaction_volume_per_month: Option<i64>,
    pub architecture_diagram_url: Option<String>,
    pub number_of_app_servers: Option<i32>,
    pub app_server_type: Option<String>,
    pub db_type: Option<String>,
    pub number_of_db_instances: Option<i32>,
    pub implementation_developer_name: Option<String>,
    pub db_developer_name: Option<String>,
    pub db_developer_contact: Option<String>,
    pub aerospike_enabled: bool,
    pub aerospike_version: Option<String>,
    pub aerospike_description: Option<String>,
    pub redis_enabled: bool,
    pub redis_description: Option<String>,
    pub recon_enabled: bool,
    pub recon_technology: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub updated_by_id: Option<DbId>,
}

/// DTO for creating a bank's configuration record.
#[derive(Debug, Deserialize)]
pub struct CreateBankOption {
    pub bank_id: DbId,
    pub transaction_volume_per_day: Option<i64>,
    pub transaction_volume_per_month: Option<i64>,
    pub architecture_diagram_url: Option<String>,
    pub number_of_app_servers: Option<i32>,
    pub app_server_type: Option<String>,
    pub db_type: Option<String>,
    pub number_of_db_instances: Option<i32>,
    pub implementation_developer_name: Option<String>,
    pub db_developer_name: Option<String>,
    pub db_developer_contact: Option<String>,
    #[serde(default)]
    pub aerospike_enabled: bool,
    pub aerospike_version: Option<String>,
    pub aerospike_description: Option<String>,
    #[serde(default)]
    pub redis_enabled: bool,
    pub redis_description: Option<String>,
    #[serde(default)]
    pub recon_enabled: bool,
    pub recon_technology: Option<String>,
}

/// DTO for a partial update of a bank's configuration record.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBankOption {
    pub transaction_volume_per_day: Option<i64>,
    pub transaction_volume_per_month: Option<i64>,
    pub architecture_diagram_url: Option<String>,
    pub number_of_app_servers: Option<i32>,
    pub app_server_type: Option<String>,
    pub db_type: Option<String>,
    pub number_of_db_instances: Option<i32>,
    pub implementation_developer_name: Option<String>,
    pub db_developer_name: Option<String>,
    pub db_developer_contact: Option<String>,
    pub aerospike_enabled: Option<bool>,
    pub aerospike_version: Option<String>,
    pub aerospike_description: Option<String>,
    pub redis_enabled: Option<bool>,
    pub redis_description: Option<String>,
    pub recon_enabled: Option<bool>,
    pub recon_technology: Option<String>,
}
