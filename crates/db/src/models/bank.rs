//! Bank entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::DbId;

/// A row from the `banks` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bank {
    pub id: DbId,
    pub name: String,
    pub active: bool,
}

/// DTO for creating a new bank.
#[derive(Debug, Deserialize)]
pub struct CreateBank {
    pub name: String,
}
