//! User entity models and DTOs.
//!
//! Roles are stored as TEXT and mapped to [`vigil_core::roles::Role`] at the
//! domain boundary. The `password_hash` column never leaves this layer:
//! [`User`] is the internal row, [`UserView`] is what handlers serialize.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vigil_core::types::{DbId, Timestamp};

/// A row from the `users` table (internal; carries the password hash).
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub created_at: Timestamp,
}

/// Public view of a user, safe to serialize in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: DbId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub created_at: Timestamp,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        UserView {
            id: u.id,
            username: u.username,
            name: u.name,
            email: u.email,
            role: u.role,
            active: u.active,
            created_at: u.created_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub role: String,
}
