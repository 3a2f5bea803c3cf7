use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

pub type UserId = i64;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,                 // surrogate key
    pub email: String,              // unique, matched exactly
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, not exposed in JSON
    pub created_at: OffsetDateTime, // creation timestamp
}
