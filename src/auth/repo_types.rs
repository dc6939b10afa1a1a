use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Public profile of a user, embedded in offers and login responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(default)]
    pub avatar: Option<serde_json::Value>,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub avatar: Option<serde_json::Value>,
    pub newsletter: bool,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 PHC string
    #[serde(skip_serializing)]
    pub salt: String,
    #[serde(skip_serializing)]
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn account(&self) -> Account {
        Account {
            username: self.username.clone(),
            avatar: self.avatar.clone(),
        }
    }
}
