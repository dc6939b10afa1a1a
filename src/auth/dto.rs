use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::Account;

/// Request body for signup. Missing strings deserialize as empty so the
/// handler can answer with a precise message instead of a parse error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub newsletter: Option<bool>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned after signup.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub account: Account,
    pub newsletter: bool,
}

/// Returned after login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub token: String,
    pub account: Account,
}
