use serde::{Deserialize, Serialize};

use super::repo_types::UserId;

/// Request body shared by signup and login. Absent fields deserialize as empty.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: UserId,
    pub email: String,
}
