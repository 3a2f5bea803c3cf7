use serde::{Deserialize, Serialize};

use crate::auth::repo_types::UserId;

/// Fallback used when the request does not name a user.
pub const DEFAULT_USER_ID: UserId = 1;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl RecommendRequest {
    pub fn user_id(&self) -> UserId {
        self.user_id.unwrap_or(DEFAULT_USER_ID)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationItem {
    pub product_name: String,
    pub image: String,
    pub price: f64,
    pub rating: f64,
}
