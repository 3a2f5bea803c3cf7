use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub catalog_path: PathBuf,
    pub model_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shopai".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shopai-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
        };
        let catalog_path = std::env::var("CATALOG_PATH")
            .unwrap_or_else(|_| "data/product_data.json".into())
            .into();
        let model_path = std::env::var("MODEL_PATH")
            .unwrap_or_else(|_| "data/svd_model.json".into())
            .into();
        Ok(Self {
            database_url,
            database_max_connections,
            jwt,
            catalog_path,
            model_path,
        })
    }
}
