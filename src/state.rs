use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{jwt::JwtKeys, repo::PgUserStore, services::AuthService};
use crate::config::AppConfig;
use crate::recommend::{catalog::Catalog, model::SvdModel, services::Recommender};

/// Process-wide handles built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub recommender: Recommender,
}

impl AppState {
    /// Connects the database, applies migrations and loads the catalog and
    /// model. Any failure aborts startup.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        let catalog = Catalog::load(&config.catalog_path)?;
        let model = SvdModel::load(&config.model_path)?;

        let auth = AuthService::new(Arc::new(PgUserStore::new(db)), JwtKeys::new(&config.jwt));
        let recommender = Recommender::new(Arc::new(catalog), Arc::new(model));

        Ok(Self { auth, recommender })
    }

    #[cfg(test)]
    pub fn fake(recommender: Recommender) -> Self {
        use crate::auth::repo::memory::InMemoryUserStore;
        use crate::config::JwtConfig;

        let keys = JwtKeys::new(&JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
        });
        let auth = AuthService::new(Arc::new(InMemoryUserStore::default()), keys);
        Self { auth, recommender }
    }
}
