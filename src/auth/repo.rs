use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{User, UserId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user credentials. Implementations must reject a duplicate
/// email atomically; callers never check before inserting.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserId, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserId, StoreError> {
        // The UNIQUE constraint on email is the only duplicate check.
        sqlx::query_scalar::<_, UserId>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            other => StoreError::Database(other),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_rejects_duplicate_email() {
        let store = memory::InMemoryUserStore::default();
        let id = store.create_user("a@x.com", "h1").await.expect("first insert");
        let err = store.create_user("a@x.com", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let user = store.find_by_email("a@x.com").await.unwrap().expect("stored");
        assert_eq!(user.id, id);
        assert_eq!(user.password_hash, "h1");
    }

    #[tokio::test]
    async fn memory_store_matches_email_exactly() {
        let store = memory::InMemoryUserStore::default();
        store.create_user("a@x.com", "h").await.unwrap();
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
        assert!(store.create_user("A@x.com", "h").await.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL with migrations applied"]
    async fn pg_store_rejects_duplicate_email() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let db = sqlx::postgres::PgPoolOptions::new()
            .connect(&url)
            .await
            .expect("connect");
        let store = PgUserStore::new(db);
        let email = format!(
            "dup-{}@example.com",
            time::OffsetDateTime::now_utc().unix_timestamp_nanos()
        );

        let id = store.create_user(&email, "h1").await.expect("insert");
        let err = store.create_user(&email, "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let user = store.find_by_id(id).await.unwrap().expect("by id");
        assert_eq!(user.email, email);
        assert_eq!(user.password_hash, "h1");
    }
}
