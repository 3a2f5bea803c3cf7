use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::{
    dto::PublicUser,
    jwt::JwtKeys,
    password::{hash_password, verify_dummy, verify_password},
    repo::{StoreError, UserStore},
    repo_types::UserId,
};

#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("Missing fields")]
    MissingFields,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email and wrong password both map here.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    /// Registers a user. No token is issued; clients log in separately.
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), SignupError> {
        if email.is_empty() || password.is_empty() {
            return Err(SignupError::MissingFields);
        }

        let hash = hash_password(password)?;

        match self.store.create_user(email, &hash).await {
            Ok(user_id) => {
                info!(user_id, email, "user registered");
                Ok(())
            }
            Err(StoreError::DuplicateEmail) => {
                warn!(email, "email already registered");
                Err(SignupError::UserAlreadyExists)
            }
            Err(e) => {
                error!(error = %e, "create user failed");
                Err(SignupError::Internal(e.into()))
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = match self.store.find_by_email(email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                verify_dummy(password);
                warn!(email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(AuthError::Internal(e.into()));
            }
        };

        if !verify_password(password, &user.password_hash) {
            warn!(email, user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.sign(user.id).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AuthError::Internal(e)
        })?;

        info!(user_id = user.id, email, "user logged in");
        Ok(token)
    }

    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        self.keys
            .verify(token)
            .map(|claims| claims.sub)
            .map_err(|e| {
                warn!(error = %e, "invalid or expired token");
                AuthError::InvalidToken
            })
    }

    pub async fn current_user(&self, user_id: UserId) -> Result<PublicUser, AuthError> {
        match self.store.find_by_id(user_id).await {
            Ok(Some(u)) => Ok(PublicUser {
                id: u.id,
                email: u.email,
            }),
            // A valid token whose user no longer resolves is treated as a bad token.
            Ok(None) => {
                warn!(user_id, "token subject not found");
                Err(AuthError::InvalidToken)
            }
            Err(e) => {
                error!(error = %e, user_id, "find_by_id failed");
                Err(AuthError::Internal(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::{auth::repo::memory::InMemoryUserStore, config::JwtConfig};

    fn make_service() -> (AuthService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::default());
        let keys = JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 15,
        });
        (AuthService::new(store.clone(), keys), store)
    }

    #[tokio::test]
    async fn signup_requires_email_and_password() {
        let (svc, _) = make_service();
        assert!(matches!(
            svc.signup("", "pw").await,
            Err(SignupError::MissingFields)
        ));
        assert!(matches!(
            svc.signup("a@x.com", "").await,
            Err(SignupError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn duplicate_signup_keeps_first_hash() {
        let (svc, store) = make_service();
        svc.signup("a@x.com", "pw1").await.expect("first signup");
        let before = store.find_by_email("a@x.com").await.unwrap().unwrap();

        let err = svc.signup("a@x.com", "pw2").await.unwrap_err();
        assert!(matches!(err, SignupError::UserAlreadyExists));

        let after = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);
        assert!(verify_password("pw1", &after.password_hash));
    }

    #[tokio::test]
    async fn concurrent_signups_for_one_email_create_one_user() {
        let (svc, _) = make_service();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.signup("race@x.com", &format!("pw{i}")).await })
            })
            .collect();

        let mut created = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(()) => created += 1,
                Err(SignupError::UserAlreadyExists) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn login_token_is_bound_to_user_id() {
        let (svc, store) = make_service();
        svc.signup("a@x.com", "pw1").await.unwrap();
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();

        let token = svc.login("a@x.com", "pw1").await.expect("login");
        assert!(!token.is_empty());
        assert_eq!(svc.authenticate(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (svc, _) = make_service();
        svc.signup("a@x.com", "pw1").await.unwrap();

        let wrong = svc.login("a@x.com", "wrong").await.unwrap_err();
        let unknown = svc.login("nobody@x.com", "pw1").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn unknown_email_costs_as_much_as_wrong_password() {
        let (svc, _) = make_service();
        svc.signup("a@x.com", "pw1").await.unwrap();
        // First miss builds the shared dummy hash.
        let _ = svc.login("warmup@x.com", "pw1").await;

        let mut wrong = Duration::ZERO;
        let mut unknown = Duration::ZERO;
        for _ in 0..3 {
            let start = Instant::now();
            assert!(svc.login("a@x.com", "wrong").await.is_err());
            wrong += start.elapsed();

            let start = Instant::now();
            assert!(svc.login("nobody@x.com", "wrong").await.is_err());
            unknown += start.elapsed();
        }

        assert!(
            unknown * 4 >= wrong && wrong * 4 >= unknown,
            "unknown={unknown:?} wrong={wrong:?}"
        );
    }

    #[tokio::test]
    async fn login_with_empty_fields_is_invalid_credentials() {
        let (svc, _) = make_service();
        assert!(matches!(
            svc.login("", "").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn current_user_resolves_authenticated_id() {
        let (svc, _) = make_service();
        svc.signup("me@x.com", "pw").await.unwrap();
        let token = svc.login("me@x.com", "pw").await.unwrap();
        let id = svc.authenticate(&token).unwrap();

        let me = svc.current_user(id).await.unwrap();
        assert_eq!(me.email, "me@x.com");
        assert!(matches!(
            svc.current_user(id + 100).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            svc.authenticate("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }
}
