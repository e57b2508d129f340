use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{PasswordHasher, TokenIssuer};
use crate::db::models::DISPLAY_NAME_PLACEHOLDER;
use crate::db::{NewUser, UserStore};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::Settings;

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: Uuid,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            store_timeout,
        }
    }

    pub fn from_settings(store: Arc<dyn UserStore>, settings: &Settings) -> Self {
        let expiry = settings.auth.token_expiry_hours.map(chrono::Duration::hours);
        Self::new(
            store,
            PasswordHasher::new(settings.auth.bcrypt_cost),
            TokenIssuer::with_expiry(&settings.auth.jwt_secret, expiry),
            settings.database.query_timeout(),
        )
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Creates a user and returns the id the store assigned to it.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        profile: Map<String, Value>,
    ) -> Result<Uuid, AppError> {
        if email.is_empty() {
            return Err(AppError::ValidationError("email is required".into()));
        }
        if password.is_empty() {
            return Err(AppError::ValidationError("password is required".into()));
        }

        if self.bounded(self.store.find_by_email(email)).await?.is_some() {
            warn!("Registration rejected, email already in use");
            return Err(AuthError::DuplicateEmail.into());
        }

        let password_hash = self.hasher.hash(password).await?;
        let new_user = NewUser::new(email.to_owned(), password_hash, profile);

        // The lookup above can race with a concurrent registration; the store
        // still refuses the second insert.
        match self.bounded(self.store.insert(new_user)).await {
            Ok(id) => {
                info!("Registered user {}", id);
                Ok(id)
            }
            Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
                warn!("Registration lost a race on the same email");
                Err(AuthError::DuplicateEmail.into())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let user = self
            .bounded(self.store.find_by_email(email))
            .await?
            .ok_or(AuthError::UnknownUser)?;

        if !self.hasher.verify(password, &user.password_hash).await? {
            warn!("Incorrect password for user {}", user.id);
            return Err(AuthError::BadPassword.into());
        }

        let token = self.tokens.issue(user.id)?;
        info!("User {} logged in", user.id);
        Ok(LoginOutcome {
            token,
            user_id: user.id,
        })
    }

    /// Display name of the user, or a placeholder when none was registered.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<String, AppError> {
        let user = self
            .bounded(self.store.find_by_id(user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        Ok(user
            .display_name()
            .unwrap_or(DISPLAY_NAME_PLACEHOLDER)
            .to_string())
    }

    /// Resolves a token to the user id it was issued for.
    pub fn validate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.tokens.verify(token)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DatabaseError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(DatabaseError::Timeout(self.store_timeout).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryUserStore, MockUserStore};
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn service_with(store: Arc<dyn UserStore>) -> AuthService {
        AuthService::new(store, PasswordHasher::new(4), TokenIssuer::new("test_secret"), TIMEOUT)
    }

    fn memory_service() -> AuthService {
        service_with(Arc::new(MemoryUserStore::new()))
    }

    fn profile(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test_log::test(tokio::test)]
    async fn test_register_then_login() {
        let service = memory_service();
        let id = service.register("a@x.com", "pw1", Map::new()).await.unwrap();

        let outcome = service.login("a@x.com", "pw1").await.unwrap();
        assert_eq!(outcome.user_id, id);
        assert_eq!(service.validate_token(&outcome.token).unwrap(), id);
    }

    #[tokio::test]
    async fn test_duplicate_email_regardless_of_password() {
        let service = memory_service();
        service.register("a@x.com", "pw1", Map::new()).await.unwrap();

        let err = service.register("a@x.com", "something-else", Map::new()).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = memory_service();
        service.register("a@x.com", "pw1", Map::new()).await.unwrap();

        let err = service.login("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::BadPassword)));

        let err = service.login("nobody@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::UnknownUser)));
    }

    #[tokio::test]
    async fn test_profile_display_name_and_placeholder() {
        let service = memory_service();
        let named = service
            .register("a@x.com", "pw1", profile(json!({ "name": "Madhu" })))
            .await
            .unwrap();
        let unnamed = service.register("b@x.com", "pw2", Map::new()).await.unwrap();

        assert_eq!(service.get_profile(named).await.unwrap(), "Madhu");
        assert_eq!(service.get_profile(unnamed).await.unwrap(), DISPLAY_NAME_PLACEHOLDER);

        let err = service.get_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_credentials() {
        let service = memory_service();
        let err = service.register("", "pw1", Map::new()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service.register("a@x.com", "", Map::new()).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_stored_record_keeps_profile_and_hashes_password() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(store.clone());
        service
            .register("a@x.com", "pw1", profile(json!({ "name": "Madhu", "age": 30 })))
            .await
            .unwrap();

        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "pw1");
        assert_eq!(user.profile.get("age"), Some(&json!(30)));
        assert_eq!(user.display_name(), Some("Madhu"));
    }

    #[tokio::test]
    async fn test_insert_conflict_reported_as_duplicate() {
        let mut store = MockUserStore::new();
        store.expect_find_by_email().returning(|_| Ok(None));
        store.expect_insert().times(1).returning(|_| Err(DatabaseError::Duplicate));

        let err = service_with(Arc::new(store))
            .register("a@x.com", "pw1", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockUserStore::new();
        store
            .expect_find_by_email()
            .returning(|_| Err(DatabaseError::QueryError("connection reset".into())));
        store.expect_insert().never();

        let service = service_with(Arc::new(store));

        let err = service.register("a@x.com", "pw1", Map::new()).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(DatabaseError::QueryError(_))));

        let err = service.login("a@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(DatabaseError::QueryError(_))));
    }

    #[tokio::test]
    async fn test_login_with_corrupt_stored_hash_is_bad_password() {
        let mut store = MockUserStore::new();
        store.expect_find_by_email().returning(|email| {
            Ok(Some(
                NewUser::new(email.to_string(), "corrupt".to_string(), Map::new())
                    .into_user(Uuid::new_v4()),
            ))
        });

        let err = service_with(Arc::new(store)).login("a@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(AuthError::BadPassword)));
    }

    struct StalledStore;

    #[async_trait::async_trait]
    impl UserStore for StalledStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<crate::db::User>, DatabaseError> {
            std::future::pending().await
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<crate::db::User>, DatabaseError> {
            std::future::pending().await
        }

        async fn insert(&self, _user: NewUser) -> Result<Uuid, DatabaseError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_store_calls_time_out() {
        let service = AuthService::new(
            Arc::new(StalledStore),
            PasswordHasher::new(4),
            TokenIssuer::new("test_secret"),
            Duration::from_millis(50),
        );
        let err = service.get_profile(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(DatabaseError::Timeout(_))));
    }
}
