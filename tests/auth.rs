use authgate_server::{
    auth::{AuthService, PasswordHasher, TokenIssuer},
    error::{AppError, AuthError},
    MemoryUserStore, UserStore,
};
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

fn auth_service(store: Arc<MemoryUserStore>) -> AuthService {
    AuthService::new(
        store,
        PasswordHasher::new(4),
        TokenIssuer::new("test_secret"),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_auth_flow() {
    let auth_service = auth_service(Arc::new(MemoryUserStore::new()));

    let id = auth_service
        .register("test@example.com", "password123", Map::new())
        .await
        .unwrap();

    let outcome = auth_service.login("test@example.com", "password123").await.unwrap();
    assert_eq!(outcome.user_id, id);

    // Validate token
    let user_id = auth_service.validate_token(&outcome.token).unwrap();
    assert_eq!(user_id, id);
}

#[tokio::test]
async fn test_invalid_token() {
    let auth_service = auth_service(Arc::new(MemoryUserStore::new()));

    match auth_service.validate_token("invalid_token") {
        Err(AuthError::InvalidToken) => (),
        other => panic!("Expected invalid token error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tokens_survive_service_restart_with_same_secret() {
    let store = Arc::new(MemoryUserStore::new());
    let first = auth_service(store.clone());
    let id = first.register("a@x.com", "pw1", Map::new()).await.unwrap();
    let token = first.login("a@x.com", "pw1").await.unwrap().token;
    drop(first);

    let second = auth_service(store);
    assert_eq!(second.validate_token(&token).unwrap(), id);
}

#[tokio::test]
async fn test_concurrent_registrations_create_one_user() {
    let store = Arc::new(MemoryUserStore::new());
    let service = Arc::new(auth_service(store.clone()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register("race@x.com", &format!("pw{}", i), Map::new())
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::AuthError(AuthError::DuplicateEmail)) => (),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(created, 1);
    assert!(store.find_by_email("race@x.com").await.unwrap().is_some());
    assert_eq!(store.len().await, 1);
}
