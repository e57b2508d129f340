pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use tracing::warn;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::{AuthService, AuthenticatedUser, PasswordHasher, TokenIssuer};
pub use db::{MemoryUserStore, NewUser, PgUserStore, User, UserStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all request workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Connects to Postgres and applies migrations. The server must not start
    /// if this fails.
    pub async fn new(config: Settings) -> Result<Self> {
        let store = PgUserStore::new_with_options(
            &config.database.url,
            config.database.max_connections,
            config.database.acquire_timeout(),
        )
        .await?;
        store.migrate().await?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: Settings, store: Arc<dyn UserStore>) -> Self {
        let auth_service = AuthService::from_settings(store, &config);
        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        }
    }
}

/// Renders malformed request bodies with the same JSON error shape as every
/// other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        warn!("Rejected body for {}: {}", req.path(), err);
        AppError::ValidationError(err.to_string()).into()
    })
}

/// Route table shared by the server binary and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use auth::handlers::{get_user_data, login, register, welcome};

    cfg.app_data(json_config())
        .route("/health", web::get().to(health_check))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/getUserData/{userId}", web::get().to(get_user_data))
        .default_service(web::to(welcome));
}
