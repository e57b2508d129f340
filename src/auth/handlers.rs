use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, error};
use uuid::Uuid;

use super::gate::AuthenticatedUser;
use crate::error::AppError;
use crate::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to the authentication backend";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Any other fields are stored with the user as its profile.
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub your_id: Uuid,
    pub message: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let RegisterRequest { email, password, profile } = req.into_inner();
    info!("Received registration request for email: {}", email);

    match state.auth_service.register(&email, &password, profile).await {
        Ok(id) => {
            info!("Registration successful for email: {}", email);
            Ok(HttpResponse::Ok().json(RegisterResponse {
                your_id: id,
                message: "User registered successfully".to_string(),
            }))
        }
        Err(e) => {
            error!("Registration failed for email: {}: {}", email, e);
            Err(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub jwt_token: String,
    pub user_id: Uuid,
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for email: {}", req.email);
    match state.auth_service.login(&req.email, &req.password).await {
        Ok(outcome) => {
            info!("Login successful for email: {}", req.email);
            Ok(HttpResponse::Ok().json(LoginResponse {
                jwt_token: outcome.token,
                user_id: outcome.user_id,
            }))
        }
        Err(e) => {
            error!("Login failed for email: {}: {}", req.email, e);
            Err(e)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDataResponse {
    pub username: String,
}

/// Display name of any registered user, for an authenticated caller.
pub async fn get_user_data(
    caller: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let raw_id = path.into_inner();
    // Ids that are not UUIDs cannot name a stored user
    let user_id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::NotFound("User not found".into()))?;

    info!("User {} requested profile of {}", caller.user_id, user_id);
    let username = state.auth_service.get_profile(user_id).await?;
    Ok(HttpResponse::Ok().json(UserDataResponse { username }))
}

pub async fn welcome() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(WELCOME_MESSAGE)
}
