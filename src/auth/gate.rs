use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use super::TokenIssuer;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// The caller of a protected handler, resolved from its bearer token.
///
/// Taking this as a handler argument gates the handler: extraction fails with
/// `401` before the handler body runs when the header is missing or the token
/// does not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Checks a raw `Authorization` header value. The token is the second
/// space-separated segment (`Bearer <token>`).
pub fn authorize(header_value: Option<&str>, tokens: &TokenIssuer) -> Result<Uuid, AuthError> {
    let header_value = header_value.ok_or(AuthError::MissingCredential)?;
    let token = header_value
        .split(' ')
        .nth(1)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)?;
    tokens.verify(token)
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(extract(req))
    }
}

fn extract(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        AppError::InternalError("application state is not registered".into())
    })?;

    let header_value = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        // A header that is not valid text cannot hold a token
        Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
    };

    match authorize(header_value, state.auth_service.tokens()) {
        Ok(user_id) => Ok(AuthenticatedUser { user_id }),
        Err(e) => {
            warn!("Rejected request to {}: {}", req.path(), e);
            Err(e.into())
        }
    }
}
