use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies HS256 session tokens bound to a user id.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Option<Duration>,
}

impl TokenIssuer {
    /// Tokens carry no expiry.
    pub fn new(secret: &str) -> Self {
        Self::with_expiry(secret, None)
    }

    pub fn with_expiry(secret: &str, expiry: Option<Duration>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match expiry {
            Some(_) => validation.set_required_spec_claims(&["exp"]),
            None => {
                validation.required_spec_claims.clear();
                validation.validate_exp = false;
            }
        }
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: self.expiry.map(|ttl| (now + ttl).timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))
    }

    /// Returns the user id the token was issued for. Malformed, tampered and
    /// expired tokens are all reported as [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.user_id)
    }
}
