//! Password hashing and verification.
use tracing::warn;

use crate::error::AppError;

/// Salted bcrypt hashing at a fixed cost. Both operations run on the blocking
/// thread pool so they never stall a request worker.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password. The result embeds salt and cost, so it is all that
    /// [`verify`](Self::verify) needs later.
    pub async fn hash(&self, plain: &str) -> Result<String, AppError> {
        let plain = plain.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
            .await?
            .map_err(|e| AppError::InternalError(format!("password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash. A mismatch or an unreadable
    /// hash both yield `false`.
    pub async fn verify(&self, plain: &str, hashed: &str) -> Result<bool, AppError> {
        let plain = plain.to_owned();
        let hashed = hashed.to_owned();
        let matched = tokio::task::spawn_blocking(move || match bcrypt::verify(plain, &hashed) {
            Ok(matched) => matched,
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        })
        .await?;
        Ok(matched)
    }
}
