//! Authentication module
//!
//! Password hashing, session token issuance and verification, the
//! registration/login/profile service and the bearer-token gate for
//! protected routes.

pub mod gate;
pub mod handlers;
mod password;
mod service;
mod token;

pub use gate::{authorize, AuthenticatedUser};
pub use password::PasswordHasher;
pub use service::{AuthService, LoginOutcome};
pub use token::{Claims, TokenIssuer};
