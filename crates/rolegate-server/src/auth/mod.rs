//! Authentication
//!
//! - **jwt**: HS256 token issuance and verification
//! - **password**: Argon2id hashing and verification
//! - **middleware**: optional bearer-token parsing into request [`Claims`]

pub mod jwt;
pub mod middleware;
pub mod password;

use thiserror::Error;

pub use jwt::{Claims, TokenService};
pub use middleware::authenticate;
pub use password::{hash_password, verify_password};

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}
