//! Login command
//!
//! Exchanges an email and password for a signed access token. Unknown
//! emails and wrong passwords produce the same error so callers cannot probe
//! which accounts exist.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{verify_password, AuthError, TokenService};
use crate::features::users::queries::find_by_email;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("account is disabled")]
    Disabled,
    #[error("Token issuance failed: {0}")]
    Token(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), LoginError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, tokens, command), fields(email = %command.email))]
pub async fn handle(
    pool: PgPool,
    tokens: &TokenService,
    command: LoginCommand,
) -> Result<LoginResponse, LoginError> {
    command.validate()?;

    let Some(user) = find_by_email(&pool, &command.email).await? else {
        tracing::info!("Login rejected: unknown email");
        return Err(LoginError::InvalidCredentials);
    };

    match verify_password(&command.password, &user.password) {
        Ok(true) => {},
        Ok(false) => {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(LoginError::InvalidCredentials);
        },
        Err(e) => {
            tracing::warn!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            return Err(LoginError::InvalidCredentials);
        },
    }

    if !user.is_active() {
        tracing::info!(user_id = user.id, "Login rejected: account disabled");
        return Err(LoginError::Disabled);
    }

    let user_id = u64::try_from(user.id).map_err(|_| LoginError::InvalidCredentials)?;
    let token = tokens.issue(user_id, &user.email)?;

    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(LoginResponse {
        token,
        user: LoginUser {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials() {
        let command = LoginCommand {
            email: " ".to_string(),
            password: "secret".to_string(),
        };
        assert!(matches!(command.validate(), Err(LoginError::MissingCredentials)));

        let command = LoginCommand {
            email: "a@x.com".to_string(),
            password: String::new(),
        };
        assert!(matches!(command.validate(), Err(LoginError::MissingCredentials)));
    }

    #[test]
    fn test_password_not_serialized() {
        let command = LoginCommand {
            email: "a@x.com".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!serde_json::to_string(&command).unwrap().contains("hunter22"));
    }
}
