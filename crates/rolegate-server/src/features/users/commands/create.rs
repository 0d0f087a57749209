//! Create user command
//!
//! Registers a new account. The password is hashed with Argon2id before it
//! reaches the database and the insert goes through the audited pipeline.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::AuditContext;
use crate::auth::{hash_password, AuthError};
use crate::db::pipeline::Pipeline;
use crate::features::shared::{
    error_helpers::map_unique_violation,
    validation::{validate_email, validate_name, EmailValidationError, NameValidationError},
    MIN_PASSWORD_LENGTH,
};
use crate::models::{User, UserResponse, USER_STATUS_ACTIVE};

/// Command to create a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserCommand {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Errors that can occur when creating a user
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("{0}")]
    Name(#[from] NameValidationError),
    #[error("{0}")]
    Email(#[from] EmailValidationError),
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    #[error("A user with email '{0}' already exists")]
    DuplicateEmail(String),
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateUserCommand {
    /// Validates the command parameters
    ///
    /// # Errors
    ///
    /// - `Name` - Name is empty or longer than 100 characters
    /// - `Email` - Email is empty, too long or malformed
    /// - `PasswordTooShort` - Password shorter than six characters
    pub fn validate(&self) -> Result<(), CreateUserError> {
        validate_name(&self.name, 100)?;
        validate_email(&self.email, 255)?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CreateUserError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Handles the create user command
///
/// # Errors
///
/// - Validation errors if command parameters are invalid
/// - `DuplicateEmail` - A live user already uses the email
/// - `Database` - A database error occurred
#[tracing::instrument(skip(pool, pipeline, command), fields(email = %command.email))]
pub async fn handle(
    pool: PgPool,
    pipeline: &Pipeline,
    ctx: &AuditContext,
    command: CreateUserCommand,
) -> Result<UserResponse, CreateUserError> {
    command.validate()?;

    let password_hash = hash_password(&command.password)?;
    let email = command.email.trim().to_string();

    let user: User = pipeline
        .create(ctx, async {
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (name, email, password, status)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(command.name.trim())
            .bind(&email)
            .bind(&password_hash)
            .bind(USER_STATUS_ACTIVE)
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    CreateUserError::DuplicateEmail(email.clone()),
                    CreateUserError::Database,
                )
            })
        })
        .await?;

    tracing::info!(user_id = user.id, "User created");

    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(name: &str, email: &str, password: &str) -> CreateUserCommand {
        CreateUserCommand {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command("Alice", "a@x.com", "secret").validate().is_ok());
    }

    #[test]
    fn test_validation_short_password() {
        assert!(matches!(
            command("Alice", "a@x.com", "12345").validate(),
            Err(CreateUserError::PasswordTooShort)
        ));
    }

    #[test]
    fn test_validation_bad_email() {
        assert!(matches!(
            command("Alice", "not-an-email", "secret").validate(),
            Err(CreateUserError::Email(EmailValidationError::InvalidFormat))
        ));
    }

    #[test]
    fn test_validation_empty_name() {
        assert!(matches!(
            command(" ", "a@x.com", "secret").validate(),
            Err(CreateUserError::Name(NameValidationError::Required))
        ));
    }

    #[test]
    fn test_password_is_not_serialized() {
        let json = serde_json::to_string(&command("Alice", "a@x.com", "secret")).unwrap();
        assert!(!json.contains("secret"));
    }
}
