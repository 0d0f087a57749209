use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::{User, UserResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetUserError {
    #[error("User {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetUserQuery) -> Result<UserResponse, GetUserError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
        .bind(query.id)
        .fetch_optional(&pool)
        .await?
        .map(UserResponse::from)
        .ok_or(GetUserError::NotFound(query.id))
}

/// Look up a live user by email, password hash included
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL")
        .bind(email.trim())
        .fetch_optional(pool)
        .await
}
