use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::{Paginated, PaginationParams};
use crate::models::{User, UserResponse};

/// Query to list live users, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl ListUsersQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }
}

pub type ListUsersResponse = Paginated<UserResponse>;

#[derive(Debug, thiserror::Error)]
pub enum ListUsersError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListUsersQuery) -> Result<ListUsersResponse, ListUsersError> {
    let params = query.pagination();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
        .fetch_one(&pool)
        .await?;

    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE deleted_at IS NULL
        ORDER BY id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(params.page_size())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    Ok(Paginated::from_items(users, &params, total).map(UserResponse::from))
}
