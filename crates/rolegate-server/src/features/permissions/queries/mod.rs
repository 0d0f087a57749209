//! Permission read side
//!
//! [`has_permission`] backs the RBAC route guard; [`list`] serves the
//! catalogue endpoint.

use sqlx::PgPool;

pub mod list;

pub use list::{ListPermissionsError, ListPermissionsQuery};

/// Whether any live role held by `user_id` grants `action` on `resource`
///
/// Deleted users and deleted roles grant nothing.
#[tracing::instrument(skip(pool))]
pub async fn has_permission(
    pool: &PgPool,
    user_id: u64,
    resource: &str,
    action: &str,
) -> Result<bool, sqlx::Error> {
    let Ok(user_id) = i64::try_from(user_id) else {
        return Ok(false);
    };

    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM user_roles ur
            JOIN users u ON u.id = ur.user_id AND u.deleted_at IS NULL
            JOIN roles r ON r.id = ur.role_id AND r.deleted_at IS NULL
            JOIN role_permissions rp ON rp.role_id = r.id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1 AND p.resource = $2 AND p.action = $3
        )
        "#,
    )
    .bind(user_id)
    .bind(resource)
    .bind(action)
    .fetch_one(pool)
    .await
}
