//! Database models
//!
//! Row types for the audited tables. Each implements [`Entity`] so the
//! mutation pipeline knows its table, primary key and soft-delete behaviour.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::pipeline::{Entity, Schema};

/// Account is enabled and may log in
pub const USER_STATUS_ACTIVE: i32 = 1;

/// Account is disabled
pub const USER_STATUS_DISABLED: i32 = 0;

pub static USERS_SCHEMA: Schema = Schema {
    table: "users",
    primary_key: "id",
    soft_delete: true,
};

pub static ROLES_SCHEMA: Schema = Schema {
    table: "roles",
    primary_key: "id",
    soft_delete: true,
};

pub static PERMISSIONS_SCHEMA: Schema = Schema {
    table: "permissions",
    primary_key: "id",
    soft_delete: false,
};

/// User account row
///
/// `password` holds the Argon2id PHC string and never leaves the server:
/// API responses use [`UserResponse`] and audit snapshots redact it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub email: String,
    pub password: String,
    pub status: i32,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == USER_STATUS_ACTIVE
    }
}

impl Entity for User {
    fn schema() -> &'static Schema {
        &USERS_SCHEMA
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Role row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Role {
    fn schema() -> &'static Schema {
        &ROLES_SCHEMA
    }
}

/// Permission row: the right to perform `action` on `resource`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resource: String,
    pub action: String,
    pub description: Option<String>,
}

impl Entity for Permission {
    fn schema() -> &'static Schema {
        &PERMISSIONS_SCHEMA
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::snapshot;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            password: "$argon2id$v=19$secret".to_string(),
            status: USER_STATUS_ACTIVE,
        }
    }

    #[test]
    fn test_user_response_drops_password() {
        let json = serde_json::to_value(UserResponse::from(user())).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@x.com");
    }

    #[test]
    fn test_user_snapshot_is_redacted() {
        let image: serde_json::Value = serde_json::from_str(&snapshot::serialize(&user())).unwrap();
        assert_eq!(image["id"], 7);
        assert_eq!(image["name"], "Alice");
        assert!(image.get("password").is_none());
        assert!(image.get("deleted_at").is_none());
    }

    #[test]
    fn test_schemas() {
        assert_eq!(User::schema().table, "users");
        assert!(Role::schema().soft_delete);
        assert!(!Permission::schema().soft_delete);
    }
}
