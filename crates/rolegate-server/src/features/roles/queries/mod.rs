pub mod get;
pub mod list;

pub use get::{GetRoleError, GetRoleQuery, RoleDetail};
pub use list::{ListRolesError, ListRolesQuery};
