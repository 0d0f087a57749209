pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreateRoleCommand, CreateRoleError, DeleteRoleCommand, DeleteRoleError,
    GrantPermissionCommand, GrantPermissionError, UpdateRoleCommand, UpdateRoleError,
};
pub use queries::{GetRoleError, GetRoleQuery, ListRolesError, ListRolesQuery, RoleDetail};
pub use routes::roles_routes;
