pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    CreatePermissionCommand, CreatePermissionError, DeletePermissionCommand, DeletePermissionError,
};
pub use queries::{has_permission, ListPermissionsError, ListPermissionsQuery};
pub use routes::permissions_routes;
