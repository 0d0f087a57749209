pub mod create;
pub mod delete;
pub mod grant;
pub mod update;

pub use create::{CreateRoleCommand, CreateRoleError};
pub use delete::{DeleteRoleCommand, DeleteRoleError, DeleteRoleResponse};
pub use grant::{
    GrantPermissionCommand, GrantPermissionError, GrantPermissionResponse, RevokePermissionCommand,
};
pub use update::{UpdateRoleCommand, UpdateRoleError};
