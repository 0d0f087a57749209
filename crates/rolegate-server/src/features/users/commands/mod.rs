pub mod assign_roles;
pub mod create;
pub mod delete;
pub mod update;

pub use assign_roles::{AssignRolesCommand, AssignRolesError, AssignRolesResponse};
pub use create::{CreateUserCommand, CreateUserError};
pub use delete::{DeleteUserCommand, DeleteUserError, DeleteUserResponse};
pub use update::{UpdateUserCommand, UpdateUserError};
