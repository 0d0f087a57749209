pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    AssignRolesCommand, AssignRolesError, CreateUserCommand, CreateUserError, DeleteUserCommand,
    DeleteUserError, UpdateUserCommand, UpdateUserError,
};
pub use queries::{GetUserError, GetUserQuery, ListUsersError, ListUsersQuery, ListUsersResponse};
pub use routes::users_routes;
