pub mod get;
pub mod list;

pub use get::{find_by_email, GetUserError, GetUserQuery};
pub use list::{ListUsersError, ListUsersQuery, ListUsersResponse};
