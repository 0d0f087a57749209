pub mod commands;
pub mod routes;

pub use commands::{LoginCommand, LoginError, LoginResponse};
pub use routes::auth_routes;
