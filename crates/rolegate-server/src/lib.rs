//! Rolegate Server Library
//!
//! HTTP backend for user management, JWT authentication and role-based
//! access control, with an audit trail of every data mutation.
//!
//! # Architecture
//!
//! Features are vertical slices split into **commands** (writes) and
//! **queries** (reads):
//!
//! - Commands that touch `users`, `roles` or `permissions` run through the
//!   [`db::pipeline::Pipeline`]. The [`audit::AuditInterceptor`] registered on
//!   it records one `audit_logs` row per successful create, update or delete,
//!   with before/after snapshots, the acting user and the client IP.
//! - Queries read straight from the pool and are not audited.
//!
//! Audit reads and writes use their own connection pool, outside the
//! caller's transaction. A failed audit write is logged and never fails the
//! request.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower**: middleware and service abstractions
//!
//! # Example
//!
//! ```no_run
//! use rolegate_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&db::DbConfig::business(&config)).await?;
//!     let audit_pool = db::create_pool(&db::DbConfig::audit(&config)).await?;
//!     let app = api::build_router(api::build_state(&config, pool, audit_pool), &config);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;

pub use error::{AppError, AppResult};
