//! Audit trail of data mutations
//!
//! Mutations issued through [`Pipeline`](crate::db::pipeline::Pipeline) are
//! captured by [`AuditInterceptor`] and appended to the `audit_logs` table:
//! who acted (from [`AuditContext`]), on which row (from [`identity`]), and
//! the before/after state (from [`snapshot`]).
//!
//! # Architecture
//!
//! - **context**: request-scoped actor and IP, plus the per-operation pre-image slot
//! - **middleware**: [`ActorContextLayer`] fills the context from claims and headers
//! - **identity**: table and primary-key resolution for a pending mutation
//! - **snapshot**: redacted, key-sorted JSON images
//! - **interceptor**: the pipeline hook that assembles and emits records
//! - **store**: append-only sinks on an isolated pool
//!
//! Audit writes are best-effort and synchronous. They never join the caller's
//! transaction and never change the outcome of the business operation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rolegate_server::audit::{AuditInterceptor, PgAuditStore};
//! use rolegate_server::db::pipeline::Pipeline;
//! use sqlx::PgPool;
//!
//! # fn example(audit_pool: PgPool) {
//! let store = Arc::new(PgAuditStore::new(audit_pool.clone()));
//! let pipeline = Pipeline::new(audit_pool).with_hook(Arc::new(AuditInterceptor::new(store)));
//! # }
//! ```

pub mod context;
pub mod identity;
pub mod interceptor;
pub mod middleware;
pub mod models;
pub mod snapshot;
pub mod store;

pub use context::AuditContext;
pub use interceptor::AuditInterceptor;
pub use middleware::ActorContextLayer;
pub use models::{AuditAction, AuditRecord, NewAuditRecord, NewAuditRecordBuilder, AUDIT_TABLE};
pub use store::{AuditError, AuditStore, MemoryAuditStore, PgAuditStore};
