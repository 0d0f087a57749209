//! Rolegate Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing used by every Rolegate workspace member.
//!
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber bootstrap driven by environment variables
//!
//! # Example
//!
//! ```no_run
//! use rolegate_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> rolegate_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
