//! Shared utilities and types for feature modules
//!
//! - **pagination**: page/page_size parameters and list metadata
//! - **validation**: input validation utilities
//! - **error_helpers**: constraint-violation mapping

pub mod error_helpers;
pub mod pagination;
pub mod validation;

pub use pagination::{Paginated, PaginationMetadata, PaginationParams};
pub use validation::{validate_email, validate_name, MIN_PASSWORD_LENGTH};
