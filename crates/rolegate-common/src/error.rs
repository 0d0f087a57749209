//! Error types shared across Rolegate crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised by shared infrastructure (configuration parsing, logging setup)
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value {value:?} for {setting}")]
    InvalidSetting { setting: &'static str, value: String },

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl CommonError {
    /// Build an error for a setting that failed to parse
    pub fn invalid_setting(setting: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting,
            value: value.into(),
        }
    }
}
