// Error types shared across the crate.

use thiserror::Error;

/// Errors raised by the introspection and configuration layer
#[derive(Debug, Error)]
pub enum RuleError {
    /// A required argument was absent
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
