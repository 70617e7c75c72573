//! Framework error type.
//!
//! Sub-crates define their own error enums; `CoreError` covers the few
//! failures that belong to the shared layer (configuration validation).

use thiserror::Error;

/// The error type for `fm-core`.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `fm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
