//! Core error type.
//!
//! Sub-crates define their own error enums; `CoreError` covers the handful of
//! failures that can happen while constructing core values (bad generator
//! bounds, bad run configuration, unreadable files).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid distribution: {0}")]
    Distribution(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
