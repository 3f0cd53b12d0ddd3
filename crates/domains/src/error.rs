//! # AppError
//!
//! Centralized error handling for the Pjuu core.
//!
//! The taxonomy is deliberately small: "not found" is never an error here
//! (reads return `Option`, predicates return `bool`), so the only failures
//! that surface as `Err` are store I/O and configuration problems.

use thiserror::Error;

/// The primary error type for all core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Store round-trip failure (connection lost, command refused).
    /// Fatal at this layer; nothing here retries.
    #[error("store i/o error: {0}")]
    Store(String),

    /// Settings could not be loaded or were malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized Result type for Pjuu core logic.
pub type Result<T> = std::result::Result<T, AppError>;
