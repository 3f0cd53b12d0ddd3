//! pjuu/crates/domains/src/lib.rs
//!
//! The central domain models and port definitions for the Pjuu core.
//! Everything above the raw key-value store speaks in these types.

pub mod error;
pub mod keys;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
