//! pjuu/crates/services/src/lib.rs
//!
//! The post/comment/subscription/alert engine. This crate is the single
//! choke point for every cross-entity write: the store holds no foreign
//! keys, so referential integrity lives here and nowhere else.

pub mod alerts;
pub mod feed;
pub mod posts;
pub mod subscriptions;
pub mod tags;

pub use alerts::{AlertManager, PostingAlert};
pub use posts::PostService;
pub use tags::parse_tags;
