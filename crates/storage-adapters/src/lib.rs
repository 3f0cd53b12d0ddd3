//! pjuu/crates/storage-adapters/src/lib.rs
//!
//! Implementations of the `domains` ports. The in-memory store is always
//! compiled (the test suites run against it); the Redis adapter sits
//! behind the `redis` feature and talks to a real server.

pub mod identity;
pub mod memory;
pub mod sink;

#[cfg(feature = "redis")]
pub mod redis;

pub use identity::StoreIdentity;
pub use memory::MemoryStore;
pub use sink::CollectingAlertSink;

#[cfg(feature = "redis")]
pub use redis::{RedisAlertSink, RedisKvStore};
