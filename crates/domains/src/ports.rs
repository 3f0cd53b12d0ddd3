//! # Core Ports
//!
//! Any storage or delivery adapter must implement these traits to be used
//! by the services layer.
//!
//! The store port mirrors exactly the primitives the engine relies on:
//! atomic counters, hashes, ordered lists, sorted sets, an existence check
//! and a pipelined batch. Nothing richer: correctness under concurrency
//! rests on these narrow atomic operations, not on transactions.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RenderedAlert, UserId};

/// One write in a pipelined batch. The batch reaches the store as a single
/// contiguous group; individual results are not independently rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// Set all given fields on a hash.
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Prepend a value to a list.
    ListPrepend { key: String, value: String },
    /// Trim a list to the inclusive index range `start..=stop`
    /// (negative indices count from the tail, as the store does).
    ListTrim { key: String, start: i64, stop: i64 },
}

/// Data persistence contract against the atomic hash/list/sorted-set store.
///
/// Absent keys behave as the store does: reads return empty/`None`,
/// list and set mutations on missing keys are no-ops.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomically increment an integer key, returning the new value.
    /// No two callers ever observe the same result for the same key.
    async fn incr(&self, key: &str) -> Result<i64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Remove a key of any kind. Missing keys are a no-op.
    async fn remove(&self, key: &str) -> Result<()>;

    // Hashes
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>>;
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>>;
    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<()>;
    /// Atomically add `delta` to an integer hash field, returning the new
    /// value. A missing field counts as zero.
    async fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    // Lists
    async fn list_prepend(&self, key: &str, value: &str) -> Result<()>;
    async fn list_trim(&self, key: &str, start: i64, stop: i64) -> Result<()>;
    async fn list_range(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;
    /// Remove every occurrence of `value`, returning how many were removed.
    async fn list_remove(&self, key: &str, value: &str) -> Result<u64>;
    async fn list_len(&self, key: &str) -> Result<u64>;

    // Sorted sets
    /// Add `member` with `score` only if it is not already present, as one
    /// atomic server-side operation. Returns whether it was inserted.
    async fn sorted_add_nx(&self, key: &str, member: &str, score: i64) -> Result<bool>;
    async fn sorted_remove(&self, key: &str, member: &str) -> Result<bool>;
    /// All members ordered by (score, member).
    async fn sorted_range(&self, key: &str) -> Result<Vec<String>>;
    async fn sorted_rank(&self, key: &str, member: &str) -> Result<Option<u64>>;
    async fn sorted_score(&self, key: &str, member: &str) -> Result<Option<i64>>;

    /// Submit a pipelined batch. Best effort: the batch is issued as one
    /// group but partial server-side application is not rolled back.
    async fn run_batch(&self, writes: Vec<StoreWrite>) -> Result<()>;
}

/// Identity collaborator contract: resolve a username to a user id.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait Identity: Send + Sync {
    /// `None` when no such user exists.
    async fn uid_for_username(&self, username: &str) -> Result<Option<UserId>>;
}

/// Delivery contract for rendered alerts. The distribution mechanism
/// (queue, polling store) lives behind this seam.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, recipient: UserId, alert: RenderedAlert) -> Result<()>;
}
