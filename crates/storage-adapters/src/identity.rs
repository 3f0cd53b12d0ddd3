//! # Store-backed identity adapter
//!
//! The auth collaborator maintains a `uid:{username}` lookup hash; this
//! adapter resolves usernames through it. It works against any store
//! implementation, so tests get it for free on the in-memory adapter.

use std::sync::Arc;

use async_trait::async_trait;
use domains::ports::{Identity, KvStore};
use domains::{keys, Result, UserId};

pub struct StoreIdentity {
    store: Arc<dyn KvStore>,
}

impl StoreIdentity {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        StoreIdentity { store }
    }
}

#[async_trait]
impl Identity for StoreIdentity {
    async fn uid_for_username(&self, username: &str) -> Result<Option<UserId>> {
        let field = self
            .store
            .hash_get(&keys::uid_lookup(username), "uid")
            .await?;
        Ok(field.and_then(|f| f.parse().ok()))
    }
}
