//! pjuu/crates/integration-tests/src/lib.rs
//!
//! Shared fixtures for the end-to-end scenario tests. Everything runs
//! against the in-memory store adapter; users are seeded the way the
//! (external) auth layer would write them.

use std::sync::Arc;

use domains::ports::KvStore;
use domains::{keys, UserId};
use services::PostService;
use storage_adapters::{CollectingAlertSink, MemoryStore, StoreIdentity};

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub alerts: Arc<CollectingAlertSink>,
    pub posts: PostService,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(StoreIdentity::new(store.clone()));
        let alerts = Arc::new(CollectingAlertSink::new());
        let posts = PostService::new(store.clone(), identity, alerts.clone());
        TestEnv {
            store,
            alerts,
            posts,
        }
    }

    /// Seed a user record and its username lookup, as the auth
    /// collaborator does.
    pub async fn create_user(&self, username: &str) -> UserId {
        let uid = UserId(self.store.incr("global:uid").await.unwrap().unsigned_abs());
        self.store
            .hash_set(
                &keys::user(uid),
                &[
                    ("username".into(), username.into()),
                    ("email".into(), format!("{username}@example.com")),
                    ("score".into(), "0".into()),
                ],
            )
            .await
            .unwrap();
        self.store
            .hash_set(&keys::uid_lookup(username), &[("uid".into(), uid.to_string())])
            .await
            .unwrap();
        uid
    }

    pub async fn follow(&self, follower: UserId, followed: UserId) {
        self.store
            .sorted_add_nx(&keys::user_followers(followed), &follower.to_string(), 0)
            .await
            .unwrap();
    }

    /// The user's aggregate reputation as currently stored.
    pub async fn reputation(&self, uid: UserId) -> i64 {
        self.store
            .hash_get(&keys::user(uid), "score")
            .await
            .unwrap()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub async fn feed(&self, uid: UserId) -> Vec<String> {
        self.store
            .list_range(&keys::user_feed(uid), 0, -1)
            .await
            .unwrap()
    }
}
