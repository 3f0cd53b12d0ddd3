//! # Subscription Ledger
//!
//! Per-post sorted set of subscriber uids, each scored by the reason they
//! are subscribed. The first reason recorded wins: subscribe goes through
//! the store's atomic add-if-absent so two racing callers cannot both
//! believe they were first.

use domains::ports::KvStore;
use domains::{keys, PostId, Reason, Result, UserId};

/// Subscribe `uid` to `pid` for `reason`. Fails closed (no-op, `false`)
/// when the post does not exist. Returns whether an insertion happened;
/// an already-subscribed user keeps their original reason.
pub async fn subscribe(
    store: &dyn KvStore,
    uid: UserId,
    pid: PostId,
    reason: Reason,
) -> Result<bool> {
    if !store.exists(&keys::post(pid)).await? {
        return Ok(false);
    }
    store
        .sorted_add_nx(&keys::post_subscribers(pid), &uid.to_string(), reason.score())
        .await
}

/// Remove `uid` from the post's subscribers. Returns whether anything was
/// removed.
pub async fn unsubscribe(store: &dyn KvStore, uid: UserId, pid: PostId) -> Result<bool> {
    store
        .sorted_remove(&keys::post_subscribers(pid), &uid.to_string())
        .await
}

/// Every subscriber of `pid`. Members that fail to parse as uids are
/// skipped rather than surfaced.
pub async fn get_subscribers(store: &dyn KvStore, pid: PostId) -> Result<Vec<UserId>> {
    let members = store.sorted_range(&keys::post_subscribers(pid)).await?;
    Ok(members.iter().filter_map(|m| m.parse().ok()).collect())
}

pub async fn is_subscribed(store: &dyn KvStore, uid: UserId, pid: PostId) -> Result<bool> {
    let rank = store
        .sorted_rank(&keys::post_subscribers(pid), &uid.to_string())
        .await?;
    Ok(rank.is_some())
}

/// The reason `uid` is subscribed to `pid`, or `None` when not subscribed
/// (or the stored score is not a known reason).
pub async fn subscription_reason(
    store: &dyn KvStore,
    uid: UserId,
    pid: PostId,
) -> Result<Option<Reason>> {
    let score = store
        .sorted_score(&keys::post_subscribers(pid), &uid.to_string())
        .await?;
    Ok(score.and_then(Reason::from_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::PostRecord;
    use storage_adapters::MemoryStore;

    async fn store_with_post(pid: PostId) -> MemoryStore {
        let store = MemoryStore::new();
        let record = PostRecord {
            pid,
            uid: UserId(1),
            body: "hello".into(),
            created: 0,
            score: 0,
        };
        store
            .hash_set(&keys::post(pid), &record.to_fields())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn first_reason_wins() {
        let pid = PostId(1);
        let store = store_with_post(pid).await;
        let uid = UserId(7);

        assert!(subscribe(&store, uid, pid, Reason::Tagee).await.unwrap());
        assert!(!subscribe(&store, uid, pid, Reason::Commenter).await.unwrap());
        assert_eq!(
            subscription_reason(&store, uid, pid).await.unwrap(),
            Some(Reason::Tagee)
        );
    }

    #[tokio::test]
    async fn subscribe_fails_closed_on_missing_post() {
        let store = MemoryStore::new();
        let subscribed = subscribe(&store, UserId(7), PostId(99), Reason::Poster)
            .await
            .unwrap();
        assert!(!subscribed);
        assert!(!is_subscribed(&store, UserId(7), PostId(99)).await.unwrap());
    }

    #[tokio::test]
    async fn unsubscribe_reports_whether_removed() {
        let pid = PostId(2);
        let store = store_with_post(pid).await;
        let uid = UserId(3);

        subscribe(&store, uid, pid, Reason::Poster).await.unwrap();
        assert!(unsubscribe(&store, uid, pid).await.unwrap());
        assert!(!unsubscribe(&store, uid, pid).await.unwrap());
        assert_eq!(subscription_reason(&store, uid, pid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscribers_enumerate_all_members() {
        let pid = PostId(3);
        let store = store_with_post(pid).await;

        subscribe(&store, UserId(1), pid, Reason::Poster).await.unwrap();
        subscribe(&store, UserId(2), pid, Reason::Commenter).await.unwrap();
        subscribe(&store, UserId(3), pid, Reason::Tagee).await.unwrap();

        let mut subs = get_subscribers(&store, pid).await.unwrap();
        subs.sort();
        assert_eq!(subs, vec![UserId(1), UserId(2), UserId(3)]);
    }
}
