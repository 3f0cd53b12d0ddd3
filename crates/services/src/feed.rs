//! # Fan-out Feed Writer
//!
//! Write-time propagation of a new post into every follower's feed.
//! Deliberately not transactional across followers: a crash partway
//! through leaves some feeds updated and others not, which we accept
//! rather than serializing post creation behind follower count.

use domains::ports::KvStore;
use domains::{keys, PostId, UserId};
use tracing::debug;

/// Feeds are a sliding window of the newest entries, trimmed after each
/// append.
pub const FEED_MAX_LENGTH: i64 = 1000;

/// Prepend `pid` to the feed of every follower of `author`, trimming each
/// feed to [`FEED_MAX_LENGTH`]. Followers are not validated to still
/// exist; list operations on absent keys are no-ops.
pub async fn populate_feeds(
    store: &dyn KvStore,
    author: UserId,
    pid: PostId,
) -> domains::Result<()> {
    // The complete follower set, unpaginated.
    let followers = store.sorted_range(&keys::user_followers(author)).await?;
    debug!(%author, %pid, followers = followers.len(), "fanning out post to followers");

    for member in followers {
        let Ok(fid) = member.parse::<UserId>() else {
            continue;
        };
        let feed = keys::user_feed(fid);
        store.list_prepend(&feed, &pid.to_string()).await?;
        store.list_trim(&feed, 0, FEED_MAX_LENGTH - 1).await?;
    }
    Ok(())
}
