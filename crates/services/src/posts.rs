//! # Post/Comment Engine
//!
//! Orchestrates creation, validation, voting and cascading deletion of
//! posts and comments. The store holds no foreign keys, so every
//! cross-entity invariant (a comment's parent must live, votes and
//! subscriptions must reference real targets) is enforced right here.

use std::sync::Arc;

use domains::ports::{AlertSink, Identity, KvStore, StoreWrite};
use domains::{
    keys, timestamp_micros, CommentId, CommentRecord, CommentView, PostId, PostRecord, PostView,
    Reason, Result, UserId,
};
use tracing::{debug, info};

use crate::alerts::{AlertManager, PostingAlert};
use crate::feed::{self, FEED_MAX_LENGTH};
use crate::subscriptions;
use crate::tags;

/// The single entry point the view layer uses for everything post-shaped.
pub struct PostService {
    store: Arc<dyn KvStore>,
    identity: Arc<dyn Identity>,
    alerts: Arc<dyn AlertSink>,
}

impl PostService {
    pub fn new(
        store: Arc<dyn KvStore>,
        identity: Arc<dyn Identity>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        PostService {
            store,
            identity,
            alerts,
        }
    }

    fn alert_manager(&self) -> AlertManager<'_> {
        AlertManager::new(self.store.as_ref(), self.alerts.as_ref())
    }

    /// Create a post: reserve the next pid, write the record plus the
    /// author's index and feed entries as one pipelined batch, fan out to
    /// followers, subscribe the author, then handle tags.
    ///
    /// The pid reservation is never released; if the batch fails the id
    /// is simply skipped.
    pub async fn create_post(&self, uid: UserId, body: &str) -> Result<PostId> {
        let pid = PostId(self.store.incr(keys::GLOBAL_PID).await?.unsigned_abs());
        let record = PostRecord {
            pid,
            uid,
            body: body.to_string(),
            created: timestamp_micros(),
            score: 0,
        };

        self.store
            .run_batch(vec![
                StoreWrite::HashSet {
                    key: keys::post(pid),
                    fields: record.to_fields(),
                },
                StoreWrite::ListPrepend {
                    key: keys::user_posts(uid),
                    value: pid.to_string(),
                },
                StoreWrite::ListPrepend {
                    key: keys::user_feed(uid),
                    value: pid.to_string(),
                },
                StoreWrite::ListTrim {
                    key: keys::user_feed(uid),
                    start: 0,
                    stop: FEED_MAX_LENGTH - 1,
                },
            ])
            .await?;

        // Cross-follower fan-out happens after the batch, non-atomically.
        feed::populate_feeds(self.store.as_ref(), uid, pid).await?;

        subscriptions::subscribe(self.store.as_ref(), uid, pid, Reason::Poster).await?;

        self.handle_tags(uid, pid, body).await?;

        info!(%uid, %pid, "created post");
        Ok(pid)
    }

    /// Create a comment on `pid`. Subscribers are notified before the
    /// commenter is added to the ledger, so nobody hears about their own
    /// comment and a same-event tagee is not notified twice.
    pub async fn create_comment(&self, uid: UserId, pid: PostId, body: &str) -> Result<CommentId> {
        // Reserve the id now. If the batch fails we lose this id.
        let cid = CommentId(self.store.incr(keys::GLOBAL_CID).await?.unsigned_abs());
        let record = CommentRecord {
            cid,
            uid,
            pid,
            body: body.to_string(),
            created: timestamp_micros(),
            score: 0,
        };

        self.store
            .run_batch(vec![
                StoreWrite::HashSet {
                    key: keys::comment(cid),
                    fields: record.to_fields(),
                },
                StoreWrite::ListPrepend {
                    key: keys::post_comments(pid),
                    value: cid.to_string(),
                },
                // Redundant-looking but it makes account deletion
                // self-cleaning: every comment is reachable from exactly
                // one user index.
                StoreWrite::ListPrepend {
                    key: keys::user_comments(uid),
                    value: cid.to_string(),
                },
            ])
            .await?;

        // Alert the current subscribers, minus the commenter, before any
        // new subscriptions from this comment land.
        if let Some(alert) = PostingAlert::commenting(self.store.as_ref(), uid, pid).await? {
            let recipients: Vec<UserId> =
                subscriptions::get_subscribers(self.store.as_ref(), pid)
                    .await?
                    .into_iter()
                    .filter(|&subscriber| subscriber != uid)
                    .collect();
            self.alert_manager().alert(&alert, &recipients).await?;
        }

        // No-op if they are already subscribed; the original reason wins.
        subscriptions::subscribe(self.store.as_ref(), uid, pid, Reason::Commenter).await?;

        self.handle_tags(uid, pid, body).await?;

        info!(%uid, %pid, %cid, "created comment");
        Ok(cid)
    }

    /// Subscribe every non-self tagee in `body` and send them a tagging
    /// alert. Shared tail of both creation paths.
    async fn handle_tags(&self, uid: UserId, pid: PostId, body: &str) -> Result<()> {
        let tagees = tags::parse_tags(self.identity.as_ref(), body, false).await?;
        if tagees.is_empty() {
            return Ok(());
        }

        let mut to_alert = Vec::new();
        for tagee in &tagees {
            // Tagging yourself does nothing.
            if tagee.uid != uid {
                subscriptions::subscribe(self.store.as_ref(), tagee.uid, pid, Reason::Tagee)
                    .await?;
                to_alert.push(tagee.uid);
            }
        }

        if let Some(alert) = PostingAlert::tagging(self.store.as_ref(), uid, pid).await? {
            self.alert_manager().alert(&alert, &to_alert).await?;
        }
        Ok(())
    }

    /// Validate a claimed ownership chain: `cid` (when given) must belong
    /// to `pid`, and `pid` must be authored by `uid`. Never errors for
    /// malformed or missing links, only for store I/O failure. This is
    /// the pre-authorization check for [`PostService::delete`]; the view
    /// layer turns `false` into a 403/404.
    pub async fn check_post(
        &self,
        uid: UserId,
        pid: PostId,
        cid: Option<CommentId>,
    ) -> Result<bool> {
        if let Some(cid) = cid {
            let parent = self.store.hash_get(&keys::comment(cid), "pid").await?;
            if parent.and_then(|p| p.parse::<PostId>().ok()) != Some(pid) {
                return Ok(false);
            }
        }
        let author = self.store.hash_get(&keys::post(pid), "uid").await?;
        Ok(author.and_then(|a| a.parse::<UserId>().ok()) == Some(uid))
    }

    /// A post joined live with its author's current profile. `None` when
    /// the post, its author record, or any required field is missing or
    /// malformed.
    pub async fn get_post(&self, pid: PostId) -> Result<Option<PostView>> {
        let fields = self.store.hash_get_all(&keys::post(pid)).await?;
        let Some(record) = PostRecord::from_fields(&fields) else {
            return Ok(None);
        };

        let user = self.store.hash_get_all(&keys::user(record.uid)).await?;
        let (Some(username), Some(email), Some(score)) =
            (user.get("username"), user.get("email"), user.get("score"))
        else {
            return Ok(None);
        };
        let Ok(user_score) = score.parse::<i64>() else {
            return Ok(None);
        };
        let comment_count = self.store.list_len(&keys::post_comments(pid)).await?;

        Ok(Some(PostView {
            pid: record.pid,
            uid: record.uid,
            body: record.body,
            created: record.created,
            score: record.score,
            user_username: username.clone(),
            user_email: email.clone(),
            user_score,
            comment_count,
        }))
    }

    /// A comment joined live with its author's profile and the parent
    /// post author's username.
    pub async fn get_comment(&self, cid: CommentId) -> Result<Option<CommentView>> {
        let fields = self.store.hash_get_all(&keys::comment(cid)).await?;
        let Some(record) = CommentRecord::from_fields(&fields) else {
            return Ok(None);
        };

        let user = self.store.hash_get_all(&keys::user(record.uid)).await?;
        let (Some(username), Some(email), Some(score)) =
            (user.get("username"), user.get("email"), user.get("score"))
        else {
            return Ok(None);
        };
        let Ok(user_score) = score.parse::<i64>() else {
            return Ok(None);
        };

        let Some(post_author_uid) = self.get_post_author(record.pid).await? else {
            return Ok(None);
        };
        let Some(post_author) = self
            .store
            .hash_get(&keys::user(post_author_uid), "username")
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(CommentView {
            cid: record.cid,
            uid: record.uid,
            pid: record.pid,
            body: record.body,
            created: record.created,
            score: record.score,
            user_username: username.clone(),
            user_email: email.clone(),
            user_score,
            post_author,
        }))
    }

    pub async fn get_post_author(&self, pid: PostId) -> Result<Option<UserId>> {
        let field = self.store.hash_get(&keys::post(pid), "uid").await?;
        Ok(field.and_then(|f| f.parse().ok()))
    }

    pub async fn get_comment_author(&self, cid: CommentId) -> Result<Option<UserId>> {
        let field = self.store.hash_get(&keys::comment(cid), "uid").await?;
        Ok(field.and_then(|f| f.parse().ok()))
    }

    /// The stored vote direction of `uid` on the target, or `None` when
    /// they have not voted.
    pub async fn has_voted(
        &self,
        uid: UserId,
        pid: PostId,
        cid: Option<CommentId>,
    ) -> Result<Option<i64>> {
        let key = match cid {
            Some(cid) => keys::comment_votes(cid),
            None => keys::post_votes(pid),
        };
        self.store.sorted_score(&key, &uid.to_string()).await
    }

    /// Apply a vote of `amount` (±1). Self-votes and repeat votes are
    /// rejected as a quiet `false`. The target's score may go negative;
    /// the author's aggregate reputation is clamped so it never drops
    /// below zero.
    ///
    /// The clamp reads the author's current reputation and adjusts the
    /// delta, so concurrent downvotes on one author can over- or
    /// under-clamp. Eventual (not strict) floor enforcement is accepted.
    pub async fn vote(
        &self,
        uid: UserId,
        pid: PostId,
        cid: Option<CommentId>,
        amount: i64,
    ) -> Result<bool> {
        if self.has_voted(uid, pid, cid).await?.is_some() {
            return Ok(false);
        }

        let (votes_key, target_key, author) = match cid {
            Some(cid) => (
                keys::comment_votes(cid),
                keys::comment(cid),
                self.get_comment_author(cid).await?,
            ),
            None => (
                keys::post_votes(pid),
                keys::post(pid),
                self.get_post_author(pid).await?,
            ),
        };
        let Some(author) = author else {
            // Target vanished; nothing to vote on.
            return Ok(false);
        };
        if author == uid {
            return Ok(false);
        }

        self.store
            .sorted_add_nx(&votes_key, &uid.to_string(), amount)
            .await?;
        // Target scores can go negative.
        self.store.hash_incr_by(&target_key, "score", amount).await?;

        let mut reputation_delta = amount;
        if let Some(current) = self.store.hash_get(&keys::user(author), "score").await? {
            // An unparsable stored score skips the clamp, not the credit.
            if let Ok(current) = current.parse::<i64>() {
                if current <= 0 && amount < 0 {
                    reputation_delta = 0;
                }
            }
        }
        self.store
            .hash_incr_by(&keys::user(author), "score", reputation_delta)
            .await?;

        debug!(%uid, %pid, ?cid, amount, "vote recorded");
        Ok(true)
    }

    /// Delete a comment (when `cid` is given) or a whole post with
    /// everything hanging off it. Performs no ownership check itself;
    /// callers must pre-authorize via [`PostService::check_post`].
    pub async fn delete(&self, uid: UserId, pid: PostId, cid: Option<CommentId>) -> Result<()> {
        match cid {
            Some(cid) => {
                self.delete_comment(pid, cid).await?;
                info!(%uid, %pid, %cid, "deleted comment");
            }
            None => {
                self.delete_post(pid).await?;
                info!(%uid, %pid, "deleted post");
            }
        }
        Ok(())
    }

    /// Remove one comment, its votes, and its two index memberships.
    /// Sibling comments and the post's score stay untouched.
    async fn delete_comment(&self, pid: PostId, cid: CommentId) -> Result<()> {
        // Author lookup must precede the record deletion.
        let author = self.get_comment_author(cid).await?;
        self.store.remove(&keys::comment(cid)).await?;
        self.store.remove(&keys::comment_votes(cid)).await?;
        self.store
            .list_remove(&keys::post_comments(pid), &cid.to_string())
            .await?;
        if let Some(author) = author {
            self.store
                .list_remove(&keys::user_comments(author), &cid.to_string())
                .await?;
        }
        Ok(())
    }

    /// Cascade: the post record, its votes, its subscriber ledger, its
    /// membership in the author's post index, then every comment, then
    /// the emptied comment index. Not atomic across the cascade; a crash
    /// partway through is accepted and not retried.
    async fn delete_post(&self, pid: PostId) -> Result<()> {
        let author = self.get_post_author(pid).await?;
        self.store.remove(&keys::post(pid)).await?;
        self.store.remove(&keys::post_votes(pid)).await?;
        self.store.remove(&keys::post_subscribers(pid)).await?;
        if let Some(author) = author {
            self.store
                .list_remove(&keys::user_posts(author), &pid.to_string())
                .await?;
        }
        self.delete_comments(pid).await?;
        Ok(())
    }

    /// Walk the post's comment index deleting each comment in turn, each
    /// one also removed from its own author's comment index, then drop
    /// the index key itself.
    async fn delete_comments(&self, pid: PostId) -> Result<()> {
        let cids = self
            .store
            .list_range(&keys::post_comments(pid), 0, -1)
            .await?;
        for member in cids {
            let Ok(cid) = member.parse::<CommentId>() else {
                continue;
            };
            let author = self.get_comment_author(cid).await?;
            self.store.remove(&keys::comment(cid)).await?;
            self.store.remove(&keys::comment_votes(cid)).await?;
            if let Some(author) = author {
                self.store
                    .list_remove(&keys::user_comments(author), &cid.to_string())
                    .await?;
            }
        }
        self.store.remove(&keys::post_comments(pid)).await?;
        Ok(())
    }
}
