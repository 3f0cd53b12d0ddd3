//! # Alert Dispatch
//!
//! Posting alerts come in two flavours: "you were tagged" and "someone
//! commented on a post you care about". Both carry denormalized context
//! (the post id and its author's username) resolved at construction time,
//! and both must verify against current store state at delivery time so a
//! deleted post or user never produces a broken notification.

use domains::ports::{AlertSink, KvStore};
use domains::{keys, timestamp_micros, AlertKind, PostId, Reason, RenderedAlert, Result, UserId};
use tracing::debug;

use crate::subscriptions;

/// Shared context for both alert variants: who triggered it, which post,
/// and the post author's username (needed by the view layer to link to
/// the post).
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub by: UserId,
    pub pid: PostId,
    pub post_author: String,
}

impl AlertContext {
    /// Resolve the post's author and their username from the store.
    /// `None` when the post or its author record has already gone away,
    /// in which case the caller simply skips alerting.
    async fn load(store: &dyn KvStore, by: UserId, pid: PostId) -> Result<Option<Self>> {
        let Some(author_field) = store.hash_get(&keys::post(pid), "uid").await? else {
            return Ok(None);
        };
        let Ok(author_uid) = author_field.parse::<UserId>() else {
            return Ok(None);
        };
        let Some(post_author) = store.hash_get(&keys::user(author_uid), "username").await? else {
            return Ok(None);
        };
        Ok(Some(AlertContext {
            by,
            pid,
            post_author,
        }))
    }
}

/// A closed set of post-related alerts. Rendering is per-recipient: the
/// commenting variant personalizes its verb clause by looking up the
/// recipient's own subscription reason.
#[derive(Debug, Clone)]
pub enum PostingAlert {
    Tagging(AlertContext),
    Commenting(AlertContext),
}

impl PostingAlert {
    pub async fn tagging(store: &dyn KvStore, by: UserId, pid: PostId) -> Result<Option<Self>> {
        Ok(AlertContext::load(store, by, pid)
            .await?
            .map(PostingAlert::Tagging))
    }

    pub async fn commenting(store: &dyn KvStore, by: UserId, pid: PostId) -> Result<Option<Self>> {
        Ok(AlertContext::load(store, by, pid)
            .await?
            .map(PostingAlert::Commenting))
    }

    fn context(&self) -> &AlertContext {
        match self {
            PostingAlert::Tagging(ctx) | PostingAlert::Commenting(ctx) => ctx,
        }
    }

    pub fn kind(&self) -> AlertKind {
        match self {
            PostingAlert::Tagging(_) => AlertKind::Tagging,
            PostingAlert::Commenting(_) => AlertKind::Commenting,
        }
    }

    /// Both referenced entities must still exist for the alert to be
    /// deliverable.
    pub async fn verify(&self, store: &dyn KvStore) -> Result<bool> {
        let ctx = self.context();
        Ok(store.exists(&keys::user(ctx.by)).await? && store.exists(&keys::post(ctx.pid)).await?)
    }

    /// Render the alert for one recipient. The triggering user's name is
    /// looked up live so it reflects their current profile.
    pub async fn render(&self, store: &dyn KvStore, recipient: UserId) -> Result<RenderedAlert> {
        let ctx = self.context();
        let by_username = store
            .hash_get(&keys::user(ctx.by), "username")
            .await?
            .unwrap_or_default();

        let message = match self {
            PostingAlert::Tagging(_) => format!("{by_username} tagged you in a post."),
            PostingAlert::Commenting(_) => {
                // Work out why this recipient is being told about the comment.
                let verb = match subscriptions::subscription_reason(store, recipient, ctx.pid)
                    .await?
                {
                    Some(Reason::Poster) => "posted",
                    Some(Reason::Commenter) => "commented on",
                    Some(Reason::Tagee) => "were tagged in",
                    None => "are subscribed to",
                };
                format!("{by_username} commented on a post you {verb}.")
            }
        };

        Ok(RenderedAlert {
            kind: self.kind(),
            pid: ctx.pid,
            by: ctx.by,
            message,
            created: timestamp_micros(),
        })
    }
}

/// Fans an alert out to an explicit recipient list, one delivery per
/// recipient, through the sink port.
pub struct AlertManager<'a> {
    store: &'a dyn KvStore,
    sink: &'a dyn AlertSink,
}

impl<'a> AlertManager<'a> {
    pub fn new(store: &'a dyn KvStore, sink: &'a dyn AlertSink) -> Self {
        AlertManager { store, sink }
    }

    /// Deliver `alert` to every recipient. An alert whose backing
    /// entities have vanished is silently dropped, never delivered as a
    /// broken link.
    pub async fn alert(&self, alert: &PostingAlert, recipients: &[UserId]) -> Result<()> {
        if recipients.is_empty() {
            return Ok(());
        }
        if !alert.verify(self.store).await? {
            debug!(pid = %alert.context().pid, "dropping unverifiable alert");
            return Ok(());
        }
        for &recipient in recipients {
            let rendered = alert.render(self.store, recipient).await?;
            self.sink.deliver(recipient, rendered).await?;
        }
        Ok(())
    }
}
