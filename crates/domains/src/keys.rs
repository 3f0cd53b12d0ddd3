//! # Key Schema
//!
//! Deterministic mapping from logical entities to store keys. No logic
//! beyond templating; every other module goes through these helpers so a
//! key format only ever exists in one place.

use crate::models::{CommentId, PostId, UserId};

/// Counter behind `create_post` id reservation.
pub const GLOBAL_PID: &str = "global:pid";

/// Counter behind `create_comment` id reservation.
pub const GLOBAL_CID: &str = "global:cid";

/// Hash: the post record.
pub fn post(pid: PostId) -> String {
    format!("post:{pid}")
}

/// List: cids on a post, newest first.
pub fn post_comments(pid: PostId) -> String {
    format!("post:{pid}:comments")
}

/// Sorted set: voter uid scored by vote direction.
pub fn post_votes(pid: PostId) -> String {
    format!("post:{pid}:votes")
}

/// Sorted set: subscriber uid scored by subscription reason.
pub fn post_subscribers(pid: PostId) -> String {
    format!("post:{pid}:subscribers")
}

/// Hash: the comment record.
pub fn comment(cid: CommentId) -> String {
    format!("comment:{cid}")
}

/// Sorted set: voter uid scored by vote direction.
pub fn comment_votes(cid: CommentId) -> String {
    format!("comment:{cid}:votes")
}

/// Hash: the user profile record (owned by the auth collaborator).
pub fn user(uid: UserId) -> String {
    format!("user:{uid}")
}

/// List: pids authored by a user, newest first.
pub fn user_posts(uid: UserId) -> String {
    format!("user:{uid}:posts")
}

/// List: cids authored by a user. Kept purely so deletion is self-cleaning.
pub fn user_comments(uid: UserId) -> String {
    format!("user:{uid}:comments")
}

/// List: the user's feed of pids, capped by the fan-out writer.
pub fn user_feed(uid: UserId) -> String {
    format!("user:{uid}:feed")
}

/// List: rendered alerts delivered to this user, newest first.
pub fn user_alerts(uid: UserId) -> String {
    format!("user:{uid}:alerts")
}

/// Sorted set: uids following this user.
pub fn user_followers(uid: UserId) -> String {
    format!("user:{uid}:followers")
}

/// Hash: username -> uid lookup (owned by the auth collaborator).
pub fn uid_lookup(username: &str) -> String {
    format!("uid:{username}")
}
