//! # Domain Models
//!
//! These types represent the core entities of Pjuu. Posts and comments are
//! stored as flat field-mappings in the key-value store; the structs here
//! are the typed views the rest of the system works with.
//!
//! `pid`/`cid`/`uid` are distinct newtypes so a comment id can never be
//! passed where a post id is expected.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse().map($name)
            }
        }
    };
}

id_newtype! {
    /// Globally unique user identifier, issued by the (external) auth layer.
    UserId
}

id_newtype! {
    /// Globally unique, monotonically increasing post identifier.
    PostId
}

id_newtype! {
    /// Globally unique, monotonically increasing comment identifier.
    /// Counted separately from [`PostId`].
    CommentId
}

/// Why a user is subscribed to a post. Stored as the member score in the
/// post's subscriber sorted set; the first reason recorded wins and is
/// never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// You wrote the post.
    Poster,
    /// You commented on the post.
    Commenter,
    /// You were tagged in the post.
    Tagee,
}

impl Reason {
    pub fn score(self) -> i64 {
        match self {
            Reason::Poster => 1,
            Reason::Commenter => 2,
            Reason::Tagee => 3,
        }
    }

    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            1 => Some(Reason::Poster),
            2 => Some(Reason::Commenter),
            3 => Some(Reason::Tagee),
            _ => None,
        }
    }
}

/// Microsecond-resolution UTC timestamp for `created` fields.
pub fn timestamp_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// The hash record behind `post:{pid}`. Body is immutable after creation;
/// only `score` mutates (via voting).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub pid: PostId,
    pub uid: UserId,
    pub body: String,
    pub created: i64,
    pub score: i64,
}

impl PostRecord {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("pid".into(), self.pid.to_string()),
            ("uid".into(), self.uid.to_string()),
            ("body".into(), self.body.clone()),
            ("created".into(), self.created.to_string()),
            ("score".into(), self.score.to_string()),
        ]
    }

    /// Rebuild from a stored hash. `None` on any missing or unparsable
    /// field; callers treat that the same as an absent record.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        Some(PostRecord {
            pid: fields.get("pid")?.parse().ok()?,
            uid: fields.get("uid")?.parse().ok()?,
            body: fields.get("body")?.clone(),
            created: fields.get("created")?.parse().ok()?,
            score: fields.get("score")?.parse().ok()?,
        })
    }
}

/// The hash record behind `comment:{cid}`. The `pid` link is an
/// application-level invariant; the store does not enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub cid: CommentId,
    pub uid: UserId,
    pub pid: PostId,
    pub body: String,
    pub created: i64,
    pub score: i64,
}

impl CommentRecord {
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("cid".into(), self.cid.to_string()),
            ("uid".into(), self.uid.to_string()),
            ("pid".into(), self.pid.to_string()),
            ("body".into(), self.body.clone()),
            ("created".into(), self.created.to_string()),
            ("score".into(), self.score.to_string()),
        ]
    }

    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        Some(CommentRecord {
            cid: fields.get("cid")?.parse().ok()?,
            uid: fields.get("uid")?.parse().ok()?,
            pid: fields.get("pid")?.parse().ok()?,
            body: fields.get("body")?.clone(),
            created: fields.get("created")?.parse().ok()?,
            score: fields.get("score")?.parse().ok()?,
        })
    }
}

/// A post merged with its author's *current* profile data, joined live at
/// read time so profile edits show through old posts immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub pid: PostId,
    pub uid: UserId,
    pub body: String,
    pub created: i64,
    pub score: i64,
    pub user_username: String,
    pub user_email: String,
    pub user_score: i64,
    pub comment_count: u64,
}

/// A comment merged with its author's current profile data plus the parent
/// post author's username (the view layer needs it to build the post URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub cid: CommentId,
    pub uid: UserId,
    pub pid: PostId,
    pub body: String,
    pub created: i64,
    pub score: i64,
    pub user_username: String,
    pub user_email: String,
    pub user_score: i64,
    pub post_author: String,
}

/// One `@username` occurrence found in a post or comment body, resolved to
/// a real user. `span` is the byte range of `text` within the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMatch {
    pub uid: UserId,
    pub username: String,
    pub text: String,
    pub span: (usize, usize),
}

/// The kind of a posting alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Tagging,
    Commenting,
}

/// An alert rendered for one specific recipient, ready to hand to the
/// delivery collaborator. Carries enough denormalized context to display
/// without further store lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedAlert {
    pub kind: AlertKind,
    pub pid: PostId,
    pub by: UserId,
    pub message: String,
    pub created: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_record_round_trips_through_fields() {
        let record = PostRecord {
            pid: PostId(7),
            uid: UserId(3),
            body: "Hello world".into(),
            created: timestamp_micros(),
            score: -2,
        };
        let map: HashMap<String, String> = record.to_fields().into_iter().collect();
        assert_eq!(PostRecord::from_fields(&map), Some(record));
    }

    #[test]
    fn post_record_rejects_corrupt_fields() {
        let mut map: HashMap<String, String> = PostRecord {
            pid: PostId(1),
            uid: UserId(1),
            body: String::new(),
            created: 0,
            score: 0,
        }
        .to_fields()
        .into_iter()
        .collect();
        map.insert("score".into(), "not-a-number".into());
        assert_eq!(PostRecord::from_fields(&map), None);
    }

    #[test]
    fn reason_scores_are_stable() {
        for reason in [Reason::Poster, Reason::Commenter, Reason::Tagee] {
            assert_eq!(Reason::from_score(reason.score()), Some(reason));
        }
        assert_eq!(Reason::from_score(0), None);
        assert_eq!(Reason::from_score(4), None);
    }
}
