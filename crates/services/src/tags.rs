//! # Tag Parser
//!
//! Finds `@username` mentions in post and comment bodies and resolves them
//! through the identity port. Used by the engine to drive subscriptions
//! and tagging alerts, and by the (external) view layer to highlight tags.

use domains::ports::Identity;
use domains::{Result, TagMatch, UserId};
use once_cell::sync::Lazy;
use regex::Regex;

/// Candidate pattern: `@` followed by 3-16 word characters. The boundary
/// conditions (left: start or non-word char, right: end or one of a small
/// punctuation set) are checked by hand below since the regex engine has
/// no look-around. The two checks are equivalent: the punctuation set and
/// `\w` are disjoint, so a candidate that fails the right boundary has no
/// shorter prefix that could pass it.
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w{3,16}").expect("static pattern"));

const RIGHT_BOUNDARY: [char; 6] = ['.', ';', ',', ':', ' ', '\t'];

fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn left_boundary_ok(body: &str, start: usize) -> bool {
    match body[..start].chars().next_back() {
        Some(ch) => !is_word(ch),
        None => true,
    }
}

fn right_boundary_ok(body: &str, end: usize) -> bool {
    match body[end..].chars().next() {
        Some(ch) => RIGHT_BOUNDARY.contains(&ch),
        None => true,
    }
}

/// Scan `body` for tags and resolve each one to a user. Names that do not
/// resolve are silently dropped.
///
/// With `send_all` false the result is deduplicated by uid keeping the
/// first occurrence, which is what subscription/alert side effects want
/// (a user can only be subscribed once). With `send_all` true every
/// occurrence is kept with its span so the view layer can mark each one.
pub async fn parse_tags(
    identity: &dyn Identity,
    body: &str,
    send_all: bool,
) -> Result<Vec<TagMatch>> {
    let mut results = Vec::new();
    let mut seen: Vec<UserId> = Vec::new();

    for m in TAG_RE.find_iter(body) {
        if !left_boundary_ok(body, m.start()) || !right_boundary_ok(body, m.end()) {
            continue;
        }
        let username = &m.as_str()[1..];
        let Some(uid) = identity.uid_for_username(username).await? else {
            continue;
        };
        if send_all {
            results.push(tag_match(uid, username, m));
        } else if !seen.contains(&uid) {
            results.push(tag_match(uid, username, m));
            seen.push(uid);
        }
    }

    Ok(results)
}

fn tag_match(uid: UserId, username: &str, m: regex::Match<'_>) -> TagMatch {
    TagMatch {
        uid,
        username: username.to_string(),
        text: m.as_str().to_string(),
        span: (m.start(), m.end()),
    }
}
