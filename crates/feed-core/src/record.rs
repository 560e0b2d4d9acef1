//! The record shapes the firehose subscriber decodes op payloads into, and
//! the NSID interest table that drives dispatch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::Uri;

/// Collections the subscriber has an opinion about. Likes are tracked for
/// forward-compatibility but carry no persistence today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Post,
    Like,
    Follow,
    Repost,
}

impl Collection {
    pub const POST_NSID: &'static str = "app.bsky.feed.post";
    pub const LIKE_NSID: &'static str = "app.bsky.feed.like";
    pub const FOLLOW_NSID: &'static str = "app.bsky.graph.follow";
    pub const REPOST_NSID: &'static str = "app.bsky.feed.repost";

    /// The fixed interest table: collection NSID -> variant. Returns `None`
    /// for any collection the feed generator doesn't model.
    pub fn from_nsid(nsid: &str) -> Option<Self> {
        match nsid {
            Self::POST_NSID => Some(Self::Post),
            Self::LIKE_NSID => Some(Self::Like),
            Self::FOLLOW_NSID => Some(Self::Follow),
            Self::REPOST_NSID => Some(Self::Repost),
            _ => None,
        }
    }

    pub fn nsid(self) -> &'static str {
        match self {
            Self::Post => Self::POST_NSID,
            Self::Like => Self::LIKE_NSID,
            Self::Follow => Self::FOLLOW_NSID,
            Self::Repost => Self::REPOST_NSID,
        }
    }
}

/// A strong reference to another record, as embedded e.g. in a repost's
/// `subject` or a post's `reply.parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongRef {
    pub uri: Uri,
    pub cid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub root: StrongRef,
    pub parent: StrongRef,
}

/// `app.bsky.feed.post` record, trimmed to the fields ingestion actually
/// inspects. Extra fields on the wire (text, embeds, langs, facets...) are
/// irrelevant to a skeleton-only feed and are not modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reply: Option<ReplyRef>,
}

impl PostRecord {
    pub fn is_reply(&self) -> bool {
        self.reply.is_some()
    }
}

/// `app.bsky.feed.repost` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepostRecord {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub subject: Option<StrongRef>,
}

/// `app.bsky.graph.follow` record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRecord {
    pub subject: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `app.bsky.feed.like` record. Kept only so the interest table can classify
/// it; the ingestion pipeline never persists it (see design notes on
/// forward-compatibility).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub subject: StrongRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nsid_round_trip() {
        for c in [
            Collection::Post,
            Collection::Like,
            Collection::Follow,
            Collection::Repost,
        ] {
            assert_eq!(Collection::from_nsid(c.nsid()), Some(c));
        }
    }

    #[test]
    fn unknown_nsid_is_not_of_interest() {
        assert_eq!(Collection::from_nsid("app.bsky.actor.profile"), None);
    }
}
