//! Row shapes as they come off the wire from Postgres. Kept as plain
//! primitives rather than `feed_core`'s newtypes: `sqlx::FromRow` derives
//! over concrete column types, and the newtype conversion happens once at
//! each operation's public boundary instead.

use chrono::{DateTime, Utc};

/// A freshly-decoded post or repost, ready for a batched insert.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub uri: String,
    pub cid_rev: String,
    pub repost_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowRow {
    pub uri: String,
    pub follower: String,
    pub followee: String,
}

/// The narrow candidate shape the feed materializer's SQL query returns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidatePost {
    pub uri: String,
    pub repost_uri: Option<String>,
    pub cid_rev: String,
}
