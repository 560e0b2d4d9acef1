//! Idempotent DDL, run once at [`Store::connect`](crate::Store::connect).
//!
//! Literal DDL grounded on the Postgres iteration of the system this
//! service replaces: `posts` is range-partitioned by `created_at` at hour
//! granularity (see [`crate::partition`]), `follows` tracks the follow
//! graph, and `follows_primed` records which readers have completed a
//! follow-list backfill.

use sqlx::PgPool;

use crate::error::{BootstrapSnafu, StoreError};

use snafu::ResultExt;

const BOOTSTRAP_STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS follows_primed(
        did TEXT PRIMARY KEY
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_follows_primed_did ON follows_primed (did)",
    r#"CREATE TABLE IF NOT EXISTS posts(
        uri TEXT NOT NULL,
        cid_rev TEXT NOT NULL,
        repost_uri TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        author TEXT NOT NULL,
        PRIMARY KEY (uri, created_at)
    ) PARTITION BY RANGE(created_at)"#,
    "CREATE INDEX IF NOT EXISTS idx_posts_uri ON posts (uri)",
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts (author)",
    r#"CREATE TABLE IF NOT EXISTS follows(
        uri TEXT PRIMARY KEY,
        follower TEXT NOT NULL,
        followee TEXT NOT NULL
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_follows_uri ON follows (uri)",
    "CREATE INDEX IF NOT EXISTS idx_follows_follower ON follows (follower)",
];

/// `uri` alone can't be the partitioned table's primary key — Postgres
/// requires the partition key in any primary key of a partitioned table —
/// so `ON CONFLICT DO NOTHING` targets `(uri, created_at)`. A post can't
/// legitimately have two different `created_at` values under the same
/// `uri`, so this is equivalent to uri-uniqueness for every row ingestion
/// actually produces.
pub const POSTS_CONFLICT_TARGET: &str = "(uri, created_at)";

pub async fn bootstrap(pool: &PgPool) -> Result<(), StoreError> {
    for statement in BOOTSTRAP_STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context(BootstrapSnafu)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_statements_are_nonempty() {
        assert!(!BOOTSTRAP_STATEMENTS.is_empty());
        for stmt in BOOTSTRAP_STATEMENTS {
            assert!(stmt.to_uppercase().contains("CREATE"));
        }
    }
}
