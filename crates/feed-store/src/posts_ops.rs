//! Batched writes and the feed materializer's candidate-selection query.

use snafu::ResultExt;
use sqlx::PgPool;

use crate::error::{DeletePostsSnafu, InsertPostsSnafu, SelectCandidatesSnafu, StoreError};
use crate::model::{CandidatePost, NewPost};
use crate::schema::POSTS_CONFLICT_TARGET;

const LOG_TARGET: &str = "feed::store::posts";

/// Insert a batch of posts/reposts. Duplicate `(uri, created_at)` pairs are
/// silently ignored — re-ingesting the same create op is a no-op.
///
/// Callers must call [`crate::partition::ensure_partition`] for every
/// distinct hour represented in `posts` before calling this; an insert
/// targeting a missing partition fails the whole batch (and the tick, by
/// extension), which is the intended behavior.
pub async fn insert_posts(pool: &PgPool, posts: &[NewPost]) -> Result<u64, StoreError> {
    if posts.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context(InsertPostsSnafu)?;
    let mut inserted = 0u64;
    for post in posts {
        let statement = format!(
            "INSERT INTO posts (uri, cid_rev, repost_uri, created_at, author) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT {POSTS_CONFLICT_TARGET} DO NOTHING"
        );
        let result = sqlx::query(&statement)
            .bind(&post.uri)
            .bind(&post.cid_rev)
            .bind(&post.repost_uri)
            .bind(post.created_at)
            .bind(&post.author)
            .execute(&mut *tx)
            .await
            .context(InsertPostsSnafu)?;
        inserted += result.rows_affected();
    }
    tx.commit().await.context(InsertPostsSnafu)?;

    tracing::debug!(target: LOG_TARGET, count = posts.len(), inserted, "inserted posts batch");
    Ok(inserted)
}

/// Delete posts/reposts by uri. Used for both post-delete and repost-delete
/// ops, which share the `posts` table.
pub async fn delete_posts_by_uri(pool: &PgPool, uris: &[String]) -> Result<u64, StoreError> {
    if uris.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM posts WHERE uri = ANY($1)")
        .bind(uris)
        .execute(pool)
        .await
        .context(DeletePostsSnafu)?;

    tracing::debug!(target: LOG_TARGET, count = uris.len(), deleted = result.rows_affected(), "deleted posts batch");
    Ok(result.rows_affected())
}

/// The feed materializer's candidate query: posts authored by anyone the
/// reader follows, ordered by `cid_rev` (the reversed-CID sort key), capped
/// at 1000 rows as an explicit quality-of-service bound.
pub async fn select_candidates(
    pool: &PgPool,
    follower: &str,
    include_reposts: bool,
) -> Result<Vec<CandidatePost>, StoreError> {
    let repost_filter = if include_reposts {
        ""
    } else {
        "AND repost_uri IS NULL"
    };
    let statement = format!(
        "SELECT uri, repost_uri, cid_rev \
         FROM posts \
         WHERE author IN (SELECT followee FROM follows WHERE follower = $1) \
         {repost_filter} \
         ORDER BY cid_rev \
         LIMIT 1000"
    );

    sqlx::query_as::<_, CandidatePost>(&statement)
        .bind(follower)
        .fetch_all(pool)
        .await
        .context(SelectCandidatesSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_target_matches_schema_primary_key() {
        assert_eq!(POSTS_CONFLICT_TARGET, "(uri, created_at)");
    }
}
