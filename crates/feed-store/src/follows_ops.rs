//! Follow-graph writes and the primed-reader set.

use snafu::ResultExt;
use sqlx::PgPool;

use crate::error::{
    CheckPrimedSnafu, DeleteFollowsSnafu, InsertFollowsSnafu, StoreError,
};
use crate::model::FollowRow;

const LOG_TARGET: &str = "feed::store::follows";

pub async fn insert_follows(pool: &PgPool, follows: &[FollowRow]) -> Result<u64, StoreError> {
    if follows.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context(InsertFollowsSnafu)?;
    let mut inserted = 0u64;
    for follow in follows {
        let result = sqlx::query(
            "INSERT INTO follows (uri, follower, followee) VALUES ($1, $2, $3) \
             ON CONFLICT (uri) DO NOTHING",
        )
        .bind(&follow.uri)
        .bind(&follow.follower)
        .bind(&follow.followee)
        .execute(&mut *tx)
        .await
        .context(InsertFollowsSnafu)?;
        inserted += result.rows_affected();
    }
    tx.commit().await.context(InsertFollowsSnafu)?;

    tracing::debug!(target: LOG_TARGET, count = follows.len(), inserted, "inserted follows batch");
    Ok(inserted)
}

pub async fn delete_follows_by_uri(pool: &PgPool, uris: &[String]) -> Result<u64, StoreError> {
    if uris.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM follows WHERE uri = ANY($1)")
        .bind(uris)
        .execute(pool)
        .await
        .context(DeleteFollowsSnafu)?;

    Ok(result.rows_affected())
}

/// Whether `did` has at least one follow row recorded as follower — spec's
/// "has this reader been backfilled yet?" check, evaluated against the
/// literal `follows_primed` table rather than inferred from `follows`
/// membership, so a reader who genuinely follows no one is still
/// recognized as primed.
pub async fn is_primed(pool: &PgPool, did: &str) -> Result<bool, StoreError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM follows_primed WHERE did = $1")
        .bind(did)
        .fetch_optional(pool)
        .await
        .context(CheckPrimedSnafu { did })?;

    Ok(row.is_some())
}

pub async fn mark_primed(pool: &PgPool, did: &str) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO follows_primed (did) VALUES ($1) ON CONFLICT (did) DO NOTHING")
        .bind(did)
        .execute(pool)
        .await
        .context(CheckPrimedSnafu { did })?;
    Ok(())
}

/// Bulk-insert a reader's complete follow list from the primer. Wraps the
/// insert in a disable/enable of `check_follows_primed_trigger` when
/// `enforce_trigger` is set, matching the original system's priming step;
/// most deployments leave the trigger undefined and this is a no-op pair.
pub async fn bulk_insert_primed_follows(
    pool: &PgPool,
    follows: &[FollowRow],
    enforce_trigger: bool,
) -> Result<u64, StoreError> {
    if enforce_trigger {
        sqlx::query("ALTER TABLE follows DISABLE TRIGGER check_follows_primed_trigger")
            .execute(pool)
            .await
            .context(InsertFollowsSnafu)?;
    }

    let inserted = insert_follows(pool, follows).await?;

    if enforce_trigger {
        sqlx::query("ALTER TABLE follows ENABLE TRIGGER check_follows_primed_trigger")
            .execute(pool)
            .await
            .context(InsertFollowsSnafu)?;
    }

    Ok(inserted)
}
