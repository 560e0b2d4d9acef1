//! Partition lifecycle for the hour-ranged `posts` table.

use chrono::{DateTime, Utc};
use snafu::ResultExt;
use sqlx::{PgPool, Row};

use feed_core::time::{floor_to_hour, parse_partition_hour, partition_name};

use crate::error::{DropPartitionSnafu, EnsurePartitionSnafu, EnumeratePartitionsSnafu, StoreError};

const LOG_TARGET: &str = "feed::store::partition";

/// Create the hour partition covering `ts` if it doesn't already exist.
/// Idempotent: safe to call for every post in a batch sharing an hour.
pub async fn ensure_partition(pool: &PgPool, ts: DateTime<Utc>) -> Result<(), StoreError> {
    let hour = floor_to_hour(ts);
    let name = partition_name(hour);
    let next_hour = hour + chrono::Duration::hours(1);

    let statement = format!(
        "CREATE TABLE IF NOT EXISTS {name} PARTITION OF posts FOR VALUES FROM ($1) TO ($2)"
    );
    sqlx::query(&statement)
        .bind(hour)
        .bind(next_hour)
        .execute(pool)
        .await
        .context(EnsurePartitionSnafu { name })?;
    Ok(())
}

/// List every child partition of `posts`, in ascending name order.
pub async fn list_partitions(pool: &PgPool) -> Result<Vec<String>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT child.relname AS name
        FROM pg_inherits
            JOIN pg_class parent ON pg_inherits.inhparent = parent.oid
            JOIN pg_class child ON pg_inherits.inhrelid = child.oid
            JOIN pg_namespace nmsp_parent ON nmsp_parent.oid = parent.relnamespace
            JOIN pg_namespace nmsp_child ON nmsp_child.oid = child.relnamespace
        WHERE parent.relname = 'posts'
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context(EnumeratePartitionsSnafu)?;

    Ok(rows.into_iter().map(|row| row.get("name")).collect())
}

async fn drop_partition(pool: &PgPool, name: &str) -> Result<(), StoreError> {
    let statement = format!("DROP TABLE {name}");
    sqlx::query(&statement)
        .execute(pool)
        .await
        .context(DropPartitionSnafu {
            name: name.to_owned(),
        })?;
    Ok(())
}

/// Drop every partition whose hour is strictly older than `now - horizon_hours`.
/// Returns the names of the partitions dropped, for logging.
pub async fn sweep_expired(
    pool: &PgPool,
    now: DateTime<Utc>,
    horizon_hours: i64,
) -> Result<Vec<String>, StoreError> {
    let cutoff = now - chrono::Duration::hours(horizon_hours);
    let mut dropped = Vec::new();

    for name in list_partitions(pool).await? {
        let Some(hour) = parse_partition_hour(&name) else {
            tracing::warn!(target: LOG_TARGET, %name, "skipping non-post-partition child table");
            continue;
        };
        if hour < cutoff {
            tracing::info!(target: LOG_TARGET, %name, "dropping expired partition");
            drop_partition(pool, &name).await?;
            dropped.push(name);
        }
    }

    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_name_matches_hour() {
        let ts = "2026-03-05T14:37:09Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(partition_name(ts), "posts_y2026m03d05h14");
    }
}
