//! Drains the event queue on a fixed cadence, groups by record kind and
//! action, batches into the store, and retires expired partitions.
//!
//! Each kind's batch commits independently rather than the whole tick
//! committing atomically in one transaction — a deliberate simplification
//! over the strictest reading of the design (see `DESIGN.md`). Every write
//! here is idempotent (`ON CONFLICT DO NOTHING` / delete-by-uri), so a tick
//! that partially fails and is retried, or a process that restarts
//! mid-tick, converges to the same end state either way.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use feed_core::time::within_ingest_window;
use feed_firehose::{DecodedRecord, EventAction, FirehoseEvent};
use feed_store::model::{FollowRow, NewPost};
use feed_store::{follows_ops, partition, posts_ops, Store};
use tokio::sync::mpsc;

use crate::error::ClientError;

const LOG_TARGET: &str = "feed::client::writer";

#[derive(Default)]
struct Buckets {
    posts_create: Vec<NewPost>,
    posts_delete: Vec<String>,
    follows_create: Vec<FollowRow>,
    follows_delete: Vec<String>,
}

pub struct WriterLoop {
    store: Store,
    rx: mpsc::UnboundedReceiver<FirehoseEvent>,
    cadence: Duration,
    retention_sweep_interval: Duration,
    watchdog_timeout: Duration,
    retention_horizon_hours: i64,
}

impl WriterLoop {
    pub fn new(store: Store, rx: mpsc::UnboundedReceiver<FirehoseEvent>) -> Self {
        Self {
            store,
            rx,
            cadence: Duration::from_secs(2),
            retention_sweep_interval: Duration::from_secs(45 * 60),
            watchdog_timeout: Duration::from_secs(30),
            retention_horizon_hours: feed_core::time::RETENTION_HORIZON_HOURS,
        }
    }

    pub async fn run(mut self) -> Result<(), ClientError> {
        let mut interval = tokio::time::interval(self.cadence);
        let mut last_successful_commit = Instant::now();
        let mut last_retention_sweep = Instant::now();

        loop {
            interval.tick().await;

            let elapsed = last_successful_commit.elapsed();
            if elapsed >= self.watchdog_timeout {
                tracing::error!(target: LOG_TARGET, elapsed_secs = elapsed.as_secs(), "watchdog timeout, exiting");
                return Err(ClientError::WatchdogTimeout {
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            let Some(buckets) = self.drain_queue() else {
                continue;
            };

            self.flush(buckets).await?;

            if last_retention_sweep.elapsed() >= self.retention_sweep_interval {
                self.sweep_retention().await?;
                last_retention_sweep = Instant::now();
            }

            last_successful_commit = Instant::now();
        }
    }

    /// Returns `None` if the queue was empty at wake (tick skipped without
    /// touching the watchdog timestamp).
    fn drain_queue(&mut self) -> Option<Buckets> {
        let mut buckets = Buckets::default();
        let mut drained = 0usize;

        while let Ok(event) = self.rx.try_recv() {
            drained += 1;
            bucket_event(event, &mut buckets, Utc::now());
        }

        if drained == 0 {
            return None;
        }

        tracing::debug!(target: LOG_TARGET, drained, "drained firehose events");
        Some(buckets)
    }

    async fn flush(&self, buckets: Buckets) -> Result<(), ClientError> {
        let pool = self.store.pool();

        if !buckets.posts_create.is_empty() {
            let hours: HashSet<DateTime<Utc>> = buckets
                .posts_create
                .iter()
                .map(|post| post.created_at)
                .collect();
            for hour in hours {
                partition::ensure_partition(pool, hour).await?;
            }
            let inserted = posts_ops::insert_posts(pool, &buckets.posts_create).await?;
            tracing::info!(target: LOG_TARGET, inserted, "inserted posts");
        }

        if !buckets.posts_delete.is_empty() {
            posts_ops::delete_posts_by_uri(pool, &buckets.posts_delete).await?;
        }

        if !buckets.follows_create.is_empty() {
            follows_ops::insert_follows(pool, &buckets.follows_create).await?;
        }

        if !buckets.follows_delete.is_empty() {
            follows_ops::delete_follows_by_uri(pool, &buckets.follows_delete).await?;
        }

        Ok(())
    }

    async fn sweep_retention(&self) -> Result<(), ClientError> {
        let dropped =
            partition::sweep_expired(self.store.pool(), Utc::now(), self.retention_horizon_hours)
                .await?;
        if !dropped.is_empty() {
            tracing::info!(target: LOG_TARGET, count = dropped.len(), "retention sweep dropped partitions");
        }
        Ok(())
    }
}

fn bucket_event(event: FirehoseEvent, buckets: &mut Buckets, now: DateTime<Utc>) {
    match (event.action, event.record) {
        (EventAction::Created, Some(DecodedRecord::Post(post))) => {
            if post.is_reply() || !within_ingest_window(post.created_at, now) {
                return;
            }
            let Some(cid) = event.cid else { return };
            buckets.posts_create.push(NewPost {
                uri: event.uri.into_string(),
                cid_rev: cid_rev(&cid),
                repost_uri: None,
                created_at: post.created_at,
                author: event.author.into_string(),
            });
        }
        (EventAction::Deleted, None) if event.collection == feed_core::record::Collection::Post => {
            buckets.posts_delete.push(event.uri.into_string());
        }
        (EventAction::Created, Some(DecodedRecord::Repost(repost))) => {
            let Some(subject) = repost.subject else {
                return;
            };
            if !within_ingest_window(repost.created_at, now) {
                return;
            }
            let Some(cid) = event.cid else { return };
            buckets.posts_create.push(NewPost {
                uri: event.uri.into_string(),
                cid_rev: cid_rev(&cid),
                repost_uri: Some(subject.uri.into_string()),
                created_at: repost.created_at,
                author: event.author.into_string(),
            });
        }
        (EventAction::Deleted, None)
            if event.collection == feed_core::record::Collection::Repost =>
        {
            buckets.posts_delete.push(event.uri.into_string());
        }
        (EventAction::Created, Some(DecodedRecord::Follow(follow))) => {
            buckets.follows_create.push(FollowRow {
                uri: event.uri.into_string(),
                follower: event.author.into_string(),
                followee: follow.subject,
            });
        }
        (EventAction::Deleted, None)
            if event.collection == feed_core::record::Collection::Follow =>
        {
            buckets.follows_delete.push(event.uri.into_string());
        }
        _ => {}
    }
}

fn cid_rev(cid: &str) -> String {
    feed_core::Cid::new(cid.to_owned()).reverse().into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_core::record::{FollowRecord, PostRecord, StrongRef};
    use feed_core::{Did, Uri};

    fn post_event(created_at: DateTime<Utc>, is_reply: bool) -> FirehoseEvent {
        let reply = if is_reply {
            Some(feed_core::record::ReplyRef {
                root: StrongRef {
                    uri: Uri::new("at://did:plc:root/app.bsky.feed.post/r"),
                    cid: "root-cid".to_owned(),
                },
                parent: StrongRef {
                    uri: Uri::new("at://did:plc:parent/app.bsky.feed.post/p"),
                    cid: "parent-cid".to_owned(),
                },
            })
        } else {
            None
        };
        FirehoseEvent {
            collection: feed_core::record::Collection::Post,
            action: EventAction::Created,
            uri: Uri::new("at://did:plc:author/app.bsky.feed.post/abc"),
            cid: Some("bafyabc".to_owned()),
            author: Did::new("did:plc:author"),
            record: Some(DecodedRecord::Post(PostRecord { created_at, reply })),
        }
    }

    #[test]
    fn reply_posts_are_dropped() {
        let mut buckets = Buckets::default();
        let now = Utc::now();
        bucket_event(post_event(now, true), &mut buckets, now);
        assert!(buckets.posts_create.is_empty());
    }

    #[test]
    fn stale_posts_are_dropped() {
        let mut buckets = Buckets::default();
        let now = Utc::now();
        let too_old = now - chrono::Duration::hours(20);
        bucket_event(post_event(too_old, false), &mut buckets, now);
        assert!(buckets.posts_create.is_empty());
    }

    #[test]
    fn fresh_posts_are_kept_with_reversed_cid() {
        let mut buckets = Buckets::default();
        let now = Utc::now();
        bucket_event(post_event(now, false), &mut buckets, now);
        assert_eq!(buckets.posts_create.len(), 1);
        assert_eq!(buckets.posts_create[0].cid_rev, "cbafyab");
    }

    #[test]
    fn follow_events_bucket_separately() {
        let mut buckets = Buckets::default();
        let now = Utc::now();
        let event = FirehoseEvent {
            collection: feed_core::record::Collection::Follow,
            action: EventAction::Created,
            uri: Uri::new("at://did:plc:a/app.bsky.graph.follow/1"),
            cid: None,
            author: Did::new("did:plc:a"),
            record: Some(DecodedRecord::Follow(FollowRecord {
                subject: "did:plc:b".to_owned(),
                created_at: None,
            })),
        };
        bucket_event(event, &mut buckets, now);
        assert_eq!(buckets.follows_create.len(), 1);
        assert_eq!(buckets.follows_create[0].followee, "did:plc:b");
    }
}
