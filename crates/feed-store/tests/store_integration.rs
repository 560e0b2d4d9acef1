//! Integration tests against a live Postgres instance.
//!
//! `#[ignore]`d because no database is reachable here; point `DATABASE_URL`
//! at a disposable Postgres and run with `--ignored` to exercise them.

use chrono::Utc;
use feed_store::model::{FollowRow, NewPost};
use feed_store::{follows_ops, partition, posts_ops, Store};

async fn test_store() -> Store {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    Store::connect(&url).await.expect("connect")
}

#[test_log::test(tokio::test)]
#[ignore]
async fn reingesting_same_post_is_a_noop() {
    let store = test_store().await;
    let now = Utc::now();
    partition::ensure_partition(store.pool(), now).await.unwrap();

    let post = NewPost {
        uri: "at://did:plc:a/app.bsky.feed.post/1".to_owned(),
        cid_rev: "cba".to_owned(),
        repost_uri: None,
        created_at: now,
        author: "did:plc:a".to_owned(),
    };

    let first = posts_ops::insert_posts(store.pool(), &[post.clone()]).await.unwrap();
    let second = posts_ops::insert_posts(store.pool(), &[post]).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
}

#[test_log::test(tokio::test)]
#[ignore]
async fn retention_sweep_drops_only_expired_partitions() {
    let store = test_store().await;
    let now = Utc::now();
    let stale = now - chrono::Duration::hours(20);

    partition::ensure_partition(store.pool(), now).await.unwrap();
    partition::ensure_partition(store.pool(), stale).await.unwrap();

    let dropped = partition::sweep_expired(store.pool(), now, 13).await.unwrap();
    assert!(dropped.iter().any(|name| name.contains(&feed_core::time::partition_name(stale)[..])));

    let remaining = partition::list_partitions(store.pool()).await.unwrap();
    assert!(!remaining.iter().any(|name| dropped.contains(name)));
}

#[test_log::test(tokio::test)]
#[ignore]
async fn candidates_are_limited_to_followees() {
    let store = test_store().await;
    let now = Utc::now();
    partition::ensure_partition(store.pool(), now).await.unwrap();

    follows_ops::bulk_insert_primed_follows(
        store.pool(),
        &[FollowRow {
            uri: "at://did:plc:reader/app.bsky.graph.follow/1".to_owned(),
            follower: "did:plc:reader".to_owned(),
            followee: "did:plc:followed".to_owned(),
        }],
        false,
    )
    .await
    .unwrap();

    posts_ops::insert_posts(
        store.pool(),
        &[
            NewPost {
                uri: "at://did:plc:followed/app.bsky.feed.post/1".to_owned(),
                cid_rev: "aaa".to_owned(),
                repost_uri: None,
                created_at: now,
                author: "did:plc:followed".to_owned(),
            },
            NewPost {
                uri: "at://did:plc:stranger/app.bsky.feed.post/1".to_owned(),
                cid_rev: "bbb".to_owned(),
                repost_uri: None,
                created_at: now,
                author: "did:plc:stranger".to_owned(),
            },
        ],
    )
    .await
    .unwrap();

    let candidates = posts_ops::select_candidates(store.pool(), "did:plc:reader", false)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].uri, "at://did:plc:followed/app.bsky.feed.post/1");
}

#[test_log::test(tokio::test)]
#[ignore]
async fn chaos_feed_includes_reposts_non_chaos_excludes_them() {
    let store = test_store().await;
    let now = Utc::now();
    partition::ensure_partition(store.pool(), now).await.unwrap();

    follows_ops::bulk_insert_primed_follows(
        store.pool(),
        &[FollowRow {
            uri: "at://did:plc:reader/app.bsky.graph.follow/1".to_owned(),
            follower: "did:plc:reader".to_owned(),
            followee: "did:plc:followed".to_owned(),
        }],
        false,
    )
    .await
    .unwrap();

    posts_ops::insert_posts(
        store.pool(),
        &[NewPost {
            uri: "at://did:plc:followed/app.bsky.feed.repost/1".to_owned(),
            cid_rev: "ccc".to_owned(),
            repost_uri: Some("at://did:plc:original/app.bsky.feed.post/1".to_owned()),
            created_at: now,
            author: "did:plc:followed".to_owned(),
        }],
    )
    .await
    .unwrap();

    let without_reposts = posts_ops::select_candidates(store.pool(), "did:plc:reader", false)
        .await
        .unwrap();
    let with_reposts = posts_ops::select_candidates(store.pool(), "did:plc:reader", true)
        .await
        .unwrap();

    assert!(without_reposts.is_empty());
    assert_eq!(with_reposts.len(), 1);
}
