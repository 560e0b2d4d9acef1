//! The Feed Materializer (§4.F): candidate selection, per-request
//! deterministic randomization, sort, and cursor pagination.

use std::collections::HashMap;
use std::sync::Mutex;

use feed_core::cursor::{Cursor, CursorError};
use feed_core::ids::{Cid, Did};
use feed_core::rand_id::{hashcode, ReaderRng};
use feed_store::model::CandidatePost;
use feed_store::{posts_ops, Store};
use serde::Serialize;
use snafu::{ResultExt, Snafu};

/// Requests with `cursor == null` and `limit` above this are treated as a
/// full refresh rather than a top-up around a cursor boundary.
pub const FULL_REFRESH_LIMIT_THRESHOLD: u32 = 20;
const MAX_LIMIT: u32 = 600;
const DEFAULT_LIMIT: u32 = 20;

const REPOST_REASON_TYPE: &str = "app.bsky.feed.defs#skeletonReasonRepost";

#[derive(Debug, Snafu)]
pub enum MaterializeError {
    #[snafu(display("malformed or mismatched cursor"))]
    Cursor { source: CursorError },
    #[snafu(display("candidate query failed"))]
    Store { source: feed_store::StoreError },
}

#[derive(Debug, Serialize)]
pub struct SkeletonReason {
    #[serde(rename = "$type")]
    pub type_: String,
    pub repost: String,
}

#[derive(Debug, Serialize)]
pub struct SkeletonItem {
    pub post: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkeletonReason>,
}

#[derive(Debug, Serialize)]
pub struct FeedSkeleton {
    pub cursor: String,
    pub feed: Vec<SkeletonItem>,
}

/// `feed` suffix `chaos` includes reposts in candidates; anything else
/// excludes them.
pub fn includes_reposts(feed: &str) -> bool {
    feed.ends_with("chaos")
}

struct RankedCandidate {
    rand_id: i64,
    candidate: CandidatePost,
}

pub async fn materialize(
    store: &Store,
    last_seed: &Mutex<HashMap<String, i64>>,
    did: &Did,
    feed: &str,
    cursor: Option<&str>,
    limit: Option<u32>,
) -> Result<FeedSkeleton, MaterializeError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT).max(1);

    let cursor_rand_id = match cursor {
        Some(raw) => Some(Cursor::decode(raw, did).context(CursorSnafu)?.rand_id),
        None => None,
    };

    let seed = {
        let mut seeds = last_seed.lock().expect("last_seed mutex poisoned");
        let current = *seeds.get(did.as_str()).unwrap_or(&0);
        if cursor.is_none() && limit > FULL_REFRESH_LIMIT_THRESHOLD {
            let next = current + 1;
            seeds.insert(did.as_str().to_owned(), next);
            next
        } else {
            current
        }
    };

    let candidates = posts_ops::select_candidates(store.pool(), did.as_str(), includes_reposts(feed))
        .await
        .context(StoreSnafu)?;

    let mut reader_rng = ReaderRng::new(seed);
    let mut ranked: Vec<RankedCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let rand_id = hashcode(candidate.cid_rev.as_str(), &mut reader_rng);
            RankedCandidate { rand_id, candidate }
        })
        .collect();
    ranked.sort_by_key(|r| r.rand_id);

    let start = match cursor_rand_id {
        Some(cursor_rand_id) => ranked.partition_point(|r| r.rand_id <= cursor_rand_id),
        None => 0,
    };
    let end = (start + limit as usize).min(ranked.len());
    let page = &ranked[start..end];

    let next_rand_id = page.last().map(|r| r.rand_id).unwrap_or_else(|| cursor_rand_id.unwrap_or(0));

    let feed_items = page
        .iter()
        .map(|r| match &r.candidate.repost_uri {
            Some(repost_uri) => SkeletonItem {
                post: repost_uri.clone(),
                reason: Some(SkeletonReason {
                    type_: REPOST_REASON_TYPE.to_owned(),
                    repost: r.candidate.uri.clone(),
                }),
            },
            None => SkeletonItem {
                post: r.candidate.uri.clone(),
                reason: None,
            },
        })
        .collect();

    Ok(FeedSkeleton {
        cursor: Cursor::encode(next_rand_id, did),
        feed: feed_items,
    })
}

/// Used by the writer to compute the stable sort key from a raw CID
/// string; kept here so the materializer and the ingestion path agree on
/// what `cid_rev` means.
pub fn cid_rev(cid: &str) -> String {
    Cid::new(cid).reverse().into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chaos_suffix_includes_reposts() {
        assert!(includes_reposts("random_chaos"));
        assert!(!includes_reposts("random_onlyposts"));
    }

    #[test]
    fn full_refresh_threshold_matches_spec_heuristic() {
        assert_eq!(FULL_REFRESH_LIMIT_THRESHOLD, 20);
    }
}
