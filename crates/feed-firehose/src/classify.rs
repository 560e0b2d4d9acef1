//! Dispatch a commit's ops against the fixed NSID interest table and decode
//! each accepted op's record payload.

use feed_core::record::{Collection, FollowRecord, LikeRecord, PostRecord, RepostRecord};
use feed_core::{Did, Uri};

use crate::commit::{Commit, RepoOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Created,
    Deleted,
}

#[derive(Debug, Clone)]
pub enum DecodedRecord {
    Post(PostRecord),
    Repost(RepostRecord),
    Follow(FollowRecord),
    Like(LikeRecord),
}

#[derive(Debug, Clone)]
pub struct FirehoseEvent {
    pub collection: Collection,
    pub action: EventAction,
    pub uri: Uri,
    pub cid: Option<String>,
    pub author: Did,
    /// Present for `Created` events once the payload has been decoded into
    /// a known shape; always `None` for `Deleted` (a delete op carries no
    /// record body).
    pub record: Option<DecodedRecord>,
}

fn decode_record(collection: Collection, bytes: &[u8]) -> Option<DecodedRecord> {
    match collection {
        Collection::Post => serde_ipld_dagcbor::from_slice::<PostRecord>(bytes)
            .ok()
            .map(DecodedRecord::Post),
        Collection::Repost => serde_ipld_dagcbor::from_slice::<RepostRecord>(bytes)
            .ok()
            .map(DecodedRecord::Repost),
        Collection::Follow => serde_ipld_dagcbor::from_slice::<FollowRecord>(bytes)
            .ok()
            .map(DecodedRecord::Follow),
        Collection::Like => serde_ipld_dagcbor::from_slice::<LikeRecord>(bytes)
            .ok()
            .map(DecodedRecord::Like),
    }
}

/// Classify and decode every op in a commit's block map. Ops whose
/// collection isn't in the interest table, whose referenced block is
/// missing, or whose payload doesn't decode to the expected shape are
/// silently dropped — a single malformed op never fails the whole frame.
pub fn classify_commit(
    commit: &Commit,
    blocks: &std::collections::HashMap<ipld_core::cid::Cid, Vec<u8>>,
) -> Vec<FirehoseEvent> {
    let author = Did::new(commit.repo.clone());
    let mut events = Vec::new();

    for op in &commit.ops {
        if op.action == RepoOp::UPDATE {
            continue;
        }

        let Some(collection_str) = op.collection() else {
            continue;
        };
        let Some(collection) = Collection::from_nsid(collection_str) else {
            continue;
        };

        let uri = Uri::from_repo_and_path(&author, &op.path);

        match op.action.as_str() {
            RepoOp::CREATE => {
                let Some(cid) = op.cid else { continue };
                let Some(block) = blocks.get(&cid) else {
                    continue;
                };
                let Some(record) = decode_record(collection, block) else {
                    continue;
                };
                events.push(FirehoseEvent {
                    collection,
                    action: EventAction::Created,
                    uri,
                    cid: Some(cid.to_string()),
                    author: author.clone(),
                    record: Some(record),
                });
            }
            RepoOp::DELETE => {
                events.push(FirehoseEvent {
                    collection,
                    action: EventAction::Deleted,
                    uri,
                    cid: None,
                    author: author.clone(),
                    record: None,
                });
            }
            _ => {}
        }
    }

    events
}
