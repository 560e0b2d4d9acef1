//! The `#commit` payload shape and the CAR block map it carries.

use std::collections::HashMap;
use std::io::Cursor;

use ipld_core::cid::Cid;
use iroh_car::CarReader;
use serde::Deserialize;

use crate::error::FirehoseError;

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOp {
    pub action: String,
    pub path: String,
    #[serde(default)]
    pub cid: Option<Cid>,
}

impl RepoOp {
    pub const CREATE: &'static str = "create";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";

    /// Split `op.path` (`{collection}/{rkey}`) into its two parts.
    pub fn collection(&self) -> Option<&str> {
        self.path.split_once('/').map(|(collection, _)| collection)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub repo: String,
    #[serde(with = "serde_bytes")]
    pub blocks: Vec<u8>,
    pub ops: Vec<RepoOp>,
}

/// Decode a commit's CAR-encoded block payload into a lookup map from CID
/// to raw block bytes, so each op's `cid` can be resolved to its record.
pub async fn decode_block_map(blocks: &[u8]) -> Result<HashMap<Cid, Vec<u8>>, FirehoseError> {
    let mut reader = CarReader::new(Cursor::new(blocks))
        .await
        .map_err(|source| FirehoseError::CarBlocks {
            source: std::io::Error::other(source),
        })?;

    let mut map = HashMap::new();
    while let Some((cid, data)) = reader
        .next_block()
        .await
        .map_err(|source| FirehoseError::CarBlocks {
            source: std::io::Error::other(source),
        })?
    {
        map.insert(cid, data);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_splits_on_first_slash() {
        let op = RepoOp {
            action: "create".to_owned(),
            path: "app.bsky.feed.post/3jzfcijpj2z2a".to_owned(),
            cid: None,
        };
        assert_eq!(op.collection(), Some("app.bsky.feed.post"));
    }

    #[test]
    fn path_without_slash_has_no_collection() {
        let op = RepoOp {
            action: "create".to_owned(),
            path: "malformed".to_owned(),
            cid: None,
        };
        assert_eq!(op.collection(), None);
    }
}
