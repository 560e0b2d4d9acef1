//! The two-part DAG-CBOR framing every firehose websocket message uses: a
//! small header identifying the message type, immediately followed by a
//! second DAG-CBOR value holding the type-specific payload.

use serde::Deserialize;

use crate::error::{FirehoseError, FrameHeaderSnafu};

#[derive(Debug, Clone, Deserialize)]
pub struct FrameHeader {
    #[serde(rename = "op")]
    pub op: i8,
    #[serde(rename = "t")]
    pub message_type: Option<String>,
}

impl FrameHeader {
    pub const COMMIT: &'static str = "#commit";
    pub const IDENTITY: &'static str = "#identity";
    pub const ACCOUNT: &'static str = "#account";
    pub const HANDLE: &'static str = "#handle";
    pub const TOMBSTONE: &'static str = "#tombstone";
    pub const INFO: &'static str = "#info";

    pub fn is_commit(&self) -> bool {
        self.message_type.as_deref() == Some(Self::COMMIT)
    }
}

/// Split a raw websocket binary message into its header and the remaining
/// payload bytes. DAG-CBOR values are self-delimiting, so decoding the
/// header via a `Deserializer` positioned at the start of `bytes` tells us
/// exactly how many bytes it consumed.
pub fn decode_frame_header(bytes: &[u8]) -> Result<(FrameHeader, &[u8]), FirehoseError> {
    let mut deserializer = serde_ipld_dagcbor::de::Deserializer::from_slice(bytes);
    let header = FrameHeader::deserialize(&mut deserializer).context(FrameHeaderSnafu)?;
    let consumed = deserializer.byte_offset();
    Ok((header, &bytes[consumed..]))
}

use snafu::ResultExt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_commit_type() {
        let header = FrameHeader {
            op: 1,
            message_type: Some("#commit".to_owned()),
        };
        assert!(header.is_commit());
    }

    #[test]
    fn ignores_other_types() {
        let header = FrameHeader {
            op: 1,
            message_type: Some("#identity".to_owned()),
        };
        assert!(!header.is_commit());
    }
}
