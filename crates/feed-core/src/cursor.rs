//! The opaque pagination cursor: `"{rand_id}::{did}"`.
//!
//! Binding the reader's `did` into the cursor isn't for obfuscation, it's a
//! safety check: a cursor minted for one reader must not be replayable by
//! another, even if they can both obtain a valid bearer token.

use snafu::Snafu;

use crate::ids::Did;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub rand_id: i64,
    pub did: Did,
}

#[derive(Debug, Snafu)]
pub enum CursorError {
    #[snafu(display("cursor is not in the '<rand_id>::<did>' shape"))]
    Malformed,
    #[snafu(display("cursor rand_id is not a valid integer"))]
    InvalidRandId,
    #[snafu(display("cursor was minted for a different reader"))]
    ReaderMismatch,
}

impl Cursor {
    pub fn encode(rand_id: i64, did: &Did) -> String {
        format!("{rand_id}::{did}")
    }

    /// Decode a cursor and check it was minted for `expected_did`.
    pub fn decode(raw: &str, expected_did: &Did) -> Result<Self, CursorError> {
        let (rand_id_str, did_str) = raw.split_once("::").ok_or(CursorError::Malformed)?;
        if did_str.is_empty() {
            return Err(CursorError::Malformed);
        }
        let rand_id: i64 = rand_id_str
            .parse()
            .map_err(|_| CursorError::InvalidRandId)?;
        let did = Did::new(did_str);
        if &did != expected_did {
            return Err(CursorError::ReaderMismatch);
        }
        Ok(Self { rand_id, did })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let did = Did::new("did:plc:reader");
        let encoded = Cursor::encode(42, &did);
        assert_eq!(encoded, "42::did:plc:reader");
        let decoded = Cursor::decode(&encoded, &did).unwrap();
        assert_eq!(decoded.rand_id, 42);
        assert_eq!(decoded.did, did);
    }

    #[test]
    fn rejects_reader_mismatch() {
        let minted_for = Did::new("did:plc:r1");
        let replaying_as = Did::new("did:plc:r2");
        let encoded = Cursor::encode(1, &minted_for);
        assert!(matches!(
            Cursor::decode(&encoded, &replaying_as),
            Err(CursorError::ReaderMismatch)
        ));
    }

    #[test]
    fn rejects_malformed() {
        let did = Did::new("did:plc:r1");
        assert!(matches!(
            Cursor::decode("not-a-cursor", &did),
            Err(CursorError::Malformed)
        ));
        assert!(matches!(
            Cursor::decode("abc::did:plc:r1", &did),
            Err(CursorError::InvalidRandId)
        ));
    }
}
