//! Shared domain types for the feed generator: identifiers, record shapes
//! decoded off the firehose, the opaque pagination cursor, the seeded
//! randomization used to order a feed, and the hour-partition naming scheme.

pub mod config;
pub mod cursor;
pub mod ids;
pub mod rand_id;
pub mod record;
pub mod time;

pub use cursor::{Cursor, CursorError};
pub use ids::{Cid, CidRev, Did, Uri};
pub use rand_id::{hashcode, ReaderRng};
pub use record::{Collection, FollowRecord, LikeRecord, RepostRecord, PostRecord, StrongRef};
