//! The writer loop and follow primer: the two pieces of the pipeline that
//! sit on top of [`feed_store`] and actually move data in and out of it.

pub mod error;
pub mod identity;
pub mod primer;
pub mod writer;

pub use error::ClientError;
pub use primer::FollowPrimer;
pub use writer::WriterLoop;
