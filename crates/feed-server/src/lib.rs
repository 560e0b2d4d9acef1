//! The serving process: an axum HTTP service that authenticates a reader,
//! primes their follow list on first sight, and materializes their
//! personalized feed skeleton.

pub mod auth;
pub mod error;
pub mod materializer;
pub mod routes;
pub mod state;

pub use error::ServerError;
pub use state::AppState;

pub const LOG_TARGET: &str = "feed::server";
