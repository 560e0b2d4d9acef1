//! Maps the serving path's internal errors onto the HTTP status codes
//! `getFeedSkeleton` documents: `400` for a malformed or reader-mismatched
//! cursor, `401` for auth failures (handled directly by
//! [`crate::auth::AuthError`]), `500` for anything on the store side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use snafu::Snafu;

use crate::materializer::MaterializeError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ServerError {
    #[snafu(display("malformed cursor"))]
    Materialize { source: MaterializeError },
    #[snafu(display("follow priming failed"))]
    Primer { source: feed_client::error::PrimerError },
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Materialize {
                source: MaterializeError::Cursor { .. },
            } => {
                tracing::debug!(target: crate::LOG_TARGET, error = %self, "bad request");
                StatusCode::BAD_REQUEST.into_response()
            }
            _ => {
                tracing::error!(target: crate::LOG_TARGET, error = %self, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
