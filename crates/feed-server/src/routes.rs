//! The four HTTP endpoints (§6): liveness, the static DID document,
//! feed-generator description, and the core feed skeleton.

use axum::extract::{Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::auth::AuthedReader;
use crate::error::{MaterializeSnafu, PrimerSnafu, ServerError};
use crate::materializer;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/.well-known/did.json", get(did_document))
        .route(
            "/xrpc/app.bsky.feed.describeFeedGenerator",
            get(describe_feed_generator),
        )
        .route("/xrpc/app.bsky.feed.getFeedSkeleton", get(get_feed_skeleton))
        .with_state(state)
}

async fn index() -> &'static str {
    "feed generator running"
}

#[derive(Debug, Serialize)]
struct DidService {
    id: String,
    #[serde(rename = "type")]
    type_: String,
    service_endpoint: String,
}

#[derive(Debug, Serialize)]
struct DidDocument {
    #[serde(rename = "@context")]
    context: Vec<String>,
    id: String,
    service: Vec<DidService>,
}

async fn did_document(State(state): State<AppState>) -> Json<DidDocument> {
    let hostname = &state.config.hostname;
    Json(DidDocument {
        context: vec!["https://www.w3.org/ns/did/v1".to_owned()],
        id: format!("did:web:{hostname}"),
        service: vec![DidService {
            id: "#bsky_fg".to_owned(),
            type_: "BskyFeedGenerator".to_owned(),
            service_endpoint: format!("https://{hostname}"),
        }],
    })
}

#[derive(Debug, Serialize)]
struct DescribeFeedGeneratorResponse {
    did: String,
    feeds: Vec<FeedUri>,
}

#[derive(Debug, Serialize)]
struct FeedUri {
    uri: String,
}

async fn describe_feed_generator(
    State(state): State<AppState>,
) -> Json<DescribeFeedGeneratorResponse> {
    Json(DescribeFeedGeneratorResponse {
        did: format!("did:web:{}", state.config.hostname),
        feeds: state
            .config
            .feeds
            .values()
            .map(|feed| FeedUri {
                uri: feed.uri.clone(),
            })
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct GetFeedSkeletonQuery {
    feed: String,
    cursor: Option<String>,
    limit: Option<u32>,
}

async fn get_feed_skeleton(
    State(state): State<AppState>,
    AuthedReader(did): AuthedReader,
    Query(query): Query<GetFeedSkeletonQuery>,
) -> Result<Json<materializer::FeedSkeleton>, ServerError> {
    state
        .primer
        .prime_if_needed(did.as_str())
        .await
        .context(PrimerSnafu)?;

    let skeleton = materializer::materialize(
        &state.store,
        &state.last_seed,
        &did,
        &query.feed,
        query.cursor.as_deref(),
        query.limit,
    )
    .await
    .context(MaterializeSnafu)?;

    Ok(Json(skeleton))
}
