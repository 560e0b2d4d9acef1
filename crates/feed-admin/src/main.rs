//! One-shot admin utility: publish (or republish) a feed generator record
//! to the bot account's own repository.
//!
//! Outside the two-process core, but named in the external interfaces as
//! part of the boundary: an operator runs this after editing a feed's
//! `display_name`/`description`/`avatar_path` in the config file.

use std::path::PathBuf;

use clap::Parser;
use feed_core::config::{Config, FeedConfig};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

const LOG_TARGET: &str = "feed::admin";
const GENERATOR_COLLECTION: &str = "app.bsky.feed.generator";

#[derive(Debug, Parser)]
#[command(name = "feed-admin")]
struct Opts {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Which of `config.feeds` to publish.
    #[arg(long)]
    feed: String,

    /// PDS endpoint to authenticate against.
    #[arg(long, default_value = "https://bsky.social")]
    pds_endpoint: String,
}

#[derive(Debug, Snafu)]
enum AdminError {
    #[snafu(display("failed to load config"))]
    Config { source: feed_core::config::ConfigError },
    #[snafu(display("feed '{feed}' is not defined in the config file"))]
    UnknownFeed { feed: String },
    #[snafu(display("login request failed"))]
    LoginRequest { source: reqwest::Error },
    #[snafu(display("login failed with status {status}"))]
    LoginRejected { status: reqwest::StatusCode },
    #[snafu(display("failed to read avatar file at {path}"))]
    ReadAvatar { path: String, source: std::io::Error },
    #[snafu(display("avatar upload request failed"))]
    UploadRequest { source: reqwest::Error },
    #[snafu(display("avatar upload failed with status {status}"))]
    UploadRejected { status: reqwest::StatusCode },
    #[snafu(display("put_record request failed"))]
    PutRecordRequest { source: reqwest::Error },
    #[snafu(display("put_record failed with status {status}: {body}"))]
    PutRecordRejected { status: reqwest::StatusCode, body: String },
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    #[serde(rename = "accessJwt")]
    access_jwt: String,
    did: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobRef {
    #[serde(rename = "$type")]
    type_: String,
    #[serde(rename = "ref")]
    link: serde_json::Value,
    #[serde(rename = "mimeType")]
    mime_type: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct UploadBlobResponse {
    blob: BlobRef,
}

#[derive(Debug, Serialize)]
struct GeneratorRecord {
    #[serde(rename = "$type")]
    type_: &'static str,
    did: String,
    #[serde(rename = "displayName")]
    display_name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<BlobRef>,
    #[serde(rename = "createdAt")]
    created_at: String,
}

#[derive(Debug, Serialize)]
struct PutRecordRequest {
    repo: String,
    collection: &'static str,
    rkey: String,
    record: GeneratorRecord,
}

#[derive(Debug, Deserialize)]
struct PutRecordResponse {
    uri: String,
}

struct Session {
    http: reqwest::Client,
    pds_endpoint: String,
    access_jwt: String,
    did: String,
}

impl Session {
    async fn login(pds_endpoint: &str, handle: &str, password: &str) -> Result<Self, AdminError> {
        let http = reqwest::Client::new();
        let response = http
            .post(format!(
                "{pds_endpoint}/xrpc/com.atproto.server.createSession"
            ))
            .json(&CreateSessionRequest {
                identifier: handle,
                password,
            })
            .send()
            .await
            .context(LoginRequestSnafu)?;

        if !response.status().is_success() {
            return Err(AdminError::LoginRejected {
                status: response.status(),
            });
        }

        let session: CreateSessionResponse = response.json().await.context(LoginRequestSnafu)?;

        Ok(Self {
            http,
            pds_endpoint: pds_endpoint.to_owned(),
            access_jwt: session.access_jwt,
            did: session.did,
        })
    }

    async fn upload_avatar(&self, path: &str) -> Result<BlobRef, AdminError> {
        let bytes = tokio::fs::read(path).await.context(ReadAvatarSnafu {
            path: path.to_owned(),
        })?;
        let mime = mime_guess_from_path(path);

        let response = self
            .http
            .post(format!(
                "{}/xrpc/com.atproto.repo.uploadBlob",
                self.pds_endpoint
            ))
            .bearer_auth(&self.access_jwt)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await
            .context(UploadRequestSnafu)?;

        if !response.status().is_success() {
            return Err(AdminError::UploadRejected {
                status: response.status(),
            });
        }

        let uploaded: UploadBlobResponse = response.json().await.context(UploadRequestSnafu)?;
        Ok(uploaded.blob)
    }

    async fn publish_feed(
        &self,
        hostname: &str,
        feed: &FeedConfig,
        avatar: Option<BlobRef>,
    ) -> Result<String, AdminError> {
        let record = GeneratorRecord {
            type_: GENERATOR_COLLECTION,
            did: format!("did:web:{hostname}"),
            display_name: feed.display_name.clone(),
            description: feed.description.clone(),
            avatar,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let response = self
            .http
            .post(format!(
                "{}/xrpc/com.atproto.repo.putRecord",
                self.pds_endpoint
            ))
            .bearer_auth(&self.access_jwt)
            .json(&PutRecordRequest {
                repo: self.did.clone(),
                collection: GENERATOR_COLLECTION,
                rkey: feed.record_name.clone(),
                record,
            })
            .send()
            .await
            .context(PutRecordRequestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminError::PutRecordRejected { status, body });
        }

        let result: PutRecordResponse = response.json().await.context(PutRecordRequestSnafu)?;
        Ok(result.uri)
    }
}

fn mime_guess_from_path(path: &str) -> &'static str {
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), AdminError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let config = Config::load(&opts.config).context(ConfigSnafu)?;

    let feed = config
        .feeds
        .get(&opts.feed)
        .cloned()
        .ok_or_else(|| AdminError::UnknownFeed {
            feed: opts.feed.clone(),
        })?;

    let session = Session::login(&opts.pds_endpoint, &config.handle, &config.password).await?;

    let avatar = match &feed.avatar_path {
        Some(path) => {
            tracing::info!(target: LOG_TARGET, path, "uploading avatar");
            Some(session.upload_avatar(path).await?)
        }
        None => None,
    };

    let uri = session
        .publish_feed(&config.hostname, &feed, avatar)
        .await?;

    tracing::info!(target: LOG_TARGET, %uri, "published feed generator record");
    println!("Feed URI: {uri}");

    Ok(())
}
