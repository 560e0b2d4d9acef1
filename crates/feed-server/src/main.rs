//! Serving process: authenticates readers, primes follows on first sight,
//! and serves the personalized feed skeleton over HTTP.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use feed_client::FollowPrimer;
use feed_core::config::Config;
use feed_server::auth::{JwtVerifier, TokenVerifier};
use feed_server::{routes, AppState};
use feed_store::Store;
use feed_util_bind_addr::BindAddr;
use jsonwebtoken::DecodingKey;
use snafu::{ResultExt, Snafu};

const LOG_TARGET: &str = "feed::server";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Parser)]
#[command(name = "feed-server")]
struct Opts {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Address (or unix socket path) to bind the HTTP server to.
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// PEM-encoded Ed25519 public key used to verify reader service JWTs.
    /// Defaults to a development key; production deployments must set this
    /// to the key their token issuer actually signs with.
    #[arg(long, env = "FEED_JWT_PUBLIC_KEY_PEM")]
    jwt_public_key_pem: Option<String>,

    /// Require the bulk-insert trigger check when priming follows.
    #[arg(long)]
    enforce_follows_primed_trigger: bool,
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("failed to load config"))]
    Config { source: feed_core::config::ConfigError },
    #[snafu(display("failed to connect to store"))]
    Store { source: feed_store::StoreError },
    #[snafu(display("invalid bind address {addr}"))]
    BindAddr { addr: String },
    #[snafu(display("invalid jwt public key"))]
    JwtKey { source: jsonwebtoken::errors::Error },
    #[snafu(display("server failed"))]
    Serve { source: std::io::Error },
}

fn database_url(config: &Config) -> String {
    config.database_url.clone().unwrap_or_else(|| {
        format!(
            "postgres://postgres:{}@localhost:5432/bluesky",
            config.db_password
        )
    })
}

fn decoding_key(opts: &Opts) -> Result<DecodingKey, CliError> {
    match &opts.jwt_public_key_pem {
        Some(pem) => DecodingKey::from_ed_pem(pem.as_bytes()).context(JwtKeySnafu),
        None => {
            tracing::warn!(
                target: LOG_TARGET,
                "no --jwt-public-key-pem provided; refusing all bearer tokens"
            );
            Ok(DecodingKey::from_secret(&[]))
        }
    }
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let config = Config::load(&opts.config).context(ConfigSnafu)?;

    let store = Store::connect(&database_url(&config))
        .await
        .context(StoreSnafu)?;

    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(decoding_key(&opts)?));
    let primer = FollowPrimer::new(store.clone(), opts.enforce_follows_primed_trigger);

    let state = AppState::new(store, primer, config, verifier);
    let app = routes::router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let bind_addr =
        BindAddr::from_str(&opts.bind).map_err(|_| CliError::BindAddr { addr: opts.bind.clone() })?;

    match bind_addr {
        BindAddr::Tcp(addr) => {
            tracing::info!(target: LOG_TARGET, %addr, "listening");
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context(ServeSnafu)?;
            axum::serve(listener, app).await.context(ServeSnafu)?;
        }
        BindAddr::Unix(path) => {
            tracing::info!(target: LOG_TARGET, path = %path.display(), "listening");
            let _ = std::fs::remove_file(&path);
            let listener = tokio::net::UnixListener::bind(&path).context(ServeSnafu)?;
            axum::serve(listener, app.into_make_service())
                .await
                .context(ServeSnafu)?;
        }
    }

    Ok(())
}
