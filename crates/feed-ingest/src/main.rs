//! Ingestion process: runs the firehose subscriber and the writer loop as
//! two long-lived tasks under one tokio runtime, connected by the unbounded
//! event queue.

use std::path::PathBuf;

use clap::Parser;
use feed_client::WriterLoop;
use feed_core::config::Config;
use feed_firehose::Subscriber;
use feed_store::Store;
use snafu::{ResultExt, Snafu};
use tokio::sync::{mpsc, watch};

const LOG_TARGET: &str = "feed::ingest";
const DEFAULT_FIREHOSE_URL: &str =
    "wss://bsky.network/xrpc/com.atproto.sync.subscribeRepos";

#[derive(Debug, Parser)]
#[command(name = "feed-ingest")]
struct Opts {
    /// Path to the YAML config file.
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,

    /// Websocket URL of the upstream commit-stream subscription.
    #[arg(long, default_value = DEFAULT_FIREHOSE_URL)]
    firehose_url: String,
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("failed to load config"))]
    Config { source: feed_core::config::ConfigError },
    #[snafu(display("failed to connect to store"))]
    Store { source: feed_store::StoreError },
    #[snafu(display("firehose subscriber failed"))]
    Firehose { source: feed_firehose::FirehoseError },
    #[snafu(display("writer loop failed"))]
    Writer { source: feed_client::ClientError },
}

fn database_url(config: &Config) -> String {
    config.database_url.clone().unwrap_or_else(|| {
        format!(
            "postgres://postgres:{}@localhost:5432/bluesky",
            config.db_password
        )
    })
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

    let (tx, rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let subscriber = Subscriber::new(opts.firehose_url.clone());
    let subscriber_handle = tokio::spawn(async move { subscriber.run(tx, shutdown_rx).await });

    let writer = WriterLoop::new(store, rx);
    let writer_handle = tokio::spawn(writer.run());

    tokio::select! {
        result = subscriber_handle => {
            tracing::error!(target: LOG_TARGET, "subscriber task exited");
            result.expect("subscriber task panicked").context(FirehoseSnafu)?;
        }
        result = writer_handle => {
            tracing::error!(target: LOG_TARGET, "writer task exited");
            let _ = shutdown_tx.send(true);
            result.expect("writer task panicked").context(WriterSnafu)?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: LOG_TARGET, "shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    }

    Ok(())
}
