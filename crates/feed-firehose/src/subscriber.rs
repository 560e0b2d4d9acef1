//! Connects to the upstream commit stream and emits classified events onto
//! an unbounded channel. Reconnects with exponential backoff on transport
//! failure, up to a bounded number of attempts, before giving up and
//! letting the caller decide to exit the process (per the design's
//! "upstream stream failure -> process exits non-zero" policy — this adds
//! bounded retry in front of that, it doesn't replace it).

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use crate::classify::classify_commit;
use crate::commit::{decode_block_map, Commit};
use crate::error::{ConnectSnafu, FirehoseError, TransportSnafu};
use crate::frame::decode_frame_header;
use crate::FirehoseEvent;

use snafu::ResultExt;

const LOG_TARGET: &str = "feed::firehose::subscriber";
const MAX_RECONNECT_ATTEMPTS: u32 = 10;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub struct Subscriber {
    url: String,
}

impl Subscriber {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Run the reconnect loop until `shutdown` signals true or reconnect
    /// attempts are exhausted.
    pub async fn run(
        &self,
        tx: mpsc::UnboundedSender<FirehoseEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), FirehoseError> {
        let mut attempt = 0u32;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            let mut shutdown_watch = shutdown.clone();
            tokio::select! {
                result = self.connect_and_process(&tx, &mut shutdown) => {
                    match result {
                        Ok(()) => return Ok(()),
                        Err(err) => {
                            attempt += 1;
                            tracing::warn!(target: LOG_TARGET, %err, attempt, "firehose connection dropped");
                            if attempt >= MAX_RECONNECT_ATTEMPTS {
                                return Err(FirehoseError::ReconnectExhausted { attempts: attempt });
                            }
                            tokio::time::sleep(backoff).await;
                            backoff = (backoff * 2).min(MAX_BACKOFF);
                        }
                    }
                }
                _ = shutdown_watch.changed() => {
                    if *shutdown_watch.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn connect_and_process(
        &self,
        tx: &mpsc::UnboundedSender<FirehoseEvent>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), FirehoseError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .context(ConnectSnafu {
                url: self.url.clone(),
            })?;
        tracing::info!(target: LOG_TARGET, url = %self.url, "connected to firehose");

        let (_, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                message = read.next() => {
                    let Some(message) = message else {
                        return Ok(());
                    };
                    let message = message.context(TransportSnafu)?;
                    if let Message::Binary(bytes) = message {
                        if let Err(err) = self.handle_message(&bytes, tx).await {
                            tracing::warn!(target: LOG_TARGET, %err, "dropping malformed frame");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn handle_message(
        &self,
        bytes: &[u8],
        tx: &mpsc::UnboundedSender<FirehoseEvent>,
    ) -> Result<(), FirehoseError> {
        let (header, payload) = decode_frame_header(bytes)?;
        if !header.is_commit() {
            return Ok(());
        }

        let commit: Commit = match serde_ipld_dagcbor::from_slice(payload) {
            Ok(commit) => commit,
            Err(_) => return Ok(()),
        };
        if commit.blocks.is_empty() {
            return Ok(());
        }

        let blocks = decode_block_map(&commit.blocks).await?;
        for event in classify_commit(&commit, &blocks) {
            // The receiver outliving the subscriber isn't required; a
            // closed channel just means the writer loop shut down first.
            let _ = tx.send(event);
        }
        Ok(())
    }
}
