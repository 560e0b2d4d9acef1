use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum ClientError {
    #[snafu(display("store error"))]
    Store { source: feed_store::StoreError },
    #[snafu(display("watchdog timeout: no successful commit in {elapsed_secs}s"))]
    WatchdogTimeout { elapsed_secs: u64 },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PrimerError {
    #[snafu(display("failed to resolve PDS endpoint for {did}"))]
    ResolveIdentity {
        did: String,
        source: crate::identity::IdentityError,
    },
    #[snafu(display("store error while priming {did}"))]
    Store {
        did: String,
        source: feed_store::StoreError,
    },
}

impl From<feed_store::StoreError> for ClientError {
    fn from(source: feed_store::StoreError) -> Self {
        ClientError::Store { source }
    }
}
