//! Process-wide shared state for the serving process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use feed_client::FollowPrimer;
use feed_core::config::Config;
use feed_store::Store;

use crate::auth::TokenVerifier;

/// The only process-wide mutable state besides the DB: a reader's last
/// full-refresh seed. Requests for a given reader arrive serialized in the
/// common case, but a mutex still guards it per the spec's concurrency
/// model.
pub type LastSeed = Mutex<HashMap<String, i64>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub primer: Arc<FollowPrimer>,
    pub config: Arc<Config>,
    pub last_seed: Arc<LastSeed>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        store: Store,
        primer: FollowPrimer,
        config: Config,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            store,
            primer: Arc::new(primer),
            config: Arc::new(config),
            last_seed: Arc::new(Mutex::new(HashMap::new())),
            verifier,
        }
    }
}
