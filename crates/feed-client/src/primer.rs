//! On first sight of a reader, pages their complete follow list from their
//! own repository and bulk-loads it, so the feed materializer has
//! something to join against even for readers who started following
//! people before this service existed.

use feed_store::model::FollowRow;
use feed_store::{follows_ops, Store};
use serde::Deserialize;
use snafu::ResultExt;

use crate::error::{PrimerError, ResolveIdentitySnafu, StoreSnafu};
use crate::identity::IdentityResolver;

const FOLLOW_COLLECTION: &str = "app.bsky.graph.follow";
const PAGE_LIMIT: u32 = 100;

const LOG_TARGET: &str = "feed::client::primer";

#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    records: Vec<ListedRecord>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedRecord {
    uri: String,
    value: FollowValue,
}

#[derive(Debug, Deserialize)]
struct FollowValue {
    subject: String,
}

pub struct FollowPrimer {
    store: Store,
    identity: IdentityResolver,
    http: reqwest::Client,
    /// Whether to wrap the bulk insert in a disable/enable of
    /// `check_follows_primed_trigger`; see `feed_store::follows_ops`.
    enforce_trigger: bool,
}

impl FollowPrimer {
    pub fn new(store: Store, enforce_trigger: bool) -> Self {
        Self {
            store,
            identity: IdentityResolver::default(),
            http: reqwest::Client::new(),
            enforce_trigger,
        }
    }

    /// No-op if `did` has already been primed. On partial listing failure,
    /// whatever was paged before the failure is still committed — the
    /// primer is never retried automatically (a later request will see
    /// non-empty follows and skip priming, which is an accepted weakness).
    pub async fn prime_if_needed(&self, did: &str) -> Result<(), PrimerError> {
        if follows_ops::is_primed(self.store.pool(), did)
            .await
            .context(StoreSnafu { did })?
        {
            return Ok(());
        }

        tracing::info!(target: LOG_TARGET, %did, "priming follows");

        let pds_endpoint = self
            .identity
            .resolve_pds_endpoint(did)
            .await
            .context(ResolveIdentitySnafu { did })?;

        let follows = self.page_all_follows(&pds_endpoint, did).await;

        if !follows.is_empty() {
            follows_ops::bulk_insert_primed_follows(
                self.store.pool(),
                &follows,
                self.enforce_trigger,
            )
            .await
            .context(StoreSnafu { did })?;
        }

        follows_ops::mark_primed(self.store.pool(), did)
            .await
            .context(StoreSnafu { did })?;

        tracing::info!(target: LOG_TARGET, %did, count = follows.len(), "primed follows");
        Ok(())
    }

    /// Pages `listRecords` until the upstream cursor is exhausted. Errors
    /// partway through are swallowed (logged) rather than propagated, so
    /// whatever was already paged is still used — matching the primer's
    /// documented best-effort failure semantics.
    async fn page_all_follows(&self, pds_endpoint: &str, did: &str) -> Vec<FollowRow> {
        let mut follows = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!(
                    "{pds_endpoint}/xrpc/com.atproto.repo.listRecords"
                ))
                .query(&[
                    ("repo", did),
                    ("collection", FOLLOW_COLLECTION),
                    ("limit", &PAGE_LIMIT.to_string()),
                ]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor)]);
            }

            let page = match request.send().await {
                Ok(response) => response.json::<ListRecordsResponse>().await,
                Err(err) => {
                    tracing::warn!(target: LOG_TARGET, %did, %err, "follow listing failed, using partial results");
                    break;
                }
            };

            let page = match page {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(target: LOG_TARGET, %did, %err, "follow listing response malformed");
                    break;
                }
            };

            for record in page.records {
                follows.push(FollowRow {
                    uri: record.uri,
                    follower: did.to_owned(),
                    followee: record.value.subject,
                });
            }

            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        follows
    }
}
