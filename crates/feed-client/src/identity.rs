//! Resolves a reader's repository (PDS) endpoint from their `did`, so the
//! follow primer knows where to page `listRecords` from.
//!
//! This stands in for the external identity-resolution boundary `spec.md`
//! treats only through its result: given a `did`, produce a base URL.
//! `did:plc:*` identifiers resolve through the PLC directory; `did:web:*`
//! identifiers resolve through the DID's own `/.well-known/did.json`.

use serde::Deserialize;
use snafu::Snafu;

const PLC_DIRECTORY_URL: &str = "https://plc.directory";
const PDS_SERVICE_ID: &str = "#atproto_pds";

#[derive(Debug, Snafu)]
pub enum IdentityError {
    #[snafu(display("unsupported did method: {did}"))]
    UnsupportedMethod { did: String },
    #[snafu(display("failed to fetch did document for {did}"))]
    Fetch { did: String, source: reqwest::Error },
    #[snafu(display("did document for {did} has no atproto_pds service entry"))]
    MissingPdsService { did: String },
}

#[derive(Debug, Deserialize)]
struct DidDocument {
    service: Vec<DidService>,
}

#[derive(Debug, Deserialize)]
struct DidService {
    id: String,
    #[serde(rename = "serviceEndpoint")]
    service_endpoint: String,
}

impl DidDocument {
    fn pds_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|service| service.id == PDS_SERVICE_ID)
            .map(|service| service.service_endpoint.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    http: reqwest::Client,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl IdentityResolver {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn resolve_pds_endpoint(&self, did: &str) -> Result<String, IdentityError> {
        let doc = if let Some(domain) = did.strip_prefix("did:web:") {
            self.fetch_did_document(&format!("https://{domain}/.well-known/did.json"), did)
                .await?
        } else if did.starts_with("did:plc:") {
            self.fetch_did_document(&format!("{PLC_DIRECTORY_URL}/{did}"), did)
                .await?
        } else {
            return Err(IdentityError::UnsupportedMethod {
                did: did.to_owned(),
            });
        };

        doc.pds_endpoint()
            .map(str::to_owned)
            .ok_or_else(|| IdentityError::MissingPdsService {
                did: did.to_owned(),
            })
    }

    async fn fetch_did_document(&self, url: &str, did: &str) -> Result<DidDocument, IdentityError> {
        self.http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| IdentityError::Fetch {
                did: did.to_owned(),
                source,
            })?
            .json::<DidDocument>()
            .await
            .map_err(|source| IdentityError::Fetch {
                did: did.to_owned(),
                source,
            })
    }
}
