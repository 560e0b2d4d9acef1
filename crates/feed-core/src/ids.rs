//! Newtype wrappers around the string identifiers that flow through every
//! layer of the pipeline. Keeping them distinct prevents a `did` ending up
//! where a `uri` was expected, which is an easy mistake when everything is
//! `String` underneath.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A repository identifier (the reader, the author, the followee...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Did(String);

impl Did {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<String> for Did {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A network-unique reference to a record: `at://{repo}/{collection}/{rkey}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uri(String);

impl Uri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Assemble a record uri from a repo and an op path, per `at://{repo}/{path}`.
    pub fn from_repo_and_path(repo: &Did, path: &str) -> Self {
        Self(format!("at://{repo}/{path}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A record's content identifier, as printed by the upstream (base32, CIDv1).
///
/// The feed's sort key is derived from the *reversed* form of this string —
/// see [`Cid::reverse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cid(String);

impl Cid {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reverse the CID byte-for-byte (here, char-for-char over its printed
    /// form). CIDs share structural prefixes, which clusters raw ordering by
    /// author/time; reversing decorrelates that structure well enough to
    /// seed the feed's randomization.
    pub fn reverse(&self) -> CidRev {
        CidRev(self.0.chars().rev().collect())
    }
}

impl From<String> for Cid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A [`Cid`] reversed for storage as the feed's sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CidRev(String);

impl CidRev {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for CidRev {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for CidRev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_byte_reversal() {
        let cid = Cid::new("bafyabc123");
        assert_eq!(cid.reverse().as_str(), "321cbafyab");
    }

    #[test]
    fn uri_assembly() {
        let repo = Did::new("did:plc:abc123");
        let uri = Uri::from_repo_and_path(&repo, "app.bsky.feed.post/3jzfcijpj2z2a");
        assert_eq!(uri.as_str(), "at://did:plc:abc123/app.bsky.feed.post/3jzfcijpj2z2a");
    }
}
