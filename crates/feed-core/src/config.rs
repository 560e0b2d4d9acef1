//! The YAML config file both binaries load at startup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use snafu::{ResultExt, Snafu};

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub record_name: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub avatar_path: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub handle: String,
    pub password: String,
    pub hostname: String,
    pub db_password: String,
    #[serde(default = "default_database_url")]
    pub database_url: Option<String>,
    pub feeds: BTreeMap<String, FeedConfig>,
}

fn default_database_url() -> Option<String> {
    None
}

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("failed to read config file at {path}"))]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("failed to parse config file at {path}"))]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).context(ReadSnafu {
            path: path.display().to_string(),
        })?;
        serde_yaml::from_str(&raw).context(ParseSnafu {
            path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let yaml = r#"
handle: bot.bsky.social
password: hunter2
hostname: feeds.example.com
db_password: secret
feeds:
  random_onlyposts:
    record_name: onlyposts
    display_name: Only Posts
    description: No reposts.
    uri: at://did:plc:abc/app.bsky.feed.generator/onlyposts
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.handle, "bot.bsky.social");
        assert_eq!(config.feeds.len(), 1);
        assert!(config.feeds["random_onlyposts"].avatar_path.is_none());
    }
}
