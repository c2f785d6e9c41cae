use crate::identity::{CrawlerIdentity, IdentityRegistry};
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for CrawlerView
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub robots: RobotsConfig,

    /// Crawler identities in test order; empty means the built-in registry
    #[serde(default, rename = "identity")]
    pub identities: Vec<IdentityEntry>,
}

impl Config {
    /// Builds the identity registry described by this configuration
    pub fn registry(&self) -> Result<IdentityRegistry, ConfigError> {
        if self.identities.is_empty() {
            return Ok(IdentityRegistry::default());
        }

        IdentityRegistry::new(
            self.identities
                .iter()
                .map(|entry| CrawlerIdentity::new(&entry.name, &entry.user_agent))
                .collect(),
        )
    }
}

/// HTTP fetch and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum redirect hops followed for one logical fetch
    pub max_redirects: usize,

    /// Maximum attempts per identity
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubles on each retry
    pub backoff_base_ms: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirects: 5,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

/// robots.txt probe configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RobotsConfig {
    /// Identity whose User-Agent fetches robots.txt
    pub identity: String,

    /// Agent tokens checked for a `Disallow: /` rule, in report order
    pub blocked_agents: Vec<String>,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            identity: "GPTBot".to_string(),
            blocked_agents: vec!["GPTBot".to_string(), "Claude-Web".to_string()],
        }
    }
}

/// One `[[identity]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IdentityEntry {
    pub name: String,
    pub user_agent: String,
}
