//! Crawler identity registry
//!
//! An ordered list of simulated crawlers. Order is significant: sessions test
//! identities in registration order and report results in the same order.

use crate::ConfigError;
use serde::Serialize;

/// OpenAI's crawler
pub const GPTBOT_USER_AGENT: &str =
    "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; GPTBot/1.0; +https://openai.com/gptbot)";

/// Anthropic's crawler
pub const CLAUDEBOT_USER_AGENT: &str =
    "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; Claude-Web/1.0; +support@anthropic.com)";

/// Google's search crawler
pub const GOOGLEBOT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

/// Microsoft's search crawler
pub const BINGBOT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)";

/// A named simulated crawler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerIdentity {
    pub name: String,
    pub user_agent: String,
}

impl CrawlerIdentity {
    pub fn new(name: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Ordered, read-only set of crawler identities with unique names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRegistry {
    identities: Vec<CrawlerIdentity>,
}

impl IdentityRegistry {
    /// Builds a registry, rejecting empty or duplicate names
    pub fn new(identities: Vec<CrawlerIdentity>) -> Result<Self, ConfigError> {
        if identities.is_empty() {
            return Err(ConfigError::Validation(
                "at least one crawler identity is required".to_string(),
            ));
        }

        for (i, identity) in identities.iter().enumerate() {
            if identity.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "identity name cannot be empty".to_string(),
                ));
            }
            if identity.user_agent.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "identity '{}' has an empty user-agent",
                    identity.name
                )));
            }
            if identities[..i].iter().any(|other| other.name == identity.name) {
                return Err(ConfigError::Validation(format!(
                    "duplicate identity name '{}'",
                    identity.name
                )));
            }
        }

        Ok(Self { identities })
    }

    /// Looks up an identity by its exact name
    pub fn get(&self, name: &str) -> Option<&CrawlerIdentity> {
        self.identities.iter().find(|identity| identity.name == name)
    }

    /// Iterates identities in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CrawlerIdentity> {
        self.identities.iter()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.identities.iter().map(|i| i.name.as_str()).collect()
    }
}

impl Default for IdentityRegistry {
    /// The reference deployment: OpenAI, Anthropic, Google, Microsoft
    fn default() -> Self {
        Self {
            identities: vec![
                CrawlerIdentity::new("GPTBot", GPTBOT_USER_AGENT),
                CrawlerIdentity::new("ClaudeBot", CLAUDEBOT_USER_AGENT),
                CrawlerIdentity::new("GoogleBot", GOOGLEBOT_USER_AGENT),
                CrawlerIdentity::new("BingBot", BINGBOT_USER_AGENT),
            ],
        }
    }
}

impl<'a> IntoIterator for &'a IdentityRegistry {
    type Item = &'a CrawlerIdentity;
    type IntoIter = std::slice::Iter<'a, CrawlerIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.identities.iter()
    }
}
