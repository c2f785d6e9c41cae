//! Robots.txt probe
//!
//! Fetches `/robots.txt` from the target's origin once per session and flags
//! directives that appear to block AI crawlers. The scan is a best-effort text
//! match, not a robots.txt grammar; see [`scan`].

pub mod scan;

pub use scan::scan_for_blocks;

use crate::config::RobotsConfig;
use crate::crawler::Fetcher;
use serde::Serialize;
use url::Url;

/// Outcome of the robots.txt probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsProbeResult {
    /// robots.txt answered with HTTP 200
    pub accessible: bool,

    /// Raw robots.txt text when accessible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Why robots.txt could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Matched blocking directives
    pub issues: Vec<String>,
}

impl RobotsProbeResult {
    fn inaccessible(error: String) -> Self {
        Self {
            accessible: false,
            content: None,
            error: Some(error),
            issues: Vec::new(),
        }
    }

    /// Builds a result from robots.txt text that was fetched successfully
    pub fn from_content(content: String, agents: &[String]) -> Self {
        let issues = scan_for_blocks(&content, agents);
        Self {
            accessible: true,
            content: Some(content),
            error: None,
            issues,
        }
    }
}

/// Resolves `/robots.txt` against the origin of `base_url`
pub fn robots_url(base_url: &str) -> Result<Url, url::ParseError> {
    Url::parse(base_url)?.join("/robots.txt")
}

/// Fetches and inspects robots.txt as one fixed identity
#[derive(Debug, Clone)]
pub struct RobotsProber {
    fetcher: Fetcher,
    user_agent: String,
    blocked_agents: Vec<String>,
}

impl RobotsProber {
    /// Creates a prober sending `user_agent` and checking `config.blocked_agents`
    pub fn new(fetcher: Fetcher, user_agent: impl Into<String>, config: &RobotsConfig) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            blocked_agents: config.blocked_agents.clone(),
        }
    }

    /// Probes robots.txt for the site hosting `base_url`
    ///
    /// Never fails: unreachable or non-200 robots.txt yields `accessible = false`
    /// with a descriptive error.
    pub async fn probe(&self, base_url: &str) -> RobotsProbeResult {
        let url = match robots_url(base_url) {
            Ok(url) => url,
            Err(e) => {
                return RobotsProbeResult::inaccessible(format!("Invalid URL {}: {}", base_url, e))
            }
        };

        tracing::info!("Checking robots.txt at {}", url);

        match self.fetcher.fetch(url.as_str(), &self.user_agent).await {
            Ok(response) if response.status_code == 200 => {
                let result = RobotsProbeResult::from_content(response.body, &self.blocked_agents);
                if result.issues.is_empty() {
                    tracing::info!("robots.txt accessible, no blocking directives found");
                } else {
                    tracing::info!("robots.txt accessible, {} issue(s) found", result.issues.len());
                }
                result
            }
            Ok(response) => {
                tracing::warn!("robots.txt returned status {}", response.status_code);
                RobotsProbeResult::inaccessible(format!(
                    "robots.txt returned status {}",
                    response.status_code
                ))
            }
            Err(e) => {
                tracing::warn!("robots.txt fetch failed: {}", e);
                RobotsProbeResult::inaccessible(e.to_string())
            }
        }
    }
}
