//! Session coordinator - per-URL orchestration logic
//!
//! A [`Session`] evaluates one URL:
//! - Probes robots.txt once
//! - Fetches the page as each identity, strictly one at a time, in
//!   registration order
//! - Analyzes delivered HTML, converts every failure into a structured outcome
//! - Averages the scores of the identities that were analyzed
//!
//! One instance may run many URLs sequentially. Cancellation applies to a
//! single run: once a cancelled run ends, the session installs a fresh token.
//! Clones never share a token, so hosts serving concurrent requests can hand
//! each request its own clone.

use crate::analyzer::{analyze, AnalysisResult};
use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, Redirect};
use crate::crawler::retry::{Retrier, RetryAttempt, RetryError, RetryOutcome};
use crate::explain::{explain_error, explain_status, ScoreRange};
use crate::identity::{CrawlerIdentity, IdentityRegistry};
use crate::robots::{RobotsProbeResult, RobotsProber};
use crate::{ConfigError, CrawlerViewError};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// An identity whose page was delivered and analyzed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedIdentity {
    pub name: String,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub final_url: String,
    pub redirect_chain: Vec<Redirect>,
    pub retry_attempts: Vec<RetryAttempt>,
}

/// An identity for which no analyzable page was obtained
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedIdentity {
    pub name: String,
    pub error: String,
    /// Final HTTP status, when the server answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub explanation: String,
    pub retry_attempts: Vec<RetryAttempt>,
    /// Always 0; failed identities do not count toward the average
    pub score: u32,
}

/// Per-identity result, in registration order within a session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum IdentityOutcome {
    Analyzed(AnalyzedIdentity),
    Failed(FailedIdentity),
}

impl IdentityOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Analyzed(a) => &a.name,
            Self::Failed(f) => &f.name,
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            Self::Analyzed(a) => a.analysis.score,
            Self::Failed(f) => f.score,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Analyzed(a) => Some(&a.analysis),
            Self::Failed(_) => None,
        }
    }

    pub fn retry_attempts(&self) -> &[RetryAttempt] {
        match self {
            Self::Analyzed(a) => &a.retry_attempts,
            Self::Failed(f) => &f.retry_attempts,
        }
    }
}

/// Complete evaluation of one URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub url: String,
    pub robots_txt: RobotsProbeResult,
    pub crawlers: Vec<IdentityOutcome>,
    /// Mean score over analyzed identities only; 0 when none succeeded
    pub average_score: f64,
    pub verdict: ScoreRange,
}

impl SessionResult {
    /// Number of identities that produced an analysis
    pub fn analyzed_count(&self) -> usize {
        self.crawlers.iter().filter(|c| !c.is_error()).count()
    }
}

/// Mean score of analyzed outcomes; failed outcomes are excluded, not counted as zero
pub fn average_score(outcomes: &[IdentityOutcome]) -> f64 {
    let scores: Vec<u32> = outcomes
        .iter()
        .filter_map(|o| o.analysis().map(|a| a.score))
        .collect();

    if scores.is_empty() {
        return 0.0;
    }

    scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
}

/// Evaluates URLs across a registry of crawler identities
#[derive(Debug)]
pub struct Session {
    registry: IdentityRegistry,
    retrier: Retrier,
    prober: RobotsProber,
    /// Token for the current run, or the next one if none is in progress
    cancel: Mutex<CancellationToken>,
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            retrier: self.retrier.clone(),
            prober: self.prober.clone(),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }
}

impl Session {
    /// Creates a session from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - Ready to run
    /// * `Err(CrawlerViewError)` - Invalid identities or HTTP client failure
    pub fn new(config: &Config) -> Result<Self, CrawlerViewError> {
        let registry = config.registry()?;
        let fetcher = Fetcher::new(&config.fetch)?;
        Self::with_parts(config, registry, fetcher)
    }

    /// Creates a session with an explicit registry and fetcher
    pub fn with_parts(
        config: &Config,
        registry: IdentityRegistry,
        fetcher: Fetcher,
    ) -> Result<Self, CrawlerViewError> {
        let robots_identity = registry.get(&config.robots.identity).ok_or_else(|| {
            ConfigError::Validation(format!(
                "robots identity '{}' is not a configured identity",
                config.robots.identity
            ))
        })?;

        let prober = RobotsProber::new(
            fetcher.clone(),
            robots_identity.user_agent.clone(),
            &config.robots,
        );
        let retrier = Retrier::new(fetcher, &config.fetch);

        Ok(Self {
            registry,
            retrier,
            prober,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Token that interrupts retry backoff of the current run, or of the
    /// next run when none is in progress
    ///
    /// Once cancelled, remaining identities of that run are recorded as failed
    /// without being fetched. Later runs get a fresh token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs a fresh token if the current one has been cancelled
    fn retire_cancelled_token(&self) {
        let mut current = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_cancelled() {
            *current = CancellationToken::new();
        }
    }

    /// Runs a full session for `url`
    pub async fn run(&self, url: &str) -> Result<SessionResult, CrawlerViewError> {
        self.run_with_progress(url, |_, _| {}).await
    }

    /// Runs a full session, calling `on_outcome` as each identity completes
    ///
    /// The callback receives the identity's index in the registry and its
    /// outcome; it is called in registration order.
    pub async fn run_with_progress<F>(
        &self,
        url: &str,
        mut on_outcome: F,
    ) -> Result<SessionResult, CrawlerViewError>
    where
        F: FnMut(usize, &IdentityOutcome),
    {
        validate_target(url)?;

        tracing::info!(
            "Starting session for {} with {} identities",
            url,
            self.registry.len()
        );
        let start_time = Instant::now();

        let cancel = self.cancellation_token();
        let retrier = self.retrier.clone().with_cancellation(cancel.clone());

        let robots_txt = self.prober.probe(url).await;

        let mut crawlers = Vec::with_capacity(self.registry.len());
        for (index, identity) in self.registry.iter().enumerate() {
            let outcome = test_identity(&retrier, &cancel, url, identity).await;
            on_outcome(index, &outcome);
            crawlers.push(outcome);
        }

        if cancel.is_cancelled() {
            tracing::info!("Session for {} was cancelled", url);
            self.retire_cancelled_token();
        }

        let average_score = average_score(&crawlers);
        let result = SessionResult {
            url: url.to_string(),
            robots_txt,
            verdict: ScoreRange::for_score(average_score),
            average_score,
            crawlers,
        };

        tracing::info!(
            "Session for {} completed in {:?}: {}/{} identities analyzed, average score {:.1}",
            url,
            start_time.elapsed(),
            result.analyzed_count(),
            result.crawlers.len(),
            result.average_score
        );

        Ok(result)
    }
}

/// Fetches and analyzes the page as one identity
async fn test_identity(
    retrier: &Retrier,
    cancel: &CancellationToken,
    url: &str,
    identity: &CrawlerIdentity,
) -> IdentityOutcome {
    if cancel.is_cancelled() {
        tracing::info!("Skipping {}: session cancelled", identity.name);
        return IdentityOutcome::Failed(FailedIdentity {
            name: identity.name.clone(),
            error: "Cancelled".to_string(),
            status: None,
            explanation: "The session was cancelled before this identity was tested."
                .to_string(),
            retry_attempts: Vec::new(),
            score: 0,
        });
    }

    tracing::info!("Testing as {}", identity.name);

    match retrier.fetch_with_retry(url, &identity.user_agent).await {
        Ok(RetryOutcome { result, attempts }) if result.is_ok() => {
            let analysis = analyze(&result.body, &identity.name);
            tracing::info!(
                "{} scored {}/100 ({} issue(s), {} redirect(s))",
                identity.name,
                analysis.score,
                analysis.issues.len(),
                result.redirect_chain.len()
            );
            IdentityOutcome::Analyzed(AnalyzedIdentity {
                name: identity.name.clone(),
                analysis,
                final_url: result.final_url,
                redirect_chain: result.redirect_chain,
                retry_attempts: attempts,
            })
        }
        Ok(RetryOutcome { result, attempts }) => {
            tracing::warn!("{} received HTTP {}", identity.name, result.status_code);
            IdentityOutcome::Failed(FailedIdentity {
                name: identity.name.clone(),
                error: format!("HTTP {}", result.status_code),
                status: Some(result.status_code),
                explanation: explain_status(result.status_code).to_string(),
                retry_attempts: attempts,
                score: 0,
            })
        }
        Err(error) => {
            tracing::warn!("{} failed: {}", identity.name, error);
            let explanation = match &error {
                RetryError::Failed { source, .. } => explain_error(source.category()),
                RetryError::Cancelled { .. } => {
                    "The session was cancelled during retry backoff."
                }
            };
            IdentityOutcome::Failed(FailedIdentity {
                name: identity.name.clone(),
                error: error.to_string(),
                status: None,
                explanation: explanation.to_string(),
                retry_attempts: error.into_attempts(),
                score: 0,
            })
        }
    }
}

/// Accepts absolute http(s) URLs only
fn validate_target(url: &str) -> Result<Url, CrawlerViewError> {
    let parsed = Url::parse(url).map_err(|e| CrawlerViewError::InvalidTarget {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CrawlerViewError::InvalidTarget {
            url: url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    if parsed.host_str().is_none() {
        return Err(CrawlerViewError::InvalidTarget {
            url: url.to_string(),
            message: "missing host".to_string(),
        });
    }

    Ok(parsed)
}
