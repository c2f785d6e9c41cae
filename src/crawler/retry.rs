//! Bounded retry with exponential backoff
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 200 | Return immediately |
//! | HTTP >= 400 | Return immediately, never retried |
//! | Other status | Retry with backoff while attempts remain, else return it |
//! | Network error / timeout / bad compression | Retry with backoff, else fail |
//! | Too many redirects / invalid URL | Fail immediately |
//!
//! Backoff waits `base * 2^(attempt-1)` and can be interrupted through a
//! [`CancellationToken`].

use crate::config::FetchConfig;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// How a single attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
    /// Response with status 200
    Success,
    /// Response with any other status
    HttpError,
    /// No response: transport, timeout, redirect or decoding failure
    NetworkError,
}

/// Diagnostic record of one fetch attempt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
    /// Delay scheduled before the next attempt, if one follows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
}

/// A delivered response together with the attempts that produced it
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub result: FetchResult,
    pub attempts: Vec<RetryAttempt>,
}

/// Terminal failure of the retry loop
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("{source}")]
    Failed {
        source: FetchError,
        attempts: Vec<RetryAttempt>,
    },

    #[error("Cancelled after {} attempt(s)", .attempts.len())]
    Cancelled { attempts: Vec<RetryAttempt> },
}

impl RetryError {
    pub fn attempts(&self) -> &[RetryAttempt] {
        match self {
            Self::Failed { attempts, .. } | Self::Cancelled { attempts } => attempts,
        }
    }

    pub fn into_attempts(self) -> Vec<RetryAttempt> {
        match self {
            Self::Failed { attempts, .. } | Self::Cancelled { attempts } => attempts,
        }
    }

    /// The fetch error that ended the loop, if it was not cancelled
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed { source, .. } => Some(source),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
}

impl Backoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// Delay after the given 1-based attempt: base, 2*base, 4*base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exponent)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Wraps a [`Fetcher`] with the retry policy
#[derive(Debug, Clone)]
pub struct Retrier {
    fetcher: Fetcher,
    max_retries: u32,
    backoff: Backoff,
    cancel: CancellationToken,
}

impl Retrier {
    pub fn new(fetcher: Fetcher, config: &FetchConfig) -> Self {
        Self {
            fetcher,
            max_retries: config.max_retries.max(1),
            backoff: Backoff::new(config.backoff_base()),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses the given token to interrupt backoff waits
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Fetches `url`, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(RetryOutcome)` - A response was delivered (any status)
    /// * `Err(RetryError)` - Every attempt failed, the failure was fatal, or
    ///   the wait was cancelled; the attempt trace is carried either way
    pub async fn fetch_with_retry(
        &self,
        url: &str,
        user_agent: &str,
    ) -> Result<RetryOutcome, RetryError> {
        let mut attempts: Vec<RetryAttempt> = Vec::with_capacity(self.max_retries as usize);
        let mut attempt: u32 = 1;

        loop {
            let timestamp = Utc::now();
            let started = Instant::now();
            let result = self.fetcher.fetch(url, user_agent).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let attempts_remain = attempt < self.max_retries;

            match result {
                Ok(fetched) => {
                    let status = fetched.status_code;
                    let outcome = if status == 200 {
                        AttemptOutcome::Success
                    } else {
                        AttemptOutcome::HttpError
                    };

                    // The server answered; a 4xx/5xx will not change within this session
                    let terminal = status == 200 || status >= 400;
                    let retry = !terminal && attempts_remain;
                    let delay = retry.then(|| self.backoff.delay_for(attempt));

                    attempts.push(RetryAttempt {
                        attempt,
                        outcome,
                        status: Some(status),
                        message: (status != 200).then(|| format!("HTTP {}", status)),
                        elapsed_ms,
                        timestamp,
                        backoff_ms: delay.map(|d| d.as_millis() as u64),
                    });

                    let Some(delay) = delay else {
                        tracing::debug!(
                            "Attempt {}/{} for {} returned HTTP {}",
                            attempt,
                            self.max_retries,
                            url,
                            status
                        );
                        return Ok(RetryOutcome {
                            result: fetched,
                            attempts,
                        });
                    };

                    tracing::warn!(
                        "Attempt {}/{} for {} returned unexpected HTTP {}, retrying in {:?}",
                        attempt,
                        self.max_retries,
                        url,
                        status,
                        delay
                    );
                    if !self.wait(delay).await {
                        return Err(RetryError::Cancelled { attempts });
                    }
                }
                Err(error) => {
                    let retry = error.is_retryable() && attempts_remain;
                    let delay = retry.then(|| self.backoff.delay_for(attempt));

                    attempts.push(RetryAttempt {
                        attempt,
                        outcome: AttemptOutcome::NetworkError,
                        status: None,
                        message: Some(error.to_string()),
                        elapsed_ms,
                        timestamp,
                        backoff_ms: delay.map(|d| d.as_millis() as u64),
                    });

                    let Some(delay) = delay else {
                        tracing::warn!(
                            "Attempt {}/{} for {} failed: {}",
                            attempt,
                            self.max_retries,
                            url,
                            error
                        );
                        return Err(RetryError::Failed {
                            source: error,
                            attempts,
                        });
                    };

                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}, retrying in {:?}",
                        attempt,
                        self.max_retries,
                        url,
                        error,
                        delay
                    );
                    if !self.wait(delay).await {
                        return Err(RetryError::Cancelled { attempts });
                    }
                }
            }

            attempt += 1;
        }
    }

    /// Sleeps for `delay`; returns false if cancelled first
    async fn wait(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}
