//! Crawler module for simulated-crawler page fetching
//!
//! This module contains the fetch pipeline and session orchestration:
//! - HTTP fetching with manual redirect handling
//! - Content-Encoding driven body decoding
//! - Bounded retry with exponential backoff
//! - Per-URL session coordination across identities

mod coordinator;
mod decode;
mod fetcher;
mod retry;

pub use coordinator::{
    average_score, AnalyzedIdentity, FailedIdentity, IdentityOutcome, Session, SessionResult,
};
pub use decode::{decode_body, ContentEncoding};
pub use fetcher::{build_http_client, FetchResult, Fetcher, Redirect, REDIRECT_STATUSES};
pub use retry::{AttemptOutcome, Backoff, Retrier, RetryAttempt, RetryError, RetryOutcome};

use crate::config::Config;
use crate::CrawlerViewError;

/// Runs a complete session for one URL
///
/// This is the main entry point. It will:
/// 1. Build the identity registry and HTTP client from `config`
/// 2. Probe robots.txt
/// 3. Fetch and analyze the page as every identity, in order
/// 4. Aggregate the per-identity results
///
/// # Arguments
///
/// * `config` - The session configuration
/// * `url` - The absolute http(s) URL to evaluate
pub async fn test_url(config: &Config, url: &str) -> Result<SessionResult, CrawlerViewError> {
    Session::new(config)?.run(url).await
}
