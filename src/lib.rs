//! CrawlerView: AI crawler accessibility probe
//!
//! This crate fetches a single page under several simulated crawler identities,
//! checks the site's robots.txt, and scores the returned HTML for the signals
//! machine readers depend on (text content, noscript fallback, structured data,
//! meta tags, headings, and client-side loading markers).

pub mod analyzer;
pub mod config;
pub mod crawler;
pub mod explain;
pub mod identity;
pub mod robots;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for CrawlerView operations
#[derive(Debug, Error)]
pub enum CrawlerViewError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid target URL {url}: {message}")]
    InvalidTarget { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors produced by a single logical fetch (one attempt, redirects included)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Network error for {url}: {message}")]
    Network {
        url: String,
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Too many redirects ({count}) from {url}")]
    TooManyRedirects { url: String, count: usize },

    #[error("Decompression error ({encoding}): {message}")]
    Decompression { encoding: String, message: String },
}

impl FetchError {
    /// Returns true if another attempt may produce a different outcome
    ///
    /// Redirect overflow and malformed URLs are deterministic and never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Decompression { .. }
        )
    }

    /// Category used to look up a human readable explanation
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUrl { .. } => ErrorCategory::InvalidUrl,
            Self::Network { kind, .. } => ErrorCategory::Network(*kind),
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::TooManyRedirects { .. } => ErrorCategory::TooManyRedirects,
            Self::Decompression { .. } => ErrorCategory::Decompression,
        }
    }
}

/// Classification of socket-level failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkErrorKind {
    /// Connection refused by the remote host
    Refused,
    /// Host name could not be resolved
    Dns,
    /// Connection reset or closed mid-request
    Reset,
    /// TLS handshake or certificate failure
    Tls,
    /// Anything else reqwest reports
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Refused => "connection refused",
            Self::Dns => "dns failure",
            Self::Reset => "connection reset",
            Self::Tls => "tls failure",
            Self::Other => "network failure",
        };
        f.write_str(label)
    }
}

/// Error category keyed by the explanation table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InvalidUrl,
    Network(NetworkErrorKind),
    Timeout,
    TooManyRedirects,
    Decompression,
}

/// Result type alias for CrawlerView operations
pub type Result<T> = std::result::Result<T, CrawlerViewError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analyzer::{analyze, AnalysisResult};
pub use config::Config;
pub use crawler::{FetchResult, Session, SessionResult};
pub use identity::{CrawlerIdentity, IdentityRegistry};
pub use robots::RobotsProbeResult;
