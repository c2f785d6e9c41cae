//! Static lookup tables
//!
//! Scoring weights per issue kind, one-line explanations for HTTP statuses and
//! network failure categories, and the verdict ranges for an average score.
//! Long-form guidance lives with the presentation layer; these tables only
//! carry what the engine itself attaches to results.

use crate::{ErrorCategory, NetworkErrorKind};
use serde::Serialize;
use std::fmt;

/// A scored signal that can cost points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    Content,
    Noscript,
    StructuredData,
    MetaTags,
    H1,
    LoadingState,
}

impl IssueKind {
    /// All kinds in scoring order
    pub const ALL: [IssueKind; 6] = [
        Self::Content,
        Self::Noscript,
        Self::StructuredData,
        Self::MetaTags,
        Self::H1,
        Self::LoadingState,
    ];

    /// Points subtracted from 100 when this check fails
    pub const fn weight(self) -> u32 {
        match self {
            Self::Content => 30,
            Self::Noscript => 10,
            Self::StructuredData => 15,
            Self::MetaTags => 20,
            Self::H1 => 10,
            Self::LoadingState => 15,
        }
    }

    /// Key used by explanation catalogs
    pub const fn key(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Noscript => "noscript",
            Self::StructuredData => "structuredData",
            Self::MetaTags => "metaTags",
            Self::H1 => "h1",
            Self::LoadingState => "loadingState",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Content => "Content Accessibility",
            Self::Noscript => "Noscript Fallback",
            Self::StructuredData => "Structured Data (JSON-LD)",
            Self::MetaTags => "Meta Tags (Title & Description)",
            Self::H1 => "H1 Heading",
            Self::LoadingState => "Loading State Detection",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One-line explanation for a delivered HTTP status
pub fn explain_status(status: u16) -> &'static str {
    match status {
        200 => "OK - the page was delivered.",
        301 | 302 | 307 | 308 => "Redirect without a usable Location header.",
        304 => "Not Modified - the server expected a cached copy.",
        400 => "Bad Request - the server rejected the request as malformed.",
        401 => "Unauthorized - the page requires authentication.",
        403 => "Forbidden - the server refuses to serve this crawler, often due to bot blocking or a WAF.",
        404 => "Not Found - the page does not exist at this URL.",
        405 => "Method Not Allowed - GET is not accepted for this URL.",
        406 => "Not Acceptable - the server cannot produce HTML for the advertised Accept headers.",
        408 => "Request Timeout - the server gave up waiting for the request.",
        410 => "Gone - the page was removed permanently.",
        429 => "Too Many Requests - the crawler is being rate limited.",
        451 => "Unavailable For Legal Reasons - access is blocked for legal reasons.",
        500 => "Internal Server Error - the server failed while generating the page.",
        502 => "Bad Gateway - an upstream server returned an invalid response.",
        503 => "Service Unavailable - the server is overloaded, in maintenance, or challenging bots.",
        504 => "Gateway Timeout - an upstream server did not respond in time.",
        100..=199 => "Informational response - no page content was delivered.",
        201..=299 => "Success status other than 200 - the page was not delivered normally.",
        300..=399 => "Redirect that could not be followed.",
        400..=499 => "Client error - the server refused the request.",
        500..=599 => "Server error - the server failed to deliver the page.",
        _ => "Non-standard status code.",
    }
}

/// One-line explanation for a failure that produced no response
pub fn explain_error(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::InvalidUrl => "The URL could not be parsed.",
        ErrorCategory::Network(NetworkErrorKind::Refused) => {
            "Connection refused - nothing is listening on the target host and port."
        }
        ErrorCategory::Network(NetworkErrorKind::Dns) => {
            "DNS lookup failed - the domain name could not be resolved."
        }
        ErrorCategory::Network(NetworkErrorKind::Reset) => {
            "Connection reset - the server or a firewall dropped the connection."
        }
        ErrorCategory::Network(NetworkErrorKind::Tls) => {
            "TLS failure - the secure connection could not be established."
        }
        ErrorCategory::Network(NetworkErrorKind::Other) => {
            "Network error - the request could not be completed."
        }
        ErrorCategory::Timeout => "Timeout - the server did not respond within the time limit.",
        ErrorCategory::TooManyRedirects => {
            "Too many redirects - the redirect chain is too long or loops."
        }
        ErrorCategory::Decompression => {
            "Decompression failed - the body did not match its declared Content-Encoding."
        }
    }
}

/// Verdict band for an average score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreRange {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreRange {
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else if score >= 40.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
        }
    }

    pub const fn verdict(self) -> &'static str {
        match self {
            Self::Excellent => "Your page is highly accessible to AI crawlers.",
            Self::Good => "Your page is accessible to AI crawlers but has room for improvement.",
            Self::Fair => "Your page has several issues that limit AI crawler understanding.",
            Self::Poor => "Your page is largely inaccessible to AI crawlers.",
        }
    }
}
