//! HTTP fetcher implementation
//!
//! This module performs one logical GET for a given User-Agent:
//! - Building an HTTP client that leaves redirects and decompression to us
//! - Following 301/302/307/308 hops relative to the current URL
//! - Decoding the body according to its `Content-Encoding`
//! - Classifying transport failures
//!
//! There are no retries here; see [`crate::crawler::retry`].

use crate::config::FetchConfig;
use crate::crawler::decode::{decode_body, ContentEncoding};
use crate::{FetchError, NetworkErrorKind};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, LOCATION, USER_AGENT,
};
use reqwest::{redirect::Policy, Client};
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

pub const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";
pub const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";

/// Status codes followed as redirects when a `Location` header is present
pub const REDIRECT_STATUSES: [u16; 4] = [301, 302, 307, 308];

/// One followed redirect hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
    pub status: u16,
}

/// Result of a completed fetch, whatever its status code
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Response headers of the final response (lowercase names)
    pub headers: BTreeMap<String, String>,
    /// Decompressed body, decoded as UTF-8
    #[serde(skip)]
    pub body: String,
    /// URL of the final response
    pub final_url: String,
    /// Hops followed to reach `final_url`, in order
    pub redirect_chain: Vec<Redirect>,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Builds an HTTP client for crawler simulation
///
/// Redirects are handled manually so each hop can be recorded. The client is
/// built without reqwest's decompression features; bodies are decoded in
/// [`decode_body`] according to the response header.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .redirect(Policy::none()) // Handle redirects manually
        .build()
}

/// Executes single logical fetches with a fixed header set
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_redirects: usize,
}

impl Fetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?, config.max_redirects))
    }

    /// Creates a fetcher around an existing client
    ///
    /// The client must not follow redirects or decompress bodies itself.
    pub fn with_client(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Fetches a URL as the given User-Agent
    ///
    /// # Request Flow
    ///
    /// 1. Send GET with the crawler header set
    /// 2. On a redirect status with `Location`, resolve against the current URL,
    ///    record the hop, and repeat; fail once the hop limit is exceeded
    /// 3. Decompress per `Content-Encoding`, decode as UTF-8
    ///
    /// Non-2xx statuses are not errors here; callers inspect `status_code`.
    pub async fn fetch(&self, url: &str, user_agent: &str) -> Result<FetchResult, FetchError> {
        let mut current = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let mut redirect_chain: Vec<Redirect> = Vec::new();

        loop {
            let response = self
                .client
                .get(current.clone())
                .headers(request_headers(user_agent))
                .send()
                .await
                .map_err(|e| classify_error(current.as_str(), e))?;

            let status = response.status().as_u16();

            if REDIRECT_STATUSES.contains(&status) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                if let Some(location) = location {
                    if redirect_chain.len() >= self.max_redirects {
                        tracing::warn!(
                            "Redirect limit ({}) reached at {} -> {}",
                            self.max_redirects,
                            current,
                            location
                        );
                        return Err(FetchError::TooManyRedirects {
                            url: url.to_string(),
                            count: redirect_chain.len(),
                        });
                    }

                    let target = current.join(&location).map_err(|e| FetchError::InvalidUrl {
                        url: location.clone(),
                        message: e.to_string(),
                    })?;

                    tracing::debug!("Redirect {}: {} -> {}", status, current, target);
                    redirect_chain.push(Redirect {
                        from: current.to_string(),
                        to: target.to_string(),
                        status,
                    });
                    current = target;
                    continue;
                }
            }

            let headers = collect_headers(response.headers());
            let encoding =
                ContentEncoding::from_header(headers.get("content-encoding").map(String::as_str));

            let bytes = response
                .bytes()
                .await
                .map_err(|e| classify_error(current.as_str(), e))?;
            let decoded = decode_body(&bytes, encoding)?;
            let body = String::from_utf8_lossy(&decoded).into_owned();

            tracing::debug!(
                "Fetched {} ({}, {} bytes, encoding {})",
                current,
                status,
                decoded.len(),
                encoding
            );

            return Ok(FetchResult {
                status_code: status,
                headers,
                body,
                final_url: current.to_string(),
                redirect_chain,
            });
        }
    }
}

/// The fixed request header set plus the simulated User-Agent
fn request_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPT_ENCODING_VALUE));
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    } else {
        tracing::warn!("User-Agent contains invalid header characters: {:?}", user_agent);
    }
    headers
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

/// Maps a reqwest failure onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout {
            url: url.to_string(),
        };
    }

    let message = error_chain_message(&error);
    let kind = network_error_kind(&error, &message);

    FetchError::Network {
        url: url.to_string(),
        kind,
        message,
    }
}

fn network_error_kind(error: &reqwest::Error, message: &str) -> NetworkErrorKind {
    use std::error::Error as _;
    use std::io::ErrorKind;

    let mut source = error.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            match io.kind() {
                ErrorKind::ConnectionRefused => return NetworkErrorKind::Refused,
                ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::UnexpectedEof => return NetworkErrorKind::Reset,
                _ => {}
            }
        }
        source = inner.source();
    }

    let lowered = message.to_ascii_lowercase();
    if lowered.contains("dns") || lowered.contains("lookup") || lowered.contains("resolve") {
        NetworkErrorKind::Dns
    } else if lowered.contains("refused") {
        NetworkErrorKind::Refused
    } else if lowered.contains("reset") || lowered.contains("connection closed") {
        NetworkErrorKind::Reset
    } else if lowered.contains("certificate") || lowered.contains("tls") {
        NetworkErrorKind::Tls
    } else {
        NetworkErrorKind::Other
    }
}

/// Joins an error with all of its sources
fn error_chain_message(error: &reqwest::Error) -> String {
    use std::error::Error as _;

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}
