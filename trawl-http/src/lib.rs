//! Single-shot HTTPS GET transport with safe logging and an explicit TLS policy.
//!
//! - Every request carries the fixed [`USER_AGENT`] identity header
//! - Certificate trust is chosen by the caller through [`TlsPolicy`]
//! - Any status other than `200 OK` is an error carrying the numeric code
//! - No retries: a failed call returns immediately, retry policy belongs to callers
//! - Optional *raw* request/response logging via `TRAWL_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), trawl_http::HttpError> {
//! let client = trawl_http::HttpClient::new()?;
//! let got: serde_json::Value = client
//!     .get_json("https://api.example.com/v1/items?q=term")
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: the `token` query parameter is redacted in every log line, including
//! the curl reproduction emitted in raw mode.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and (optionally)
//! raw request/response lines (target `http.raw`) when `TRAWL_HTTP_RAW=1`.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use std::env;
use thiserror::Error;

pub use reqwest::StatusCode;

/// Client identity sent on every request. The remote service keys on it.
pub const USER_AGENT: &str = concat!("trawlingweb-rs ", env!("CARGO_PKG_VERSION"));

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "TRAWL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

const SECRET_PARAMS: &[&str] = &[
    "token",
    "access_token",
    "api_key",
    "key",
    "secret",
    "auth",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_PARAMS.contains(&lower.as_str())
}

/// Copy of `url` with secret query values replaced by `<redacted>`.
fn redacted_url(url: &Url) -> Url {
    let mut out = url.clone();
    if url.query().is_none() {
        return out;
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url) -> String {
    let parts = [
        "curl".to_string(),
        format!("-X{}", method),
        format!("-H 'User-Agent: {}'", USER_AGENT),
        format!("'{}'", redacted_url(url).as_str().replace('\'', r"'\''")),
    ];
    parts.join(" ")
}

fn header_pairs(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("http status code: {}", .status.as_u16())]
    Status { status: StatusCode, body: String },
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
}

impl HttpError {
    /// Numeric HTTP status for [`HttpError::Status`], `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }
}

// ==============================
// TLS policy
// ==============================

/// Certificate trust applied to every connection made by an [`HttpClient`].
///
/// ```
/// use trawl_http::TlsPolicy;
///
/// assert_eq!(TlsPolicy::default(), TlsPolicy::VerifyStrict);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TlsPolicy {
    /// Validate the certificate chain and host name.
    #[default]
    VerifyStrict,
    /// Accept self-signed, expired or mismatched certificates.
    AcceptAny,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    tls: TlsPolicy,
}

impl HttpClient {
    /// Construct a client that verifies certificates.
    ///
    /// ```no_run
    /// use trawl_http::{HttpClient, HttpError, TlsPolicy};
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.tls_policy(), TlsPolicy::VerifyStrict);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::with_tls_policy(TlsPolicy::default())
    }

    /// Construct a client with an explicit certificate trust policy.
    ///
    /// ```no_run
    /// use trawl_http::{HttpClient, HttpError, TlsPolicy};
    ///
    /// let client = HttpClient::with_tls_policy(TlsPolicy::AcceptAny)?;
    /// assert_eq!(client.tls_policy(), TlsPolicy::AcceptAny);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_tls_policy(tls: TlsPolicy) -> Result<Self, HttpError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if tls == TlsPolicy::AcceptAny {
            tracing::warn!("tls certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner, tls })
    }

    pub fn tls_policy(&self) -> TlsPolicy {
        self.tls
    }

    /// GET a fully formed absolute URL and decode a `200 OK` JSON body into `T`.
    ///
    /// The URL is used verbatim; no base is joined and no parameters are added.
    pub async fn get_json<T>(&self, url: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let method = Method::GET;

        let request = self
            .inner
            .request(method.clone(), url.clone())
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        // ----- Safe request logging (pre-send) -----
        let req_id = format!(
            "r{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let safe_url = redacted_url(&url);
        let redacted_q: Vec<(String, String)> = safe_url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redacted_q,
            tls=?self.tls,
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = self.inner.execute(request).await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        // Consumes the response; the connection is released on every path below.
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            // The status is already known; a lost body must not hide it.
            Err(err) if status != StatusCode::OK => {
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    message=%err,
                    "http.error.body_unread"
                );
                return Err(HttpError::Status {
                    status,
                    body: String::new(),
                });
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
                return Err(HttpError::Network(message));
            }
        };
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=content_len(&headers, bytes.len()),
            "http.response.headers"
        );

        if raw_enabled() {
            let mut body_snip = bytes.to_vec();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            if truncated {
                body_snip.truncate(RAW_MAX_BODY);
            }
            let text = String::from_utf8_lossy(&body_snip);
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?header_pairs(&headers),
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status != StatusCode::OK {
            tracing::warn!(
                req_id=%req_id,
                %status,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            tracing::warn!(
                req_id=%req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e.to_string(),
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }
}

// ==============================
// Helpers
// ==============================

/// Lossy UTF-8 view of `body`, truncated to a loggable size.
pub fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn content_len(headers: &HeaderMap, body_len: usize) -> usize {
    headers
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(body_len)
}
