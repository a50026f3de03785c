//! Search client for the Trawling Web `posts_full` API.
//!
//! `search` composes the request URL from [`SearchParameters`] and hands it to a
//! [`Transport`]. `next_page` fetches a page's opaque `next` URL verbatim, so any
//! page can be resumed on its own; nothing is kept between calls.
use crate::trawling::query::{DEFAULT_ENDPOINT, SearchParameters};
use crate::trawling::types::{ResultPage, SearchResponse, ServiceError};
use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use trawl_http::{HttpClient, HttpError, TlsPolicy, snip_body};

#[derive(Debug, Error)]
pub enum SearchError {
    /// URL, network, or decode failure from the transport.
    #[error(transparent)]
    Http(HttpError),
    /// Non-200 response. `message` is the service's error text when it sent one.
    #[error("http status code: {code}: {message}")]
    Status { code: u16, message: String },
    /// `next_page` was called on a page whose `next` is empty.
    #[error("no more pages: cursor is empty")]
    NoMorePages,
}

impl From<HttpError> for SearchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, body } => {
                let message = ServiceError::message_from(body.as_bytes())
                    .unwrap_or_else(|| snip_body(body.as_bytes()));
                SearchError::Status {
                    code: status.as_u16(),
                    message,
                }
            }
            other => SearchError::Http(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Executes one GET against a fully formed URL and decodes a result page.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, url: &str) -> Result<ResultPage>;
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, url: &str) -> Result<ResultPage> {
        let envelope: SearchResponse = self.get_json(url).await?;
        Ok(envelope.response)
    }
}

#[derive(Clone)]
pub struct TrawlingApi<T = HttpClient> {
    transport: T,
    endpoint: String,
}

impl TrawlingApi<HttpClient> {
    /// Client against the public endpoint, verifying certificates.
    pub fn new() -> Result<Self> {
        Self::with_tls_policy(TlsPolicy::VerifyStrict)
    }

    pub fn with_tls_policy(tls: TlsPolicy) -> Result<Self> {
        Ok(Self::with_transport(HttpClient::with_tls_policy(tls)?))
    }
}

impl<T: Transport> TrawlingApi<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the client at another `posts_full` base, e.g. a mirror or a test server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request URL for `params` against this client's endpoint.
    pub fn build_url(&self, params: &SearchParameters) -> String {
        params.to_url(&self.endpoint)
    }

    /// Run a search and return its first page.
    pub async fn search(&self, params: &SearchParameters) -> Result<ResultPage> {
        let url = self.build_url(params);
        tracing::debug!(fields = params.pairs().len(), "trawling.search");
        let page = self.transport.execute(&url).await?;
        log_page(&page);
        Ok(page)
    }

    /// Fetch the page after `page` by following its `next` URL as-is.
    ///
    /// An empty `next` means the sequence is finished; calling this on such a page
    /// is a caller error and returns [`SearchError::NoMorePages`] without a request.
    pub async fn next_page(&self, page: &ResultPage) -> Result<ResultPage> {
        let url = page.next_url().ok_or(SearchError::NoMorePages)?;
        self.fetch(url).await
    }

    /// Fetch a page from a raw cursor URL previously returned in `next`.
    pub async fn fetch(&self, cursor: &str) -> Result<ResultPage> {
        if cursor.is_empty() {
            return Err(SearchError::NoMorePages);
        }
        tracing::debug!("trawling.next");
        let page = self.transport.execute(cursor).await?;
        log_page(&page);
        Ok(page)
    }

    /// Stream the first page and every following page until `next` is empty or
    /// `max_pages` pages were yielded. The first error ends the stream.
    pub fn pages<'a>(
        &'a self,
        params: &'a SearchParameters,
        max_pages: Option<usize>,
    ) -> impl Stream<Item = Result<ResultPage>> + 'a {
        async_stream::try_stream! {
            let limit = max_pages.unwrap_or(usize::MAX);
            if limit > 0 {
                let mut page = self.search(params).await?;
                let mut yielded = 0usize;
                loop {
                    yielded += 1;
                    let next = page
                        .next_url()
                        .filter(|_| yielded < limit)
                        .map(str::to_owned);
                    yield page;
                    match next {
                        Some(url) => page = self.fetch(&url).await?,
                        None => break,
                    }
                }
            }
        }
    }
}

fn log_page(page: &ResultPage) {
    tracing::debug!(
        posts = page.data.len(),
        request_left = page.request_left,
        total_results = page.total_results,
        rest_results = page.rest_results,
        has_next = page.has_next(),
        "trawling.page"
    );
}
