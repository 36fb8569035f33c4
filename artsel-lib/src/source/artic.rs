//! HTTP source for the Art Institute of Chicago artworks endpoint

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::RemoteCollectionSource;
use crate::error::FetchError;
use crate::model::Artwork;
use crate::model::Page;
use crate::rate_limit::RateLimiter;
use crate::rate_limit::RetryConfig;

/// Public API root.
pub const DEFAULT_BASE_URL: &str = "https://api.artic.edu/api/v1";

/// The API refuses `page * limit` beyond this many records.
pub const ARTIC_MAX_RECORDS: u64 = 10_000;

/// Paginated artworks served by `GET {base}/artworks?page=&limit=`.
///
/// Cheap to clone (uses `Arc` internally). Every request waits on the rate
/// limiter and transient failures are retried per [`RetryConfig`].
///
/// # Example
///
/// ```ignore
/// use artsel_lib::source::{ArticSource, RemoteCollectionSource};
///
/// let source = ArticSource::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// let page = source.fetch_page(1, 10).await?;
/// println!("{} artworks in total", page.total_count().unwrap_or(0));
/// ```
#[derive(Clone)]
pub struct ArticSource {
    inner: Arc<ArticSourceInner>,
}

struct ArticSourceInner {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
    retry: RetryConfig,
    rate_limiter: RateLimiter,
}

impl ArticSource {
    /// Creates a new builder with default settings.
    pub fn builder() -> ArticSourceBuilder {
        ArticSourceBuilder::new()
    }

    /// Returns the API root this source talks to.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Builds the request URL for one page.
    pub fn page_url(&self, page_index: u32, page_size: u32) -> Result<Url, FetchError> {
        let mut url = self
            .inner
            .base_url
            .join("artworks")
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("page", &page_index.to_string())
            .append_pair("limit", &page_size.to_string())
            .append_pair("fields", Artwork::FIELDS);
        Ok(url)
    }

    async fn fetch_once(&self, url: &Url, page_index: u32) -> Result<Page<Artwork>, FetchError> {
        self.inner.rate_limiter.acquire().await;

        let mut request = self
            .inner
            .http_client
            .get(url.clone())
            .header("Accept", "application/json");
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            return Err(FetchError::http(status.as_u16(), error_message(&body)));
        }

        parse_page(page_index, &body)
    }

    fn map_transport(&self, error: reqwest::Error) -> FetchError {
        match self.inner.timeout {
            Some(timeout) if error.is_timeout() => FetchError::Timeout(timeout),
            _ => FetchError::Network(error),
        }
    }
}

#[async_trait]
impl RemoteCollectionSource for ArticSource {
    type Item = Artwork;

    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<Artwork>, FetchError> {
        let url = self.page_url(page_index, page_size)?;
        let mut attempt = 0;

        loop {
            match self.fetch_once(&url, page_index).await {
                Ok(page) => {
                    log::debug!("fetched artworks page {page_index} ({} items)", page.len());
                    return Ok(page);
                }
                Err(e) if self.inner.retry.should_retry(&e, attempt) => {
                    let delay = self.inner.retry.delay_for(attempt);
                    log::warn!(
                        "artworks page {page_index} failed (attempt {}): {e}; retrying in {delay:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn max_records(&self) -> Option<u64> {
        Some(ARTIC_MAX_RECORDS)
    }
}

/// Envelope of the artworks listing.
#[derive(Debug, Deserialize)]
struct ArtworksResponse {
    pagination: PaginationInfo,
    data: Vec<Artwork>,
}

#[derive(Debug, Deserialize)]
struct PaginationInfo {
    total: u64,
}

/// Error body the API sends alongside 4xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

fn parse_page(page_index: u32, body: &str) -> Result<Page<Artwork>, FetchError> {
    let response: ArtworksResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::parse_with_body(e.to_string(), body))?;
    Ok(Page::new(page_index, response.data).with_total_count(response.pagination.total))
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            detail: Some(detail),
            ..
        }) => detail,
        Ok(ApiErrorBody {
            error: Some(error), ..
        }) => error,
        _ => body.to_string(),
    }
}

/// Builder for an [`ArticSource`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use artsel_lib::rate_limit::RetryConfig;
/// use artsel_lib::source::ArticSource;
///
/// let source = ArticSource::builder()
///     .base_url("http://localhost:8080/api/v1")
///     .retry(RetryConfig::no_retry())
///     .timeout(Duration::from_secs(5))
///     .build()
///     .unwrap();
///
/// assert_eq!(source.base_url().as_str(), "http://localhost:8080/api/v1/");
/// ```
pub struct ArticSourceBuilder {
    base_url: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: String,
    retry: RetryConfig,
    rate_limiter: RateLimiter,
    http_client: Option<Client>,
}

impl ArticSourceBuilder {
    /// Creates a new builder pointing at the public API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: None,
            user_agent: concat!("artsel/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryConfig::default(),
            rate_limiter: RateLimiter::default(),
            http_client: None,
        }
    }

    /// Sets the API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout. Ignored when a custom client is given.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header. Ignored when a custom client is given.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Shares a rate limiter with other sources.
    pub fn rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = limiter;
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the [`ArticSource`].
    pub fn build(self) -> Result<ArticSource, FetchError> {
        let mut base = self.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder().user_agent(self.user_agent);
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(ArticSource {
            inner: Arc::new(ArticSourceInner {
                base_url,
                http_client,
                timeout: self.timeout,
                retry: self.retry,
                rate_limiter: self.rate_limiter,
            }),
        })
    }
}

impl Default for ArticSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
