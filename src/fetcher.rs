//! Cached article fetching through a reader service.
//!
//! Pages are not scraped directly. Each target URL is handed to a reader
//! service (by default [r.jina.ai](https://r.jina.ai)) that returns the page
//! as LLM-friendly text, which also sidesteps most bot detection.
//!
//! # Response Policy
//!
//! | Status | Outcome | Cached |
//! |--------|---------|--------|
//! | 200 | [`FetchOutcome::Content`] | yes |
//! | 429 | pause, then retry (bounded) | no |
//! | 402 / 403 / 404 | [`FetchOutcome::NoContent`] | yes, as `None` |
//! | anything else | [`FetchOutcome::Failed`] | no |
//!
//! A URL that keeps answering 429 ends in [`FetchOutcome::GaveUp`] once the
//! attempt budget is spent.

use crate::cache::{ContentCache, Namespace, fingerprint};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Literal stored in the reader namespace for permanently unavailable URLs.
pub const NO_CONTENT_SENTINEL: &str = "None";

/// Raw answer from a reader service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    pub status: u16,
    pub body: String,
}

/// A service that converts a web page into readable text.
pub trait ReadService {
    /// Ask the service for the text of `url`.
    ///
    /// Only transport-level problems are errors; HTTP statuses are returned
    /// in the [`ReadResponse`] for the caller to classify.
    async fn read(&self, url: &str) -> Result<ReadResponse, Box<dyn Error>>;
}

/// HTTP client for a jina-style reader endpoint (`{base}/{target_url}`).
pub struct ReaderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReaderClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self, url: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), url)
    }
}

impl fmt::Debug for ReaderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ReadService for ReaderClient {
    #[instrument(level = "debug", skip(self))]
    async fn read(&self, url: &str) -> Result<ReadResponse, Box<dyn Error>> {
        let mut request = self.client.get(self.endpoint(url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ReadResponse { status, body })
    }
}

/// How the fetcher reacts to HTTP 429.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    /// Fixed pause before re-sending a rate-limited request.
    pub delay: Duration,
    /// Total requests allowed for one fetch, the first one included.
    pub max_attempts: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

/// Result of a single [`Fetcher::fetch_outcome`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page text, fresh or from cache.
    Content(String),
    /// The service reported the page as permanently unavailable.
    NoContent,
    /// Transient failure; `status` is `None` for transport errors.
    Failed { status: Option<u16> },
    /// Still rate limited after every allowed attempt.
    GaveUp { attempts: u32 },
}

impl FetchOutcome {
    pub fn into_text(self) -> Option<String> {
        match self {
            FetchOutcome::Content(text) => Some(text),
            _ => None,
        }
    }
}

/// Cache-then-fetch front end for a [`ReadService`].
#[derive(Debug)]
pub struct Fetcher<S> {
    service: S,
    cache: ContentCache,
    policy: RateLimitPolicy,
}

impl<S: ReadService> Fetcher<S> {
    pub fn new(service: S, cache: ContentCache, policy: RateLimitPolicy) -> Self {
        Self {
            service,
            cache,
            policy,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Text of `url`, or `None` when no usable content is available.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        self.fetch_outcome(url).await.into_text()
    }

    /// Fetch `url` and report exactly how the request ended.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_outcome(&self, url: &str) -> FetchOutcome {
        let key = fingerprint(url);

        match self.cache.get(Namespace::Reader, &key).await {
            Ok(Some(blob)) if blob == NO_CONTENT_SENTINEL => {
                debug!("Negative cache hit");
                return FetchOutcome::NoContent;
            }
            Ok(Some(blob)) => return FetchOutcome::Content(blob),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Reader cache unreadable; fetching"),
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let response = match self.service.read(url).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "Reader request failed");
                    return FetchOutcome::Failed { status: None };
                }
            };

            match response.status {
                200 => {
                    info!(bytes = response.body.len(), "Fetched page text");
                    self.store(&key, &response.body).await;
                    return FetchOutcome::Content(response.body);
                }
                429 if attempts < self.policy.max_attempts => {
                    warn!(
                        attempt = attempts,
                        max = self.policy.max_attempts,
                        delay = ?self.policy.delay,
                        "Rate limited; waiting before retry"
                    );
                    sleep(self.policy.delay).await;
                }
                429 => {
                    error!(attempts, "Rate limited on every attempt; giving up");
                    return FetchOutcome::GaveUp { attempts };
                }
                402 | 403 | 404 => {
                    info!(status = response.status, "No content for URL; caching negative result");
                    self.store(&key, NO_CONTENT_SENTINEL).await;
                    return FetchOutcome::NoContent;
                }
                status => {
                    error!(status, "Failed to fetch content");
                    return FetchOutcome::Failed {
                        status: Some(status),
                    };
                }
            }
        }
    }

    async fn store(&self, key: &str, blob: &str) {
        if let Err(e) = self.cache.put(Namespace::Reader, key, blob).await {
            warn!(error = %e, "Failed to cache reader response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubReader;
    use tokio::time::Instant;

    const URL: &str = "https://example.com/blog/2021/01";

    fn fetcher(dir: &tempfile::TempDir, reader: StubReader) -> Fetcher<StubReader> {
        Fetcher::new(reader, ContentCache::new(dir.path()), RateLimitPolicy::default())
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, StubReader::new().page(URL, 200, "hello"));

        assert_eq!(fetcher.fetch(URL).await.as_deref(), Some("hello"));
        assert_eq!(fetcher.fetch(URL).await.as_deref(), Some("hello"));
        assert_eq!(fetcher.service.calls_for(URL), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_negatively_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, StubReader::new().page(URL, 404, "missing"));

        assert_eq!(fetcher.fetch_outcome(URL).await, FetchOutcome::NoContent);
        assert_eq!(fetcher.fetch_outcome(URL).await, FetchOutcome::NoContent);
        assert_eq!(fetcher.service.calls_for(URL), 1);

        let cached = fetcher
            .cache
            .get(Namespace::Reader, &fingerprint(URL))
            .await
            .unwrap();
        assert_eq!(cached.as_deref(), Some(NO_CONTENT_SENTINEL));
    }

    #[tokio::test]
    async fn test_payment_and_forbidden_are_negative() {
        let dir = tempfile::tempdir().unwrap();
        let other = "https://example.com/blog/2021/02";
        let fetcher = fetcher(
            &dir,
            StubReader::new().page(URL, 402, "").page(other, 403, ""),
        );

        assert_eq!(fetcher.fetch(URL).await, None);
        assert_eq!(fetcher.fetch(other).await, None);
        assert_eq!(fetcher.fetch(URL).await, None);
        assert_eq!(fetcher.fetch(other).await, None);
        assert_eq!(fetcher.service.calls_for(URL), 1);
        assert_eq!(fetcher.service.calls_for(other), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(
            &dir,
            StubReader::new().page(URL, 500, "boom").page(URL, 200, "recovered"),
        );

        assert_eq!(
            fetcher.fetch_outcome(URL).await,
            FetchOutcome::Failed { status: Some(500) }
        );
        assert_eq!(fetcher.fetch(URL).await.as_deref(), Some("recovered"));
        assert_eq!(fetcher.service.calls_for(URL), 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_failed() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(&dir, StubReader::new().unreachable(URL));

        assert_eq!(
            fetcher.fetch_outcome(URL).await,
            FetchOutcome::Failed { status: None }
        );
        assert_eq!(
            fetcher.cache.get(Namespace::Reader, &fingerprint(URL)).await.unwrap(),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_once_then_retries() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(
            &dir,
            StubReader::new().page(URL, 429, "slow down").page(URL, 200, "finally"),
        );

        let started = Instant::now();
        assert_eq!(fetcher.fetch(URL).await.as_deref(), Some("finally"));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(fetcher.service.calls_for(URL), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_gives_up_after_budget() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RateLimitPolicy {
            delay: Duration::from_secs(10),
            max_attempts: 3,
        };
        let fetcher = Fetcher::new(
            StubReader::new().page(URL, 429, ""),
            ContentCache::new(dir.path()),
            policy,
        );

        let started = Instant::now();
        assert_eq!(
            fetcher.fetch_outcome(URL).await,
            FetchOutcome::GaveUp { attempts: 3 }
        );
        assert_eq!(started.elapsed(), Duration::from_secs(20));
        assert_eq!(fetcher.service.calls_for(URL), 3);
        assert_eq!(
            fetcher.cache.get(Namespace::Reader, &fingerprint(URL)).await.unwrap(),
            None
        );
    }

    #[test]
    fn test_reader_endpoint_embeds_target() {
        let client = ReaderClient::new("https://r.jina.ai/", Some("secret".to_string()));
        assert_eq!(
            client.endpoint("https://example.com/a"),
            "https://r.jina.ai/https://example.com/a"
        );
        assert!(!format!("{client:?}").contains("secret"));
    }
}
