//! OpenAQ v3 API client with rate limiting and bounded retry.

use crate::error::{DataError, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// OpenAQ API base URL
const OPENAQ_BASE_URL: &str = "https://api.openaq.org";

/// Default minimum interval between requests
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(200);

/// Default HTTP timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP statuses worth retrying: rate limiting and transient server failures.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Returns true if a request that failed with this status should be retried.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Retry policy for transient failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base backoff duration, doubled on each attempt
    pub base_backoff: Duration,
    /// Upper bound on the backoff duration before jitter
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based): exponential growth
    /// capped at `max_backoff`, scaled by a jitter factor in [0.5, 1.5).
    /// `jitter` must be in [0, 1).
    pub fn backoff_delay(&self, attempt: u32, jitter: f64) -> Duration {
        let exp = self.base_backoff.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = exp.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped * (0.5 + jitter))
    }
}

/// One location row from the locations listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInfo {
    /// Location identifier
    pub id: i64,
    /// Location display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Envelope for the locations listing endpoint.
#[derive(Debug, Deserialize)]
struct LocationsPage {
    #[serde(default)]
    results: Vec<LocationInfo>,
}

/// Rate limiter enforcing a minimum interval between requests.
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// OpenAQ v3 API client with rate limiting and bounded retry.
pub struct OpenAqClient {
    client: reqwest::Client,
    api_key: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenAqClient {
    /// Create a new client with default rate limit and retry policy.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_policy(api_key, DEFAULT_RATE_LIMIT, RetryPolicy::default())
    }

    /// Create a new client with a custom minimum request interval and retry
    /// policy.
    ///
    /// # Example
    /// ```no_run
    /// use plume_data::openaq::{OpenAqClient, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// # fn example() -> plume_data::Result<()> {
    /// let client = OpenAqClient::with_policy(
    ///     "my-api-key",
    ///     Duration::from_millis(500),
    ///     RetryPolicy::default(),
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_policy(
        api_key: impl Into<String>,
        min_interval: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            base_url: OPENAQ_BASE_URL.to_string(),
            retry,
        })
    }

    /// Fetch one page of locations for a country.
    ///
    /// # Arguments
    /// * `country` - ISO 3166-1 alpha-2 country code (e.g. "IN")
    /// * `limit` - Page size
    /// * `page` - 1-based page number
    ///
    /// An empty result means pagination is exhausted.
    pub async fn locations_page(
        &self,
        country: &str,
        limit: u32,
        page: u32,
    ) -> Result<Vec<LocationInfo>> {
        if country.is_empty() {
            return Err(DataError::OpenAqApi("Empty country code".to_string()));
        }

        let url = format!(
            "{}/v3/locations?iso={}&limit={}&page={}",
            self.base_url, country, limit, page
        );
        let response = self.get_with_retries(&url).await?;
        let page: LocationsPage = response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("Failed to parse locations page: {e}")))?;
        Ok(page.results)
    }

    /// Fetch the latest measurements for a location.
    ///
    /// The payload is returned untyped; the caller decides what to stage,
    /// and normalization happens later in the transform step.
    pub async fn latest_for_location(&self, location_id: i64) -> Result<serde_json::Value> {
        let url = format!("{}/v3/locations/{}/latest", self.base_url, location_id);
        let response = self.get_with_retries(&url).await?;
        let payload = response
            .json()
            .await
            .map_err(|e| DataError::Parse(format!("Failed to parse latest payload: {e}")))?;
        Ok(payload)
    }

    /// Issue a GET, retrying on retryable statuses and transport errors with
    /// capped exponential backoff.
    async fn get_with_retries(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;
        loop {
            self.rate_limiter.lock().await.wait().await;

            let outcome = self
                .client
                .get(url)
                .header("Accept", "application/json")
                .header("X-API-Key", &self.api_key)
                .send()
                .await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if !is_retryable_status(status.as_u16()) {
                        return Err(DataError::OpenAqApi(format!("HTTP {status} for {url}")));
                    }
                    if attempt >= self.retry.max_retries {
                        return Err(DataError::RetriesExhausted {
                            status: status.as_u16(),
                            attempts: attempt + 1,
                            url: url.to_string(),
                        });
                    }
                }
                Err(err) => {
                    if attempt >= self.retry.max_retries {
                        return Err(DataError::Network(err));
                    }
                }
            }

            let jitter = rand::random::<f64>();
            sleep(self.retry.backoff_delay(attempt, jitter)).await;
            attempt += 1;
        }
    }
}

impl std::fmt::Debug for OpenAqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAqClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
