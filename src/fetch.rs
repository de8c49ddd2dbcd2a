use rand::Rng;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::rate_limiter::RateLimiter;

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("Too many requests for URL {url} after {attempts} attempts")]
    RetryExhausted { url: String, attempts: u32 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid credential header: {0}")]
    Credential(#[from] reqwest::header::InvalidHeaderValue),
}

/// What the executor needs to know about one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub retry_after: Option<Duration>,
    pub body: String,
}

/// A single GET against the remote API.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse, FetchError>> + Send;
}

/// `reqwest`-backed transport carrying the API key on every request.
pub struct HttpTransport {
    client: Client,
}

fn build_headers(api_key: &str) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();
    let mut token = HeaderValue::from_str(api_key)?;
    token.set_sensitive(true);
    headers.insert("X-Riot-Token", token);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

impl HttpTransport {
    pub fn new(api_key: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .default_headers(build_headers(api_key)?)
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// How throttled requests are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Consecutive 429 responses tolerated before giving up.
    pub max_retries: u32,
    pub min_jitter: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            min_jitter: Duration::from_millis(100),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after a 429 on the zero-based `attempt`.
    ///
    /// Honors `Retry-After` when the server sent one, otherwise `2^attempt`
    /// seconds. Jitter is added on top in both cases.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let base = retry_after.unwrap_or_else(|| Duration::from_secs(1u64 << attempt.min(16)));
        base + self.jitter()
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter <= self.min_jitter {
            return self.min_jitter;
        }
        let millis = rand::thread_rng()
            .gen_range(self.min_jitter.as_millis() as u64..=self.max_jitter.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Issues GETs through the shared rate limiter and retries throttled ones.
pub struct FetchExecutor<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl<T: Transport> FetchExecutor<T> {
    pub fn new(transport: T, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            policy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches `url` and returns the body of the first 2xx response.
    ///
    /// Every attempt, retries included, goes through rate limiter admission.
    /// Only 429 is retried; any other non-2xx status ends the call.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt: u32 = 0;

        loop {
            let response = {
                let _admission = self.limiter.admit().await;
                debug!("GET {}", url);
                self.transport.get(url).await?
            };

            if response.status == StatusCode::TOO_MANY_REQUESTS {
                attempt += 1;
                if attempt >= self.policy.max_retries {
                    return Err(FetchError::RetryExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                    });
                }

                let delay = self.policy.backoff(attempt - 1, response.retry_after);
                warn!(
                    "Rate limited on {} (attempt {}/{}), retrying in {:?}",
                    url, attempt, self.policy.max_retries, delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !response.status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                });
            }

            return Ok(response.body);
        }
    }

    pub async fn fetch_json<D: DeserializeOwned>(&self, url: &str) -> Result<D, FetchError> {
        let body = self.fetch(url).await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
