use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::fetch::{FetchExecutor, HttpTransport, RetryPolicy};
use crate::rate_limiter::{
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_MAX_REQS_PER_2MIN, DEFAULT_MAX_REQS_PER_SEC, Quota, RateLimiter,
};
use crate::riot_api::RiotClient;

pub const API_KEY_VAR: &str = "RIOT_API_KEY";
pub const DEFAULT_PLATFORM: &str = "na1";
pub const DEFAULT_REGION: &str = "americas";

/// Settings for one collection run.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    /// Platform routing value for league endpoints, e.g. `na1`.
    pub platform: String,
    /// Regional routing value for account and match endpoints, e.g. `americas`.
    pub region: String,
    pub max_reqs_per_sec: u32,
    pub max_reqs_per_2min: u32,
    pub max_in_flight: usize,
    pub retry: RetryPolicy,
}

impl Config {
    /// Reads the API key from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = env::var(API_KEY_VAR).with_context(|| format!("{API_KEY_VAR} is not set"))?;
        Ok(Self::with_api_key(api_key))
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            platform: DEFAULT_PLATFORM.to_string(),
            region: DEFAULT_REGION.to_string(),
            max_reqs_per_sec: DEFAULT_MAX_REQS_PER_SEC,
            max_reqs_per_2min: DEFAULT_MAX_REQS_PER_2MIN,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn platform_url(&self) -> String {
        format!("https://{}.api.riotgames.com", self.platform)
    }

    pub fn region_url(&self) -> String {
        format!("https://{}.api.riotgames.com", self.region)
    }

    pub fn quotas(&self) -> [Quota; 2] {
        [
            Quota::new(self.max_reqs_per_sec, Duration::from_secs(1)),
            Quota::new(self.max_reqs_per_2min, Duration::from_secs(120)),
        ]
    }

    /// A fresh limiter; nothing carries over between runs.
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::from_quotas(&self.quotas(), self.max_in_flight)
    }

    pub fn build_client(&self) -> Result<RiotClient<HttpTransport>> {
        let transport = HttpTransport::new(&self.api_key).context("building HTTP client")?;
        let executor = FetchExecutor::new(
            transport,
            Arc::new(self.rate_limiter()),
            self.retry.clone(),
        );
        Ok(RiotClient::new(
            executor,
            &self.platform_url(),
            &self.region_url(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pace_at_two_minute_quota() {
        let config = Config::with_api_key("RGAPI-test");
        let limiter = config.rate_limiter();

        assert_eq!(limiter.min_interval(), Duration::from_millis(1200));
        assert_eq!(limiter.max_in_flight(), DEFAULT_MAX_IN_FLIGHT);
        assert_eq!(config.platform_url(), "https://na1.api.riotgames.com");
        assert_eq!(config.region_url(), "https://americas.api.riotgames.com");
    }

    #[test]
    fn per_second_quota_wins_when_stricter() {
        let config = Config {
            max_reqs_per_sec: 1,
            max_reqs_per_2min: 1000,
            ..Config::with_api_key("RGAPI-test")
        };
        assert_eq!(config.rate_limiter().min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn builds_http_client() {
        assert!(Config::with_api_key("RGAPI-test").build_client().is_ok());
        assert!(Config::with_api_key("bad\nkey").build_client().is_err());
    }
}
