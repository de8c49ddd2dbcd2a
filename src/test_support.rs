use reqwest::StatusCode;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::fetch::{FetchError, FetchExecutor, RawResponse, RetryPolicy, Transport};
use crate::rate_limiter::RateLimiter;
use crate::riot_api::RiotClient;
use std::sync::Arc;

type Handler = Box<dyn Fn(&str) -> RawResponse + Send + Sync>;

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn json(value: &Value) -> Self {
        Self::ok(value.to_string())
    }

    pub fn throttled(retry_after_secs: Option<u64>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: retry_after_secs.map(Duration::from_secs),
            body: String::new(),
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }
}

/// In-memory transport answering from a handler and recording every call.
pub struct ScriptedTransport {
    handler: Handler,
    latency: Option<Duration>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&str) -> RawResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `responses` in order, then 500 once they run out.
    pub fn sequence(responses: Vec<RawResponse>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| RawResponse::status(StatusCode::INTERNAL_SERVER_ERROR))
        })
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.contains(needle))
            .count()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, FetchError> {
        self.calls.lock().unwrap().push((url.to_string(), Instant::now()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok((self.handler)(url))
    }
}

/// `n` league entries with puuids `{prefix}-{start}..`.
pub fn league_entries(prefix: &str, start: usize, n: usize) -> Value {
    Value::Array(
        (start..start + n)
            .map(|i| {
                json!({
                    "puuid": format!("{prefix}-{i}"),
                    "queueType": "RANKED_SOLO_5x5",
                    "tier": "GOLD",
                    "rank": "II",
                    "leaguePoints": 42,
                    "wins": 10,
                    "losses": 9
                })
            })
            .collect(),
    )
}

/// Minimal match body with two participants.
pub fn match_body(match_id: &str) -> Value {
    json!({
        "metadata": { "matchId": match_id, "participants": ["p-a", "p-b"] },
        "info": {
            "queueId": 420,
            "participants": [
                { "puuid": "p-a", "championName": "Ahri", "win": true },
                { "puuid": "p-b", "championName": "Garen", "win": false }
            ]
        }
    })
}

/// Query parameter value from a URL, if present.
pub fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

/// Client over `transport` with a fast limiter and the default retry policy.
pub fn test_client(transport: ScriptedTransport) -> RiotClient<ScriptedTransport> {
    let executor = FetchExecutor::new(
        transport,
        Arc::new(RateLimiter::new(Duration::from_millis(10), 4)),
        RetryPolicy::default(),
    );
    RiotClient::new(executor, "https://na1.test/", "https://americas.test")
}
