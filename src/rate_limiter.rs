use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, sleep_until};
use tracing::debug;

pub const DEFAULT_MAX_REQS_PER_2MIN: u32 = 100;
pub const DEFAULT_MAX_REQS_PER_SEC: u32 = 20;
pub const DEFAULT_MAX_IN_FLIGHT: usize = 20;

/// A server-side quota: at most `max_requests` within `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Quota {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Spacing that keeps sustained throughput inside this quota.
    pub fn min_interval(&self) -> Duration {
        self.window / self.max_requests.max(1)
    }
}

/// Admission gate shared by every outbound request of a run.
///
/// Two constraints hold at once: consecutive admissions are at least
/// `min_interval` apart, and at most `max_in_flight` admitted requests are
/// outstanding. The wait is derived lazily from the last admission time on
/// each call; nothing refills counters in the background.
pub struct RateLimiter {
    min_interval: Duration,
    max_in_flight: usize,
    in_flight: Arc<Semaphore>,
    last_admission: Mutex<Option<Instant>>,
}

/// Held for the lifetime of one request. Dropping it frees a concurrency slot.
#[derive(Debug)]
pub struct Admission {
    _permit: OwnedSemaphorePermit,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            min_interval,
            max_in_flight,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            last_admission: Mutex::new(None),
        }
    }

    /// Paces at the strictest of the given quotas.
    pub fn from_quotas(quotas: &[Quota], max_in_flight: usize) -> Self {
        let min_interval = quotas
            .iter()
            .map(Quota::min_interval)
            .max()
            .unwrap_or(Duration::ZERO);
        Self::new(min_interval, max_in_flight)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.in_flight.available_permits()
    }

    /// Suspends until one more request may be issued.
    ///
    /// The concurrency slot is taken before the pacing gate so that callers
    /// released from the slot wait cannot fire together.
    pub async fn admit(&self) -> Admission {
        let permit = Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .expect("Rate limiter semaphore is never closed");

        let mut last = self.last_admission.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                debug!(
                    "Pacing request for {:?}",
                    ready_at.saturating_duration_since(Instant::now())
                );
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());

        Admission { _permit: permit }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_quotas(
            &[
                Quota::new(DEFAULT_MAX_REQS_PER_SEC, Duration::from_secs(1)),
                Quota::new(DEFAULT_MAX_REQS_PER_2MIN, Duration::from_secs(120)),
            ],
            DEFAULT_MAX_IN_FLIGHT,
        )
    }
}
