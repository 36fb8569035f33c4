//! Sliding window rate limiter.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding window rate limiter.
///
/// Tracks request timestamps and enforces a maximum number of requests
/// within a sliding time window. The default is 60 requests per minute, the
/// documented limit of the public artwork API.
///
/// Cheap to clone; clones share the same window.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use artsel_lib::rate_limit::RateLimiter;
///
/// let limiter = RateLimiter::default();
/// assert_eq!(limiter.capacity(), 60);
///
/// let custom = RateLimiter::new(5, Duration::from_secs(1));
/// assert_eq!(custom.window(), Duration::from_secs(1));
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RateLimiterInner>,
}

struct RateLimiterInner {
    timestamps: Mutex<VecDeque<Instant>>,
    capacity: u32,
    window: Duration,
}

impl RateLimiter {
    /// Creates a limiter allowing `capacity` requests per `window`.
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(RateLimiterInner {
                timestamps: Mutex::new(VecDeque::new()),
                capacity,
                window,
            }),
        }
    }

    /// Creates a limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(u32::MAX, Duration::ZERO)
    }

    /// Waits until a request slot is free and claims it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.inner.timestamps.lock().await;
                let now = Instant::now();
                self.prune(&mut timestamps, now);

                if (timestamps.len() as u32) < self.inner.capacity {
                    if !self.inner.window.is_zero() {
                        timestamps.push_back(now);
                    }
                    return;
                }

                // Full: wait until the oldest request leaves the window
                timestamps
                    .front()
                    .map(|&oldest| (oldest + self.inner.window).saturating_duration_since(now))
            };

            match wait {
                Some(wait) if !wait.is_zero() => {
                    log::debug!("rate limit reached, waiting {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                _ => tokio::task::yield_now().await,
            }
        }
    }

    /// Claims a slot if one is free right now.
    pub async fn try_acquire(&self) -> bool {
        let mut timestamps = self.inner.timestamps.lock().await;
        let now = Instant::now();
        self.prune(&mut timestamps, now);

        if (timestamps.len() as u32) < self.inner.capacity {
            if !self.inner.window.is_zero() {
                timestamps.push_back(now);
            }
            true
        } else {
            false
        }
    }

    /// Returns the number of requests that can be made immediately.
    pub async fn available(&self) -> u32 {
        let mut timestamps = self.inner.timestamps.lock().await;
        self.prune(&mut timestamps, Instant::now());
        self.inner
            .capacity
            .saturating_sub(timestamps.len() as u32)
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> u32 {
        self.inner.capacity
    }

    /// Returns the configured window duration.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&ts) = timestamps.front() {
            if now.saturating_duration_since(ts) >= self.inner.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(60, Duration::from_secs(60))
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.inner.capacity)
            .field("window", &self.inner.window)
            .finish()
    }
}
