//! Retry configuration for page fetches.

use std::time::Duration;

use rand::Rng;

use crate::error::FetchError;

/// Configuration for automatic retry behavior.
///
/// Controls how an HTTP source handles transient failures such as rate
/// limiting (429), server errors (5xx), timeouts and network errors.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use artsel_lib::rate_limit::RetryConfig;
///
/// let custom = RetryConfig::default()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(250))
///     .max_delay(Duration::from_secs(10));
///
/// let no_retry = RetryConfig::no_retry();
/// assert_eq!(no_retry.max_retries, 0);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request.
    pub max_retries: u32,
    /// Delay before the first retry (doubles each attempt).
    pub initial_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Whether to retry on HTTP 429 (rate limited).
    pub retry_on_429: bool,
    /// Whether to retry on HTTP 5xx (server errors).
    pub retry_on_5xx: bool,
    /// Whether to retry on network errors and timeouts.
    pub retry_on_network: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            retry_on_429: true,
            retry_on_5xx: true,
            retry_on_network: true,
        }
    }
}

impl RetryConfig {
    /// Creates a config with all retries disabled.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            retry_on_429: false,
            retry_on_5xx: false,
            retry_on_network: false,
            ..Default::default()
        }
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the initial delay between retries.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enables or disables retry on HTTP 429.
    pub fn retry_on_429(mut self, enabled: bool) -> Self {
        self.retry_on_429 = enabled;
        self
    }

    /// Enables or disables retry on HTTP 5xx.
    pub fn retry_on_5xx(mut self, enabled: bool) -> Self {
        self.retry_on_5xx = enabled;
        self
    }

    /// Enables or disables retry on network errors.
    pub fn retry_on_network(mut self, enabled: bool) -> Self {
        self.retry_on_network = enabled;
        self
    }

    /// Decides whether `error` on attempt `attempt` (0-based) should be retried.
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        if attempt >= self.max_retries || !error.is_retryable() {
            return false;
        }
        match error {
            FetchError::Http { status: 429, .. } => self.retry_on_429,
            FetchError::Http { .. } => self.retry_on_5xx,
            FetchError::Network(e) => match e.status() {
                Some(status) if status.as_u16() == 429 => self.retry_on_429,
                Some(status) if status.is_server_error() => self.retry_on_5xx,
                _ => self.retry_on_network,
            },
            FetchError::Timeout(_) => self.retry_on_network,
            _ => false,
        }
    }

    /// Returns the backoff before retry number `attempt` (0-based).
    ///
    /// Exponential from `initial_delay`, capped at `max_delay`, with up to 20%
    /// random jitter subtracted so concurrent clients spread out.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        let jitter = rand::rng().random_range(0.0..0.2);
        base.mul_f64(1.0 - jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_respects_budget() {
        let config = RetryConfig::default().max_retries(2);
        let err = FetchError::http(503, "busy");

        assert!(config.should_retry(&err, 0));
        assert!(config.should_retry(&err, 1));
        assert!(!config.should_retry(&err, 2));
    }

    #[test]
    fn test_should_retry_respects_toggles() {
        let config = RetryConfig::default().retry_on_429(false);
        assert!(!config.should_retry(&FetchError::http(429, "slow"), 0));
        assert!(config.should_retry(&FetchError::http(502, "gateway"), 0));
        assert!(!config.should_retry(&FetchError::http(404, "missing"), 0));
        assert!(!RetryConfig::no_retry().should_retry(&FetchError::http(503, "busy"), 0));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig::default()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(300));

        let first = config.delay_for(0);
        assert!(first <= Duration::from_millis(100));
        assert!(first >= Duration::from_millis(80));

        let late = config.delay_for(10);
        assert!(late <= Duration::from_millis(300));
        assert!(late >= Duration::from_millis(240));
    }
}
