//! Rate limiting and retry configuration for HTTP sources.

mod limiter;
mod retry;

pub use limiter::RateLimiter;
pub use retry::RetryConfig;
