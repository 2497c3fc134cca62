use crate::config::RetryConfig;
use http::StatusCode;
use std::time::Duration;

/// Fixed backoff table: one wait per attempt, then a set of statuses worth another try.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
    retryable: Vec<StatusCode>,
}

impl RetryPolicy {
    /// An empty schedule still makes one immediate attempt.
    pub fn new(mut delays: Vec<Duration>, retryable: Vec<StatusCode>) -> Self {
        if delays.is_empty() {
            delays.push(Duration::ZERO);
        }
        Self { delays, retryable }
    }

    /// Waits before each attempt. The length is the number of attempts.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn attempts(&self) -> usize {
        self.delays.len()
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retryable.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            vec![
                Duration::ZERO,
                Duration::from_millis(600),
                Duration::from_millis(1500),
            ],
            vec![
                StatusCode::TOO_MANY_REQUESTS,     // 429
                StatusCode::INTERNAL_SERVER_ERROR, // 500
                StatusCode::BAD_GATEWAY,           // 502
                StatusCode::SERVICE_UNAVAILABLE,   // 503
                StatusCode::GATEWAY_TIMEOUT,       // 504
            ],
        )
    }
}

impl From<&RetryConfig> for RetryPolicy {
    // Invalid codes are rejected by `RetryConfig::validate`
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config
                .delays_ms
                .iter()
                .map(|&ms| Duration::from_millis(ms))
                .collect(),
            config
                .retryable_statuses
                .iter()
                .filter_map(|&code| StatusCode::from_u16(code).ok())
                .collect(),
        )
    }
}
