use serde::{Deserialize, Serialize};

/// Mirrors the teacher's `model::execution::pipeline::RetryConfig` /
/// `BackoffStrategy`, trimmed to the knobs the connection-level retry
/// policy in `engine-core::retry` actually reads (§7 Retry policy).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff: BackoffStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    Exponential,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 250,
            backoff: BackoffStrategy::Exponential,
        }
    }
}
