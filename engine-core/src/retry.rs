//! Connection-level retry policy (§7 Retry policy): retries transient
//! `Connect` failures at session-open time only, since a COPY stream cannot
//! be resumed mid-transfer once it has started. Adapted directly from the
//! teacher's `engine-core/src/retry.rs`, trimmed of the generic database
//! preset in favor of reading `model::retry::RetryConfig`.

use connectors::error::Error as ConnectorError;
use connectors::postgres::session::PgSession;
use model::retry::{BackoffStrategy, RetryConfig};
use model::schema::ConnectionSpec;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

#[derive(Debug)]
pub enum RetryError<E> {
    Fatal(E),
    AttemptsExceeded(E),
}

impl<E: std::fmt::Display> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) => e,
            RetryError::AttemptsExceeded(e) => e,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    backoff: BackoffStrategy,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1) as usize,
            base_delay: Duration::from_millis(config.delay_ms),
            backoff: config.backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }
                        sleep(self.backoff_delay(attempt)).await;
                        attempt += 1;
                    }
                },
            }
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let base_ms = self.base_delay.as_millis() as u64;
        match self.backoff {
            BackoffStrategy::Fixed => Duration::from_millis(base_ms),
            BackoffStrategy::Linear => Duration::from_millis(base_ms * (attempt as u64 + 1)),
            BackoffStrategy::Exponential => {
                let factor = 1u64 << (attempt.min(6));
                Duration::from_millis(base_ms.saturating_mul(factor))
            }
        }
    }
}

/// Opens a Postgres session through `policy` (§7 Retry policy): a
/// transient `Error::Connect` is retried with backoff, anything else (auth
/// failure, bad dbname) stops immediately since retrying it can't help.
pub async fn open_session_with_retry(
    spec: &ConnectionSpec,
    policy: &RetryPolicy,
) -> Result<PgSession, ConnectorError> {
    policy
        .run(
            || PgSession::open(spec),
            |err: &ConnectorError| match err {
                ConnectorError::Connect(_) => RetryDisposition::Retry,
                _ => RetryDisposition::Stop,
            },
        )
        .await
        .map_err(RetryError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct TestError(&'static str);

    #[tokio::test]
    async fn retries_transient_failure_and_succeeds() {
        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 5,
            delay_ms: 0,
            backoff: BackoffStrategy::Fixed,
        });
        let attempts = Arc::new(AtomicUsize::new(0));
        let op_attempts = attempts.clone();

        let result = policy
            .run(
                move || {
                    let op_attempts = op_attempts.clone();
                    async move {
                        let attempt = op_attempts.fetch_add(1, Ordering::SeqCst);
                        if attempt < 2 {
                            Err(TestError("transient"))
                        } else {
                            Ok::<&'static str, TestError>("done")
                        }
                    }
                },
                |err: &TestError| match err.0 {
                    "transient" => RetryDisposition::Retry,
                    _ => RetryDisposition::Stop,
                },
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_disposition_stops_immediately() {
        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 5,
            delay_ms: 0,
            backoff: BackoffStrategy::Fixed,
        });
        let attempts = Arc::new(AtomicUsize::new(0));
        let op_attempts = attempts.clone();

        let result: Result<(), RetryError<TestError>> = policy
            .run(
                move || {
                    op_attempts.fetch_add(1, Ordering::SeqCst);
                    async move { Err(TestError("auth")) }
                },
                |_| RetryDisposition::Stop,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
