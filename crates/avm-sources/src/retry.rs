//! Exponential back-off with jitter for answer-platform calls.
//!
//! Only transient failures are retried: timeouts, connection errors, 429 and
//! 5xx. Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors worth another attempt after a delay.
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => *status >= 500,
        SourceError::Deserialize { .. }
        | SourceError::EmptyAnswer { .. }
        | SourceError::Timeout { .. }
        | SourceError::MissingApiKey { .. }
        | SourceError::InvalidBaseUrl { .. } => false,
    }
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at 60 s, then scaled by a random factor in `[0.75, 1.25)`.
fn backoff_delay(backoff_base_ms: u64, attempt: u32) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// The last error is returned once retries are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    platform: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(backoff_base_ms, attempt);
                tracing::warn!(
                    platform,
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient answer source error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn rate_limited() -> SourceError {
        SourceError::RateLimited {
            platform: "openai".to_owned(),
            retry_after_secs: 1,
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retriable() {
        assert!(is_retriable(&rate_limited()));
        assert!(is_retriable(&SourceError::UnexpectedStatus {
            platform: "openai".to_owned(),
            status: 503,
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&SourceError::UnexpectedStatus {
            platform: "openai".to_owned(),
            status: 401,
        }));
        assert!(!is_retriable(&SourceError::EmptyAnswer {
            platform: "openai".to_owned(),
        }));
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        assert!(!is_retriable(&SourceError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }));
    }

    #[test]
    fn backoff_is_jittered_and_capped() {
        let first = backoff_delay(1_000, 1).as_millis();
        assert!((750..1_250).contains(&first), "got {first}");
        let third = backoff_delay(1_000, 3).as_millis();
        assert!((3_000..5_000).contains(&third), "got {third}");
        let huge = backoff_delay(1_000, 30).as_millis();
        assert!(huge < 75_000, "got {huge}");
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("openai", 3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, SourceError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("openai", 3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("openai", 2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(rate_limited())
            }
        })
        .await;
        assert!(matches!(result, Err(SourceError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("openai", 3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(SourceError::UnexpectedStatus {
                    platform: "openai".to_owned(),
                    status: 400,
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1, "4xx must not be retried");
    }
}
