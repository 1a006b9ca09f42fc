//! Retry with exponential back-off and jitter for the X API client.
//!
//! [`retry_with_backoff`] wraps a fallible async operation and retries on
//! transient errors (network failures, 5xx, 429). Application-level errors
//! and malformed responses are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::XApiError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 5xx responses: transient server/infrastructure errors.
/// - HTTP 429: the platform's rate limiter; backs off and tries again.
///
/// **Not retriable (hard stop):**
/// - [`XApiError::Api`] — application-level error; retrying won't fix it.
/// - [`XApiError::Deserialize`] — malformed response; retrying won't fix it.
pub(crate) fn is_retriable(err: &XApiError) -> bool {
    match err {
        XApiError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        XApiError::RateLimited { .. } => true,
        XApiError::Api(_) | XApiError::Deserialize { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Delay doubles per attempt from `backoff_base_ms`, with ±25 % jitter, capped
/// at 60 s. A 429 response overrides the computed delay with the platform's
/// advertised `retry_after` when that is longer.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, XApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, XApiError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let mut delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                if let XApiError::RateLimited { retry_after_secs } = &err {
                    delay_ms = delay_ms.max(retry_after_secs.saturating_mul(1000));
                }
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "X API transient error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> XApiError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        XApiError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn api_error_is_not_retriable() {
        assert!(!is_retriable(&XApiError::Api("bad request".to_owned())));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&XApiError::RateLimited {
            retry_after_secs: 30
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, XApiError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_api_error() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(XApiError::Api("invalid query".to_owned()))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Api must not be retried");
        assert!(matches!(result, Err(XApiError::Api(_))));
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(XApiError::RateLimited {
                        retry_after_secs: 0,
                    })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99, "should succeed after retries");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
