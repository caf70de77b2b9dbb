//! Bounded retry for proxied page requests.
//!
//! A failed proxied attempt is usually the proxy's fault, so most failures are
//! retried with a fresh identity. Only errors that a different proxy cannot
//! change stop the loop early.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if another attempt through a different proxy may succeed.
///
/// Not retriable:
/// - [`ScraperError::NotFound`]: the page does not exist.
/// - [`ScraperError::InvalidUrl`]: the request cannot be built.
/// - [`ScraperError::NoProxy`]: there is no other proxy to try.
fn is_retriable(err: &ScraperError) -> bool {
    !matches!(
        err,
        ScraperError::NotFound { .. } | ScraperError::InvalidUrl { .. } | ScraperError::NoProxy
    )
}

/// Runs `operation` up to `max_attempts` times, sleeping
/// `backoff_base_ms * 2^n` between attempts.
///
/// Returns the first success, the first non-retriable error, or the last error
/// once the budget is spent. `max_attempts` of zero is treated as one.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_attempts {
            return Err(err);
        }

        let delay_ms = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(20));
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms,
            error = %err,
            "proxied request failed; retrying with a new identity"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
