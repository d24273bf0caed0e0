//! Retry policies for the profile store and the messaging transport.
//!
//! Two policies exist:
//! - store: a few quick attempts, then `StoreUnavailable` surfaces to the dispatcher
//! - reconnect: fixed delay, no attempt limit, only for connectivity errors
//!   (also used as the update listener's backoff)

use backon::{ConstantBuilder, Retryable};
use std::future::Future;
use std::time::Duration;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// Backoff used for store operations.
pub fn store_policy() -> ConstantBuilder {
    ConstantBuilder::default()
        .with_delay(config::store::retry_delay())
        .with_max_times(config::store::RETRY_ATTEMPTS)
}

/// Backoff used while the transport is unreachable.
pub fn reconnect_policy(delay: Duration) -> ConstantBuilder {
    ConstantBuilder::default().with_delay(delay).without_max_times()
}

/// Delay before the update listener polls again after a failed `getUpdates`.
///
/// Fixed, whatever the number of consecutive failures.
pub fn polling_backoff(_error_count: u32) -> Duration {
    config::network::reconnect_delay()
}

/// Runs a store operation, retrying while it fails with `StoreUnavailable`.
///
/// `NotFound` and `InvalidField` are returned on the first attempt.
pub async fn with_store_retry<T, F>(what: &str, op: F) -> AppResult<T>
where
    F: FnMut() -> AppResult<T>,
{
    let mut op = op;
    (|| {
        let result = op();
        async move { result }
    })
    .retry(store_policy())
    .when(AppError::is_store)
    .notify(|err: &AppError, dur: Duration| {
        log::warn!("Store call '{}' failed: {}. Retrying in {:?}", what, err, dur);
    })
    .await
}

/// Runs `op` until it succeeds or fails with a non-connectivity error.
///
/// Connectivity errors are retried forever with a fixed `delay`.
pub async fn until_connected<T, F, Fut>(what: &str, delay: Duration, op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    op.retry(reconnect_policy(delay))
        .when(AppError::is_connectivity)
        .notify(|err: &AppError, dur: Duration| {
            log::warn!("{} failed: {}. Reconnecting in {:?}", what, err, dur);
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn store_retry_recovers_from_transient_error() {
        let calls = AtomicU32::new(0);
        let result = with_store_retry("get", || {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::StoreUnavailable("database is locked".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn store_retry_gives_up_after_limit() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_store_retry("update", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::StoreUnavailable("disk I/O error".into()))
        })
        .await;

        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1 + config::store::RETRY_ATTEMPTS as u32);
    }

    #[tokio::test]
    async fn store_retry_does_not_repeat_not_found() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = with_store_retry("get", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::NotFound(42))
        })
        .await;

        assert!(matches!(result, Err(AppError::NotFound(42))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_retries_connectivity_errors_only() {
        let calls = AtomicU32::new(0);
        let result = until_connected("get_me", Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(AppError::TransportConnectivity("connection refused".into()))
                } else {
                    Ok("ready")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let calls = AtomicU32::new(0);
        let result: AppResult<()> = until_connected("get_me", Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Payment("unauthorized".into())) }
        })
        .await;
        assert!(matches!(result, Err(AppError::Payment(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn polling_backoff_is_fixed() {
        for errors in [0, 1, 6, 50, u32::MAX] {
            assert_eq!(polling_backoff(errors), Duration::from_secs(5));
        }
    }
}
