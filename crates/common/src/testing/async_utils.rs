//! Async test helpers

#![allow(clippy::missing_errors_doc)]

use std::future::Future;
use std::time::Duration;

/// Assert that an async condition becomes true within a timeout
///
/// The condition expression is re-evaluated every 10ms. Works under a paused
/// clock too, since the sleeps auto-advance it.
///
/// ```no_run
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() {
/// let flag = Arc::new(AtomicBool::new(false));
/// let setter = flag.clone();
/// tokio::spawn(async move { setter.store(true, Ordering::SeqCst) });
///
/// bunq_common::assert_eventually_async!(Duration::from_secs(1), async {
///     flag.load(Ordering::SeqCst)
/// });
/// # }
/// ```
#[macro_export]
macro_rules! assert_eventually_async {
    ($timeout:expr, $fut:expr) => {{
        let timeout_duration = $timeout;
        let result = tokio::time::timeout(timeout_duration, async {
            loop {
                if $fut.await {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await;

        assert!(result.is_ok(), "Condition did not become true within {:?}", timeout_duration);
    }};
}

/// Await `fut`, failing with `Elapsed` after `duration`
pub async fn timeout_ok<F, T>(duration: Duration, fut: F) -> Result<T, tokio::time::error::Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, fut).await
}

/// Yield to the scheduler a few times so spawned tasks reach their next
/// suspension point
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn eventually_waits_for_condition() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bump = counter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            bump.fetch_add(1, Ordering::SeqCst);
        });

        crate::assert_eventually_async!(Duration::from_secs(1), async {
            counter.load(Ordering::SeqCst) == 1
        });
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_ok_reports_elapsed() {
        let result = timeout_ok(Duration::from_millis(10), std::future::pending::<()>()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn settle_lets_spawned_task_run() {
        let flag = Arc::new(AtomicUsize::new(0));
        let setter = flag.clone();
        tokio::spawn(async move { setter.store(1, Ordering::SeqCst) });

        settle().await;
        assert_eq!(flag.load(Ordering::SeqCst), 1);
    }
}
