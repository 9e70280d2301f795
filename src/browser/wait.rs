use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::BrowserResult;

/// Poll `probe` until it yields `Some`, or give up after `timeout`.
///
/// Returns `Ok(None)` on timeout. A lost session ends the wait early with the
/// error; any other command error counts as "not yet".
pub async fn until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> BrowserResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BrowserResult<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match probe().await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(e) if e.is_session_lost() => return Err(e),
            Err(e) => tracing::trace!("wait probe failed: {}", e),
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(interval).await;
    }
}

/// Fixed pause; zero is a no-op.
pub async fn settle(ms: u64) {
    if ms > 0 {
        sleep(Duration::from_millis(ms)).await;
    }
}
