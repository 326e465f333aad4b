//! Runtime-neutral timers
//!
//! The session layer runs on the browser event loop in production and on a
//! current-thread Tokio runtime in native tests, so sleeping goes through
//! whichever timer the target provides.

use futures::future::{Either, select};
use std::future::Future;
use std::time::Duration;

/// The deadline passed before the future completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

/// Sleep for `duration`
#[cfg(target_arch = "wasm32")]
pub async fn sleep(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

/// Sleep for `duration`
#[cfg(not(target_arch = "wasm32"))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Resolve `future`, or `Elapsed` once `limit` passes first
pub async fn with_timeout<F>(limit: Duration, future: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    let future = std::pin::pin!(future);
    let deadline = std::pin::pin!(sleep(limit));

    match select(future, deadline).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(Elapsed),
    }
}
