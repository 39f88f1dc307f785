// src/retry.rs

//! Pre-launch retry backoff.
//!
//! When this process is a retry attempt (`retry_count > 0`), the launcher
//! pauses before submitting. The pause is deliberate backpressure on the
//! calling thread of control; submission must not start until it completes.
//! The wall-clock sleep sits behind a [`Sleeper`] seam so tests can observe
//! the requested durations without waiting them out.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::info;

use crate::flow::RetryOptions;
use crate::flow::model::DEFAULT_MINUTES_BETWEEN_RETRIES;

/// Trait abstracting the blocking wait.
///
/// Production code uses [`TokioSleeper`]; tests can provide a recording
/// implementation that returns immediately.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Real sleeper backed by `tokio::time::sleep`.
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Attempt-local retry state.
///
/// `retry_count` comes from the caller (it doubles as the attempt number);
/// `minutes_between_retries` comes from the step's declared retry options,
/// defaulting to 2. No attempt history is tracked across process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySpec {
    pub retry_count: u32,
    pub minutes_between_retries: u64,
}

impl RetrySpec {
    pub fn from_options(retry_count: u32, retry: Option<&RetryOptions>) -> Self {
        Self {
            retry_count,
            minutes_between_retries: retry
                .map(RetryOptions::minutes_between_retries)
                .unwrap_or(DEFAULT_MINUTES_BETWEEN_RETRIES),
        }
    }

    /// Wait out the backoff for a retry attempt; a first attempt proceeds
    /// immediately.
    pub async fn wait_before_launch(&self, sleeper: &dyn Sleeper) {
        if self.retry_count == 0 {
            return;
        }

        info!(
            minutes = self.minutes_between_retries,
            "Sleeping {} minutes before the next retry",
            self.minutes_between_retries
        );
        sleeper
            .sleep(Duration::from_secs(self.minutes_between_retries * 60))
            .await;
    }
}
