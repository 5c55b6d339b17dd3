//! Retry combinator with cancellation-aware spacing.
//!
//! An operation is re-run while `should_retry` accepts its result. Only the
//! sleeps between attempts observe the shutdown token; an attempt already
//! in flight always runs to completion.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Spacing and bound for [`attempt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between consecutive attempts.
    pub delay: Duration,
    /// Total attempts allowed; `None` retries until accepted or cancelled.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    #[must_use]
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    #[must_use]
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }
}

/// How an [`attempt`] run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempted<T> {
    /// `should_retry` declined the last result.
    Finished { value: T, attempts: u32 },
    /// The attempt bound was reached; `value` is the last result.
    Exhausted { value: T, attempts: u32 },
    /// Shutdown was requested while waiting to retry.
    Cancelled { attempts: u32 },
}

impl<T> Attempted<T> {
    /// The last result, unless the run was cancelled.
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Finished { value, .. } | Self::Exhausted { value, .. } => Some(value),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Finished { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

/// Run `operation` until `should_retry` declines its result, the policy
/// bound is hit, or `shutdown` fires during a pause.
pub async fn attempt<T, F, Fut, P>(
    mut operation: F,
    should_retry: P,
    policy: RetryPolicy,
    shutdown: &CancellationToken,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let mut attempts = 0u32;
    loop {
        let value = operation().await;
        attempts += 1;

        if !should_retry(&value) {
            return Attempted::Finished { value, attempts };
        }
        if !policy.allows(attempts) {
            return Attempted::Exhausted { value, attempts };
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Attempted::Cancelled { attempts },
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}
