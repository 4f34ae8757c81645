//! Retry schedule for transient fetch failures
//!
//! Two independent predicates bound the schedule, and whichever fires first
//! stops it:
//! - an attempt-count bound (`max_retries` retries after the first attempt)
//! - an exponential delay, starting at `initial_delay` and doubling, whose
//!   running total may optionally be capped by `max_total_delay`

use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_total_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_total_delay: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based), or `None` to give up
    ///
    /// `spent` is the sum of the delays already waited for this operation.
    pub fn next_delay(&self, retry: u32, spent: Duration) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }

        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(retry));

        match self.max_total_delay {
            Some(cap) if spent.saturating_add(delay) > cap => None,
            _ => Some(delay),
        }
    }

    /// The full sequence of delays this policy would wait through
    pub fn delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut spent = Duration::ZERO;
        while let Some(delay) = self.next_delay(delays.len() as u32, spent) {
            spent += delay;
            delays.push(delay);
        }
        delays
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy gives up
///
/// `op` receives the 0-based attempt number. The last error is returned when
/// retries are exhausted.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut spent = Duration::ZERO;

    loop {
        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_transient(&err) {
            return Err(err);
        }

        let Some(delay) = policy.next_delay(attempt, spent) else {
            return Err(err);
        };

        tracing::debug!(
            "Attempt {} failed ({}), retrying in {:?}",
            attempt + 1,
            err,
            delay
        );
        tokio::time::sleep(delay).await;
        spent += delay;
        attempt += 1;
    }
}
