//! Bounded waiting for an externally updated value.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::error::{Result, VerifyError};

/// How long to wait and how often to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Total wait budget.
    pub timeout: Duration,
    /// Pause between fetches.
    pub interval: Duration,
}

/// Repeatedly fetches a value until a predicate accepts it.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    settings: PollSettings,
}

impl Poller {
    /// Create a poller with the given budget and cadence.
    #[must_use]
    pub const fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    /// Fetch until `predicate` holds for a fetched value, and return that
    /// value.
    ///
    /// Each attempt evaluates the predicate against exactly one fresh fetch.
    /// The first fetch always happens, even with a zero timeout. The final
    /// sleep is shortened so the last fetch lands on the deadline. A timeout
    /// too large to represent as a deadline waits without bound.
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::TimeoutExceeded`, carrying the last fetched
    /// value's `Display` rendering, if the deadline passes without a match.
    /// Fetch errors are returned immediately.
    pub async fn wait_until<T, F, Fut, P>(
        &self,
        description: &str,
        mut fetch: F,
        mut predicate: P,
    ) -> Result<T>
    where
        T: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: FnMut(&T) -> bool,
    {
        let deadline = Instant::now().checked_add(self.settings.timeout);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            let observed = fetch().await?;
            if predicate(&observed) {
                tracing::debug!(description, attempt, %observed, "condition met");
                return Ok(observed);
            }

            let now = Instant::now();
            if deadline.is_some_and(|limit| now >= limit) {
                return Err(VerifyError::TimeoutExceeded {
                    description: String::from(description),
                    timeout_ms: u64::try_from(self.settings.timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    last_observed: observed.to_string(),
                }
                .into());
            }

            tracing::debug!(description, attempt, %observed, "condition not met");
            let pause = deadline.map_or(self.settings.interval, |limit| {
                self.settings.interval.min(limit.saturating_duration_since(now))
            });
            sleep(pause).await;
        }
    }
}
