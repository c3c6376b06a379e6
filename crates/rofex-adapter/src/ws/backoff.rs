/*
[INPUT]:  StreamConfig backoff bounds and retry budget
[OUTPUT]: Deterministic doubling delays and a consecutive-failure counter
[POS]:    WebSocket layer - reconnect pacing
[UPDATE]: When changing the reconnect schedule
*/

use std::time::Duration;

use crate::config::StreamConfig;

/// Exponential backoff without jitter.
///
/// Delays double from `initial` up to `max`. The retry counter only tracks
/// consecutive connect/subscribe failures and is cleared by [`Backoff::reset`].
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    max_retries: u32,
    current: Duration,
    retries: u32,
}

impl Backoff {
    #[must_use]
    pub const fn new(initial: Duration, max: Duration, max_retries: u32) -> Self {
        Self {
            initial,
            max,
            max_retries,
            current: initial,
            retries: 0,
        }
    }

    #[must_use]
    pub const fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.initial_backoff, config.max_backoff, config.max_retries)
    }

    /// Delay the next wait would use.
    #[must_use]
    pub const fn current(&self) -> Duration {
        self.current
    }

    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Return the current delay and double it for next time.
    pub fn advance(&mut self) -> Duration {
        let delay = self.current;
        self.current = delay.saturating_mul(2).min(self.max);
        delay
    }

    /// Count a failed attempt.
    ///
    /// Returns the delay to wait before the next attempt, or `None` once the
    /// budget is spent.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.retries += 1;
        if self.retries >= self.max_retries {
            return None;
        }
        Some(self.advance())
    }

    /// Back to the initial delay after a successful connect and subscribe.
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.retries = 0;
    }
}
