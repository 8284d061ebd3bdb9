//! Exponential-backoff reconnection for the change listener.
//!
//! When the listener drops, the subscription calls [`reconnect_loop`]
//! to keep retrying with increasing delays until either a new stream is
//! open or the [`CancellationToken`] is triggered. The [`Backoff`] is
//! owned by the subscription so the delay keeps growing across
//! connections that open and then drop straight away.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::listener::ChangeStream;
use crate::source::ContentSource;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each attempt.
    pub multiplier: f64,
    /// A stream open at least this long resets the delay.
    pub stable_after: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            stable_after: Duration::from_secs(30),
        }
    }
}

/// Calculate the next backoff delay, clamped to
/// [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// Current position in the backoff sequence.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    delay: Duration,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            delay: config.initial_delay,
            config,
        }
    }

    /// Delay before the next attempt.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn advance(&mut self) {
        self.delay = next_delay(self.delay, &self.config);
    }

    pub fn reset(&mut self) {
        self.delay = self.config.initial_delay;
    }

    /// Whether a stream that stayed open for `uptime` counts as healthy.
    pub fn is_stable(&self, uptime: Duration) -> bool {
        uptime >= self.config.stable_after
    }
}

/// Reopen the change stream with exponential backoff.
///
/// Waits before every attempt, including the first: the caller has just
/// lost (or failed to open) a connection. Every attempt advances
/// `backoff`, successful or not. Returns `None` if `cancel` fires first.
pub async fn reconnect_loop(
    source: &dyn ContentSource,
    backoff: &mut Backoff,
    cancel: &CancellationToken,
) -> Option<ChangeStream> {
    let mut attempt = 0u32;

    loop {
        let delay = backoff.delay();
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
        backoff.advance();
        tracing::info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to content listener",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Listener reconnect cancelled");
                return None;
            }
            result = source.listen() => match result {
                Ok(stream) => {
                    tracing::info!(attempt, "Reconnected to content listener");
                    return Some(stream);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Reconnect attempt {attempt} failed");
                }
            }
        }
    }
}
