//! Politeness delay between navigations of one session.

use std::time::Duration;

use nzhp_core::AppConfig;
use tokio::time::Instant;

/// Spaces requests at least `min_delay` apart.
///
/// When called sooner than `min_delay` after the previous call, sleeps a
/// random duration in `[min_delay, max_delay]`. The first call never blocks.
/// Owned by a single session; not shared between tasks.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// `max_delay` below `min_delay` is raised to `min_delay`.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            last_request: None,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.min_delay(), config.max_delay())
    }

    /// Waits if the previous call was too recent; returns the time slept.
    pub async fn wait_if_needed(&mut self) -> Duration {
        let mut slept = Duration::ZERO;
        if let Some(last) = self.last_request {
            if last.elapsed() < self.min_delay {
                let spread = self.max_delay - self.min_delay;
                let delay = self.min_delay + spread.mul_f64(rand::random::<f64>());
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = delay.as_millis() as u64;
                tracing::debug!(delay_ms, "rate limiting before next request");
                tokio::time::sleep(delay).await;
                slept = delay;
            }
        }
        self.last_request = Some(Instant::now());
        slept
    }
}
