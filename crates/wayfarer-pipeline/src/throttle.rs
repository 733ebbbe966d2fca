//! Minimum-interval pacing between candidates.
//!
//! Geocoding providers cap free tiers at about one request per second, so
//! the pipeline never starts a new candidate sooner than `min_interval`
//! after the previous one.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tracing::trace;

#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Call before starting each candidate. Waits until at least
    /// `min_interval` has passed since the previous call returned, so
    /// consecutive starts are spaced. The first call never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready = last + self.min_interval;
            if ready > Instant::now() {
                trace!(remaining_ms = (ready - Instant::now()).as_millis() as u64, "throttling");
                sleep_until(ready).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
