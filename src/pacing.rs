//! Spacing between index pages, the harvester's only throttle on the catalog host.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::config::{PacingMode, PacingSettings};

#[derive(Debug)]
pub struct Pacer {
    mode: PacingMode,
    delay: Duration,
    next_allowed: Option<Instant>,
}

impl Pacer {
    pub fn new(mode: PacingMode, delay: Duration) -> Self {
        Pacer {
            mode,
            delay,
            next_allowed: None,
        }
    }

    pub fn from_settings(settings: &PacingSettings) -> Self {
        // out-of-range delays are rejected by Settings::validate
        let delay = Duration::try_from_secs_f64(settings.delay_secs).unwrap_or_default();
        Self::new(settings.mode, delay)
    }

    /// Wait until the next page may start, then mark it started.
    pub async fn page_started(&mut self) {
        if let Some(at) = self.next_allowed.take() {
            let now = Instant::now();
            if at > now {
                debug!(wait_ms = (at - now).as_millis() as u64, "pacing");
                sleep_until(at).await;
            }
        }
        if self.mode == PacingMode::MinInterval {
            self.next_allowed = Some(Instant::now() + self.delay);
        }
    }

    pub fn page_finished(&mut self) {
        if self.mode == PacingMode::FixedDelay {
            self.next_allowed = Some(Instant::now() + self.delay);
        }
    }
}
