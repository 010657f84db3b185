use std::thread;
use std::time::Duration;
use rand::Rng;
use log::{debug, info};

/// Fixed pause before every listing request, optionally widened by random jitter.
#[derive(Debug, Clone)]
pub struct Pacer {
    delay: Duration,
    jitter: Duration,
    before_first: bool,
}

impl Pacer {
    pub fn new(delay: Duration, jitter: Duration, before_first: bool) -> Self {
        Pacer { delay, jitter, before_first }
    }

    /// A pacer that never sleeps.
    pub fn none() -> Self {
        Pacer::new(Duration::ZERO, Duration::ZERO, false)
    }

    /// How long to wait before fetching `page` (1-based).
    pub fn delay_for(&self, page: u32) -> Duration {
        if page <= 1 && !self.before_first {
            return Duration::ZERO;
        }
        let extra = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let mut rng = rand::thread_rng();
            Duration::from_millis(rng.gen_range(0..=self.jitter.as_millis() as u64))
        };
        self.delay.saturating_add(extra)
    }

    pub fn wait(&self, page: u32) {
        let pause = self.delay_for(page);
        if pause.is_zero() {
            debug!("No delay before page {}", page);
            return;
        }
        info!("Waiting for {:.1} seconds before page {}...", pause.as_secs_f64(), page);
        thread::sleep(pause);
    }
}
