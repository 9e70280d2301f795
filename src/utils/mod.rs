use std::time::{Duration, Instant};
use tracing::info;

/// Logs when a phase starts and, on drop, how long it ran.
pub struct Timer {
    phase: String,
    started: Instant,
}

impl Timer {
    pub fn start(phase: impl Into<String>) -> Self {
        let phase = phase.into();
        info!("Starting {}", phase);
        Self {
            phase,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("{} finished in {:.1?}", self.phase, self.elapsed());
    }
}
