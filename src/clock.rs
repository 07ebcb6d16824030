//! Restartable monotonic timer, one instance per scheduler channel.

use std::time::{Duration, Instant};

/// Measures elapsed time since the last restart.
///
/// Each scheduler channel owns exactly one clock; the two clocks of a session
/// are never shared or cross-read. The clock starts running at construction.
#[derive(Debug, Clone)]
pub struct ChannelClock {
    origin: Instant,
}

impl Default for ChannelClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelClock {
    /// Create a clock with zero elapsed time.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Reset elapsed time to zero.
    pub fn restart(&mut self) {
        self.origin = Instant::now();
    }

    /// Time elapsed since the last restart.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Elapsed time in whole milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }
}
