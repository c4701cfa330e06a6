use std::time::Duration;

use serde::{Deserialize, Serialize};

use routinely_scheduler::MAX_ROUTINES;

/// Default tick rate (50ms = 20Hz)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of routine slots (default: 1024)
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Milliseconds between calls to process() (default: 50)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Create routines quiet unless they say otherwise
    #[serde(default)]
    pub silenced: bool,

    /// Create routines persistent unless they say otherwise
    #[serde(default)]
    pub persistent: bool,
}

fn default_capacity() -> usize {
    MAX_ROUTINES
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_ROUTINES,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            silenced: false,
            persistent: false,
        }
    }
}

impl SchedulerConfig {
    /// Tick period for the driver; never zero
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
