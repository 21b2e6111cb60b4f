//! Runtime settings shared by the scheduler and the frontend.

use std::time::Duration;

use serde::Deserialize;

/// Pacing and mailbox sizing for a [`MachineHandle`](crate::core::MachineHandle).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Wall-clock length of one tick.
    pub tick_interval_ms: u64,
    /// Control messages that may queue before senders block.
    pub mailbox_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            mailbox_capacity: 16,
        }
    }
}

impl SchedulerConfig {
    /// Tick interval, never shorter than one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
