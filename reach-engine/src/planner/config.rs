//! Search configuration for the reachability planner.

use chrono::Duration;
use serde::Deserialize;

use crate::domain::{ReachTime, SearchDirection};

/// Configuration parameters for reachability search.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of movements in a path.
    pub max_depth: usize,

    /// Time budget from the task start (seconds).
    pub max_duration_secs: i64,

    /// Forward ("where can I get to") or backward ("where could I have
    /// come from").
    pub direction: SearchDirection,

    /// Worker threads for the fork-join allocator. `None` uses the global
    /// rayon pool.
    pub threads: Option<usize>,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(max_depth: usize, max_duration_secs: i64, direction: SearchDirection) -> Self {
        Self {
            max_depth,
            max_duration_secs,
            direction,
            threads: None,
        }
    }

    /// The time budget, or `None` if `max_duration_secs` is negative or too
    /// large for a Duration.
    pub fn checked_max_duration(&self) -> Option<Duration> {
        Duration::try_seconds(self.max_duration_secs).filter(|d| *d >= Duration::zero())
    }

    /// Returns the time budget as a Duration, clamped to `[0, Duration::MAX]`.
    pub fn max_duration(&self) -> Duration {
        self.checked_max_duration().unwrap_or(if self.max_duration_secs < 0 {
            Duration::zero()
        } else {
            Duration::MAX
        })
    }

    /// Cutoff for a task starting at `start`.
    pub fn cutoff(&self, start: ReachTime) -> ReachTime {
        self.direction.cutoff(start, self.max_duration())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_duration_secs: 3600, // 1 hour
            direction: SearchDirection::Forward,
            threads: None,
        }
    }
}
