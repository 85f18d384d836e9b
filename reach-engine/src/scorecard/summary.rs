//! Compact stand-in for a full path.

use chrono::Duration;

use crate::domain::MovementPath;

/// The leading comparison keys of a path, without the movements.
///
/// Orders the same way as [`MovementPath`] up to its final tie-break, so
/// `a < b` on summaries implies `a` is the better path. Paths with equal
/// summaries are treated as equally good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSummary {
    pub elapsed: Duration,
    pub walking_m: u64,
    pub moving: Duration,
    pub movements: usize,
}

impl From<&MovementPath> for PathSummary {
    fn from(path: &MovementPath) -> Self {
        Self {
            elapsed: path.elapsed(),
            walking_m: path.walking_distance_m(),
            moving: path.total_duration(),
            movements: path.len(),
        }
    }
}
