//! Reachability tasks and search direction.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{PointLocation, ReachTime};

/// Identifier of one reachability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Which way the search moves through time.
///
/// Forward searches answer "where can I get to by the cutoff"; backward
/// searches answer "where could I have started to be here by the start
/// time", and walk the schedule in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    /// Cutoff for a search starting at `start` with a time budget.
    pub fn cutoff(self, start: ReachTime, budget: Duration) -> ReachTime {
        match self {
            SearchDirection::Forward => start.saturating_add(budget),
            SearchDirection::Backward => start.saturating_sub(budget),
        }
    }

    /// Move `time` by `duration` in the search direction.
    pub fn advance(self, time: ReachTime, duration: Duration) -> ReachTime {
        match self {
            SearchDirection::Forward => time.saturating_add(duration),
            SearchDirection::Backward => time.saturating_sub(duration),
        }
    }

    /// Whether `time` is still inside the cutoff (inclusive).
    pub fn within(self, time: ReachTime, cutoff: ReachTime) -> bool {
        match self {
            SearchDirection::Forward => time <= cutoff,
            SearchDirection::Backward => time >= cutoff,
        }
    }

    /// Whether `later` is not before `earlier` in search order.
    pub fn is_ordered(self, earlier: ReachTime, later: ReachTime) -> bool {
        match self {
            SearchDirection::Forward => earlier <= later,
            SearchDirection::Backward => earlier >= later,
        }
    }

    /// Remaining budget from `current` to `cutoff`, never negative.
    pub fn remaining(self, current: ReachTime, cutoff: ReachTime) -> Duration {
        let remaining = match self {
            SearchDirection::Forward => cutoff.signed_duration_since(current),
            SearchDirection::Backward => current.signed_duration_since(cutoff),
        };
        remaining.max(Duration::zero())
    }
}

/// One (origin, start time) query.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub origin: PointLocation,
    pub start_time: ReachTime,
}

impl Task {
    pub fn new(id: TaskId, origin: PointLocation, start_time: ReachTime) -> Self {
        Self {
            id,
            origin,
            start_time,
        }
    }
}
