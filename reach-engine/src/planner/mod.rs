//! Reachability planner using fork/join expansion.
//!
//! This module answers "from this origin at this time, which locations can
//! be reached before the cutoff, and by which best path?" A task starts at
//! its origin with an empty path and expands by walking and riding. Each
//! improving step is forked through a [`WorkAllocator`] and joined before
//! the parent step returns.

mod allocator;
mod config;
mod visitor;

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::distance::WalkingCostProvider;
use crate::domain::{MovementPath, Task, TaskId};
use crate::error::ReachError;
use crate::schedule::ScheduleProvider;
use crate::scorecard::ScoreCard;

pub use allocator::{ForkJoinAllocator, InterruptHandle, Job, SerialAllocator, WorkAllocator};
pub use config::SearchConfig;

use visitor::SearchContext;

/// Counters collected while running one task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// Visitor invocations, including pruned ones.
    pub visits: u64,
    /// Continuations handed to the allocator.
    pub forks: u64,
    pub walk_queries: u64,
    pub rides_boarded: u64,
}

/// Runs reachability tasks against shared providers and a score card.
pub struct ReachPlanner<'a> {
    config: &'a SearchConfig,
    walking: &'a dyn WalkingCostProvider,
    schedule: &'a dyn ScheduleProvider,
    scorecard: &'a dyn ScoreCard,
    allocator: &'a dyn WorkAllocator,
}

impl<'a> ReachPlanner<'a> {
    pub fn new(
        config: &'a SearchConfig,
        walking: &'a dyn WalkingCostProvider,
        schedule: &'a dyn ScheduleProvider,
        scorecard: &'a dyn ScoreCard,
        allocator: &'a dyn WorkAllocator,
    ) -> Self {
        Self {
            config,
            walking,
            schedule,
            scorecard,
            allocator,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        self.config
    }

    /// Run one task to completion.
    ///
    /// Best paths are written to the score card as they are found; on error
    /// the score card holds whatever had been recorded before the failure.
    pub fn run_task(&self, task: &Task) -> Result<TaskStats, ReachError> {
        let cutoff = self.config.cutoff(task.start_time);
        let ctx = SearchContext::new(
            task.id,
            cutoff,
            self.config,
            self.walking,
            self.schedule,
            self.scorecard,
            self.allocator,
        );

        let start = MovementPath::empty(task.origin.key(), task.start_time, self.config.direction);
        ctx.admit(&task.origin, &start)?;
        ctx.arrive(&task.origin, &start, 0)?;

        let stats = ctx.stats();
        debug!(
            task = %task.id,
            origin = %task.origin,
            start = %task.start_time,
            cutoff = %cutoff,
            visits = stats.visits,
            forks = stats.forks,
            walk_queries = stats.walk_queries,
            rides_boarded = stats.rides_boarded,
            "Reachability task complete"
        );
        Ok(stats)
    }

    /// Run independent tasks through the allocator.
    ///
    /// A failing task reports its own error and does not stop the others.
    /// Tasks that never started because the allocator was interrupted
    /// report [`ReachError::Interrupted`]. Results are in input order.
    pub fn run_batch(&self, tasks: &[Task]) -> Vec<(TaskId, Result<TaskStats, ReachError>)> {
        let slots: Vec<Mutex<Option<Result<TaskStats, ReachError>>>> =
            tasks.iter().map(|_| Mutex::new(None)).collect();

        let jobs: Vec<Job<'_>> = tasks
            .iter()
            .zip(&slots)
            .map(|(task, slot)| {
                Box::new(move || {
                    let result = self.run_task(task);
                    if let Err(err) = &result {
                        warn!(task = %task.id, error = %err, fatal = err.is_fatal(), "Reachability task failed");
                    }
                    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                    Ok(())
                }) as Job<'_>
            })
            .collect();

        if let Err(err) = self.allocator.run_all(jobs) {
            warn!(error = %err, "Batch stopped early");
        }

        tasks
            .iter()
            .zip(slots)
            .map(|(task, slot)| {
                let result = slot
                    .into_inner()
                    .unwrap_or_else(PoisonError::into_inner)
                    .unwrap_or(Err(ReachError::Interrupted));
                (task.id, result)
            })
            .collect()
    }
}
