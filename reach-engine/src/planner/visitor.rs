//! Walk and ride expansion of one reachability task.
//!
//! A [`SearchContext`] owns everything a task's visitors share: the task,
//! its cutoff, the providers and the score card. `arrive` dispatches on the
//! location kind:
//!
//! - sectors and grid points are terminal
//! - landmarks take the walk step
//! - stops take the walk step and then the ride step
//!
//! Every continuation passes the score card's atomic improvement check
//! before it is forked, so a location is only re-expanded when a strictly
//! better path to it turns up.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::distance::WalkingCostProvider;
use crate::domain::{
    MovementKind, MovementPath, PointLocation, ReachTime, TaskId, TransitRideMovement,
    TransitStop, WalkMovement,
};
use crate::error::ReachError;
use crate::schedule::{ScheduleProvider, rider_for};
use crate::scorecard::ScoreCard;

use super::TaskStats;
use super::allocator::{Job, WorkAllocator};
use super::config::SearchConfig;

#[derive(Debug, Default)]
struct Counters {
    visits: AtomicU64,
    forks: AtomicU64,
    walk_queries: AtomicU64,
    rides_boarded: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> TaskStats {
        TaskStats {
            visits: self.visits.load(Ordering::Relaxed),
            forks: self.forks.load(Ordering::Relaxed),
            walk_queries: self.walk_queries.load(Ordering::Relaxed),
            rides_boarded: self.rides_boarded.load(Ordering::Relaxed),
        }
    }
}

/// Shared state of every visitor working on one task.
pub(crate) struct SearchContext<'a> {
    task: TaskId,
    cutoff: ReachTime,
    config: &'a SearchConfig,
    walking: &'a dyn WalkingCostProvider,
    schedule: &'a dyn ScheduleProvider,
    scorecard: &'a dyn ScoreCard,
    allocator: &'a dyn WorkAllocator,
    counters: Counters,
}

impl<'a> SearchContext<'a> {
    pub(crate) fn new(
        task: TaskId,
        cutoff: ReachTime,
        config: &'a SearchConfig,
        walking: &'a dyn WalkingCostProvider,
        schedule: &'a dyn ScheduleProvider,
        scorecard: &'a dyn ScoreCard,
        allocator: &'a dyn WorkAllocator,
    ) -> Self {
        Self {
            task,
            cutoff,
            config,
            walking,
            schedule,
            scorecard,
            allocator,
            counters: Counters::default(),
        }
    }

    pub(crate) fn stats(&self) -> TaskStats {
        self.counters.snapshot()
    }

    /// Record `path` at `location` if it beats what is stored there.
    ///
    /// A stop or landmark that takes the path also offers it to its sector.
    pub(crate) fn admit(
        &self,
        location: &PointLocation,
        path: &MovementPath,
    ) -> Result<bool, ReachError> {
        if !self.scorecard.try_improve(location, self.task, path)? {
            return Ok(false);
        }
        if let PointLocation::Stop(_) | PointLocation::Landmark(_) = location
            && let Some(sector) = location.sector()
        {
            self.visit_sector(&PointLocation::Sector(sector), path)?;
        }
        Ok(true)
    }

    fn visit_sector(&self, sector: &PointLocation, path: &MovementPath) -> Result<(), ReachError> {
        if self.scorecard.try_improve(sector, self.task, path)? {
            trace!(task = %self.task, sector = %sector, elapsed = path.elapsed().num_seconds(), "Sector improved");
        }
        Ok(())
    }

    /// Expand an admitted path that ends at `location`.
    pub(crate) fn arrive(
        &self,
        location: &PointLocation,
        path: &MovementPath,
        depth: usize,
    ) -> Result<(), ReachError> {
        self.allocator.interrupt_handle().check()?;
        Counters::bump(&self.counters.visits, 1);

        trace!(
            task = %self.task,
            location = %location,
            depth,
            time = %path.end_time(),
            "Visiting"
        );

        match location {
            PointLocation::Sector(_) | PointLocation::Grid(_) => Ok(()),
            PointLocation::Landmark(_) => self.walk_step(location, path, depth),
            PointLocation::Stop(stop) => {
                self.walk_step(location, path, depth)?;
                self.ride_step(stop, path, depth)
            }
        }
    }

    fn walk_step(
        &self,
        location: &PointLocation,
        path: &MovementPath,
        depth: usize,
    ) -> Result<(), ReachError> {
        if depth >= self.config.max_depth || path.last_kind() == Some(MovementKind::Walk) {
            return Ok(());
        }

        let direction = self.config.direction;
        let current = path.end_time();
        let costs = self
            .walking
            .get_walking_costs(location, current, self.cutoff)?;
        Counters::bump(&self.counters.walk_queries, 1);

        let mut destinations: Vec<_> = costs.into_iter().collect();
        destinations.sort_by(|a, b| a.0.cmp(&b.0));

        let mut jobs = Vec::new();
        for (destination, costs) in destinations {
            if destination == *location {
                continue;
            }
            let end = direction.advance(current, costs.duration());
            if !direction.within(end, self.cutoff) {
                continue;
            }
            let walk = WalkMovement {
                from: location.key(),
                to: destination.key(),
                start: current,
                end,
                costs,
            };
            let next = path.append(walk.into())?;
            if self.admit(&destination, &next)? {
                jobs.push(self.fork(destination, next, depth + 1));
            }
        }
        self.run(jobs)
    }

    fn ride_step(
        &self,
        stop: &TransitStop,
        path: &MovementPath,
        depth: usize,
    ) -> Result<(), ReachError> {
        if depth >= self.config.max_depth {
            return Ok(());
        }

        let direction = self.config.direction;
        let entries =
            self.schedule
                .entry_points(&stop.id, path.end_time(), self.cutoff, direction)?;

        let mut jobs = Vec::new();
        for entry in entries {
            if path.last_trip() == Some(entry.trip_id()) {
                continue;
            }
            Counters::bump(&self.counters.rides_boarded, 1);

            let mut rider = rider_for(direction, &entry, self.cutoff);
            while let Some(status) = rider.continue_trip() {
                let alight = self.schedule.stop(&status.stop)?;
                let ride = TransitRideMovement {
                    trip: entry.trip_id().clone(),
                    from: stop.id.clone(),
                    to: status.stop,
                    start: entry.time,
                    end: status.time,
                };
                let next = path.append(ride.into())?;
                let destination = PointLocation::Stop(alight);
                if self.admit(&destination, &next)? {
                    jobs.push(self.fork(destination, next, depth + 1));
                }
            }
        }
        self.run(jobs)
    }

    fn fork<'s>(&'s self, location: PointLocation, path: MovementPath, depth: usize) -> Job<'s> {
        Box::new(move || self.arrive(&location, &path, depth))
    }

    fn run(&self, jobs: Vec<Job<'_>>) -> Result<(), ReachError> {
        if jobs.is_empty() {
            return Ok(());
        }
        Counters::bump(&self.counters.forks, jobs.len() as u64);
        self.allocator.run_all(jobs)
    }
}

#[cfg(test)]
#[path = "visitor_tests.rs"]
mod tests;
