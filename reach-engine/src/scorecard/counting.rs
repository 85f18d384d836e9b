//! Scorecard that counts tasks per location instead of keeping paths.

use std::collections::HashMap;

use crate::domain::{LocationKey, MovementPath, PointLocation, TaskId};
use crate::store::StoreError;

use super::shards::ShardedMap;
use super::{PathSummary, ScoreCard};

/// Keeps a [`PathSummary`] per (location, task) for dominance, and answers
/// how many tasks reached each location.
///
/// Paths whose summaries tie are treated as equal, so the second one is not
/// admitted.
pub struct CountingScoreCard {
    summaries: ShardedMap<(LocationKey, TaskId), PathSummary>,
}

impl CountingScoreCard {
    pub fn new() -> Self {
        Self {
            summaries: ShardedMap::new(),
        }
    }

    /// Number of distinct tasks that reached `location`.
    pub fn task_count(&self, location: &LocationKey) -> usize {
        self.summaries
            .collect(|(loc, _), _| (loc == location).then_some(()))
            .len()
    }

    /// Task counts for every reached location.
    pub fn counts(&self) -> HashMap<LocationKey, usize> {
        let mut out: HashMap<LocationKey, usize> = HashMap::new();
        for loc in self.summaries.collect(|(loc, _), _| Some(loc.clone())) {
            *out.entry(loc).or_default() += 1;
        }
        out
    }
}

impl Default for CountingScoreCard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCard for CountingScoreCard {
    fn has_no_better_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> bool {
        let candidate = PathSummary::from(candidate);
        self.summaries
            .read(&(location.key(), task), |stored| stored.is_none_or(|s| candidate < *s))
    }

    fn put_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        path: &MovementPath,
    ) -> Result<(), StoreError> {
        self.summaries
            .insert((location.key(), task), PathSummary::from(path));
        Ok(())
    }

    fn try_improve(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> Result<bool, StoreError> {
        let candidate = PathSummary::from(candidate);
        Ok(self
            .summaries
            .update((location.key(), task), candidate, |s| candidate < *s))
    }

    fn best_path(&self, _location: &PointLocation, _task: TaskId) -> Option<MovementPath> {
        None
    }

    fn locations_reached(&self, task: TaskId) -> Vec<LocationKey> {
        let mut out = self
            .summaries
            .collect(|(loc, t), _| (*t == task).then(|| loc.clone()));
        out.sort();
        out
    }
}
