//! Full-fidelity scorecard.

use crate::domain::{LocationKey, MovementPath, PointLocation, TaskId};
use crate::store::StoreError;

use super::ScoreCard;
use super::shards::ShardedMap;

/// Keeps the best [`MovementPath`] for every (location, task).
///
/// Exact ties cannot occur: distinct paths never compare equal, so the
/// ordering alone picks a single winner.
pub struct PathScoreCard {
    paths: ShardedMap<(LocationKey, TaskId), MovementPath>,
}

impl PathScoreCard {
    pub fn new() -> Self {
        Self {
            paths: ShardedMap::new(),
        }
    }

    /// All best paths recorded for `task`, sorted by location.
    pub fn paths_for_task(&self, task: TaskId) -> Vec<(LocationKey, MovementPath)> {
        let mut out = self
            .paths
            .collect(|(loc, t), path| (*t == task).then(|| (loc.clone(), path.clone())));
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Number of (location, task) records.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PathScoreCard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCard for PathScoreCard {
    fn has_no_better_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> bool {
        self.paths.read(&(location.key(), task), |stored| {
            stored.is_none_or(|stored| candidate.is_better_than(stored))
        })
    }

    fn put_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        path: &MovementPath,
    ) -> Result<(), StoreError> {
        self.paths.insert((location.key(), task), path.clone());
        Ok(())
    }

    fn try_improve(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> Result<bool, StoreError> {
        Ok(self
            .paths
            .update((location.key(), task), candidate.clone(), |stored| {
                candidate.is_better_than(stored)
            }))
    }

    fn best_path(&self, location: &PointLocation, task: TaskId) -> Option<MovementPath> {
        self.paths.read(&(location.key(), task), |stored| stored.cloned())
    }

    fn locations_reached(&self, task: TaskId) -> Vec<LocationKey> {
        let mut out = self
            .paths
            .collect(|(loc, t), _| (*t == task).then(|| loc.clone()));
        out.sort();
        out
    }
}
