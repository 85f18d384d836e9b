//! Sector reach by logical center.

use std::collections::BTreeSet;

use crate::domain::{LocationKey, MovementPath, PointLocation, SectorId, TaskId};
use crate::store::StoreError;

use super::shards::ShardedMap;
use super::{CountingScoreCard, ScoreCard};

/// Records which origins ("centers") reached each sector.
///
/// Several tasks from the same origin at different start times share one
/// center. Dominance is still decided per task through an inner
/// [`CountingScoreCard`], so the search explores exactly what it would with
/// a full scorecard.
pub struct SectorCenterScoreCard {
    gate: CountingScoreCard,
    centers: ShardedMap<SectorId, BTreeSet<LocationKey>>,
}

impl SectorCenterScoreCard {
    pub fn new() -> Self {
        Self {
            gate: CountingScoreCard::new(),
            centers: ShardedMap::new(),
        }
    }

    /// Centers that reached `sector`, sorted.
    pub fn centers_reaching(&self, sector: SectorId) -> Vec<LocationKey> {
        self.centers.read(&sector, |set| {
            set.map(|s| s.iter().cloned().collect()).unwrap_or_default()
        })
    }

    /// Number of sectors reached by at least one center.
    pub fn sector_count(&self) -> usize {
        self.centers.len()
    }

    fn record_center(&self, location: &PointLocation, path: &MovementPath) {
        if let PointLocation::Sector(sector) = location {
            self.centers.modify(sector.id(), |set| {
                set.insert(path.origin().clone());
            });
        }
    }
}

impl Default for SectorCenterScoreCard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreCard for SectorCenterScoreCard {
    fn has_no_better_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> bool {
        self.gate.has_no_better_path(location, task, candidate)
    }

    fn put_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        path: &MovementPath,
    ) -> Result<(), StoreError> {
        self.gate.put_path(location, task, path)?;
        self.record_center(location, path);
        Ok(())
    }

    fn try_improve(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> Result<bool, StoreError> {
        let improved = self.gate.try_improve(location, task, candidate)?;
        if improved {
            self.record_center(location, candidate);
        }
        Ok(improved)
    }

    fn best_path(&self, _location: &PointLocation, _task: TaskId) -> Option<MovementPath> {
        None
    }

    fn locations_reached(&self, task: TaskId) -> Vec<LocationKey> {
        self.gate.locations_reached(task)
    }
}
