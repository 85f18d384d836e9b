//! Sector reach persisted for batch scoring.
//!
//! Every sector a task reaches is written as
//!
//! ```text
//! reach|<sector>|<task start, %Y%m%dT%H%M%S>|<center>  ->  "<elapsed seconds>"
//! ```
//!
//! so all centers reaching a sector within a range of start times is one
//! range scan. Rewrites for a better path overwrite the same key.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::domain::{LocationKey, MovementPath, PointLocation, ReachTime, Sector, TaskId};
use crate::store::{KeyValueStore, StoreError, join_key, prefix_range};

use super::{CountingScoreCard, ScoreCard};

const REACH_PREFIX: &str = "reach";
const TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// One stored sector reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorReach {
    pub start_time: ReachTime,
    pub center: String,
    pub elapsed_secs: i64,
}

/// Writes sector reach to a key-value store; gates dominance in memory.
pub struct PersistentScoreCard {
    gate: CountingScoreCard,
    store: Arc<dyn KeyValueStore>,
}

impl PersistentScoreCard {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            gate: CountingScoreCard::new(),
            store,
        }
    }

    fn sector_key(sector: &Sector) -> String {
        LocationKey::Sector(sector.id()).to_string()
    }

    fn write(&self, location: &PointLocation, path: &MovementPath) -> Result<(), StoreError> {
        let PointLocation::Sector(sector) = location else {
            return Ok(());
        };
        let time = path.start_time().to_datetime().format(TIME_FORMAT).to_string();
        let key = join_key(&[
            REACH_PREFIX,
            &Self::sector_key(sector),
            &time,
            &path.origin().to_string(),
        ]);
        self.store.put(&key, &path.elapsed().num_seconds().to_string())
    }

    /// Centers that reached `sector` from tasks starting in `[from, to]`,
    /// ordered by start time then center.
    pub fn reached_between(
        &self,
        sector: &Sector,
        from: ReachTime,
        to: ReachTime,
    ) -> Result<Vec<SectorReach>, StoreError> {
        let sector_key = Self::sector_key(sector);
        let from_s = from.to_datetime().format(TIME_FORMAT).to_string();
        let to_s = to.to_datetime().format(TIME_FORMAT).to_string();
        let min = join_key(&[REACH_PREFIX, &sector_key, &from_s]);
        let (_, max) = prefix_range(&join_key(&[REACH_PREFIX, &sector_key, &to_s]));

        let mut out = Vec::new();
        for (key, value) in self.store.values_in_range(&min, &max)? {
            let corrupt = |message: String| StoreError::Corrupt {
                key: key.clone(),
                message,
            };
            let mut parts = key.rsplitn(3, '|');
            let (Some(center), Some(time)) = (parts.next(), parts.next()) else {
                return Err(corrupt("missing components".to_string()));
            };
            let start = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
                .map_err(|e| corrupt(e.to_string()))?;
            let elapsed_secs = value.parse::<i64>().map_err(|e| corrupt(e.to_string()))?;
            out.push(SectorReach {
                start_time: ReachTime::from_datetime(start),
                center: center.to_string(),
                elapsed_secs,
            });
        }
        Ok(out)
    }
}

impl ScoreCard for PersistentScoreCard {
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
        self.write(location, path)
    }

    fn try_improve(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> Result<bool, StoreError> {
        if !self.gate.try_improve(location, task, candidate)? {
            return Ok(false);
        }
        self.write(location, candidate)?;
        Ok(true)
    }

    fn best_path(&self, _location: &PointLocation, _task: TaskId) -> Option<MovementPath> {
        None
    }

    fn locations_reached(&self, task: TaskId) -> Vec<LocationKey> {
        self.gate.locations_reached(task)
    }
}
