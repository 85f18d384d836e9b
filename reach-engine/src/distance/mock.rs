//! Test doubles for the distance layers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;

use crate::domain::{
    Bounds, GeoPoint, Landmark, LandmarkId, LocationKey, PointLocation, ReachTime, Sector, StopId,
    TransitStop, WalkingCosts,
};

use super::{CostMap, DistanceClient, DistanceError, WalkingCostProvider};

pub(crate) fn test_sector() -> Sector {
    Sector::new(Bounds::from_corners(
        GeoPoint::new(-90.0, -180.0),
        GeoPoint::new(90.0, 180.0),
    ))
}

pub(crate) fn stop_at(id: &str, point: GeoPoint) -> PointLocation {
    PointLocation::Stop(Arc::new(TransitStop::new(
        StopId::parse(id).unwrap(),
        id,
        point,
        test_sector(),
    )))
}

pub(crate) fn landmark(id: &str, point: GeoPoint) -> PointLocation {
    PointLocation::Landmark(Arc::new(Landmark::new(
        LandmarkId::parse(id).unwrap(),
        id,
        point,
        test_sector(),
    )))
}

/// Exact client serving a fixed table, counting calls.
pub(crate) struct MockDistanceClient {
    table: HashMap<(LocationKey, LocationKey), WalkingCosts>,
    pub(crate) call_count: Mutex<usize>,
    pub(crate) pairs_requested: Mutex<usize>,
    fail: bool,
}

impl MockDistanceClient {
    pub(crate) fn new() -> Self {
        Self {
            table: HashMap::new(),
            call_count: Mutex::new(0),
            pairs_requested: Mutex::new(0),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub(crate) fn add(&mut self, from: &PointLocation, to: &PointLocation, secs: i64, metres: u32) {
        self.table.insert(
            (from.key(), to.key()),
            WalkingCosts::new(Duration::seconds(secs), Some(metres)),
        );
    }

    pub(crate) fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub(crate) fn pairs(&self) -> usize {
        *self.pairs_requested.lock().unwrap()
    }
}

impl DistanceClient for MockDistanceClient {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError> {
        *self.call_count.lock().unwrap() += 1;
        *self.pairs_requested.lock().unwrap() += destinations.len();
        if self.fail {
            return Err(DistanceError::Status {
                code: "NoTable".into(),
                message: "mock failure".into(),
            });
        }
        let origin_key = origin.key();
        Ok(destinations
            .iter()
            .filter_map(|d| {
                self.table
                    .get(&(origin_key.clone(), d.key()))
                    .map(|c| (d.clone(), *c))
            })
            .collect())
    }
}

/// Walking provider serving a fixed table, applying the inclusive budget
/// rule, counting queries.
pub(crate) struct MockWalkingProvider {
    table: HashMap<LocationKey, Vec<(PointLocation, WalkingCosts)>>,
    pub(crate) call_count: Mutex<usize>,
    fail_at: Option<LocationKey>,
}

impl MockWalkingProvider {
    pub(crate) fn new() -> Self {
        Self {
            table: HashMap::new(),
            call_count: Mutex::new(0),
            fail_at: None,
        }
    }

    pub(crate) fn add(&mut self, from: &PointLocation, to: &PointLocation, secs: i64, metres: u32) {
        self.table.entry(from.key()).or_default().push((
            to.clone(),
            WalkingCosts::new(Duration::seconds(secs), Some(metres)),
        ));
    }

    pub(crate) fn fail_at(&mut self, at: &PointLocation) {
        self.fail_at = Some(at.key());
    }

    pub(crate) fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl WalkingCostProvider for MockWalkingProvider {
    fn get_walking_costs(
        &self,
        origin: &PointLocation,
        current: ReachTime,
        cutoff: ReachTime,
    ) -> Result<CostMap, DistanceError> {
        *self.call_count.lock().unwrap() += 1;
        if self.fail_at.as_ref() == Some(&origin.key()) {
            return Err(DistanceError::Status {
                code: "NoTable".into(),
                message: "mock failure".into(),
            });
        }
        let budget = current.abs_diff(cutoff);
        Ok(self
            .table
            .get(&origin.key())
            .map(|dests| {
                dests
                    .iter()
                    .filter(|(_, c)| c.fits_within(budget))
                    .map(|(d, c)| (d.clone(), *c))
                    .collect()
            })
            .unwrap_or_default())
    }
}
