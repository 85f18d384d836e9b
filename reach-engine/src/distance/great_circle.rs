//! Straight-line distance sources.

use tracing::trace;

use crate::domain::PointLocation;

use super::{CostMap, DistanceClient, DistanceError, DistanceEstimator, WalkingConfig};

/// Exact client that walks in straight lines at a constant pace.
///
/// Useful offline and in tests. Every destination is reachable.
#[derive(Debug, Clone, Default)]
pub struct GreatCircleDistanceClient {
    walking: WalkingConfig,
}

impl GreatCircleDistanceClient {
    pub fn new(walking: WalkingConfig) -> Self {
        Self { walking }
    }
}

impl DistanceClient for GreatCircleDistanceClient {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError> {
        let from = origin.point();
        let mut out = CostMap::with_capacity(destinations.len());
        for dest in destinations {
            if let Some(costs) = self.walking.walking_costs(from.distance_m(&dest.point())) {
                out.insert(dest.clone(), costs);
            }
        }
        Ok(out)
    }
}

/// Estimator over a fixed candidate set by great-circle distance.
///
/// A straight line is never longer than a street route, so this is a safe
/// lower bound for pruning.
#[derive(Debug, Clone)]
pub struct GreatCircleEstimator {
    candidates: Vec<PointLocation>,
}

impl GreatCircleEstimator {
    pub fn new(candidates: impl IntoIterator<Item = PointLocation>) -> Self {
        Self {
            candidates: candidates.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl DistanceEstimator for GreatCircleEstimator {
    fn estimate(
        &self,
        origin: &PointLocation,
        max_distance_m: f64,
    ) -> Result<Vec<(PointLocation, f64)>, DistanceError> {
        let from = origin.point();
        let origin_key = origin.key();
        let mut found: Vec<(PointLocation, f64)> = self
            .candidates
            .iter()
            .filter(|c| c.key() != origin_key)
            .map(|c| (c.clone(), from.distance_m(&c.point())))
            .filter(|(_, d)| *d <= max_distance_m)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        trace!(origin = %origin_key, radius_m = max_distance_m, candidates = found.len(), "Estimated distances");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::mock::{landmark, stop_at};
    use crate::domain::GeoPoint;

    #[test]
    fn estimator_excludes_origin_and_far_points() {
        let origin = landmark("L", GeoPoint::new(51.5, -0.1));
        let near = stop_at("S1", GeoPoint::new(51.501, -0.1));
        let far = stop_at("S2", GeoPoint::new(51.6, -0.1));
        let estimator = GreatCircleEstimator::new(vec![origin.clone(), near.clone(), far]);

        let found = estimator.estimate(&origin, 500.0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, near);
        assert!((found[0].1 - 111.2).abs() < 1.0);
    }

    #[test]
    fn estimates_are_nearest_first() {
        let origin = landmark("L", GeoPoint::new(0.0, 0.0));
        let a = stop_at("A", GeoPoint::new(0.002, 0.0));
        let b = stop_at("B", GeoPoint::new(0.001, 0.0));
        let estimator = GreatCircleEstimator::new(vec![a.clone(), b.clone()]);
        let found = estimator.estimate(&origin, 1_000.0).unwrap();
        let order: Vec<_> = found.into_iter().map(|(l, _)| l).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn client_uses_walking_pace() {
        let client = GreatCircleDistanceClient::new(WalkingConfig::new(1.0, 10_000.0));
        let origin = landmark("L", GeoPoint::new(0.0, 0.0));
        let dest = stop_at("S", GeoPoint::new(0.001, 0.0));
        let costs = client.walking_costs(&origin, &[dest.clone()]).unwrap();
        let c = costs[&dest];
        // ~111m at 1 m/s
        assert_eq!(c.duration().num_seconds(), 112);
        assert_eq!(c.distance_m(), Some(111));
    }
}
