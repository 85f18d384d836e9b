//! Estimate-then-refine walking provider.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{PointLocation, ReachTime};

use super::{
    CostMap, DistanceClient, DistanceError, DistanceEstimator, WalkingConfig, WalkingCostProvider,
};

/// Prunes candidates with a cheap estimator before asking the exact client.
///
/// Only candidates whose estimated distance fits inside the walkable radius
/// for the remaining time are sent on. Exact results are filtered again
/// against the time budget (inclusive).
pub struct EstimateRefiningProvider {
    estimator: Arc<dyn DistanceEstimator>,
    client: Arc<dyn DistanceClient>,
    walking: WalkingConfig,
}

impl EstimateRefiningProvider {
    pub fn new(
        estimator: Arc<dyn DistanceEstimator>,
        client: Arc<dyn DistanceClient>,
        walking: WalkingConfig,
    ) -> Self {
        Self {
            estimator,
            client,
            walking,
        }
    }
}

impl WalkingCostProvider for EstimateRefiningProvider {
    fn get_walking_costs(
        &self,
        origin: &PointLocation,
        current: ReachTime,
        cutoff: ReachTime,
    ) -> Result<CostMap, DistanceError> {
        let budget = current.abs_diff(cutoff);
        let radius = self.walking.max_distance_for(budget);

        let origin_key = origin.key();
        let candidates: Vec<PointLocation> = self
            .estimator
            .estimate(origin, radius)?
            .into_iter()
            .map(|(location, _)| location)
            .filter(|location| location.key() != origin_key)
            .collect();
        if candidates.is_empty() {
            return Ok(CostMap::new());
        }

        let mut costs = self.client.walking_costs(origin, &candidates)?;
        costs.retain(|_, c| c.fits_within(budget));

        debug!(
            origin = %origin_key,
            radius_m = radius,
            candidates = candidates.len(),
            reachable = costs.len(),
            "Refined walking estimates"
        );
        Ok(costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::GreatCircleEstimator;
    use crate::distance::mock::{MockDistanceClient, landmark, stop_at};
    use crate::domain::GeoPoint;
    use chrono::{Duration, NaiveDate};

    fn time(s: &str) -> ReachTime {
        ReachTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    struct Fixture {
        origin: PointLocation,
        at_budget: PointLocation,
        over_budget: PointLocation,
        far: PointLocation,
    }

    fn fixture() -> Fixture {
        Fixture {
            origin: landmark("L", GeoPoint::new(0.0, 0.0)),
            at_budget: stop_at("S1", GeoPoint::new(0.001, 0.0)),
            over_budget: stop_at("S2", GeoPoint::new(0.0, 0.002)),
            far: stop_at("S3", GeoPoint::new(1.0, 1.0)),
        }
    }

    fn provider(f: &Fixture, client: Arc<MockDistanceClient>) -> EstimateRefiningProvider {
        let estimator = GreatCircleEstimator::new(vec![
            f.origin.clone(),
            f.at_budget.clone(),
            f.over_budget.clone(),
            f.far.clone(),
        ]);
        EstimateRefiningProvider::new(
            Arc::new(estimator),
            client,
            WalkingConfig::new(1.4, 2_000.0),
        )
    }

    #[test]
    fn budget_boundary_is_inclusive() {
        let f = fixture();
        let mut client = MockDistanceClient::new();
        client.add(&f.origin, &f.at_budget, 300, 200);
        client.add(&f.origin, &f.over_budget, 301, 250);
        let client = Arc::new(client);
        let provider = provider(&f, Arc::clone(&client));

        let costs = provider
            .get_walking_costs(&f.origin, time("12:00"), time("12:05"))
            .unwrap();
        assert!(costs.contains_key(&f.at_budget));
        assert!(!costs.contains_key(&f.over_budget));
        assert_eq!(costs[&f.at_budget].duration(), Duration::seconds(300));
    }

    #[test]
    fn far_candidates_never_reach_exact_client() {
        let f = fixture();
        let client = Arc::new(MockDistanceClient::new());
        let provider = provider(&f, Arc::clone(&client));

        provider
            .get_walking_costs(&f.origin, time("12:00"), time("12:05"))
            .unwrap();
        // S1 and S2 are within 420m, S3 is ~157km away.
        assert_eq!(client.calls(), 1);
        assert_eq!(client.pairs(), 2);
    }

    #[test]
    fn backward_budget_uses_absolute_difference() {
        let f = fixture();
        let mut client = MockDistanceClient::new();
        client.add(&f.origin, &f.at_budget, 300, 200);
        let provider = provider(&f, Arc::new(client));

        let costs = provider
            .get_walking_costs(&f.origin, time("12:05"), time("12:00"))
            .unwrap();
        assert_eq!(costs.len(), 1);
    }

    #[test]
    fn no_candidates_skips_exact_client() {
        let f = fixture();
        let client = Arc::new(MockDistanceClient::new());
        let provider = provider(&f, Arc::clone(&client));
        let costs = provider
            .get_walking_costs(&f.origin, time("12:00"), time("12:00"))
            .unwrap();
        assert!(costs.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn client_errors_propagate() {
        let f = fixture();
        let provider = provider(&f, Arc::new(MockDistanceClient::failing()));
        let err = provider
            .get_walking_costs(&f.origin, time("12:00"), time("12:05"))
            .unwrap_err();
        assert!(matches!(err, DistanceError::Status { .. }));
    }
}
