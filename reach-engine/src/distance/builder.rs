//! Assembly of the walking-cost stack.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{LocationKey, PointLocation};

use super::{
    CacheConfig, CachingDistanceClient, DistanceClient, DistanceEstimator, DistanceStoreManager,
    EstimateRefiningProvider, FilteringDistanceClient, GreatCircleDistanceClient,
    GreatCircleEstimator, SplittingDistanceClient, StoredDistanceEstimator, WalkingConfig,
};

/// Builds an [`EstimateRefiningProvider`] from optional layers.
///
/// From the outside in: estimator (optionally backed by a store), refining,
/// blocklist filter, cache, split, exact client. Without an explicit exact
/// client the great-circle client at the configured pace is used.
///
/// ```
/// use reach_engine::distance::{WalkingConfig, WalkingCostProviderBuilder};
///
/// let provider = WalkingCostProviderBuilder::new(Vec::new(), WalkingConfig::default())
///     .with_max_batch(100)
///     .build();
/// # let _ = provider;
/// ```
pub struct WalkingCostProviderBuilder {
    locations: Vec<PointLocation>,
    walking: WalkingConfig,
    client: Option<Arc<dyn DistanceClient>>,
    storage: Option<(Arc<dyn DistanceStoreManager>, f64)>,
    blocked: HashSet<LocationKey>,
    cache: Option<CacheConfig>,
    max_batch: Option<usize>,
}

impl WalkingCostProviderBuilder {
    /// `locations` is the candidate set for estimation: every location a
    /// walk may end at.
    pub fn new(locations: Vec<PointLocation>, walking: WalkingConfig) -> Self {
        Self {
            locations,
            walking,
            client: None,
            storage: None,
            blocked: HashSet::new(),
            cache: None,
            max_batch: None,
        }
    }

    /// Use `client` for exact costs.
    pub fn with_client(mut self, client: Arc<dyn DistanceClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Persist estimates in `store`, refusing radii above `max_radius_m`.
    pub fn with_storage(mut self, store: Arc<dyn DistanceStoreManager>, max_radius_m: f64) -> Self {
        self.storage = Some((store, max_radius_m));
        self
    }

    /// Never return these destinations.
    pub fn with_blocklist(mut self, blocked: impl IntoIterator<Item = LocationKey>) -> Self {
        self.blocked.extend(blocked);
        self
    }

    /// Cache exact results.
    pub fn with_cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    /// Limit exact requests to `n` destinations.
    pub fn with_max_batch(mut self, n: usize) -> Self {
        self.max_batch = Some(n);
        self
    }

    pub fn build(self) -> EstimateRefiningProvider {
        let mut client: Arc<dyn DistanceClient> = match self.client {
            Some(client) => client,
            None => Arc::new(GreatCircleDistanceClient::new(self.walking.clone())),
        };
        if let Some(n) = self.max_batch {
            client = Arc::new(SplittingDistanceClient::new(client, n));
        }
        if let Some(config) = &self.cache {
            client = Arc::new(CachingDistanceClient::new(client, config));
        }
        if !self.blocked.is_empty() {
            client = Arc::new(FilteringDistanceClient::new(client, self.blocked.iter().cloned()));
        }

        let mut estimator: Arc<dyn DistanceEstimator> =
            Arc::new(GreatCircleEstimator::new(self.locations.iter().cloned()));
        if let Some((store, max_radius_m)) = self.storage {
            estimator = Arc::new(StoredDistanceEstimator::new(
                estimator,
                store,
                self.locations.iter().cloned(),
                max_radius_m,
            ));
        }

        debug!(
            locations = self.locations.len(),
            split = self.max_batch.is_some(),
            cached = self.cache.is_some(),
            blocked = self.blocked.len(),
            "Built walking cost provider"
        );
        EstimateRefiningProvider::new(estimator, client, self.walking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::mock::{MockDistanceClient, landmark, stop_at};
    use crate::distance::{KvEstimateStorage, WalkingCostProvider};
    use crate::domain::{GeoPoint, ReachTime};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn time(s: &str) -> ReachTime {
        ReachTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    #[test]
    fn default_stack_walks_great_circle() {
        let origin = landmark("L", GeoPoint::new(0.0, 0.0));
        let near = stop_at("A", GeoPoint::new(0.001, 0.0));
        let provider = WalkingCostProviderBuilder::new(
            vec![origin.clone(), near.clone()],
            WalkingConfig::new(1.0, 1_000.0),
        )
        .build();

        let costs = provider
            .get_walking_costs(&origin, time("12:00"), time("12:01"))
            .unwrap();
        assert!(costs.is_empty(), "112s walk does not fit in 60s");

        let costs = provider
            .get_walking_costs(&origin, time("12:00"), time("12:02"))
            .unwrap();
        assert_eq!(costs[&near].duration().num_seconds(), 112);
    }

    #[test]
    fn full_stack_filters_caches_and_splits() {
        let origin = landmark("L", GeoPoint::new(0.0, 0.0));
        let stops: Vec<_> = (1..=5)
            .map(|i| stop_at(&format!("S{i}"), GeoPoint::new(0.0, 0.0005 * i as f64)))
            .collect();
        let mut mock = MockDistanceClient::new();
        for s in &stops {
            mock.add(&origin, s, 60, 60);
        }
        let mock = Arc::new(mock);

        let mut locations = vec![origin.clone()];
        locations.extend(stops.iter().cloned());
        let store = Arc::new(KvEstimateStorage::new(Arc::new(MemoryStore::new())));
        let provider = WalkingCostProviderBuilder::new(locations, WalkingConfig::default())
            .with_client(mock.clone())
            .with_storage(store, 2_000.0)
            .with_blocklist(vec![stops[4].key()])
            .with_cache(CacheConfig::default())
            .with_max_batch(2)
            .build();

        let first = provider
            .get_walking_costs(&origin, time("12:00"), time("12:10"))
            .unwrap();
        assert_eq!(first.len(), 4);
        assert!(!first.contains_key(&stops[4]));
        // Four allowed destinations in batches of two.
        assert_eq!(mock.calls(), 2);

        let second = provider
            .get_walking_costs(&origin, time("12:00"), time("12:10"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.calls(), 2);
    }
}
