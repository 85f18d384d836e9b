//! Caching layer for an exact distance client.
//!
//! Results are cached per (origin, destination) pair, including pairs the
//! backing client could not route, so a repeat lookup never reaches the
//! backing client. Concurrent first lookups may both miss; they compute the
//! same value and the last insert wins.

use std::sync::Arc;

use moka::sync::Cache as MokaCache;
use tracing::trace;

use crate::domain::{LocationKey, PointLocation, WalkingCosts};

use super::{CacheConfig, CostMap, DistanceClient, DistanceError};

/// Cache key: (origin, destination).
type PairKey = (LocationKey, LocationKey);

/// `None` records a pair with no route.
type PairEntry = Option<WalkingCosts>;

/// A distance client with a moka cache in front.
pub struct CachingDistanceClient {
    inner: Arc<dyn DistanceClient>,
    pairs: MokaCache<PairKey, PairEntry>,
}

impl CachingDistanceClient {
    pub fn new(inner: Arc<dyn DistanceClient>, config: &CacheConfig) -> Self {
        let mut builder = MokaCache::builder().max_capacity(config.max_capacity);
        if let Some(ttl) = config.ttl() {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner,
            pairs: builder.build(),
        }
    }

    /// Number of cached pairs. Approximate until pending maintenance runs.
    pub fn entry_count(&self) -> u64 {
        self.pairs.run_pending_tasks();
        self.pairs.entry_count()
    }
}

impl DistanceClient for CachingDistanceClient {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError> {
        let origin_key = origin.key();
        let mut out = CostMap::with_capacity(destinations.len());
        let mut misses = Vec::new();

        for dest in destinations {
            match self.pairs.get(&(origin_key.clone(), dest.key())) {
                Some(Some(costs)) => {
                    out.insert(dest.clone(), costs);
                }
                Some(None) => {}
                None => misses.push(dest.clone()),
            }
        }

        trace!(
            origin = %origin_key,
            hits = destinations.len() - misses.len(),
            misses = misses.len(),
            "Distance cache lookup"
        );
        if misses.is_empty() {
            return Ok(out);
        }

        let fetched = self.inner.walking_costs(origin, &misses)?;
        for dest in &misses {
            let entry = fetched.get(dest).copied();
            self.pairs.insert((origin_key.clone(), dest.key()), entry);
            if let Some(costs) = entry {
                out.insert(dest.clone(), costs);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::mock::{MockDistanceClient, landmark, stop_at};
    use crate::domain::GeoPoint;

    fn locations() -> (PointLocation, PointLocation, PointLocation) {
        (
            landmark("L", GeoPoint::new(0.0, 0.0)),
            stop_at("A", GeoPoint::new(0.001, 0.0)),
            stop_at("B", GeoPoint::new(0.002, 0.0)),
        )
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let (origin, a, b) = locations();
        let mut mock = MockDistanceClient::new();
        mock.add(&origin, &a, 60, 80);
        let mock = Arc::new(mock);
        let client = CachingDistanceClient::new(mock.clone(), &CacheConfig::default());

        let first = client.walking_costs(&origin, &[a.clone(), b.clone()]).unwrap();
        let second = client.walking_costs(&origin, &[a.clone(), b.clone()]).unwrap();

        assert_eq!(mock.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(client.entry_count(), 2);
    }

    #[test]
    fn only_misses_are_forwarded() {
        let (origin, a, b) = locations();
        let mut mock = MockDistanceClient::new();
        mock.add(&origin, &a, 60, 80);
        mock.add(&origin, &b, 120, 160);
        let mock = Arc::new(mock);
        let client = CachingDistanceClient::new(mock.clone(), &CacheConfig::default());

        client.walking_costs(&origin, &[a.clone()]).unwrap();
        let costs = client.walking_costs(&origin, &[a.clone(), b.clone()]).unwrap();

        assert_eq!(mock.calls(), 2);
        assert_eq!(mock.pairs(), 2);
        assert_eq!(costs.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let (origin, a, _) = locations();
        let mock = Arc::new(MockDistanceClient::failing());
        let client = CachingDistanceClient::new(mock.clone(), &CacheConfig::default());

        assert!(client.walking_costs(&origin, &[a.clone()]).is_err());
        assert!(client.walking_costs(&origin, &[a]).is_err());
        assert_eq!(mock.calls(), 2);
    }
}
