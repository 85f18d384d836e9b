//! Estimator backed by an estimate store.
//!
//! A query at or below an origin's high-water mark is a range scan. A query
//! above it recomputes the whole set for the new radius with the inner
//! estimator and stores it, raising the mark. Radii beyond the configured
//! maximum are refused: the store was sized for that maximum and callers
//! asking for more have a configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{LocationKey, PointLocation};
use crate::error::FatalError;

use super::{DistanceError, DistanceEstimator, DistanceStoreManager};

pub struct StoredDistanceEstimator {
    inner: Arc<dyn DistanceEstimator>,
    store: Arc<dyn DistanceStoreManager>,
    /// Stored keys resolve back to locations through this index.
    locations: HashMap<String, PointLocation>,
    max_radius_m: f64,
}

impl StoredDistanceEstimator {
    pub fn new(
        inner: Arc<dyn DistanceEstimator>,
        store: Arc<dyn DistanceStoreManager>,
        locations: impl IntoIterator<Item = PointLocation>,
        max_radius_m: f64,
    ) -> Self {
        Self {
            inner,
            store,
            locations: locations
                .into_iter()
                .map(|l| (l.key().to_string(), l))
                .collect(),
            max_radius_m,
        }
    }

    pub fn max_radius_m(&self) -> f64 {
        self.max_radius_m
    }

    fn recompute(
        &self,
        origin: &PointLocation,
        origin_key: &LocationKey,
        radius_m: f64,
    ) -> Result<Vec<(PointLocation, f64)>, DistanceError> {
        let computed = self.inner.estimate(origin, radius_m)?;
        let keyed: Vec<(LocationKey, f64)> =
            computed.iter().map(|(l, d)| (l.key(), *d)).collect();
        self.store.store(origin_key, radius_m, &keyed)?;
        debug!(origin = %origin_key, radius_m, estimates = keyed.len(), "Stored distance estimates");
        Ok(computed)
    }
}

impl DistanceEstimator for StoredDistanceEstimator {
    fn estimate(
        &self,
        origin: &PointLocation,
        max_distance_m: f64,
    ) -> Result<Vec<(PointLocation, f64)>, DistanceError> {
        if max_distance_m > self.max_radius_m {
            return Err(FatalError::RadiusAboveMaximum {
                requested_m: max_distance_m,
                max_m: self.max_radius_m,
            }
            .into());
        }

        let origin_key = origin.key();
        let covered = self
            .store
            .max_stored_radius(&origin_key)?
            .is_some_and(|mark| mark >= max_distance_m);
        if !covered {
            return self.recompute(origin, &origin_key, max_distance_m);
        }

        let stored = self.store.stored_within(&origin_key, max_distance_m)?;
        let mut out = Vec::with_capacity(stored.len());
        for (dest, distance) in stored {
            let location = self
                .locations
                .get(&dest)
                .ok_or_else(|| FatalError::MissingLocation(dest.clone()))?;
            out.push((location.clone(), distance));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::mock::{landmark, stop_at};
    use crate::distance::{GreatCircleEstimator, KvEstimateStorage};
    use crate::domain::GeoPoint;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    /// Inner estimator that counts recomputations.
    struct Counting {
        inner: GreatCircleEstimator,
        call_count: Mutex<usize>,
    }

    impl DistanceEstimator for Counting {
        fn estimate(
            &self,
            origin: &PointLocation,
            max_distance_m: f64,
        ) -> Result<Vec<(PointLocation, f64)>, DistanceError> {
            *self.call_count.lock().unwrap() += 1;
            self.inner.estimate(origin, max_distance_m)
        }
    }

    fn world() -> Vec<PointLocation> {
        vec![
            landmark("L", GeoPoint::new(0.0, 0.0)),
            stop_at("A", GeoPoint::new(0.001, 0.0)),
            stop_at("B", GeoPoint::new(0.004, 0.0)),
            stop_at("C", GeoPoint::new(0.010, 0.0)),
        ]
    }

    fn estimator(locations: &[PointLocation]) -> (StoredDistanceEstimator, Arc<Counting>) {
        let counting = Arc::new(Counting {
            inner: GreatCircleEstimator::new(locations.to_vec()),
            call_count: Mutex::new(0),
        });
        let store = Arc::new(KvEstimateStorage::new(Arc::new(MemoryStore::new())));
        let stored = StoredDistanceEstimator::new(
            counting.clone(),
            store,
            locations.to_vec(),
            2_000.0,
        );
        (stored, counting)
    }

    fn ids(found: &[(PointLocation, f64)]) -> Vec<String> {
        found.iter().map(|(l, _)| l.key().to_string()).collect()
    }

    #[test]
    fn smaller_radius_is_served_from_store() {
        let locations = world();
        let (stored, counting) = estimator(&locations);
        let origin = &locations[0];

        let wide = stored.estimate(origin, 1_000.0).unwrap();
        let narrow = stored.estimate(origin, 500.0).unwrap();

        assert_eq!(*counting.call_count.lock().unwrap(), 1);
        assert_eq!(ids(&wide), vec!["stop:A", "stop:B"]);
        assert_eq!(ids(&narrow), vec!["stop:A", "stop:B"]);
        assert_eq!(ids(&stored.estimate(origin, 200.0).unwrap()), vec!["stop:A"]);
    }

    #[test]
    fn larger_radius_recomputes_fully() {
        let locations = world();
        let (stored, counting) = estimator(&locations);
        let origin = &locations[0];

        stored.estimate(origin, 500.0).unwrap();
        let wider = stored.estimate(origin, 1_500.0).unwrap();
        assert_eq!(*counting.call_count.lock().unwrap(), 2);
        assert_eq!(ids(&wider), vec!["stop:A", "stop:B", "stop:C"]);

        stored.estimate(origin, 1_500.0).unwrap();
        assert_eq!(*counting.call_count.lock().unwrap(), 2);
    }

    #[test]
    fn radius_above_maximum_is_fatal() {
        let locations = world();
        let (stored, _) = estimator(&locations);
        let err = stored.estimate(&locations[0], 2_000.5).unwrap_err();
        assert!(matches!(
            err,
            DistanceError::Fatal(FatalError::RadiusAboveMaximum { .. })
        ));
    }

    #[test]
    fn unknown_stored_location_is_fatal() {
        let locations = world();
        let store = Arc::new(KvEstimateStorage::new(Arc::new(MemoryStore::new())));
        store
            .store(&locations[0].key(), 1_000.0, &[(locations[1].key(), 111.0)])
            .unwrap();

        // Index without stop A.
        let stored = StoredDistanceEstimator::new(
            Arc::new(GreatCircleEstimator::new(locations.clone())),
            store,
            vec![locations[0].clone()],
            2_000.0,
        );
        let err = stored.estimate(&locations[0], 500.0).unwrap_err();
        assert!(matches!(
            err,
            DistanceError::Fatal(FatalError::MissingLocation(ref k)) if k == "stop:A"
        ));
    }
}
