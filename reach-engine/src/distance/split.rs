//! Batch-limited distance client.

use std::sync::Arc;

use tracing::trace;

use crate::domain::PointLocation;

use super::{CostMap, DistanceClient, DistanceError};

/// Splits destination sets into chunks no larger than the backing client's
/// limit and merges the answers.
///
/// Chunks follow the input order, so the same input always produces the
/// same requests.
pub struct SplittingDistanceClient {
    inner: Arc<dyn DistanceClient>,
    max_batch: usize,
}

impl SplittingDistanceClient {
    /// A `max_batch` of zero is treated as one.
    pub fn new(inner: Arc<dyn DistanceClient>, max_batch: usize) -> Self {
        Self {
            inner,
            max_batch: max_batch.max(1),
        }
    }
}

impl DistanceClient for SplittingDistanceClient {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError> {
        if destinations.len() <= self.max_batch {
            return self.inner.walking_costs(origin, destinations);
        }

        let mut out = CostMap::with_capacity(destinations.len());
        for chunk in destinations.chunks(self.max_batch) {
            out.extend(self.inner.walking_costs(origin, chunk)?);
        }
        trace!(
            origin = %origin.key(),
            destinations = destinations.len(),
            batches = destinations.len().div_ceil(self.max_batch),
            "Split distance request"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::mock::{MockDistanceClient, landmark, stop_at};
    use crate::domain::GeoPoint;

    fn setup(n: usize) -> (PointLocation, Vec<PointLocation>, MockDistanceClient) {
        let origin = landmark("L", GeoPoint::new(0.0, 0.0));
        let mut mock = MockDistanceClient::new();
        let dests: Vec<_> = (0..n)
            .map(|i| stop_at(&format!("S{i}"), GeoPoint::new(0.0, i as f64 * 0.001)))
            .collect();
        for (i, d) in dests.iter().enumerate() {
            // Leave every third destination unroutable.
            if i % 3 != 0 {
                mock.add(&origin, d, 10 * i as i64, 15 * i as u32);
            }
        }
        (origin, dests, mock)
    }

    #[test]
    fn split_matches_unbatched_call() {
        let (origin, dests, mock) = setup(23);
        let mock = Arc::new(mock);
        let unbatched = mock.walking_costs(&origin, &dests).unwrap();

        let split = SplittingDistanceClient::new(mock.clone(), 5);
        let merged = split.walking_costs(&origin, &dests).unwrap();

        assert_eq!(merged, unbatched);
        // One unbatched call plus five chunks.
        assert_eq!(mock.calls(), 1 + 5);
    }

    #[test]
    fn small_sets_pass_through() {
        let (origin, dests, mock) = setup(4);
        let mock = Arc::new(mock);
        let split = SplittingDistanceClient::new(mock.clone(), 10);
        split.walking_costs(&origin, &dests).unwrap();
        assert_eq!(mock.calls(), 1);
    }

    #[test]
    fn zero_batch_is_one() {
        let (origin, dests, mock) = setup(3);
        let mock = Arc::new(mock);
        let split = SplittingDistanceClient::new(mock.clone(), 0);
        split.walking_costs(&origin, &dests).unwrap();
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn chunk_errors_propagate() {
        let (origin, dests, _) = setup(7);
        let split = SplittingDistanceClient::new(Arc::new(MockDistanceClient::failing()), 2);
        assert!(split.walking_costs(&origin, &dests).is_err());
    }
}
