//! Persistent distance-estimate storage.
//!
//! Estimates live in a [`KeyValueStore`] under keys ordered by origin, then
//! distance, then destination:
//!
//! ```text
//! est|stop:S1|000000031250|landmark:home  ->  "312.5"
//! max|stop:S1                             ->  "2000"
//! ```
//!
//! Distances are zero-padded centimetres, rounded down, so "everything
//! within R of an origin" is one range scan up to R rounded up, followed by
//! an exact check on the stored value. The `max|` entry is the high-water
//! mark: the largest radius for which the stored set is complete.
//!
//! A value that does not parse is a [`FatalError::CorruptEstimate`]: the
//! store was written by this module and nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::LocationKey;
use crate::error::FatalError;
use crate::store::{KeyValueStore, join_key, prefix_range};

use super::DistanceError;

const ESTIMATE_PREFIX: &str = "est";
const MAX_PREFIX: &str = "max";

/// Owner of estimate sets and their high-water marks.
pub trait DistanceStoreManager: Send + Sync {
    /// Largest radius stored completely for `origin`, if any.
    fn max_stored_radius(&self, origin: &LocationKey) -> Result<Option<f64>, DistanceError>;

    /// Stored estimates within `radius_m` of `origin`, nearest first.
    fn stored_within(
        &self,
        origin: &LocationKey,
        radius_m: f64,
    ) -> Result<Vec<(String, f64)>, DistanceError>;

    /// Record the complete estimate set for `origin` up to `radius_m` and
    /// raise the high-water mark.
    fn store(
        &self,
        origin: &LocationKey,
        radius_m: f64,
        estimates: &[(LocationKey, f64)],
    ) -> Result<(), DistanceError>;
}

/// Distance in zero-padded centimetres, rounded with `round`.
fn padded_cm(distance_m: f64, round: fn(f64) -> f64) -> String {
    let cm = round(distance_m.max(0.0) * 100.0);
    format!("{:012}", cm as u64)
}

fn parse_estimate(key: &str, value: &str) -> Result<f64, FatalError> {
    value.parse::<f64>().map_err(|e| FatalError::CorruptEstimate {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// [`DistanceStoreManager`] over any key-value store.
pub struct KvEstimateStorage {
    store: Arc<dyn KeyValueStore>,
}

impl KvEstimateStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn estimate_key(origin: &str, distance_m: f64, dest: &str) -> String {
        join_key(&[ESTIMATE_PREFIX, origin, &padded_cm(distance_m, f64::floor), dest])
    }

    fn max_key(origin: &str) -> String {
        join_key(&[MAX_PREFIX, origin])
    }
}

impl DistanceStoreManager for KvEstimateStorage {
    fn max_stored_radius(&self, origin: &LocationKey) -> Result<Option<f64>, DistanceError> {
        let key = Self::max_key(&origin.to_string());
        match self.store.get(&key)? {
            Some(value) => Ok(Some(parse_estimate(&key, &value)?)),
            None => Ok(None),
        }
    }

    fn stored_within(
        &self,
        origin: &LocationKey,
        radius_m: f64,
    ) -> Result<Vec<(String, f64)>, DistanceError> {
        let origin = origin.to_string();
        let (min, _) = prefix_range(&join_key(&[ESTIMATE_PREFIX, &origin]));
        let (_, max) = prefix_range(&join_key(&[
            ESTIMATE_PREFIX,
            &origin,
            &padded_cm(radius_m, f64::ceil),
        ]));

        let mut out = Vec::new();
        for (key, value) in self.store.values_in_range(&min, &max)? {
            let Some(dest) = key.rsplit('|').next() else {
                continue;
            };
            let distance = parse_estimate(&key, &value)?;
            if distance <= radius_m {
                out.push((dest.to_string(), distance));
            }
        }
        Ok(out)
    }

    fn store(
        &self,
        origin: &LocationKey,
        radius_m: f64,
        estimates: &[(LocationKey, f64)],
    ) -> Result<(), DistanceError> {
        let origin = origin.to_string();
        let mut batch: Vec<(String, String)> = estimates
            .iter()
            .map(|(dest, d)| {
                (
                    Self::estimate_key(&origin, *d, &dest.to_string()),
                    d.to_string(),
                )
            })
            .collect();
        // High-water mark last, so a reader never sees it ahead of the data
        // when the backend applies the batch in order.
        batch.push((Self::max_key(&origin), radius_m.to_string()));
        Ok(self.store.put_batch(&batch)?)
    }
}

/// Routes some origins to their own supplemental store.
///
/// Reads for a supplemented origin merge both stores; its writes go to the
/// supplemental store only, leaving the shared default untouched.
pub struct CompositeStoreManager {
    default: Arc<dyn DistanceStoreManager>,
    supplemental: HashMap<LocationKey, Arc<dyn DistanceStoreManager>>,
}

impl CompositeStoreManager {
    pub fn new(default: Arc<dyn DistanceStoreManager>) -> Self {
        Self {
            default,
            supplemental: HashMap::new(),
        }
    }

    /// Give `origin` its own store.
    pub fn with_supplemental(
        mut self,
        origin: LocationKey,
        store: Arc<dyn DistanceStoreManager>,
    ) -> Self {
        self.supplemental.insert(origin, store);
        self
    }
}

impl DistanceStoreManager for CompositeStoreManager {
    fn max_stored_radius(&self, origin: &LocationKey) -> Result<Option<f64>, DistanceError> {
        let base = self.default.max_stored_radius(origin)?;
        let Some(extra) = self.supplemental.get(origin) else {
            return Ok(base);
        };
        // Either store's complete set answers any radius up to its mark.
        Ok(match (base, extra.max_stored_radius(origin)?) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        })
    }

    fn stored_within(
        &self,
        origin: &LocationKey,
        radius_m: f64,
    ) -> Result<Vec<(String, f64)>, DistanceError> {
        let base = self.default.stored_within(origin, radius_m)?;
        let Some(extra) = self.supplemental.get(origin) else {
            return Ok(base);
        };

        let mut merged: HashMap<String, f64> = HashMap::new();
        for (dest, d) in base.into_iter().chain(extra.stored_within(origin, radius_m)?) {
            merged
                .entry(dest)
                .and_modify(|existing| *existing = existing.min(d))
                .or_insert(d);
        }
        let mut out: Vec<(String, f64)> = merged.into_iter().collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(out)
    }

    fn store(
        &self,
        origin: &LocationKey,
        radius_m: f64,
        estimates: &[(LocationKey, f64)],
    ) -> Result<(), DistanceError> {
        match self.supplemental.get(origin) {
            Some(extra) => extra.store(origin, radius_m, estimates),
            None => self.default.store(origin, radius_m, estimates),
        }
    }
}
