//! Blocklist filter in front of a distance client.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{LocationKey, PointLocation};

use super::{CostMap, DistanceClient, DistanceError};

/// Drops blocked destinations before querying and from the result.
pub struct FilteringDistanceClient {
    inner: Arc<dyn DistanceClient>,
    blocked: HashSet<LocationKey>,
}

impl FilteringDistanceClient {
    pub fn new(inner: Arc<dyn DistanceClient>, blocked: impl IntoIterator<Item = LocationKey>) -> Self {
        Self {
            inner,
            blocked: blocked.into_iter().collect(),
        }
    }

    pub fn is_blocked(&self, key: &LocationKey) -> bool {
        self.blocked.contains(key)
    }
}

impl DistanceClient for FilteringDistanceClient {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError> {
        let allowed: Vec<PointLocation> = destinations
            .iter()
            .filter(|d| !self.blocked.contains(&d.key()))
            .cloned()
            .collect();
        if allowed.is_empty() {
            return Ok(CostMap::new());
        }
        let mut out = self.inner.walking_costs(origin, &allowed)?;
        out.retain(|d, _| !self.blocked.contains(&d.key()));
        Ok(out)
    }
}
