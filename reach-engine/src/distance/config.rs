//! Configuration for walking costs and distance clients.

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Deserialize;

use crate::domain::WalkingCosts;

/// Walking pace and range.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    /// Walking speed.
    pub meters_per_second: f64,

    /// Longest walk considered, regardless of remaining time.
    pub max_walk_meters: f64,
}

impl WalkingConfig {
    pub fn new(meters_per_second: f64, max_walk_meters: f64) -> Self {
        Self {
            meters_per_second,
            max_walk_meters,
        }
    }

    /// Costs of walking `distance_m` at this pace.
    pub fn walking_costs(&self, distance_m: f64) -> Option<WalkingCosts> {
        WalkingCosts::from_distance(distance_m, self.meters_per_second)
    }

    /// Furthest distance coverable inside `budget`, capped at the maximum
    /// walk.
    pub fn max_distance_for(&self, budget: Duration) -> f64 {
        let secs = budget.num_seconds().max(0) as f64;
        (secs * self.meters_per_second).min(self.max_walk_meters)
    }
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            meters_per_second: 1.4,
            max_walk_meters: 2_000.0,
        }
    }
}

/// Configuration for the caching distance client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached (origin, destination) pairs.
    pub max_capacity: u64,

    /// TTL for cached entries in seconds. `None` keeps entries until
    /// evicted by capacity.
    pub ttl_secs: Option<u64>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<StdDuration> {
        self.ttl_secs.map(StdDuration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000_000,
            ttl_secs: None,
        }
    }
}

/// Default base URL for a local OSRM instance.
const DEFAULT_OSRM_URL: &str = "http://localhost:5000";

/// Configuration for the OSRM table client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    /// Base URL of the OSRM service
    pub base_url: String,
    /// Routing profile, usually `foot`
    pub profile: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Largest number of destinations per table request
    pub max_batch: usize,
}

impl OsrmConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the routing profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the batch limit.
    pub fn with_max_batch(mut self, n: usize) -> Self {
        self.max_batch = n;
        self
    }

    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.timeout_secs)
    }
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OSRM_URL.to_string(),
            profile: "foot".to_string(),
            timeout_secs: 30,
            max_batch: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_walking_config() {
        let config = WalkingConfig::default();
        assert_eq!(config.meters_per_second, 1.4);
        assert_eq!(config.max_walk_meters, 2_000.0);
    }

    #[test]
    fn max_distance_is_capped() {
        let config = WalkingConfig::new(1.5, 500.0);
        assert_eq!(config.max_distance_for(Duration::seconds(100)), 150.0);
        assert_eq!(config.max_distance_for(Duration::minutes(60)), 500.0);
        assert_eq!(config.max_distance_for(Duration::seconds(-5)), 0.0);
    }

    #[test]
    fn walking_costs_use_pace() {
        let config = WalkingConfig::new(1.25, 1_000.0);
        let costs = config.walking_costs(300.0).unwrap();
        assert_eq!(costs.duration(), Duration::seconds(240));
        assert_eq!(costs.distance_m(), Some(300));
    }

    #[test]
    fn configs_deserialize_with_defaults() {
        let osrm: OsrmConfig =
            serde_json::from_str(r#"{"base_url": "http://osrm:5000", "max_batch": 50}"#).unwrap();
        assert_eq!(osrm.base_url, "http://osrm:5000");
        assert_eq!(osrm.profile, "foot");
        assert_eq!(osrm.max_batch, 50);

        let cache: CacheConfig = serde_json::from_str(r#"{"ttl_secs": 60}"#).unwrap();
        assert_eq!(cache.ttl(), Some(StdDuration::from_secs(60)));
        assert_eq!(cache.max_capacity, 1_000_000);
    }

    #[test]
    fn builder_methods() {
        let config = OsrmConfig::new("http://example")
            .with_profile("walking")
            .with_timeout(5)
            .with_max_batch(10);
        assert_eq!(config.profile, "walking");
        assert_eq!(config.timeout(), StdDuration::from_secs(5));
        assert_eq!(config.max_batch, 10);
    }
}
