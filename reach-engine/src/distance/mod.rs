//! Walking costs between locations.
//!
//! The search asks one question of this module: from here, with this much
//! time left, where can I walk? [`WalkingCostProvider`] answers it. The
//! standard provider is a stack of small layers, each implementing one
//! capability trait and wrapping the next:
//!
//! ```text
//! EstimateRefiningProvider
//!   ├── DistanceEstimator      GreatCircleEstimator, optionally behind
//!   │                          StoredDistanceEstimator + a DistanceStoreManager
//!   └── DistanceClient         FilteringDistanceClient
//!                                └── CachingDistanceClient
//!                                      └── SplittingDistanceClient
//!                                            └── exact client (great-circle or OSRM)
//! ```
//!
//! [`WalkingCostProviderBuilder`] assembles the stack. Errors from the exact
//! client pass through every layer unchanged.

mod builder;
mod cache;
mod config;
mod error;
mod filter;
mod great_circle;
#[cfg(test)]
pub(crate) mod mock;
mod osrm;
mod refining;
mod split;
mod storage;
mod stored;

use std::collections::HashMap;

use crate::domain::{PointLocation, ReachTime, WalkingCosts};

pub use builder::WalkingCostProviderBuilder;
pub use cache::CachingDistanceClient;
pub use config::{CacheConfig, OsrmConfig, WalkingConfig};
pub use error::DistanceError;
pub use filter::FilteringDistanceClient;
pub use great_circle::{GreatCircleDistanceClient, GreatCircleEstimator};
pub use osrm::{OsrmDistanceClient, TableResponse};
pub use refining::EstimateRefiningProvider;
pub use split::SplittingDistanceClient;
pub use storage::{CompositeStoreManager, DistanceStoreManager, KvEstimateStorage};
pub use stored::StoredDistanceEstimator;

/// Walking costs keyed by destination.
pub type CostMap = HashMap<PointLocation, WalkingCosts>;

/// Destinations reachable on foot inside a time budget.
pub trait WalkingCostProvider: Send + Sync {
    /// Every destination whose walking duration from `origin` is at most
    /// `|cutoff - current|`. The origin itself is never included.
    fn get_walking_costs(
        &self,
        origin: &PointLocation,
        current: ReachTime,
        cutoff: ReachTime,
    ) -> Result<CostMap, DistanceError>;
}

/// An exact distance source.
///
/// Returns costs for the destinations it can route to. Destinations with no
/// route are absent from the result.
pub trait DistanceClient: Send + Sync {
    fn walking_costs(
        &self,
        origin: &PointLocation,
        destinations: &[PointLocation],
    ) -> Result<CostMap, DistanceError>;
}

/// A fast, possibly approximate distance source used for pruning.
///
/// Estimates must never exceed the true walking distance, otherwise the
/// refining layer would discard reachable destinations.
pub trait DistanceEstimator: Send + Sync {
    /// Candidates within `max_distance_m` of `origin` (inclusive), nearest
    /// first, with their estimated distance in metres.
    fn estimate(
        &self,
        origin: &PointLocation,
        max_distance_m: f64,
    ) -> Result<Vec<(PointLocation, f64)>, DistanceError>;
}
