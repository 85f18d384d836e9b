//! Crate-level error types.
//!
//! Each layer has its own error enum; [`ReachError`] is what a task run
//! returns. Conversions keep the original error intact so a backend failure
//! is never mistaken for an empty result.

use crate::distance::DistanceError;
use crate::domain::DomainError;
use crate::schedule::ScheduleError;
use crate::store::StoreError;

/// An internal invariant is broken. The affected run must stop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FatalError {
    /// The estimate store names a location the engine does not know
    #[error("estimate store references unknown location {0}")]
    MissingLocation(String),

    /// A radius beyond what the estimate store was built for
    #[error("requested radius {requested_m}m exceeds the supported maximum {max_m}m")]
    RadiusAboveMaximum { requested_m: f64, max_m: f64 },

    /// A stored estimate cannot be read back
    #[error("estimate store entry {key} is unreadable: {message}")]
    CorruptEstimate { key: String, message: String },

    /// A path could not be extended
    #[error("path invariant violated: {0}")]
    Path(#[from] DomainError),
}

/// Error from running a reachability task.
#[derive(Debug, thiserror::Error)]
pub enum ReachError {
    /// Walking-cost provider failed
    #[error("distance provider failed: {0}")]
    Distance(DistanceError),

    /// Schedule lookup failed
    #[error("schedule lookup failed: {0}")]
    Schedule(#[from] ScheduleError),

    /// Key-value store failed
    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    /// Invariant violation
    #[error("fatal: {0}")]
    Fatal(#[from] FatalError),

    /// The run was cancelled
    #[error("interrupted")]
    Interrupted,
}

impl ReachError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReachError::Fatal(_))
    }
}

impl From<DistanceError> for ReachError {
    fn from(err: DistanceError) -> Self {
        match err {
            DistanceError::Fatal(fatal) => ReachError::Fatal(fatal),
            other => ReachError::Distance(other),
        }
    }
}

impl From<DomainError> for ReachError {
    fn from(err: DomainError) -> Self {
        ReachError::Fatal(FatalError::Path(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_distance_errors_stay_fatal() {
        let err: ReachError = DistanceError::Fatal(FatalError::MissingLocation("stop:X".into())).into();
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "fatal: estimate store references unknown location stop:X"
        );

        let err: ReachError = DistanceError::Malformed("short row".into()).into();
        assert!(matches!(err, ReachError::Distance(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn error_display() {
        assert_eq!(ReachError::Interrupted.to_string(), "interrupted");
        let err = FatalError::RadiusAboveMaximum {
            requested_m: 3000.0,
            max_m: 2000.0,
        };
        assert_eq!(
            err.to_string(),
            "requested radius 3000m exceeds the supported maximum 2000m"
        );
    }
}
