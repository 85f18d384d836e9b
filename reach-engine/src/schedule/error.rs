//! Schedule lookup errors.

use crate::domain::{StopId, TripId};

/// Errors from a schedule provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    /// No stop with this id is known
    #[error("unknown stop {0}")]
    UnknownStop(StopId),

    /// No trip with this id is known
    #[error("unknown trip {0}")]
    UnknownTrip(TripId),
}
