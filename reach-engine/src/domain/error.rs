//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from provider and store errors.

use super::{LocationKey, TripId};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// A trip's stop times are unusable
    #[error("invalid trip {trip}: {reason}")]
    InvalidTrip { trip: TripId, reason: &'static str },

    /// A movement does not start where the path ends
    #[error("movement starts at {found} but the path ends at {expected}")]
    DisconnectedMovement {
        expected: LocationKey,
        found: LocationKey,
    },

    /// A movement runs against the search direction
    #[error("movement from {at} runs against the search direction")]
    MovementBackInTime { at: LocationKey },

    /// A grid needs at least one row and one column
    #[error("invalid grid: {0}")]
    InvalidGrid(&'static str),
}
