//! Individual legs of a path: walks and transit rides.

use chrono::Duration;

use super::{LocationKey, ReachTime, StopId, TripId, WalkingCosts};

/// A walk between two locations.
///
/// Times are in search order: for a backward search `start` is later than
/// `end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkMovement {
    pub from: LocationKey,
    pub to: LocationKey,
    pub start: ReachTime,
    pub end: ReachTime,
    pub costs: WalkingCosts,
}

/// A ride on one trip from a boarding stop to an alighting stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitRideMovement {
    pub trip: TripId,
    pub from: StopId,
    pub to: StopId,
    pub start: ReachTime,
    pub end: ReachTime,
}

/// Mode of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKind {
    Walk,
    Ride,
}

/// A leg of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Movement {
    Walk(WalkMovement),
    Ride(TransitRideMovement),
}

impl Movement {
    pub fn kind(&self) -> MovementKind {
        match self {
            Movement::Walk(_) => MovementKind::Walk,
            Movement::Ride(_) => MovementKind::Ride,
        }
    }

    pub fn start_location(&self) -> LocationKey {
        match self {
            Movement::Walk(walk) => walk.from.clone(),
            Movement::Ride(ride) => LocationKey::Stop(ride.from.clone()),
        }
    }

    pub fn end_location(&self) -> LocationKey {
        match self {
            Movement::Walk(walk) => walk.to.clone(),
            Movement::Ride(ride) => LocationKey::Stop(ride.to.clone()),
        }
    }

    pub fn start_time(&self) -> ReachTime {
        match self {
            Movement::Walk(walk) => walk.start,
            Movement::Ride(ride) => ride.start,
        }
    }

    pub fn end_time(&self) -> ReachTime {
        match self {
            Movement::Walk(walk) => walk.end,
            Movement::Ride(ride) => ride.end,
        }
    }

    /// Time in motion.
    pub fn duration(&self) -> Duration {
        match self {
            Movement::Walk(walk) => walk.costs.duration(),
            Movement::Ride(ride) => ride.end.abs_diff(ride.start),
        }
    }

    /// Metres walked. Rides and walks of unknown distance count as zero.
    pub fn walking_distance_m(&self) -> u64 {
        match self {
            Movement::Walk(walk) => walk.costs.distance_m().map_or(0, u64::from),
            Movement::Ride(_) => 0,
        }
    }

    pub fn is_walk(&self) -> bool {
        matches!(self, Movement::Walk(_))
    }

    pub fn trip(&self) -> Option<&TripId> {
        match self {
            Movement::Walk(_) => None,
            Movement::Ride(ride) => Some(&ride.trip),
        }
    }
}

impl From<WalkMovement> for Movement {
    fn from(walk: WalkMovement) -> Self {
        Movement::Walk(walk)
    }
}

impl From<TransitRideMovement> for Movement {
    fn from(ride: TransitRideMovement) -> Self {
        Movement::Ride(ride)
    }
}
