//! Cursors that step along a trip.

use std::sync::Arc;

use crate::domain::{EntryPoint, ReachTime, SearchDirection, StopId, Trip};

/// Where a rider is after advancing one stop.
#[derive(Debug, Clone)]
pub struct RiderStatus {
    pub stop: StopId,
    /// Arrival at `stop` going forward, departure from it going backward.
    pub time: ReachTime,
    pub trip: Arc<Trip>,
}

/// A cursor over one trip starting at a boarding stop.
pub trait Rider: Send {
    /// False at the end of the trip or once the next stop lies beyond the
    /// cutoff.
    fn can_continue_trip(&self) -> bool;

    /// Advance one stop. Returns `None` when [`can_continue_trip`] is false.
    ///
    /// [`can_continue_trip`]: Rider::can_continue_trip
    fn continue_trip(&mut self) -> Option<RiderStatus>;
}

/// Rides a trip forward: arrival times increase, cutoff is inclusive `<=`.
#[derive(Debug, Clone)]
pub struct ForwardRider {
    trip: Arc<Trip>,
    index: usize,
    cutoff: ReachTime,
}

impl ForwardRider {
    pub fn new(trip: Arc<Trip>, boarding_index: usize, cutoff: ReachTime) -> Self {
        Self {
            trip,
            index: boarding_index,
            cutoff,
        }
    }
}

impl Rider for ForwardRider {
    fn can_continue_trip(&self) -> bool {
        self.trip
            .entry(self.index + 1)
            .is_some_and(|next| next.arrival <= self.cutoff)
    }

    fn continue_trip(&mut self) -> Option<RiderStatus> {
        if !self.can_continue_trip() {
            return None;
        }
        self.index += 1;
        let entry = self.trip.entry(self.index)?;
        Some(RiderStatus {
            stop: entry.stop.clone(),
            time: entry.arrival,
            trip: Arc::clone(&self.trip),
        })
    }
}

/// Rides a trip backward: departure times decrease, cutoff is inclusive
/// `>=`.
#[derive(Debug, Clone)]
pub struct RetrospectiveRider {
    trip: Arc<Trip>,
    index: usize,
    cutoff: ReachTime,
}

impl RetrospectiveRider {
    pub fn new(trip: Arc<Trip>, boarding_index: usize, cutoff: ReachTime) -> Self {
        Self {
            trip,
            index: boarding_index,
            cutoff,
        }
    }
}

impl Rider for RetrospectiveRider {
    fn can_continue_trip(&self) -> bool {
        self.index
            .checked_sub(1)
            .and_then(|prev| self.trip.entry(prev))
            .is_some_and(|prev| prev.departure >= self.cutoff)
    }

    fn continue_trip(&mut self) -> Option<RiderStatus> {
        if !self.can_continue_trip() {
            return None;
        }
        self.index -= 1;
        let entry = self.trip.entry(self.index)?;
        Some(RiderStatus {
            stop: entry.stop.clone(),
            time: entry.departure,
            trip: Arc::clone(&self.trip),
        })
    }
}

/// The rider for an entry point in the given search direction.
pub fn rider_for(
    direction: SearchDirection,
    entry: &EntryPoint,
    cutoff: ReachTime,
) -> Box<dyn Rider> {
    let trip = Arc::clone(&entry.trip);
    match direction {
        SearchDirection::Forward => Box::new(ForwardRider::new(trip, entry.stop_index, cutoff)),
        SearchDirection::Backward => {
            Box::new(RetrospectiveRider::new(trip, entry.stop_index, cutoff))
        }
    }
}
