//! Transit schedule lookups and trip riders.
//!
//! The search asks two questions of the schedule: which trips can be
//! boarded at a stop inside a time window, and where does a trip go next.
//! [`ScheduleProvider`] answers the first; a [`Rider`] cursor answers the
//! second, one stop at a time.

mod error;
mod rider;
mod timetable;

use std::sync::Arc;

use crate::domain::{EntryPoint, ReachTime, SearchDirection, StopId, TransitStop, Trip, TripId};

pub use error::ScheduleError;
pub use rider::{ForwardRider, RetrospectiveRider, Rider, RiderStatus, rider_for};
pub use timetable::TimetableSchedule;

/// Source of scheduled trips.
///
/// Implementations are shared by every visitor thread.
pub trait ScheduleProvider: Send + Sync {
    /// Trips boardable at `stop` with a boarding time inside the window.
    ///
    /// The window is inclusive at both ends and may be given in either
    /// order. For a forward search the boarding time is the departure at the
    /// stop; for a backward search it is the arrival, since the rider is
    /// travelling back along the trip.
    fn entry_points(
        &self,
        stop: &StopId,
        window_start: ReachTime,
        window_end: ReachTime,
        direction: SearchDirection,
    ) -> Result<Vec<EntryPoint>, ScheduleError>;

    /// Look up a trip by id.
    fn trip(&self, id: &TripId) -> Result<Arc<Trip>, ScheduleError>;

    /// Look up a stop by id.
    fn stop(&self, id: &StopId) -> Result<Arc<TransitStop>, ScheduleError>;
}
