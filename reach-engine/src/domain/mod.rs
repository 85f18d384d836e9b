//! Domain types for the reachability engine.
//!
//! This module contains the core model types: timestamps, coordinates, the
//! locations the search visits, the movements and paths it builds, and the
//! trips it rides. Types enforce their invariants at construction time.

mod costs;
mod error;
mod geo;
mod location;
mod movement;
mod path;
mod task;
mod time;
mod trip;

pub use costs::WalkingCosts;
pub use error::DomainError;
pub use geo::{Bounds, GeoPoint};
pub use location::{
    GridPoint, GridPointId, InvalidId, Landmark, LandmarkId, LocationKey, PointLocation, Sector,
    SectorId, StopId, TransitStop,
};
pub use movement::{Movement, MovementKind, TransitRideMovement, WalkMovement};
pub use path::MovementPath;
pub use task::{SearchDirection, Task, TaskId};
pub use time::{ReachTime, TimeError};
pub use trip::{EntryPoint, ScheduleEntry, Trip, TripId};
