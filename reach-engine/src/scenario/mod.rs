//! Scenario loading for the command-line runner.
//!
//! A scenario file lists stops, landmarks, trips and tasks together with
//! the search, walking and cache configuration. Loading validates every
//! identifier and time and tags each location with its grid sector.

mod convert;
mod types;

pub use convert::{Scenario, ScenarioError};
pub use types::{
    CallSpec, GridSpec, LandmarkSpec, OriginSpec, ScenarioFile, StopSpec, TaskSpec, TripSpec,
};
