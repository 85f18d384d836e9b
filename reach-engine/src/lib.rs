//! Transit and walking reachability engine.
//!
//! Answers: "starting here at this time, where can I get to (or where
//! could I have come from) within this time budget, and by which best
//! path?" Searches combine walks costed by a layered distance stack with
//! rides on scheduled trips, and record best paths per location, per
//! sector and per task.

pub mod distance;
pub mod domain;
pub mod error;
pub mod grid;
pub mod planner;
pub mod scenario;
pub mod schedule;
pub mod scorecard;
pub mod store;

pub use error::{FatalError, ReachError};
