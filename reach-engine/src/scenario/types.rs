//! Scenario file DTOs.
//!
//! These types map directly to the JSON the binary reads. Identifiers and
//! times stay as strings here and are validated during conversion.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::distance::{CacheConfig, OsrmConfig, WalkingConfig};
use crate::planner::SearchConfig;

/// A complete scenario: network, tasks and configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioFile {
    /// Service day that schedule and task times are relative to.
    pub service_date: NaiveDate,

    /// Sector grid. Defaults to a grid covering every stop and landmark.
    #[serde(default)]
    pub grid: Option<GridSpec>,

    pub stops: Vec<StopSpec>,

    #[serde(default)]
    pub landmarks: Vec<LandmarkSpec>,

    #[serde(default)]
    pub trips: Vec<TripSpec>,

    pub tasks: Vec<TaskSpec>,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub walking: WalkingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Exact walking distances from an OSRM server. Without it walks are
    /// costed by great-circle distance.
    #[serde(default)]
    pub osrm: Option<OsrmConfig>,

    /// SQLite file for persisted distance estimates. Needs the `sqlite`
    /// feature; estimates are kept in memory otherwise.
    #[serde(default)]
    pub estimate_db: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridSpec {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopSpec {
    pub id: String,
    /// Falls back to the id.
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkSpec {
    pub id: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripSpec {
    pub id: String,
    pub route: Option<String>,
    pub calls: Vec<CallSpec>,
}

/// One stop time, "H:MM:SS" relative to the service day. A missing arrival
/// or departure takes the other's value.
#[derive(Debug, Clone, Deserialize)]
pub struct CallSpec {
    pub stop: String,
    pub arrival: Option<String>,
    pub departure: Option<String>,
}

/// Where a task starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginSpec {
    Stop(String),
    Landmark(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub id: u64,
    pub origin: OriginSpec,
    /// "H:MM:SS" relative to the service day.
    pub start: String,
}
