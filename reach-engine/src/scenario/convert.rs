//! Conversion from scenario DTOs to domain types.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::distance::{CacheConfig, OsrmConfig, WalkingConfig};
use crate::domain::{
    Bounds, DomainError, GeoPoint, InvalidId, Landmark, LandmarkId, PointLocation, ReachTime,
    ScheduleEntry, StopId, Task, TaskId, TimeError, TransitStop, Trip, TripId,
};
use crate::grid::{SectorGrid, SectorLookup};
use crate::planner::SearchConfig;

use super::types::{CallSpec, GridSpec, OriginSpec, ScenarioFile, TripSpec};

/// Rows and columns of the grid generated when a scenario has none.
const DEFAULT_GRID_CELLS: usize = 10;

/// Margin in degrees around generated grid bounds.
const GRID_MARGIN_DEG: f64 = 0.001;

/// Error loading or converting a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    #[error("invalid time {value:?}: {source}")]
    InvalidTime { value: String, source: TimeError },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("duplicate location id {0}")]
    DuplicateId(String),

    #[error("trip {trip} calls at unknown stop {stop}")]
    UnknownStop { trip: String, stop: String },

    #[error("trip {trip} has no time at stop {stop}")]
    MissingTime { trip: String, stop: String },

    #[error("task {task} starts at unknown location {origin}")]
    UnknownOrigin { task: u64, origin: String },

    #[error("scenario has no stops or landmarks")]
    Empty,

    #[error("max_duration_secs {0} is out of range")]
    InvalidDuration(i64),
}

/// A validated scenario ready to run.
#[derive(Debug)]
pub struct Scenario {
    pub grid: SectorGrid,
    pub stops: Vec<Arc<TransitStop>>,
    pub landmarks: Vec<Arc<Landmark>>,
    pub trips: Vec<Arc<Trip>>,
    pub tasks: Vec<Task>,
    pub search: SearchConfig,
    pub walking: WalkingConfig,
    pub cache: CacheConfig,
    pub osrm: Option<OsrmConfig>,
    pub estimate_db: Option<PathBuf>,
}

impl Scenario {
    /// Read and convert a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = serde_json::from_str(text)?;
        Self::from_file(file)
    }

    pub fn from_file(file: ScenarioFile) -> Result<Self, ScenarioError> {
        if file.search.checked_max_duration().is_none() {
            return Err(ScenarioError::InvalidDuration(file.search.max_duration_secs));
        }

        let points: Vec<GeoPoint> = file
            .stops
            .iter()
            .map(|s| GeoPoint::new(s.lat, s.lon))
            .chain(file.landmarks.iter().map(|l| GeoPoint::new(l.lat, l.lon)))
            .collect();
        let grid = build_grid(file.grid.as_ref(), &points)?;

        let mut seen = HashSet::new();
        let mut stops = HashMap::new();
        for spec in &file.stops {
            claim(&mut seen, "stop", &spec.id)?;
            let point = GeoPoint::new(spec.lat, spec.lon);
            let stop = TransitStop::new(
                StopId::parse(&spec.id)?,
                spec.name.clone().unwrap_or_else(|| spec.id.clone()),
                point,
                grid.sector_for(&point),
            );
            stops.insert(spec.id.clone(), Arc::new(stop));
        }

        let mut landmarks = HashMap::new();
        for spec in &file.landmarks {
            claim(&mut seen, "landmark", &spec.id)?;
            let point = GeoPoint::new(spec.lat, spec.lon);
            let landmark = Landmark::new(
                LandmarkId::parse(&spec.id)?,
                spec.name.clone().unwrap_or_else(|| spec.id.clone()),
                point,
                grid.sector_for(&point),
            );
            landmarks.insert(spec.id.clone(), Arc::new(landmark));
        }

        let trips = file
            .trips
            .iter()
            .map(|spec| convert_trip(spec, &stops, file.service_date).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let tasks = file
            .tasks
            .iter()
            .map(|spec| {
                let origin = match &spec.origin {
                    OriginSpec::Stop(id) => stops.get(id).cloned().map(PointLocation::Stop),
                    OriginSpec::Landmark(id) => {
                        landmarks.get(id).cloned().map(PointLocation::Landmark)
                    }
                };
                let origin = origin.ok_or_else(|| ScenarioError::UnknownOrigin {
                    task: spec.id,
                    origin: origin_name(&spec.origin).to_string(),
                })?;
                let start = parse_time(&spec.start, file.service_date)?;
                Ok(Task::new(TaskId(spec.id), origin, start))
            })
            .collect::<Result<Vec<_>, ScenarioError>>()?;

        let mut stops: Vec<_> = stops.into_values().collect();
        stops.sort_by(|a, b| a.id.cmp(&b.id));
        let mut landmarks: Vec<_> = landmarks.into_values().collect();
        landmarks.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(
            stops = stops.len(),
            landmarks = landmarks.len(),
            trips = trips.len(),
            tasks = tasks.len(),
            "Converted scenario"
        );

        Ok(Self {
            grid,
            stops,
            landmarks,
            trips,
            tasks,
            search: file.search,
            walking: file.walking,
            cache: file.cache,
            osrm: file.osrm,
            estimate_db: file.estimate_db,
        })
    }

    /// Every stop and landmark, the candidate set for walking.
    pub fn locations(&self) -> Vec<PointLocation> {
        self.stops
            .iter()
            .cloned()
            .map(PointLocation::Stop)
            .chain(self.landmarks.iter().cloned().map(PointLocation::Landmark))
            .collect()
    }
}

fn claim(seen: &mut HashSet<String>, kind: &str, id: &str) -> Result<(), ScenarioError> {
    let key = format!("{kind}:{id}");
    if !seen.insert(key.clone()) {
        return Err(ScenarioError::DuplicateId(key));
    }
    Ok(())
}

fn origin_name(origin: &OriginSpec) -> &str {
    match origin {
        OriginSpec::Stop(id) | OriginSpec::Landmark(id) => id,
    }
}

fn parse_time(value: &str, date: NaiveDate) -> Result<ReachTime, ScenarioError> {
    ReachTime::parse_service_time(value, date).map_err(|source| ScenarioError::InvalidTime {
        value: value.to_string(),
        source,
    })
}

fn build_grid(spec: Option<&GridSpec>, points: &[GeoPoint]) -> Result<SectorGrid, ScenarioError> {
    if let Some(spec) = spec {
        let bounds = Bounds::from_corners(
            GeoPoint::new(spec.min_lat, spec.min_lon),
            GeoPoint::new(spec.max_lat, spec.max_lon),
        );
        return Ok(SectorGrid::new(bounds, spec.rows, spec.cols)?);
    }

    let (first, rest) = points.split_first().ok_or(ScenarioError::Empty)?;
    let (mut min, mut max) = (*first, *first);
    for p in rest {
        min = GeoPoint::new(min.lat.min(p.lat), min.lon.min(p.lon));
        max = GeoPoint::new(max.lat.max(p.lat), max.lon.max(p.lon));
    }
    let bounds = Bounds::from_corners(
        GeoPoint::new(min.lat - GRID_MARGIN_DEG, min.lon - GRID_MARGIN_DEG),
        GeoPoint::new(max.lat + GRID_MARGIN_DEG, max.lon + GRID_MARGIN_DEG),
    );
    Ok(SectorGrid::new(bounds, DEFAULT_GRID_CELLS, DEFAULT_GRID_CELLS)?)
}

fn convert_trip(
    spec: &TripSpec,
    stops: &HashMap<String, Arc<TransitStop>>,
    date: NaiveDate,
) -> Result<Trip, ScenarioError> {
    let entries = spec
        .calls
        .iter()
        .map(|call| convert_call(spec, call, stops, date))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Trip::new(TripId::parse(&spec.id)?, spec.route.clone(), entries)?)
}

fn convert_call(
    trip: &TripSpec,
    call: &CallSpec,
    stops: &HashMap<String, Arc<TransitStop>>,
    date: NaiveDate,
) -> Result<ScheduleEntry, ScenarioError> {
    let stop = stops
        .get(&call.stop)
        .ok_or_else(|| ScenarioError::UnknownStop {
            trip: trip.id.clone(),
            stop: call.stop.clone(),
        })?;

    let arrival = call.arrival.as_deref().map(|t| parse_time(t, date)).transpose()?;
    let departure = call.departure.as_deref().map(|t| parse_time(t, date)).transpose()?;
    let (arrival, departure) = match (arrival, departure) {
        (Some(a), Some(d)) => (a, d),
        (Some(a), None) => (a, a),
        (None, Some(d)) => (d, d),
        (None, None) => {
            return Err(ScenarioError::MissingTime {
                trip: trip.id.clone(),
                stop: call.stop.clone(),
            });
        }
    };
    Ok(ScheduleEntry::new(stop.id.clone(), arrival, departure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SearchDirection;

    const SCENARIO: &str = r#"{
        "service_date": "2024-03-15",
        "stops": [
            {"id": "S1", "name": "High Street", "lat": 51.500, "lon": -0.100},
            {"id": "S2", "lat": 51.510, "lon": -0.100}
        ],
        "landmarks": [
            {"id": "home", "lat": 51.499, "lon": -0.101}
        ],
        "trips": [
            {"id": "T1", "route": "10", "calls": [
                {"stop": "S1", "departure": "12:05:00"},
                {"stop": "S2", "arrival": "12:09:00"}
            ]}
        ],
        "tasks": [
            {"id": 1, "origin": {"landmark": "home"}, "start": "12:00:00"},
            {"id": 2, "origin": {"stop": "S2"}, "start": "24:30:00"}
        ],
        "search": {"max_depth": 3, "max_duration_secs": 900, "direction": "backward"}
    }"#;

    #[test]
    fn converts_full_scenario() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();

        assert_eq!(scenario.stops.len(), 2);
        assert_eq!(scenario.stops[0].name, "High Street");
        assert_eq!(scenario.stops[1].name, "S2");
        assert_eq!(scenario.landmarks.len(), 1);
        assert_eq!(scenario.locations().len(), 3);

        let trip = &scenario.trips[0];
        assert_eq!(trip.route(), Some("10"));
        assert_eq!(trip.entries()[0].arrival, trip.entries()[0].departure);

        assert_eq!(scenario.tasks.len(), 2);
        assert!(matches!(scenario.tasks[0].origin, PointLocation::Landmark(_)));
        // Past-midnight start rolls onto the next day.
        assert_eq!(
            scenario.tasks[1].start_time.date(),
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );

        assert_eq!(scenario.search.max_depth, 3);
        assert_eq!(scenario.search.direction, SearchDirection::Backward);
        assert!(scenario.osrm.is_none());
        assert_eq!(scenario.walking.meters_per_second, WalkingConfig::default().meters_per_second);
    }

    #[test]
    fn every_location_lies_in_its_sector() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        for location in scenario.locations() {
            let sector = location.sector().unwrap();
            assert!(sector.contains(&location.point()), "{location}");
        }
    }

    #[test]
    fn rejects_unknown_origin() {
        let text = SCENARIO.replace(r#"{"stop": "S2"}"#, r#"{"stop": "S9"}"#);
        let err = Scenario::from_json(&text).unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownOrigin { task: 2, .. }));
    }

    #[test]
    fn rejects_trip_with_unknown_stop() {
        let text = SCENARIO.replace(r#"{"stop": "S2", "arrival""#, r#"{"stop": "S7", "arrival""#);
        let err = Scenario::from_json(&text).unwrap_err();
        assert_eq!(err.to_string(), "trip T1 calls at unknown stop S7");
    }

    #[test]
    fn rejects_duplicate_stop() {
        let text = SCENARIO.replace(r#""id": "S2""#, r#""id": "S1""#);
        assert!(matches!(
            Scenario::from_json(&text).unwrap_err(),
            ScenarioError::DuplicateId(_)
        ));
    }

    #[test]
    fn rejects_bad_time() {
        let text = SCENARIO.replace("12:05:00", "12:5");
        assert!(matches!(
            Scenario::from_json(&text).unwrap_err(),
            ScenarioError::InvalidTime { .. }
        ));
    }

    #[test]
    fn rejects_out_of_range_duration() {
        for secs in ["-1", "9300000000000000"] {
            let text = SCENARIO.replace("900", secs);
            let err = Scenario::from_json(&text).unwrap_err();
            assert!(matches!(err, ScenarioError::InvalidDuration(_)), "{secs}: {err}");
        }
    }

    #[test]
    fn explicit_grid_is_used() {
        let text = SCENARIO.replace(
            r#""stops""#,
            r#""grid": {"min_lat": 51.0, "min_lon": -1.0, "max_lat": 52.0, "max_lon": 0.0, "rows": 2, "cols": 2}, "stops""#,
        );
        let scenario = Scenario::from_json(&text).unwrap();
        assert_eq!(scenario.grid.sectors().len(), 4);
    }
}
