//! Scheduled vehicle runs.
//!
//! A `Trip` is the output of schedule loading: an immutable, validated
//! sequence of stop times for one vehicle on one service day. Trips are
//! shared behind `Arc` by every entry point and rider that refers to them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::location::{InvalidId, StopId};
use super::{DomainError, ReachTime};

/// Stable identifier of a trip.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TripId(String);

impl TripId {
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        // Trip ids share the stop id rules.
        StopId::parse(s).map(|id| Self(id.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TripId {
    type Error = InvalidId;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TripId> for String {
    fn from(id: TripId) -> String {
        id.0
    }
}

impl fmt::Debug for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripId({})", self.0)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stop on a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub stop: StopId,
    pub arrival: ReachTime,
    pub departure: ReachTime,
}

impl ScheduleEntry {
    pub fn new(stop: StopId, arrival: ReachTime, departure: ReachTime) -> Self {
        Self {
            stop,
            arrival,
            departure,
        }
    }
}

/// A scheduled vehicle run.
///
/// # Invariants
///
/// - At least two entries
/// - `arrival <= departure` at every entry
/// - Each entry's arrival is not before the previous entry's departure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    id: TripId,
    route: Option<String>,
    entries: Vec<ScheduleEntry>,
}

impl Trip {
    /// Construct a trip, validating its stop times.
    pub fn new(
        id: TripId,
        route: Option<String>,
        entries: Vec<ScheduleEntry>,
    ) -> Result<Self, DomainError> {
        if entries.len() < 2 {
            return Err(DomainError::InvalidTrip {
                trip: id,
                reason: "a trip needs at least two stops",
            });
        }
        for entry in &entries {
            if entry.departure < entry.arrival {
                return Err(DomainError::InvalidTrip {
                    trip: id,
                    reason: "departure before arrival at a stop",
                });
            }
        }
        for pair in entries.windows(2) {
            if let [prev, next] = pair
                && next.arrival < prev.departure
            {
                return Err(DomainError::InvalidTrip {
                    trip: id,
                    reason: "stop times go backwards",
                });
            }
        }
        Ok(Self { id, route, entries })
    }

    pub fn id(&self) -> &TripId {
        &self.id
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ScheduleEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices at which the trip calls at `stop`. Loop routes may call twice.
    pub fn indices_of<'a>(&'a self, stop: &'a StopId) -> impl Iterator<Item = usize> + 'a {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, e)| &e.stop == stop)
            .map(|(i, _)| i)
    }
}

/// An opportunity to board a trip at a stop.
///
/// `time` is the departure at `stop_index` for forward searches and the
/// arrival there for backward searches.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    pub trip: Arc<Trip>,
    pub stop_index: usize,
    pub time: ReachTime,
}

impl EntryPoint {
    pub fn trip_id(&self) -> &TripId {
        self.trip.id()
    }
}

impl PartialEq for EntryPoint {
    fn eq(&self, other: &Self) -> bool {
        self.trip.id() == other.trip.id()
            && self.stop_index == other.stop_index
            && self.time == other.time
    }
}

impl Eq for EntryPoint {}

impl std::hash::Hash for EntryPoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.trip.id().hash(state);
        self.stop_index.hash(state);
        self.time.hash(state);
    }
}
