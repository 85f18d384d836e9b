//! In-memory timetable index.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{EntryPoint, ReachTime, SearchDirection, StopId, TransitStop, Trip, TripId};

use super::{ScheduleError, ScheduleProvider};

/// One boarding opportunity in a per-stop index.
#[derive(Debug, Clone)]
struct Boarding {
    time: ReachTime,
    trip: Arc<Trip>,
    stop_index: usize,
}

/// Trips indexed by stop for window lookups.
///
/// Each stop keeps two lists sorted by time: departures (for forward
/// searches) and arrivals (for backward searches). A trip's final stop has
/// no departure entry and its first stop has no arrival entry, since there
/// is nowhere to ride from either.
#[derive(Debug, Default)]
pub struct TimetableSchedule {
    stops: HashMap<StopId, Arc<TransitStop>>,
    trips: HashMap<TripId, Arc<Trip>>,
    departures: HashMap<StopId, Vec<Boarding>>,
    arrivals: HashMap<StopId, Vec<Boarding>>,
}

impl TimetableSchedule {
    /// Index `trips` against `stops`.
    ///
    /// Trips calling at a stop that is not in `stops` are dropped with a
    /// warning.
    pub fn new(
        stops: impl IntoIterator<Item = Arc<TransitStop>>,
        trips: impl IntoIterator<Item = Arc<Trip>>,
    ) -> Self {
        let stops: HashMap<StopId, Arc<TransitStop>> =
            stops.into_iter().map(|s| (s.id.clone(), s)).collect();

        let mut schedule = Self {
            stops,
            ..Self::default()
        };

        for trip in trips {
            if let Some(missing) = trip
                .entries()
                .iter()
                .find(|e| !schedule.stops.contains_key(&e.stop))
            {
                warn!(trip = %trip.id(), stop = %missing.stop, "Dropping trip with unknown stop");
                continue;
            }
            schedule.index_trip(trip);
        }

        for list in schedule
            .departures
            .values_mut()
            .chain(schedule.arrivals.values_mut())
        {
            list.sort_by(|a, b| {
                a.time
                    .cmp(&b.time)
                    .then_with(|| a.trip.id().cmp(b.trip.id()))
                    .then_with(|| a.stop_index.cmp(&b.stop_index))
            });
        }

        debug!(
            stops = schedule.stops.len(),
            trips = schedule.trips.len(),
            "Indexed timetable"
        );
        schedule
    }

    fn index_trip(&mut self, trip: Arc<Trip>) {
        let last = trip.len().saturating_sub(1);
        for (i, entry) in trip.entries().iter().enumerate() {
            if i < last {
                self.departures
                    .entry(entry.stop.clone())
                    .or_default()
                    .push(Boarding {
                        time: entry.departure,
                        trip: Arc::clone(&trip),
                        stop_index: i,
                    });
            }
            if i > 0 {
                self.arrivals
                    .entry(entry.stop.clone())
                    .or_default()
                    .push(Boarding {
                        time: entry.arrival,
                        trip: Arc::clone(&trip),
                        stop_index: i,
                    });
            }
        }
        self.trips.insert(trip.id().clone(), trip);
    }

    pub fn stops(&self) -> impl Iterator<Item = &Arc<TransitStop>> {
        self.stops.values()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }
}

impl ScheduleProvider for TimetableSchedule {
    fn entry_points(
        &self,
        stop: &StopId,
        window_start: ReachTime,
        window_end: ReachTime,
        direction: SearchDirection,
    ) -> Result<Vec<EntryPoint>, ScheduleError> {
        if !self.stops.contains_key(stop) {
            return Err(ScheduleError::UnknownStop(stop.clone()));
        }
        let index = match direction {
            SearchDirection::Forward => &self.departures,
            SearchDirection::Backward => &self.arrivals,
        };
        let Some(list) = index.get(stop) else {
            return Ok(Vec::new());
        };

        let (lo, hi) = if window_start <= window_end {
            (window_start, window_end)
        } else {
            (window_end, window_start)
        };
        let first = list.partition_point(|b| b.time < lo);
        let found: Vec<EntryPoint> = list[first..]
            .iter()
            .take_while(|b| b.time <= hi)
            .map(|b| EntryPoint {
                trip: Arc::clone(&b.trip),
                stop_index: b.stop_index,
                time: b.time,
            })
            .collect();

        debug!(stop = %stop, from = %lo, to = %hi, entry_points = found.len(), "Looked up entry points");
        Ok(found)
    }

    fn trip(&self, id: &TripId) -> Result<Arc<Trip>, ScheduleError> {
        self.trips
            .get(id)
            .cloned()
            .ok_or_else(|| ScheduleError::UnknownTrip(id.clone()))
    }

    fn stop(&self, id: &StopId) -> Result<Arc<TransitStop>, ScheduleError> {
        self.stops
            .get(id)
            .cloned()
            .ok_or_else(|| ScheduleError::UnknownStop(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bounds, GeoPoint, ScheduleEntry, Sector};
    use chrono::NaiveDate;

    fn time(s: &str) -> ReachTime {
        ReachTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    fn stop(id: &str) -> Arc<TransitStop> {
        let sector = Sector::new(Bounds::from_corners(
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 1.0),
        ));
        Arc::new(TransitStop::new(
            StopId::parse(id).unwrap(),
            id,
            GeoPoint::new(0.5, 0.5),
            sector,
        ))
    }

    fn trip(id: &str, calls: &[(&str, &str, &str)]) -> Arc<Trip> {
        let entries = calls
            .iter()
            .map(|(s, arr, dep)| ScheduleEntry::new(StopId::parse(s).unwrap(), time(arr), time(dep)))
            .collect();
        Arc::new(Trip::new(TripId::parse(id).unwrap(), None, entries).unwrap())
    }

    fn schedule() -> TimetableSchedule {
        TimetableSchedule::new(
            vec![stop("A"), stop("B"), stop("C")],
            vec![
                trip("T1", &[("A", "10:00", "10:00"), ("B", "10:10", "10:11"), ("C", "10:20", "10:20")]),
                trip("T2", &[("A", "10:30", "10:30"), ("B", "10:40", "10:40")]),
            ],
        )
    }

    fn sid(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    #[test]
    fn forward_window_is_inclusive() {
        let s = schedule();
        let found = s
            .entry_points(&sid("A"), time("10:00"), time("10:30"), SearchDirection::Forward)
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].trip_id().as_str(), "T1");
        assert_eq!(found[1].time, time("10:30"));

        let found = s
            .entry_points(&sid("A"), time("10:01"), time("10:29"), SearchDirection::Forward)
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn last_stop_has_no_departures() {
        let s = schedule();
        let found = s
            .entry_points(&sid("C"), time("00:00"), time("23:59"), SearchDirection::Forward)
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn backward_uses_arrivals_and_accepts_reversed_window() {
        let s = schedule();
        let found = s
            .entry_points(&sid("B"), time("10:45"), time("10:05"), SearchDirection::Backward)
            .unwrap();
        let times: Vec<_> = found.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![time("10:10"), time("10:40")]);
        assert!(
            s.entry_points(&sid("A"), time("09:00"), time("11:00"), SearchDirection::Backward)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn unknown_lookups_error() {
        let s = schedule();
        assert!(matches!(
            s.entry_points(&sid("Z"), time("10:00"), time("11:00"), SearchDirection::Forward),
            Err(ScheduleError::UnknownStop(_))
        ));
        assert!(s.trip(&TripId::parse("T9").unwrap()).is_err());
        assert_eq!(s.stop(&sid("B")).unwrap().id, sid("B"));
    }

    #[test]
    fn trip_with_unknown_stop_is_dropped() {
        let s = TimetableSchedule::new(
            vec![stop("A")],
            vec![trip("T1", &[("A", "10:00", "10:00"), ("Q", "10:10", "10:10")])],
        );
        assert_eq!(s.trip_count(), 0);
    }
}
