//! Walking cost values.

use std::fmt;

use chrono::Duration;

/// Time and distance to walk between two locations.
///
/// `duration` decides reachability. `distance_m` is informational and is
/// `None` when the provider that computed the cost does not report distance
/// (an OSRM table queried for durations only, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WalkingCosts {
    duration: Duration,
    distance_m: Option<u32>,
}

impl WalkingCosts {
    /// Sentinel distance emitted when none was computed.
    pub const UNKNOWN_DISTANCE: i64 = -1;

    pub fn new(duration: Duration, distance_m: Option<u32>) -> Self {
        Self {
            duration,
            distance_m,
        }
    }

    /// Costs known only by duration.
    pub fn duration_only(duration: Duration) -> Self {
        Self::new(duration, None)
    }

    /// Derive costs from a distance at a constant walking pace.
    ///
    /// The duration is rounded up to the next whole second, so a walker never
    /// arrives earlier than the pace allows. A non-positive pace yields
    /// `None`.
    pub fn from_distance(distance_m: f64, meters_per_second: f64) -> Option<Self> {
        if meters_per_second <= 0.0 || !distance_m.is_finite() || distance_m < 0.0 {
            return None;
        }
        let secs = (distance_m / meters_per_second).ceil();
        if secs > i64::MAX as f64 {
            return None;
        }
        let rounded = distance_m.round();
        let distance = if rounded > f64::from(u32::MAX) {
            u32::MAX
        } else {
            rounded as u32
        };
        Some(Self::new(Duration::seconds(secs as i64), Some(distance)))
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn distance_m(&self) -> Option<u32> {
        self.distance_m
    }

    /// Distance with the `-1` sentinel for telemetry output.
    pub fn distance_or_sentinel(&self) -> i64 {
        self.distance_m
            .map_or(Self::UNKNOWN_DISTANCE, i64::from)
    }

    /// Inclusive admission test against a time budget.
    pub fn fits_within(&self, budget: Duration) -> bool {
        self.duration <= budget
    }
}

impl fmt::Display for WalkingCosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}s/{}m",
            self.duration.num_seconds(),
            self.distance_or_sentinel()
        )
    }
}
