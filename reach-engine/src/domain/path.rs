//! Immutable movement paths and their ordering.
//!
//! A `MovementPath` is a persistent list: appending allocates one node that
//! points at the shared prefix, so sibling visitors forked from the same
//! parent share everything up to their fork point and never observe each
//! other's extensions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use super::{DomainError, LocationKey, Movement, MovementKind, ReachTime, SearchDirection, TripId};

struct PathNode {
    movement: Movement,
    parent: Option<Arc<PathNode>>,
    len: usize,
    walking_m: u64,
    moving: Duration,
}

/// An ordered, direction-consistent sequence of movements from an origin.
///
/// # Invariants
///
/// - Each movement starts where the previous one ended (or at the origin)
/// - Times never go against the search direction
///
/// # Ordering
///
/// `a < b` means `a` is the better path. Paths compare by, in order:
/// elapsed time from the start (earlier completion), total walking
/// distance, total time in motion, and movement count. Remaining ties are
/// broken by origin, start time, direction and finally the movements
/// themselves, so only identical paths compare equal.
#[derive(Clone)]
pub struct MovementPath {
    direction: SearchDirection,
    origin: LocationKey,
    start_time: ReachTime,
    tail: Option<Arc<PathNode>>,
}

impl MovementPath {
    /// A path with no movements, standing at `origin`.
    pub fn empty(origin: LocationKey, start_time: ReachTime, direction: SearchDirection) -> Self {
        Self {
            direction,
            origin,
            start_time,
            tail: None,
        }
    }

    /// Return a new path with `movement` appended. `self` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the movement does not start at this path's end, or
    /// if its times run against the search direction.
    pub fn append(&self, movement: Movement) -> Result<Self, DomainError> {
        let end = self.end_location();
        let start = movement.start_location();
        if start != end {
            return Err(DomainError::DisconnectedMovement {
                expected: end,
                found: start,
            });
        }
        if !self.direction.is_ordered(self.end_time(), movement.start_time())
            || !self.direction.is_ordered(movement.start_time(), movement.end_time())
        {
            return Err(DomainError::MovementBackInTime {
                at: movement.start_location(),
            });
        }

        let (len, walking_m, moving) = match &self.tail {
            Some(node) => (node.len, node.walking_m, node.moving),
            None => (0, 0, Duration::zero()),
        };
        let node = PathNode {
            walking_m: walking_m.saturating_add(movement.walking_distance_m()),
            moving: moving + movement.duration(),
            len: len + 1,
            parent: self.tail.clone(),
            movement,
        };

        Ok(Self {
            direction: self.direction,
            origin: self.origin.clone(),
            start_time: self.start_time,
            tail: Some(Arc::new(node)),
        })
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    pub fn origin(&self) -> &LocationKey {
        &self.origin
    }

    pub fn start_time(&self) -> ReachTime {
        self.start_time
    }

    /// Where the path currently ends.
    pub fn end_location(&self) -> LocationKey {
        match &self.tail {
            Some(node) => node.movement.end_location(),
            None => self.origin.clone(),
        }
    }

    /// Time at the end of the path.
    pub fn end_time(&self) -> ReachTime {
        match &self.tail {
            Some(node) => node.movement.end_time(),
            None => self.start_time,
        }
    }

    /// Time from the start to the end of the path, waiting included.
    pub fn elapsed(&self) -> Duration {
        self.end_time().abs_diff(self.start_time)
    }

    /// Sum of movement durations (time in motion).
    pub fn total_duration(&self) -> Duration {
        self.tail
            .as_ref()
            .map_or_else(Duration::zero, |node| node.moving)
    }

    /// Metres walked along the path.
    pub fn walking_distance_m(&self) -> u64 {
        self.tail.as_ref().map_or(0, |node| node.walking_m)
    }

    pub fn len(&self) -> usize {
        self.tail.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
    }

    pub fn last(&self) -> Option<&Movement> {
        self.tail.as_ref().map(|node| &node.movement)
    }

    pub fn last_kind(&self) -> Option<MovementKind> {
        self.last().map(Movement::kind)
    }

    /// Trip of the final movement, if it was a ride.
    pub fn last_trip(&self) -> Option<&TripId> {
        self.last().and_then(Movement::trip)
    }

    /// Movements in order from the origin.
    pub fn movements(&self) -> Vec<&Movement> {
        let mut out = Vec::with_capacity(self.len());
        let mut cursor = self.tail.as_deref();
        while let Some(node) = cursor {
            out.push(&node.movement);
            cursor = node.parent.as_deref();
        }
        out.reverse();
        out
    }

    /// Strictly better under the path ordering.
    pub fn is_better_than(&self, other: &MovementPath) -> bool {
        self < other
    }

    fn tie_break(&self, other: &Self) -> Ordering {
        let same_tail = match (&self.tail, &other.tail) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.origin
            .cmp(&other.origin)
            .then_with(|| self.start_time.cmp(&other.start_time))
            .then_with(|| direction_rank(self.direction).cmp(&direction_rank(other.direction)))
            .then_with(|| {
                if same_tail {
                    Ordering::Equal
                } else {
                    self.movements().cmp(&other.movements())
                }
            })
    }
}

fn direction_rank(direction: SearchDirection) -> u8 {
    match direction {
        SearchDirection::Forward => 0,
        SearchDirection::Backward => 1,
    }
}

impl Ord for MovementPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.elapsed()
            .cmp(&other.elapsed())
            .then_with(|| self.walking_distance_m().cmp(&other.walking_distance_m()))
            .then_with(|| self.total_duration().cmp(&other.total_duration()))
            .then_with(|| self.len().cmp(&other.len()))
            .then_with(|| self.tie_break(other))
    }
}

impl PartialOrd for MovementPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MovementPath {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MovementPath {}

impl fmt::Debug for MovementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementPath")
            .field("origin", &self.origin)
            .field("start_time", &self.start_time)
            .field("direction", &self.direction)
            .field("movements", &self.movements())
            .finish()
    }
}
