//! The vertex space of the search: stops, landmarks, grid points and sectors.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::geo::{Bounds, GeoPoint};

/// Error returned when an identifier cannot be used as a location key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier {value:?}: {reason}")]
pub struct InvalidId {
    value: String,
    reason: &'static str,
}

/// Generate a validated string identifier.
///
/// Identifiers end up inside store keys, so the key separator `|` is
/// rejected along with empty strings.
macro_rules! string_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier from a string.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                if s.is_empty() {
                    return Err(InvalidId { value: s.to_string(), reason: "must not be empty" });
                }
                if s.contains('|') {
                    return Err(InvalidId { value: s.to_string(), reason: "must not contain '|'" });
                }
                Ok(Self(s.to_string()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// Stable identifier of a transit stop.
    StopId
}

string_id! {
    /// Identifier of a landmark (task origin or point of interest).
    LandmarkId
}

/// Identifier of a generated grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPointId(pub u64);

/// Identity of a sector, derived from the bit patterns of its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectorId([u64; 4]);

/// A rectangular aggregation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sector {
    bounds: Bounds,
}

impl Sector {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn center(&self) -> GeoPoint {
        self.bounds.center()
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.bounds.contains(point)
    }

    pub fn id(&self) -> SectorId {
        SectorId([
            self.bounds.min_lat.to_bits(),
            self.bounds.min_lon.to_bits(),
            self.bounds.max_lat.to_bits(),
            self.bounds.max_lon.to_bits(),
        ])
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bounds)
    }
}

/// A scheduled-service stop.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitStop {
    pub id: StopId,
    pub name: String,
    pub point: GeoPoint,
    pub sector: Sector,
}

impl TransitStop {
    pub fn new(id: StopId, name: impl Into<String>, point: GeoPoint, sector: Sector) -> Self {
        Self {
            id,
            name: name.into(),
            point,
            sector,
        }
    }
}

/// An arbitrary point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmark {
    pub id: LandmarkId,
    pub name: String,
    pub point: GeoPoint,
    pub sector: Sector,
}

impl Landmark {
    pub fn new(id: LandmarkId, name: impl Into<String>, point: GeoPoint, sector: Sector) -> Self {
        Self {
            id,
            name: name.into(),
            point,
            sector,
        }
    }
}

/// A point where a grid line crosses a walkable street segment.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub id: GridPointId,
    pub point: GeoPoint,
    pub sector: Sector,
}

/// Hashable, orderable identity of any location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationKey {
    Stop(StopId),
    Landmark(LandmarkId),
    Grid(GridPointId),
    Sector(SectorId),
}

impl LocationKey {
    /// The stop id, if this key names a stop.
    pub fn as_stop(&self) -> Option<&StopId> {
        match self {
            LocationKey::Stop(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKey::Stop(id) => write!(f, "stop:{id}"),
            LocationKey::Landmark(id) => write!(f, "landmark:{id}"),
            LocationKey::Grid(id) => write!(f, "grid:{}", id.0),
            LocationKey::Sector(SectorId(bits)) => write!(
                f,
                "sector:{:016x}{:016x}{:016x}{:016x}",
                bits[0], bits[1], bits[2], bits[3]
            ),
        }
    }
}

/// Any location the search can reach.
///
/// Locations are shared between many paths and visitors, so the heavier
/// variants sit behind `Arc`. Equality, hashing and ordering go through
/// [`LocationKey`].
#[derive(Debug, Clone)]
pub enum PointLocation {
    Stop(Arc<TransitStop>),
    Landmark(Arc<Landmark>),
    Grid(Arc<GridPoint>),
    Sector(Sector),
}

impl PointLocation {
    pub fn key(&self) -> LocationKey {
        match self {
            PointLocation::Stop(stop) => LocationKey::Stop(stop.id.clone()),
            PointLocation::Landmark(landmark) => LocationKey::Landmark(landmark.id.clone()),
            PointLocation::Grid(grid) => LocationKey::Grid(grid.id),
            PointLocation::Sector(sector) => LocationKey::Sector(sector.id()),
        }
    }

    /// Representative coordinate. Sectors use their center.
    pub fn point(&self) -> GeoPoint {
        match self {
            PointLocation::Stop(stop) => stop.point,
            PointLocation::Landmark(landmark) => landmark.point,
            PointLocation::Grid(grid) => grid.point,
            PointLocation::Sector(sector) => sector.center(),
        }
    }

    /// The sector this location aggregates into. A sector has none.
    pub fn sector(&self) -> Option<Sector> {
        match self {
            PointLocation::Stop(stop) => Some(stop.sector),
            PointLocation::Landmark(landmark) => Some(landmark.sector),
            PointLocation::Grid(grid) => Some(grid.sector),
            PointLocation::Sector(_) => None,
        }
    }

    pub fn as_stop(&self) -> Option<&Arc<TransitStop>> {
        match self {
            PointLocation::Stop(stop) => Some(stop),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            PointLocation::Stop(stop) => stop.name.clone(),
            PointLocation::Landmark(landmark) => landmark.name.clone(),
            PointLocation::Grid(grid) => format!("grid point {}", grid.id.0),
            PointLocation::Sector(sector) => format!("sector {sector}"),
        }
    }
}

impl From<Arc<TransitStop>> for PointLocation {
    fn from(stop: Arc<TransitStop>) -> Self {
        PointLocation::Stop(stop)
    }
}

impl From<Arc<Landmark>> for PointLocation {
    fn from(landmark: Arc<Landmark>) -> Self {
        PointLocation::Landmark(landmark)
    }
}

impl PartialEq for PointLocation {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PointLocation {}

impl Hash for PointLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for PointLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PointLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for PointLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
