//! Best-path bookkeeping per (location, task).
//!
//! The scorecard is the admission gate of the search: a visitor only forks a
//! continuation to a location if its path beats whatever is recorded there
//! for the same task. [`ScoreCard::try_improve`] does the check and the write
//! under one lock, so two sibling visitors racing for the same location
//! cannot both win.
//!
//! | Variant                  | Keeps                                       |
//! |--------------------------|---------------------------------------------|
//! | [`PathScoreCard`]        | the full best path                          |
//! | [`CountingScoreCard`]    | path summaries and tasks-per-location counts |
//! | [`SectorCenterScoreCard`]| which origins reached each sector          |
//! | [`PersistentScoreCard`]  | sector reach keyed by (sector, time, center) |

mod counting;
mod path;
mod persistent;
mod sector;
mod shards;
mod summary;

use crate::domain::{LocationKey, MovementPath, PointLocation, TaskId};
use crate::store::StoreError;

pub use counting::CountingScoreCard;
pub use path::PathScoreCard;
pub use persistent::{PersistentScoreCard, SectorReach};
pub use sector::SectorCenterScoreCard;
pub use summary::PathSummary;

/// Per-location best-path store.
///
/// All methods are safe to call from many visitor threads at once.
pub trait ScoreCard: Send + Sync {
    /// True if nothing is recorded for (location, task) or `candidate` is
    /// strictly better than what is.
    fn has_no_better_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> bool;

    /// Store `path` unconditionally. Callers are expected to have checked
    /// dominance first.
    fn put_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        path: &MovementPath,
    ) -> Result<(), StoreError>;

    /// Overwrite the recorded path. Same as [`put_path`](ScoreCard::put_path).
    fn replace_path(
        &self,
        location: &PointLocation,
        task: TaskId,
        path: &MovementPath,
    ) -> Result<(), StoreError> {
        self.put_path(location, task, path)
    }

    /// Record `candidate` if it is strictly better than the recorded path.
    /// Returns whether it was recorded. Check and write are atomic.
    fn try_improve(
        &self,
        location: &PointLocation,
        task: TaskId,
        candidate: &MovementPath,
    ) -> Result<bool, StoreError>;

    /// The recorded path, for variants that keep paths.
    fn best_path(&self, location: &PointLocation, task: TaskId) -> Option<MovementPath>;

    /// Every location with a record for `task`, sorted.
    fn locations_reached(&self, task: TaskId) -> Vec<LocationKey>;
}
