//! Sector grid: maps points to aggregation cells.
//!
//! The grid partitions a bounding box into `rows x cols` equal cells in
//! latitude/longitude space. Every stop and landmark is tagged with exactly
//! one sector via [`SectorGrid::sector_for`]; points outside the grid fall
//! back to the cell whose center is nearest.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{Bounds, DomainError, GeoPoint, GridPoint, GridPointId, Sector};

/// Lookup from a point to the region(s) containing it.
pub trait SectorLookup: Send + Sync {
    /// All sectors whose bounds contain `point`. A point on a shared edge
    /// belongs to every adjacent cell.
    fn get_sectors(&self, point: &GeoPoint) -> Vec<Sector>;

    /// The single sector a location is assigned to.
    fn sector_for(&self, point: &GeoPoint) -> Sector;
}

/// A regular lat/lon grid of sectors.
#[derive(Debug)]
pub struct SectorGrid {
    bounds: Bounds,
    rows: usize,
    cols: usize,
    /// Row-major, row 0 at `min_lat`.
    cells: Vec<Sector>,
    next_grid_id: AtomicU64,
}

impl SectorGrid {
    /// Build a grid covering `bounds`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `rows` or `cols` is zero or the bounds are empty.
    pub fn new(bounds: Bounds, rows: usize, cols: usize) -> Result<Self, DomainError> {
        if rows == 0 || cols == 0 {
            return Err(DomainError::InvalidGrid("rows and columns must be positive"));
        }
        if bounds.lat_span() <= 0.0 || bounds.lon_span() <= 0.0 {
            return Err(DomainError::InvalidGrid("bounds must have positive area"));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let (min_lat, max_lat) = edges(bounds.min_lat, bounds.max_lat, rows, row);
                let (min_lon, max_lon) = edges(bounds.min_lon, bounds.max_lon, cols, col);
                cells.push(Sector::new(Bounds {
                    min_lat,
                    min_lon,
                    max_lat,
                    max_lon,
                }));
            }
        }

        Ok(Self {
            bounds,
            rows,
            cols,
            cells,
            next_grid_id: AtomicU64::new(0),
        })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.cells
    }

    fn cell(&self, row: usize, col: usize) -> Option<&Sector> {
        self.cells.get(row * self.cols + col)
    }

    /// Fractional row/column position of a point.
    fn position(&self, point: &GeoPoint) -> (f64, f64) {
        let row = (point.lat - self.bounds.min_lat) / self.bounds.lat_span() * self.rows as f64;
        let col = (point.lon - self.bounds.min_lon) / self.bounds.lon_span() * self.cols as f64;
        (row, col)
    }

    fn nearest(&self, point: &GeoPoint) -> Sector {
        let mut best: Option<(f64, Sector)> = None;
        for sector in &self.cells {
            let d = sector.center().distance_m(point);
            if best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, *sector));
            }
        }
        // cells is never empty: rows and cols are validated positive.
        best.map_or_else(|| Sector::new(self.bounds), |(_, sector)| sector)
    }

    /// Grid points where the segment `a -> b` crosses interior grid lines,
    /// ordered from `a` to `b`.
    pub fn grid_crossings(&self, a: &GeoPoint, b: &GeoPoint) -> Vec<GridPoint> {
        let mut crossings: Vec<(f64, GeoPoint)> = Vec::new();

        for i in 1..self.rows {
            let (line, _) = edges(self.bounds.min_lat, self.bounds.max_lat, self.rows, i);
            if let Some(t) = crossing(a.lat, b.lat, line) {
                crossings.push((t, GeoPoint::new(line, lerp(a.lon, b.lon, t))));
            }
        }
        for j in 1..self.cols {
            let (line, _) = edges(self.bounds.min_lon, self.bounds.max_lon, self.cols, j);
            if let Some(t) = crossing(a.lon, b.lon, line) {
                crossings.push((t, GeoPoint::new(lerp(a.lat, b.lat, t), line)));
            }
        }

        crossings.sort_by(|x, y| x.0.total_cmp(&y.0));
        crossings
            .into_iter()
            .map(|(_, point)| GridPoint {
                id: GridPointId(self.next_grid_id.fetch_add(1, Ordering::Relaxed)),
                sector: self.sector_for(&point),
                point,
            })
            .collect()
    }
}

impl SectorLookup for SectorGrid {
    fn get_sectors(&self, point: &GeoPoint) -> Vec<Sector> {
        if !self.bounds.contains(point) {
            return Vec::new();
        }
        let (row, col) = self.position(point);
        let row = row.floor() as i64;
        let col = col.floor() as i64;

        let mut out = Vec::new();
        for r in (row - 1)..=(row + 1) {
            for c in (col - 1)..=(col + 1) {
                let (Ok(r), Ok(c)) = (usize::try_from(r), usize::try_from(c)) else {
                    continue;
                };
                if r >= self.rows || c >= self.cols {
                    continue;
                }
                if let Some(sector) = self.cell(r, c)
                    && sector.contains(point)
                {
                    out.push(*sector);
                }
            }
        }
        out
    }

    fn sector_for(&self, point: &GeoPoint) -> Sector {
        if !self.bounds.contains(point) {
            return self.nearest(point);
        }
        let (row, col) = self.position(point);
        let row = (row.floor() as usize).min(self.rows - 1);
        let col = (col.floor() as usize).min(self.cols - 1);
        self.cell(row, col)
            .copied()
            .unwrap_or_else(|| self.nearest(point))
    }
}

/// Edges of cell `i` out of `n` between `min` and `max`. The final edge is
/// exactly `max` so the cells tile the bounds without gaps.
fn edges(min: f64, max: f64, n: usize, i: usize) -> (f64, f64) {
    let step = (max - min) / n as f64;
    let lo = min + step * i as f64;
    let hi = if i + 1 == n { max } else { min + step * (i + 1) as f64 };
    (lo, hi)
}

/// Parameter `t` in (0, 1) where the segment from `a` to `b` crosses `line`.
fn crossing(a: f64, b: f64, line: f64) -> Option<f64> {
    if (a < line && b > line) || (a > line && b < line) {
        Some((line - a) / (b - a))
    } else {
        None
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
