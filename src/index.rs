//! Uniform grid structures that bound neighbour searches.

mod endpoint_hash;
mod grid;

pub use endpoint_hash::EndpointHashIndex;
pub use grid::{compute_optimal_cell_size, SpatialIndex, MAX_CELLS_PER_EXTENT};

use geo::Coord;

/// Integer address of a grid cell: `(floor(x / size), floor(y / size))`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    /// Cell containing `coord`. Coordinates beyond the `i64` range saturate
    /// into the outermost cells, which keeps lookups correct if slower.
    #[inline]
    pub fn of(coord: Coord<f64>, cell_size: f64) -> Self {
        CellKey {
            x: (coord.x / cell_size).floor() as i64,
            y: (coord.y / cell_size).floor() as i64,
        }
    }

    #[inline]
    pub fn offset(self, dx: i64, dy: i64) -> Self {
        CellKey {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// This cell and its eight neighbours.
    pub fn block(self) -> impl Iterator<Item = CellKey> {
        (-1..=1).flat_map(move |dx| (-1..=1).map(move |dy| self.offset(dx, dy)))
    }
}
