//! Grid index over axis-aligned extents.
//!
//! Every extent is registered in each cell its bounding box overlaps, so a
//! query never misses a candidate that straddles a cell edge. The index is a
//! filter: callers still run an exact geometric test on what it returns.
//!
//! # Performance
//!
//! - Build: O(n × k) where k is the number of cells an extent spans
//! - Query: O(c + m) for c cells touched and m entries found in them
//!
//! Cells much smaller than the typical extent inflate k and memory; cells much
//! larger than it put everything in one bucket and queries degrade toward a
//! full scan. [`compute_optimal_cell_size`] picks a size between the two.
//! k is capped at [`MAX_CELLS_PER_EXTENT`]; larger extents skip the grid and
//! are returned by every query.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use geo::Rect;

use super::CellKey;
use crate::config::{validate_cell_size, GridConfig};
use crate::error::ConfigError;

/// Mean of all extent widths and heights, clamped below by
/// `config.min_cell_size` and scaled by `config.scale_factor`.
///
/// Always strictly positive for a valid `config`, and never decreases when the
/// extents grow.
pub fn compute_optimal_cell_size(extents: &[Rect<f64>], config: &GridConfig) -> f64 {
    let mean = if extents.is_empty() {
        0.0
    } else {
        let total: f64 = extents.iter().map(|e| e.width() + e.height()).sum();
        total / (2 * extents.len()) as f64
    };
    mean.max(config.min_cell_size) * config.scale_factor
}

/// Extents spanning more cells than this are kept outside the grid.
pub const MAX_CELLS_PER_EXTENT: i128 = 1 << 16;

/// Number of cells in the block from `lo` to `hi` inclusive.
fn span(lo: CellKey, hi: CellKey) -> i128 {
    (hi.x as i128 - lo.x as i128 + 1) * (hi.y as i128 - lo.y as i128 + 1)
}

#[derive(Clone, Debug)]
pub struct SpatialIndex<K> {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<K>>,
    /// Entries too large for the grid; every query returns them.
    oversized: Vec<K>,
    len: usize,
}

impl<K: Copy + Eq + Hash> SpatialIndex<K> {
    /// Empty index with a fixed cell size.
    pub fn new(cell_size: f64) -> Result<Self, ConfigError> {
        Ok(SpatialIndex {
            cell_size: validate_cell_size(cell_size)?,
            cells: HashMap::new(),
            oversized: Vec::new(),
            len: 0,
        })
    }

    /// Builds an index over `extents`. Without a `cell_size` hint the size comes
    /// from [`compute_optimal_cell_size`].
    pub fn build(
        extents: impl IntoIterator<Item = (K, Rect<f64>)>,
        cell_size: Option<f64>,
        config: &GridConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let extents: Vec<(K, Rect<f64>)> = extents.into_iter().collect();
        let cell_size = match cell_size {
            Some(size) => size,
            None => {
                let rects: Vec<Rect<f64>> = extents.iter().map(|(_, rect)| *rect).collect();
                compute_optimal_cell_size(&rects, config)
            }
        };
        let mut index = SpatialIndex::new(cell_size)?;
        for (id, rect) in extents {
            index.insert(id, rect);
        }
        tracing::debug!(
            entries = index.len,
            cells = index.cells.len(),
            cell_size = index.cell_size,
            "spatial index built"
        );
        Ok(index)
    }

    /// Registers `id` in every cell `bbox` overlaps. Extents with non-finite
    /// corners cannot be placed and are ignored. An extent covering more than
    /// [`MAX_CELLS_PER_EXTENT`] cells is not gridded at all and comes back from
    /// every query instead.
    pub fn insert(&mut self, id: K, bbox: Rect<f64>) {
        let (min, max) = (bbox.min(), bbox.max());
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            tracing::warn!("ignoring extent with non-finite bounds");
            return;
        }
        let lo = CellKey::of(min, self.cell_size);
        let hi = CellKey::of(max, self.cell_size);
        self.len += 1;
        if span(lo, hi) > MAX_CELLS_PER_EXTENT {
            tracing::debug!(cell_size = self.cell_size, "extent too large for the grid");
            self.oversized.push(id);
            return;
        }
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                self.cells.entry(CellKey { x, y }).or_default().push(id);
            }
        }
    }

    /// Deduplicated ids of every entry sharing a cell with `bbox`.
    pub fn query(&self, bbox: &Rect<f64>) -> HashSet<K> {
        let mut found: HashSet<K> = self.oversized.iter().copied().collect();
        if self.cells.is_empty() {
            return found;
        }
        let lo = CellKey::of(bbox.min(), self.cell_size);
        let hi = CellKey::of(bbox.max(), self.cell_size);
        if span(lo, hi) > self.cells.len() as i128 {
            // Cheaper to walk the occupied cells than the query's footprint.
            for (key, ids) in &self.cells {
                if (lo.x..=hi.x).contains(&key.x) && (lo.y..=hi.y).contains(&key.y) {
                    found.extend(ids.iter().copied());
                }
            }
            return found;
        }
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                if let Some(ids) = self.cells.get(&CellKey { x, y }) {
                    found.extend(ids.iter().copied());
                }
            }
        }
        found
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of extents inserted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use itertools::Itertools;
    use rstar::{primitives::GeomWithData, primitives::Rectangle, RTree, AABB};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    #[test]
    fn degenerate_cell_size_fails() {
        assert_eq!(
            SpatialIndex::<usize>::new(0.0).unwrap_err(),
            ConfigError::NonPositiveCellSize(0.0)
        );
        assert!(SpatialIndex::<usize>::build(vec![], Some(-1.0), &GridConfig::default()).is_err());
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = SpatialIndex::<usize>::build(vec![], None, &GridConfig::default()).unwrap();
        assert!(index.is_empty());
        assert!(index.query(&rect(-1e9, -1e9, 1e9, 1e9)).is_empty());
    }

    #[test]
    fn straddling_extent_is_found_from_every_cell() {
        let mut index = SpatialIndex::new(10.0).unwrap();
        index.insert(7, rect(5., 5., 25., 15.));
        assert_eq!(index.cell_count(), 6);
        assert!(index.query(&rect(21., 1., 22., 2.)).contains(&7));
        assert!(index.query(&rect(1., 11., 2., 12.)).contains(&7));
        assert!(index.query(&rect(31., 1., 32., 2.)).is_empty());
    }

    #[test]
    fn query_deduplicates() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        index.insert(1, rect(0., 0., 5., 5.));
        index.insert(2, rect(0.5, 0.5, 0.6, 0.6));
        let found = index.query(&rect(0., 0., 5., 5.));
        assert_eq!(found.into_iter().sorted().collect_vec(), vec![1, 2]);
    }

    #[test]
    fn huge_query_walks_occupied_cells() {
        let mut index = SpatialIndex::new(1.0).unwrap();
        index.insert(1, rect(0., 0., 1., 1.));
        index.insert(2, rect(1e6, 1e6, 1e6 + 1., 1e6 + 1.));
        let found = index.query(&rect(-1e12, -1e12, 1e12, 1e12));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn huge_extent_on_a_fine_grid_is_not_gridded() {
        let mut index = SpatialIndex::new(1e-6).unwrap();
        index.insert(1, rect(0., 0., 1_000., 1_000.));
        index.insert(2, rect(5., 5., 5.000_001, 5.000_001));
        assert_eq!(index.len(), 2);
        assert!(index.cell_count() <= 9);
        let inside = index.query(&rect(5., 5., 5.000_001, 5.000_001));
        assert_eq!(inside.into_iter().sorted().collect_vec(), vec![1, 2]);
        assert_eq!(index.query(&rect(500., 500., 500.5, 500.5)).into_iter().collect_vec(), vec![1]);
    }

    #[test]
    fn optimal_cell_size() {
        let config = GridConfig::default();
        assert_eq!(compute_optimal_cell_size(&[], &config), 20.0);
        // Small extents are clamped to the minimum.
        assert_eq!(
            compute_optimal_cell_size(&[rect(0., 0., 1., 1.)], &config),
            20.0
        );
        assert_eq!(
            compute_optimal_cell_size(&[rect(0., 0., 40., 20.), rect(0., 0., 20., 0.)], &config),
            40.0
        );
    }

    #[test]
    fn optimal_cell_size_is_monotonic() {
        let config = GridConfig::with_scale_factor(2.5);
        let mut previous = 0.0;
        for size in [0.0, 1.0, 9.0, 10.0, 11.0, 100.0, 1000.0] {
            let cell = compute_optimal_cell_size(&[rect(0., 0., size, size)], &config);
            assert!(cell > 0.0);
            assert!(cell >= previous);
            previous = cell;
        }
    }

    #[test]
    fn never_misses_an_rtree_candidate() {
        // Deterministic pseudo-random extents of mixed sizes.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % 10_000) as f64 / 10.0
        };
        let extents = (0..500)
            .map(|i| {
                let (x, y) = (next(), next());
                let (w, h) = (next() / 20.0, next() / 50.0);
                (i, rect(x, y, x + w, y + h))
            })
            .collect_vec();
        let index = SpatialIndex::build(extents.clone(), None, &GridConfig::default()).unwrap();
        let tree = RTree::bulk_load(
            extents
                .iter()
                .map(|(i, r)| {
                    GeomWithData::new(
                        Rectangle::from_corners([r.min().x, r.min().y], [r.max().x, r.max().y]),
                        *i,
                    )
                })
                .collect_vec(),
        );
        for (_, query) in &extents {
            let envelope =
                AABB::from_corners([query.min().x, query.min().y], [query.max().x, query.max().y]);
            let candidates = index.query(query);
            for hit in tree.locate_in_envelope_intersecting(&envelope) {
                assert!(candidates.contains(&hit.data));
            }
        }
    }
}
