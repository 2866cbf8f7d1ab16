//! Fixed-radius spatial hash over line endpoints.
//!
//! Cells are as wide as the snap tolerance, so two endpoints within tolerance
//! of each other always sit in the same cell or in adjacent ones and a 3×3
//! scan around a cell sees every possible match. Expected cost is O(1) per
//! lookup for roughly uniform density; many endpoints piled into a single cell
//! degrade that cell to a pairwise scan.

use std::cell::Cell;
use std::collections::HashMap;

use super::CellKey;
use crate::config::validate_tolerance;
use crate::error::ConfigError;
use crate::util::distance_sq;
use crate::Endpoint;

/// Cell size used when the tolerance is zero. Only identical coordinates can
/// match then, and identical coordinates always share a cell.
const EXACT_MATCH_CELL_SIZE: f64 = 1.0;

#[derive(Debug)]
pub struct EndpointHashIndex<'a> {
    endpoints: &'a [Endpoint],
    tolerance_sq: f64,
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    examined: Cell<usize>,
}

impl<'a> EndpointHashIndex<'a> {
    pub fn build(endpoints: &'a [Endpoint], tolerance: f64) -> Result<Self, ConfigError> {
        let tolerance = validate_tolerance(tolerance)?;
        let cell_size = if tolerance > 0.0 {
            tolerance
        } else {
            EXACT_MATCH_CELL_SIZE
        };
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (i, endpoint) in endpoints.iter().enumerate() {
            cells
                .entry(CellKey::of(endpoint.coord, cell_size))
                .or_default()
                .push(i);
        }
        Ok(EndpointHashIndex {
            endpoints,
            tolerance_sq: tolerance * tolerance,
            cell_size,
            cells,
            examined: Cell::new(0),
        })
    }

    /// Indices of every endpoint in the 3×3 block around the cell of `endpoint`,
    /// including `endpoint` itself.
    pub fn neighbourhood(&self, endpoint: &Endpoint) -> impl Iterator<Item = usize> + '_ {
        CellKey::of(endpoint.coord, self.cell_size)
            .block()
            .filter_map(|key| self.cells.get(&key))
            .flatten()
            .copied()
    }

    /// First endpoint of a different feature within tolerance of `endpoint`.
    ///
    /// Endpoints of the same feature never count, including those of its other
    /// parts: a feature cannot connect to itself.
    pub fn connection(&self, endpoint: &Endpoint) -> Option<&'a Endpoint> {
        let endpoints = self.endpoints;
        self.neighbourhood(endpoint)
            .map(|i| &endpoints[i])
            .find(|candidate| {
                self.examined.set(self.examined.get() + 1);
                candidate.feature_id != endpoint.feature_id
                    && distance_sq(candidate.coord, endpoint.coord) <= self.tolerance_sq
            })
    }

    /// The endpoints the index was built over.
    pub fn endpoints(&self) -> &'a [Endpoint] {
        self.endpoints
    }

    /// Candidates compared by [`connection`](Self::connection) so far.
    pub fn examined(&self) -> usize {
        self.examined.get()
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
