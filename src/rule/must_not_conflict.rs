use geo::{Area, BooleanOps, MultiPolygon};
use serde::Serialize;

use super::must_not_overlap::prepare;
use crate::{
    config::ConflictConfig,
    error::{Checked, ConfigError},
    index::{compute_optimal_cell_size, SpatialIndex},
    util::extents_intersect,
    FeatureId, PolygonFeature,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictResult {
    pub building_id: FeatureId,
    pub road_id: FeatureId,
    pub area: f64,
    pub buffer_distance: f64,
    pub conflict: MultiPolygon<f64>,
}

pub trait MustNotConflict {
    /// Buildings encroaching on road corridors.
    ///
    /// `corridors` are the roads already buffered by `config.buffer_distance`;
    /// producing them is left to whatever geometry provider the caller uses.
    fn must_not_conflict_with(
        &self,
        corridors: &[PolygonFeature],
        config: &ConflictConfig,
    ) -> Result<Checked<Vec<ConflictResult>>, ConfigError>;
}

impl MustNotConflict for [PolygonFeature] {
    fn must_not_conflict_with(
        &self,
        corridors: &[PolygonFeature],
        config: &ConflictConfig,
    ) -> Result<Checked<Vec<ConflictResult>>, ConfigError> {
        config.validate()?;
        let mut issues = Vec::new();
        let buildings = prepare(self, &mut issues);
        let corridors = prepare(corridors, &mut issues);

        // Cells are at least as wide as a corridor so one road does not touch
        // a long run of cells.
        let extents: Vec<_> = buildings.iter().map(|building| building.extent).collect();
        let cell_size =
            compute_optimal_cell_size(&extents, &config.grid).max(config.buffer_distance * 2.0);
        let index = SpatialIndex::build(
            extents.into_iter().enumerate(),
            Some(cell_size),
            &config.grid,
        )?;
        tracing::info!(
            buildings = buildings.len(),
            corridors = corridors.len(),
            cell_size,
            "building index built"
        );

        let mut results = Vec::new();
        for road in &corridors {
            let mut candidates: Vec<usize> = index.query(&road.extent).into_iter().collect();
            candidates.sort_unstable();
            for building in candidates.into_iter().map(|i| &buildings[i]) {
                if !extents_intersect(&road.extent, &building.extent) {
                    continue;
                }
                let conflict = building.feature.polygon.intersection(&road.feature.polygon);
                let area = conflict.unsigned_area();
                if area <= 0.0 || area < config.min_conflict_area {
                    continue;
                }
                results.push(ConflictResult {
                    building_id: building.feature.id,
                    road_id: road.feature.id,
                    area,
                    buffer_distance: config.buffer_distance,
                    conflict,
                });
            }
        }
        tracing::info!(conflicts = results.len(), "conflict check complete");
        Ok(Checked::new(results, issues))
    }
}
