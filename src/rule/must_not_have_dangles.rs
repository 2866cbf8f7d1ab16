use serde::Serialize;

use crate::{
    config::RoadQcConfig,
    error::{Checked, ConfigError},
    index::EndpointHashIndex,
    util::feature_endpoints,
    Endpoint, EndpointKind, Feature, FeatureId,
};
use geo::Coord;

/// Classification of one line endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DangleResult {
    pub feature_id: FeatureId,
    pub part_index: usize,
    pub end: EndpointKind,
    pub coord: Coord<f64>,
    pub is_dangle: bool,
}

/// Classifies every endpoint as dangling or connected.
///
/// An endpoint is connected when an endpoint of a *different* feature lies
/// within `tolerance`. A feature whose own endpoints coincide, such as a closed
/// loop, does not connect to itself, so an isolated loop is reported as two
/// dangles. A zero tolerance matches identical coordinates only.
pub fn classify(endpoints: &[Endpoint], tolerance: f64) -> Result<Vec<DangleResult>, ConfigError> {
    let index = EndpointHashIndex::build(endpoints, tolerance)?;
    tracing::info!(
        endpoints = endpoints.len(),
        cells = index.cell_count(),
        "endpoint index built"
    );
    Ok(classify_with(&index))
}

/// [`classify`] over an index that is already built, one lookup per endpoint.
pub fn classify_with(index: &EndpointHashIndex<'_>) -> Vec<DangleResult> {
    let results: Vec<DangleResult> = index
        .endpoints()
        .iter()
        .map(|endpoint| DangleResult {
            feature_id: endpoint.feature_id,
            part_index: endpoint.part_index,
            end: endpoint.end,
            coord: endpoint.coord,
            is_dangle: index.connection(endpoint).is_none(),
        })
        .collect();
    tracing::info!(
        dangles = results.iter().filter(|result| result.is_dangle).count(),
        examined = index.examined(),
        "endpoint classification complete"
    );
    results
}

pub trait MustNotHaveDangles {
    /// Classification of every usable endpoint; see [`classify`].
    fn must_not_have_dangles(
        &self,
        config: &RoadQcConfig,
    ) -> Result<Checked<Vec<DangleResult>>, ConfigError>;
}

impl MustNotHaveDangles for [Feature] {
    fn must_not_have_dangles(
        &self,
        config: &RoadQcConfig,
    ) -> Result<Checked<Vec<DangleResult>>, ConfigError> {
        config.validate()?;
        let mut issues = Vec::new();
        let endpoints = feature_endpoints(self, &mut issues);
        let results = classify(&endpoints, config.tolerance)?;
        Ok(Checked::new(results, issues))
    }
}
