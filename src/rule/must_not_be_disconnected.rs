use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::must_not_have_dangles::{classify, DangleResult};
use crate::{
    config::RoadQcConfig,
    error::{Checked, ConfigError},
    util::feature_endpoints,
    Feature, FeatureId,
};

/// Fully isolated features, along with the dangle classification they were
/// derived from so callers do not have to classify twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disconnected {
    pub features: BTreeSet<FeatureId>,
    pub dangles: Vec<DangleResult>,
}

/// Features whose every classified endpoint, across all parts, is a dangle.
///
/// One connected end is enough to keep a feature out: that is an ordinary
/// stub, not an isolated segment.
pub fn disconnected_from(results: &[DangleResult]) -> BTreeSet<FeatureId> {
    let mut all_dangle: BTreeMap<FeatureId, bool> = BTreeMap::new();
    for result in results {
        *all_dangle.entry(result.feature_id).or_insert(true) &= result.is_dangle;
    }
    all_dangle
        .into_iter()
        .filter_map(|(feature_id, isolated)| isolated.then_some(feature_id))
        .collect()
}

/// Classifies every endpoint of `features` and derives the isolated ones.
pub fn find_disconnected(
    features: &[Feature],
    tolerance: f64,
) -> Result<Checked<Disconnected>, ConfigError> {
    let mut issues = Vec::new();
    let endpoints = feature_endpoints(features, &mut issues);
    let dangles = classify(&endpoints, tolerance)?;
    let features = disconnected_from(&dangles);
    tracing::info!(disconnected = features.len(), "disconnected features found");
    Ok(Checked::new(Disconnected { features, dangles }, issues))
}

pub trait MustNotBeDisconnected {
    fn must_not_be_disconnected(
        &self,
        config: &RoadQcConfig,
    ) -> Result<Checked<Disconnected>, ConfigError>;
}

impl MustNotBeDisconnected for [Feature] {
    fn must_not_be_disconnected(
        &self,
        config: &RoadQcConfig,
    ) -> Result<Checked<Disconnected>, ConfigError> {
        config.validate()?;
        find_disconnected(self, config.tolerance)
    }
}
