//! Road network quality control in one pass: dangles, disconnected segments,
//! self-intersections and short parts.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::{
    config::RoadQcConfig,
    error::{ConfigError, Issue},
    rule::{find_disconnected, find_self_intersections, DangleResult, IntersectionPoint},
    util::{chain_length, is_finite},
    Feature, FeatureId,
};

/// A part shorter than the configured minimum segment length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShortPart {
    pub feature_id: FeatureId,
    pub part_index: usize,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadQcReport {
    pub features: usize,
    /// Endpoints classified as dangles; connected ones are left out.
    pub dangles: Vec<DangleResult>,
    pub disconnected: BTreeSet<FeatureId>,
    pub self_intersections: Vec<IntersectionPoint>,
    pub short_parts: Vec<ShortPart>,
    pub issues: Vec<Issue>,
}

impl RoadQcReport {
    pub fn is_valid(&self) -> bool {
        self.dangles.is_empty() && self.disconnected.is_empty() && self.self_intersections.is_empty()
    }
}

/// Runs every road check over `features`.
///
/// Only an invalid `config` fails the run. Unusable features, parts and
/// segment pairs end up in `issues`; a part skipped by both the endpoint and
/// the self-intersection pass is listed once.
pub fn run_road_qc(features: &[Feature], config: &RoadQcConfig) -> Result<RoadQcReport, ConfigError> {
    config.validate()?;
    tracing::info!(
        features = features.len(),
        tolerance = config.tolerance,
        "road qc started"
    );

    let disconnected = find_disconnected(features, config.tolerance)?;
    let intersections = find_self_intersections(features);

    let mut issues = disconnected.issues;
    let mut seen: HashSet<Issue> = issues.iter().cloned().collect();
    for issue in intersections.issues {
        if seen.insert(issue.clone()) {
            issues.push(issue);
        }
    }

    let short_parts = features
        .iter()
        .flat_map(|feature| {
            feature
                .parts
                .iter()
                .enumerate()
                .filter(|(_, part)| part.0.len() >= 2 && part.0.iter().all(is_finite))
                .map(move |(part_index, part)| ShortPart {
                    feature_id: feature.id,
                    part_index,
                    length: chain_length(part),
                })
        })
        .filter(|part| part.length < config.min_segment_length)
        .collect();

    let report = RoadQcReport {
        features: features.len(),
        dangles: disconnected
            .value
            .dangles
            .into_iter()
            .filter(|result| result.is_dangle)
            .collect(),
        disconnected: disconnected.value.features,
        self_intersections: intersections.value,
        short_parts,
        issues,
    };
    tracing::info!(
        dangles = report.dangles.len(),
        disconnected = report.disconnected.len(),
        self_intersections = report.self_intersections.len(),
        skipped = report.issues.len(),
        "road qc complete"
    );
    Ok(report)
}
