//! Topology checks for planar line networks and polygon layers.
//!
//! Every check is a pure function of its input features and an immutable
//! configuration value: indexes are built per call and dropped with it.
//! Coordinates are treated as plain planar `(x, y)` pairs, so inputs must
//! already be projected.

use colored::Colorize;
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod rule;
pub mod util;

pub use config::{ConflictConfig, GridConfig, OverlapConfig, RoadQcConfig};
pub use engine::{run_road_qc, RoadQcReport, ShortPart};
pub use error::{AlgorithmError, Checked, ConfigError, InputError, Issue};

use rule::{ConflictResult, OverlapResult};

pub type FeatureId = i64;

/// A line feature: one or more continuous vertex chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub parts: Vec<LineString<f64>>,
}

impl Feature {
    pub fn new(id: FeatureId, parts: Vec<LineString<f64>>) -> Self {
        Feature { id, parts }
    }

    pub fn single(id: FeatureId, part: LineString<f64>) -> Self {
        Feature {
            id,
            parts: vec![part],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonFeature {
    pub id: FeatureId,
    pub polygon: Polygon<f64>,
}

impl PolygonFeature {
    pub fn new(id: FeatureId, polygon: Polygon<f64>) -> Self {
        PolygonFeature { id, polygon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Start,
    End,
}

/// First or last vertex of one part of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Endpoint {
    pub feature_id: FeatureId,
    pub part_index: usize,
    pub end: EndpointKind,
    pub coord: Coord<f64>,
}

/// Findings of one rule, grouped by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    Dangles(Vec<rule::DangleResult>),
    Disconnected(Vec<FeatureId>),
    SelfIntersections(Vec<rule::IntersectionPoint>),
    ShortParts(Vec<ShortPart>),
    Overlaps(Vec<OverlapResult>),
    Conflicts(Vec<ConflictResult>),
}

impl TopologyError {
    fn len(&self) -> usize {
        match self {
            TopologyError::Dangles(vec) => vec.len(),
            TopologyError::Disconnected(vec) => vec.len(),
            TopologyError::SelfIntersections(vec) => vec.len(),
            TopologyError::ShortParts(vec) => vec.len(),
            TopologyError::Overlaps(vec) => vec.len(),
            TopologyError::Conflicts(vec) => vec.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::Dangles(_) => write!(f, "{} dangles", self.len()),
            TopologyError::Disconnected(_) => write!(f, "{} disconnected features", self.len()),
            TopologyError::SelfIntersections(_) => {
                write!(f, "{} self-intersections", self.len())
            }
            TopologyError::ShortParts(_) => write!(f, "{} short parts", self.len()),
            TopologyError::Overlaps(_) => write!(f, "{} overlaps", self.len()),
            TopologyError::Conflicts(_) => write!(f, "{} conflicts", self.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopologyResult {
    Errors(Vec<TopologyError>),
    Valid,
}

impl TopologyResult {
    /// `Valid` when every group is empty; empty groups are dropped otherwise.
    pub fn from_errors(errors: Vec<TopologyError>) -> Self {
        let errors: Vec<TopologyError> = errors.into_iter().filter(|e| !e.is_empty()).collect();
        if errors.is_empty() {
            TopologyResult::Valid
        } else {
            TopologyResult::Errors(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Self::Valid => true,
            Self::Errors(_) => false,
        }
    }

    pub fn errors(&self) -> &[TopologyError] {
        match self {
            Self::Errors(errors) => errors,
            Self::Valid => &[],
        }
    }
}

impl From<&RoadQcReport> for TopologyResult {
    fn from(report: &RoadQcReport) -> Self {
        TopologyResult::from_errors(vec![
            TopologyError::Dangles(report.dangles.clone()),
            TopologyError::Disconnected(report.disconnected.iter().copied().collect()),
            TopologyError::SelfIntersections(report.self_intersections.clone()),
            TopologyError::ShortParts(report.short_parts.clone()),
        ])
    }
}

/// Named rule results plus how many inputs each rule had to skip.
#[derive(Debug, Default)]
pub struct TopologyResults(pub Vec<(String, TopologyResult, usize)>);

impl TopologyResults {
    pub fn push(&mut self, rule: impl Into<String>, result: TopologyResult, skipped: usize) {
        self.0.push((rule.into(), result, skipped));
    }

    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|(_, result, _)| result.is_valid())
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();
        for (rule, result, skipped) in &self.0 {
            summary.push_str(format!("{0: <25}", rule).as_str());
            if result.is_valid() {
                summary.push_str(
                    format!("{0: >25}\n", "No topology errors found.".green()).as_str(),
                );
            } else {
                for error in result.errors() {
                    summary.push_str(format!("{0: >25}\n", error.to_string().red()).as_str());
                    summary.push_str(format!("{0: <25}", "").as_str());
                }
                summary.truncate(summary.trim_end_matches(' ').len());
            }
            if *skipped > 0 {
                summary.push_str(
                    format!("{0: <25}{1: >25}\n", "", format!("{skipped} skipped").yellow())
                        .as_str(),
                );
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn empty_groups_are_valid() {
        let result = TopologyResult::from_errors(vec![
            TopologyError::Dangles(vec![]),
            TopologyError::Overlaps(vec![]),
        ]);
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn error_display() {
        let result = TopologyResult::from_errors(vec![
            TopologyError::Disconnected(vec![3, 4]),
            TopologyError::Conflicts(vec![]),
        ]);
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].to_string(), "2 disconnected features");
    }

    #[test]
    fn summary_lists_every_rule() {
        colored::control::set_override(false);
        let mut results = TopologyResults::default();
        results.push("Must not overlap", TopologyResult::Valid, 0);
        results.push(
            "Must not have dangles",
            TopologyResult::Errors(vec![TopologyError::Disconnected(vec![1])]),
            2,
        );
        let summary = results.summary();
        assert!(summary.contains("Must not overlap"));
        assert!(summary.contains("No topology errors found."));
        assert!(summary.contains("1 disconnected features"));
        assert!(summary.contains("2 skipped"));
        assert!(!results.is_valid());
    }

    // Test for the README.md file.
    #[cfg(doctest)]
    mod test_readme {
        macro_rules! external_doc_test {
            ($x:expr) => {
                #[doc = $x]
                extern "C" {}
            };
        }

        external_doc_test!(include_str!("../README.md"));
    }
}
