use serde::Serialize;
use thiserror::Error;

use crate::FeatureId;

/// Invalid configuration. Raised before any feature is processed and aborts the
/// whole batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cell size must be strictly positive, got {0}")]
    NonPositiveCellSize(f64),

    #[error("tolerance must not be negative, got {0}")]
    NegativeTolerance(f64),

    #[error("{name} must be finite, got {value}")]
    NonFiniteValue { name: &'static str, value: f64 },

    #[error("{name} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("partial ratio {partial} must not exceed duplicate ratio {duplicate}")]
    InvalidThresholdOrder { partial: f64, duplicate: f64 },
}

/// A feature or part that could not be used. It is skipped and the run
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
pub enum InputError {
    #[error("feature {feature_id} has no geometry")]
    EmptyGeometry { feature_id: FeatureId },

    #[error("feature {feature_id} part {part_index} has {vertices} vertices, at least 2 are required")]
    TooFewVertices {
        feature_id: FeatureId,
        part_index: usize,
        vertices: usize,
    },

    #[error("feature {feature_id} part {part_index} has a non-finite coordinate")]
    NonFiniteCoordinate {
        feature_id: FeatureId,
        part_index: usize,
    },

    #[error("feature {feature_id} is not a valid polygon: {reason}")]
    InvalidPolygon {
        feature_id: FeatureId,
        reason: &'static str,
    },
}

/// A segment pair that could not be tested reliably. The pair is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
pub enum AlgorithmError {
    #[error("feature {feature_id} part {part_index}: segment {segment} has zero length")]
    DegenerateSegment {
        feature_id: FeatureId,
        part_index: usize,
        segment: usize,
    },

    #[error("feature {feature_id} part {part_index}: segments {first} and {second} overlap collinearly")]
    CollinearOverlap {
        feature_id: FeatureId,
        part_index: usize,
        first: usize,
        second: usize,
    },

    #[error("feature {feature_id} part {part_index}: crossing of segments {first} and {second} is numerically unstable")]
    NumericallyUnstable {
        feature_id: FeatureId,
        part_index: usize,
        first: usize,
        second: usize,
    },
}

/// Anything skipped during a check, in the order it was encountered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
pub enum Issue {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),
}

/// Output of a check together with whatever it had to skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checked<T> {
    pub value: T,
    pub issues: Vec<Issue>,
}

impl<T> Checked<T> {
    pub fn new(value: T, issues: Vec<Issue>) -> Self {
        Checked { value, issues }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Checked<U> {
        Checked {
            value: f(self.value),
            issues: self.issues,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Records an issue and emits it as a warning.
pub(crate) fn skip(issues: &mut Vec<Issue>, issue: impl Into<Issue>) {
    let issue = issue.into();
    tracing::warn!(%issue, "skipping");
    issues.push(issue);
}
