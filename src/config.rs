//! Immutable check configuration.
//!
//! Every check takes its configuration by reference and validates it before
//! touching any feature. Defaults are in map units of a projected coordinate
//! system (metres for most inputs).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFiniteValue { name, value })
    }
}

/// Validates a snap tolerance. Zero is allowed and means exact coincidence.
pub fn validate_tolerance(tolerance: f64) -> Result<f64, ConfigError> {
    let tolerance = finite("tolerance", tolerance)?;
    if tolerance < 0.0 {
        return Err(ConfigError::NegativeTolerance(tolerance));
    }
    Ok(tolerance)
}

/// Validates a grid cell size, which must be strictly positive.
pub fn validate_cell_size(cell_size: f64) -> Result<f64, ConfigError> {
    let cell_size = finite("cell size", cell_size)?;
    if cell_size <= 0.0 {
        return Err(ConfigError::NonPositiveCellSize(cell_size));
    }
    Ok(cell_size)
}

fn validate_ratio(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(name, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(value)
}

fn validate_non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    Ok(value)
}

/// Sizing of the generic grid index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Multiplier applied to the mean extent size.
    pub scale_factor: f64,
    /// Lower clamp for the mean extent size before scaling.
    pub min_cell_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            scale_factor: 2.0,
            min_cell_size: 10.0,
        }
    }
}

impl GridConfig {
    pub fn with_scale_factor(scale_factor: f64) -> Self {
        GridConfig {
            scale_factor,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_cell_size(self.min_cell_size)?;
        let scale = finite("scale factor", self.scale_factor)?;
        if scale <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "scale factor",
                value: scale,
                min: f64::MIN_POSITIVE,
                max: f64::INFINITY,
            });
        }
        Ok(())
    }
}

/// Road network checks: dangles, disconnected segments, self-intersections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadQcConfig {
    /// Maximum distance for two endpoints to count as snapped together.
    pub tolerance: f64,
    /// Parts shorter than this are flagged in the report.
    pub min_segment_length: f64,
}

impl Default for RoadQcConfig {
    fn default() -> Self {
        RoadQcConfig {
            tolerance: 0.5,
            min_segment_length: 1.0,
        }
    }
}

impl RoadQcConfig {
    pub fn with_tolerance(tolerance: f64) -> Self {
        RoadQcConfig {
            tolerance,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tolerance(self.tolerance)?;
        validate_non_negative("minimum segment length", self.min_segment_length)?;
        Ok(())
    }
}

/// Pairwise polygon overlap check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    /// Overlaps with less area than this are not reported.
    pub min_overlap_area: f64,
    /// Ratio (overlap area over the smaller polygon's area) at or above which
    /// a pair is a duplicate.
    pub duplicate_ratio_min: f64,
    /// Ratio at or above which a pair is a partial overlap. Anything below is
    /// a sliver.
    pub partial_ratio_min: f64,
    pub grid: GridConfig,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        OverlapConfig {
            min_overlap_area: 1.0,
            duplicate_ratio_min: 0.90,
            partial_ratio_min: 0.50,
            grid: GridConfig::default(),
        }
    }
}

impl OverlapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_non_negative("minimum overlap area", self.min_overlap_area)?;
        let duplicate = validate_ratio("duplicate ratio", self.duplicate_ratio_min)?;
        let partial = validate_ratio("partial ratio", self.partial_ratio_min)?;
        if partial > duplicate {
            return Err(ConfigError::InvalidThresholdOrder { partial, duplicate });
        }
        self.grid.validate()
    }
}

/// Building against road corridor conflict check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Conflicts with less area than this are not reported.
    pub min_conflict_area: f64,
    /// Half-width the road corridors were buffered with.
    pub buffer_distance: f64,
    pub grid: GridConfig,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        ConflictConfig {
            min_conflict_area: 0.5,
            buffer_distance: 5.0,
            grid: GridConfig::with_scale_factor(3.0),
        }
    }
}

impl ConflictConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_non_negative("minimum conflict area", self.min_conflict_area)?;
        validate_non_negative("buffer distance", self.buffer_distance)?;
        self.grid.validate()
    }
}
