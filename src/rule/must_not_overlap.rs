use geo::{Area, BooleanOps, BoundingRect, MultiPolygon, Rect};
use serde::Serialize;

use crate::{
    config::OverlapConfig,
    error::{skip, Checked, ConfigError, InputError, Issue},
    index::SpatialIndex,
    util::{extents_intersect, is_finite},
    FeatureId, PolygonFeature,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlapKind {
    Duplicate,
    Partial,
    Sliver,
}

/// Buckets an overlap ratio (overlap area over the smaller polygon's area).
pub fn classify_overlap(ratio: f64, config: &OverlapConfig) -> OverlapKind {
    if ratio >= config.duplicate_ratio_min {
        OverlapKind::Duplicate
    } else if ratio >= config.partial_ratio_min {
        OverlapKind::Partial
    } else {
        OverlapKind::Sliver
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapResult {
    pub id_a: FeatureId,
    pub id_b: FeatureId,
    pub kind: OverlapKind,
    pub area: f64,
    pub ratio: f64,
    pub overlap: MultiPolygon<f64>,
}

/// A polygon that passed validation, with what every pair test needs.
pub(crate) struct Prepared<'a> {
    pub feature: &'a PolygonFeature,
    pub extent: Rect<f64>,
    pub area: f64,
}

/// Drops polygons that cannot take part in an area test, recording why.
pub(crate) fn prepare<'a>(
    features: &'a [PolygonFeature],
    issues: &mut Vec<Issue>,
) -> Vec<Prepared<'a>> {
    features
        .iter()
        .filter_map(|feature| {
            let polygon = &feature.polygon;
            let invalid = |reason: &'static str| InputError::InvalidPolygon {
                feature_id: feature.id,
                reason,
            };
            let coords = polygon
                .exterior()
                .0
                .iter()
                .chain(polygon.interiors().iter().flat_map(|ring| ring.0.iter()));
            let error = if polygon.exterior().0.len() < 4 {
                invalid("exterior ring has fewer than three distinct vertices")
            } else if !coords.into_iter().all(is_finite) {
                invalid("non-finite coordinate")
            } else {
                let area = polygon.unsigned_area();
                match polygon.bounding_rect() {
                    Some(extent) if area > 0.0 => {
                        return Some(Prepared {
                            feature,
                            extent,
                            area,
                        })
                    }
                    _ => invalid("zero area"),
                }
            };
            skip(issues, error);
            None
        })
        .collect()
}

pub trait MustNotOverlap {
    /// Every pair of polygons sharing at least `min_overlap_area`, each
    /// unordered pair reported once with the lower input position first.
    fn must_not_overlap(&self, config: &OverlapConfig)
        -> Result<Checked<Vec<OverlapResult>>, ConfigError>;
}

impl MustNotOverlap for [PolygonFeature] {
    fn must_not_overlap(
        &self,
        config: &OverlapConfig,
    ) -> Result<Checked<Vec<OverlapResult>>, ConfigError> {
        config.validate()?;
        let mut issues = Vec::new();
        let polygons = prepare(self, &mut issues);
        let index = SpatialIndex::build(
            polygons
                .iter()
                .enumerate()
                .map(|(position, prepared)| (position, prepared.extent)),
            None,
            &config.grid,
        )?;
        tracing::info!(
            polygons = polygons.len(),
            cell_size = index.cell_size(),
            "overlap index built"
        );

        let mut results = Vec::new();
        for (i, a) in polygons.iter().enumerate() {
            let mut candidates: Vec<usize> = index
                .query(&a.extent)
                .into_iter()
                .filter(|j| *j > i)
                .collect();
            candidates.sort_unstable();
            for b in candidates.into_iter().map(|j| &polygons[j]) {
                if !extents_intersect(&a.extent, &b.extent) {
                    continue;
                }
                let overlap = a.feature.polygon.intersection(&b.feature.polygon);
                let area = overlap.unsigned_area();
                if area <= 0.0 || area < config.min_overlap_area {
                    continue;
                }
                let ratio = area / a.area.min(b.area);
                results.push(OverlapResult {
                    id_a: a.feature.id,
                    id_b: b.feature.id,
                    kind: classify_overlap(ratio, config),
                    area,
                    ratio,
                    overlap,
                });
            }
        }
        tracing::info!(overlaps = results.len(), "overlap check complete");
        Ok(Checked::new(results, issues))
    }
}
