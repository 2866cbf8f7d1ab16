//! Self-crossing vertex chains.
//!
//! Every part is tested on its own with an exhaustive segment-pair scan:
//! crossings are intra-feature, so the cost is bounded by the vertex count of
//! the largest part rather than by the size of the dataset, and no index is
//! involved.

use geo::{Coord, LineString};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    error::{skip, AlgorithmError, Checked, Issue},
    util::{segment_contact, usable_parts, SegmentContact},
    Feature, FeatureId,
};

/// A location where a feature's geometry meets itself away from a shared
/// vertex of two consecutive segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntersectionPoint {
    pub feature_id: FeatureId,
    pub part_index: usize,
    pub x: f64,
    pub y: f64,
}

impl IntersectionPoint {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Self-intersections of one part.
///
/// Pairs of consecutive segments are never tested since they legitimately
/// share a vertex, and neither is the first/last pair of a closed chain. Any
/// other pair reports the single location it meets at, whether the segments
/// cross properly or the chain revisits a vertex. Each location is reported
/// once per part.
fn part_intersections(
    feature_id: FeatureId,
    part_index: usize,
    part: &LineString<f64>,
    issues: &mut Vec<Issue>,
) -> Vec<IntersectionPoint> {
    // Zero-length segments are dropped up front so the segments either side of
    // a repeated vertex stay consecutive.
    let mut segments = Vec::with_capacity(part.0.len());
    for (segment, pair) in part.0.windows(2).enumerate() {
        if pair[0] == pair[1] {
            skip(
                issues,
                AlgorithmError::DegenerateSegment {
                    feature_id,
                    part_index,
                    segment,
                },
            );
            continue;
        }
        segments.push((segment, pair[0], pair[1]));
    }
    let closed = part.is_closed() && segments.len() > 2;

    let mut found: Vec<Coord<f64>> = Vec::new();
    for (i, j) in (0..segments.len()).tuple_combinations() {
        if j == i + 1 || (closed && i == 0 && j == segments.len() - 1) {
            continue;
        }
        let ((first, p1, q1), (second, p2, q2)) = (segments[i], segments[j]);
        match segment_contact(p1, q1, p2, q2) {
            SegmentContact::Disjoint => {}
            SegmentContact::Point { at, .. } => {
                if !found.contains(&at) {
                    found.push(at);
                }
            }
            SegmentContact::Overlap => skip(
                issues,
                AlgorithmError::CollinearOverlap {
                    feature_id,
                    part_index,
                    first,
                    second,
                },
            ),
            SegmentContact::Unstable => skip(
                issues,
                AlgorithmError::NumericallyUnstable {
                    feature_id,
                    part_index,
                    first,
                    second,
                },
            ),
        }
    }

    found
        .into_iter()
        .map(|at| IntersectionPoint {
            feature_id,
            part_index,
            x: at.x,
            y: at.y,
        })
        .collect()
}

/// Self-intersections of every feature, in input order.
pub fn find_self_intersections(features: &[Feature]) -> Checked<Vec<IntersectionPoint>> {
    let mut issues = Vec::new();
    let mut points = Vec::new();
    for feature in features {
        for (part_index, part) in usable_parts(feature, &mut issues) {
            points.extend(part_intersections(feature.id, part_index, part, &mut issues));
        }
    }
    tracing::info!(
        features = features.len(),
        intersections = points.len(),
        "self-intersection scan complete"
    );
    Checked::new(points, issues)
}

pub trait MustNotSelfIntersect {
    fn must_not_self_intersect(&self) -> Checked<Vec<IntersectionPoint>>;
}

impl MustNotSelfIntersect for [Feature] {
    fn must_not_self_intersect(&self) -> Checked<Vec<IntersectionPoint>> {
        find_self_intersections(self)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;
    use geo::line_string;

    fn points(input: Vec<Feature>) -> Vec<IntersectionPoint> {
        input.must_not_self_intersect().value
    }

    #[test]
    fn bow_tie() {
        let output = points(vec![Feature::single(
            1,
            line_string![(x: 0., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.), (x: 10., y: 0.)],
        )]);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].feature_id, 1);
        assert_relative_eq!(output[0].x, 5.0);
        assert_relative_eq!(output[0].y, 5.0);
    }

    #[test]
    fn simple_chain_is_clean() {
        let output = points(vec![Feature::single(
            1,
            line_string![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 20., y: 10.)],
        )]);
        assert!(output.is_empty());
    }

    #[test]
    fn closed_loop_is_not_reported() {
        let checked = vec![Feature::single(
            1,
            line_string![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 10.), (x: 0., y: 10.), (x: 0., y: 0.)],
        )]
        .must_not_self_intersect();
        assert!(checked.value.is_empty());
        assert!(checked.is_clean());
    }

    #[test]
    fn revisited_vertex_is_reported_once() {
        // The chain passes through (5, 5) twice.
        let output = points(vec![Feature::single(
            2,
            line_string![
                (x: 0., y: 0.),
                (x: 5., y: 5.),
                (x: 10., y: 5.),
                (x: 10., y: 10.),
                (x: 5., y: 5.),
                (x: 0., y: 10.)
            ],
        )]);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].coord(), geo::coord! { x: 5., y: 5. });
    }

    #[test]
    fn crossings_in_every_part() {
        let bow_tie = line_string![(x: 0., y: 0.), (x: 2., y: 2.), (x: 0., y: 2.), (x: 2., y: 0.)];
        let output = points(vec![Feature::new(
            4,
            vec![
                bow_tie.clone(),
                line_string![(x: 50., y: 0.), (x: 60., y: 0.)],
                bow_tie,
            ],
        )]);
        assert_eq!(
            output.iter().map(|point| point.part_index).collect_vec(),
            vec![0, 2]
        );
    }

    #[test]
    fn multiple_crossings_in_one_part() {
        // A zig-zag folded back over a straight run crosses it twice.
        let output = points(vec![Feature::single(
            5,
            line_string![
                (x: 0., y: 0.),
                (x: 10., y: 0.),
                (x: 10., y: 5.),
                (x: 7., y: -5.),
                (x: 3., y: 5.),
                (x: 3., y: 10.)
            ],
        )]);
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn collinear_backtrack_is_skipped() {
        let checked = vec![Feature::single(
            6,
            line_string![(x: 0., y: 0.), (x: 10., y: 0.), (x: 10., y: 1.), (x: 10., y: 0.5), (x: 10., y: 3.)],
        )]
        .must_not_self_intersect();
        assert!(checked
            .issues
            .iter()
            .any(|issue| matches!(issue, Issue::Algorithm(AlgorithmError::CollinearOverlap { .. }))));
    }

    #[test]
    fn repeated_vertex_is_degenerate() {
        let checked = vec![Feature::single(
            7,
            line_string![(x: 0., y: 0.), (x: 1., y: 0.), (x: 1., y: 0.), (x: 2., y: 0.)],
        )]
        .must_not_self_intersect();
        assert!(checked.value.is_empty());
        assert_eq!(
            checked.issues,
            vec![Issue::Algorithm(AlgorithmError::DegenerateSegment {
                feature_id: 7,
                part_index: 0,
                segment: 1
            })]
        );
    }

    #[test]
    fn crossing_through_a_nearly_collinear_vertex() {
        let chain = [(0., 0.), (10., 0.), (10., 5.), (5., 1e-12), (5., -10.)];
        let (sin, cos) = std::f64::consts::FRAC_PI_4.sin_cos();
        let rotate = |(x, y): (f64, f64)| (x * cos - y * sin, x * sin + y * cos);
        for (coords, expected) in [
            (chain.to_vec(), (5., 1e-12)),
            (chain.map(rotate).to_vec(), rotate((5., 1e-12))),
        ] {
            let output = points(vec![Feature::single(9, LineString::from(coords))]);
            assert_eq!(output.len(), 1, "{output:?}");
            assert_relative_eq!(output[0].x, expected.0, epsilon = 1e-9);
            assert_relative_eq!(output[0].y, expected.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn short_parts_are_skipped() {
        let checked = vec![Feature::single(8, line_string![(x: 0., y: 0.)])].must_not_self_intersect();
        assert!(checked.value.is_empty());
        assert_eq!(checked.issues.len(), 1);
    }
}
