use geo::{Coord, LineString, Rect};

use crate::error::{skip, InputError, Issue};
use crate::{Endpoint, EndpointKind, Feature};

/// Relative tolerance of the orientation test. A turn whose sine is below this
/// is treated as collinear.
pub const ORIENTATION_EPSILON: f64 = 1e-10;

pub fn distance_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn cross(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

/// Orientation of `c` relative to the directed line `a -> b`.
///
/// The cross product is compared against the product of the two edge lengths
/// so the test behaves the same at any coordinate magnitude.
pub fn orient(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> Orientation {
    let det = cross(a, b, c);
    let scale = distance(a, b) * distance(a, c);
    if det.abs() <= ORIENTATION_EPSILON * scale {
        Orientation::Collinear
    } else if det > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    }
}

fn opposite(a: Orientation, b: Orientation) -> bool {
    matches!(
        (a, b),
        (Orientation::Clockwise, Orientation::CounterClockwise)
            | (Orientation::CounterClockwise, Orientation::Clockwise)
    )
}

/// True when `c`, already known to be collinear with `a -> b`, projects onto
/// the segment, even when it sits a rounding error off an axis-aligned one.
fn within(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> bool {
    let r = b - a;
    let t = ((c.x - a.x) * r.x + (c.y - a.y) * r.y) / (r.x * r.x + r.y * r.y);
    (0.0..=1.0).contains(&t)
}

/// How two segments meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentContact {
    Disjoint,
    /// A single shared location. `proper` when both segments pass through it
    /// at interior points.
    Point { at: Coord<f64>, proper: bool },
    /// The segments share a collinear stretch; no single location exists.
    Overlap,
    /// The crossing could not be located reliably.
    Unstable,
}

/// Classifies the contact between segments `p1 -> q1` and `p2 -> q2`.
/// Both segments must have non-zero length.
pub fn segment_contact(
    p1: Coord<f64>,
    q1: Coord<f64>,
    p2: Coord<f64>,
    q2: Coord<f64>,
) -> SegmentContact {
    let d1 = orient(p2, q2, p1);
    let d2 = orient(p2, q2, q1);
    let d3 = orient(p1, q1, p2);
    let d4 = orient(p1, q1, q2);

    if [d1, d2, d3, d4]
        .iter()
        .all(|orientation| *orientation == Orientation::Collinear)
    {
        return collinear_contact(p1, q1, p2, q2);
    }

    if opposite(d1, d2) && opposite(d3, d4) {
        let r = q1 - p1;
        let s = q2 - p2;
        let denom = r.x * s.y - r.y * s.x;
        if denom.abs() <= ORIENTATION_EPSILON * r.x.hypot(r.y) * s.x.hypot(s.y) {
            return SegmentContact::Unstable;
        }
        let w = p2 - p1;
        let t = (w.x * s.y - w.y * s.x) / denom;
        return SegmentContact::Point {
            at: p1 + r * t,
            proper: true,
        };
    }

    let touching = [(d1, p2, q2, p1), (d2, p2, q2, q1), (d3, p1, q1, p2), (d4, p1, q1, q2)]
        .into_iter()
        .find(|(orientation, a, b, c)| *orientation == Orientation::Collinear && within(*a, *b, *c));
    match touching {
        Some((.., at)) => SegmentContact::Point { at, proper: false },
        None => SegmentContact::Disjoint,
    }
}

fn collinear_contact(
    p1: Coord<f64>,
    q1: Coord<f64>,
    p2: Coord<f64>,
    q2: Coord<f64>,
) -> SegmentContact {
    // Project everything onto the first segment's direction.
    let r = q1 - p1;
    let length_sq = r.x * r.x + r.y * r.y;
    let project = |c: Coord<f64>| ((c.x - p1.x) * r.x + (c.y - p1.y) * r.y) / length_sq;
    let (t2, u2) = (project(p2), project(q2));
    let (lo, hi) = (t2.min(u2).max(0.0), t2.max(u2).min(1.0));
    if lo > hi {
        return SegmentContact::Disjoint;
    }
    if lo < hi {
        return SegmentContact::Overlap;
    }
    // A single point in common: the segments meet end to end.
    let at = [p1, q1]
        .into_iter()
        .find(|c| *c == p2 || *c == q2)
        .unwrap_or(p1 + r * lo);
    SegmentContact::Point { at, proper: false }
}

/// Bounding box of a vertex chain, `None` when it has no vertices.
pub fn extent_of(coords: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = coords.first()?;
    let (min, max) = coords.iter().skip(1).fold((*first, *first), |(min, max), c| {
        (
            Coord {
                x: min.x.min(c.x),
                y: min.y.min(c.y),
            },
            Coord {
                x: max.x.max(c.x),
                y: max.y.max(c.y),
            },
        )
    });
    Some(Rect::new(min, max))
}

/// Closed-interval bounding box test. Boxes that only touch intersect.
pub fn extents_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    !(a.max().x < b.min().x
        || a.min().x > b.max().x
        || a.max().y < b.min().y
        || a.min().y > b.max().y)
}

pub fn is_finite(coord: &Coord<f64>) -> bool {
    coord.x.is_finite() && coord.y.is_finite()
}

/// Yields the parts of a feature that are usable as vertex chains, recording
/// an issue for every part (or the whole feature) that is not.
pub fn usable_parts<'a>(
    feature: &'a Feature,
    issues: &mut Vec<Issue>,
) -> Vec<(usize, &'a LineString<f64>)> {
    if feature.parts.iter().all(|part| part.0.is_empty()) {
        skip(
            issues,
            InputError::EmptyGeometry {
                feature_id: feature.id,
            },
        );
        return Vec::new();
    }
    feature
        .parts
        .iter()
        .enumerate()
        .filter(|(part_index, part)| {
            let error = if part.0.len() < 2 {
                InputError::TooFewVertices {
                    feature_id: feature.id,
                    part_index: *part_index,
                    vertices: part.0.len(),
                }
            } else if !part.0.iter().all(is_finite) {
                InputError::NonFiniteCoordinate {
                    feature_id: feature.id,
                    part_index: *part_index,
                }
            } else {
                return true;
            };
            skip(issues, error);
            false
        })
        .collect()
}

/// Extract the first and last vertex of every usable part.
pub fn feature_endpoints(features: &[Feature], issues: &mut Vec<Issue>) -> Vec<Endpoint> {
    let mut endpoints = Vec::with_capacity(features.len() * 2);
    for feature in features {
        for (part_index, part) in usable_parts(feature, issues) {
            let (Some(first), Some(last)) = (part.0.first(), part.0.last()) else {
                continue;
            };
            endpoints.push(Endpoint {
                feature_id: feature.id,
                part_index,
                end: EndpointKind::Start,
                coord: *first,
            });
            endpoints.push(Endpoint {
                feature_id: feature.id,
                part_index,
                end: EndpointKind::End,
                coord: *last,
            });
        }
    }
    endpoints
}

/// Planar length of a vertex chain.
pub fn chain_length(part: &LineString<f64>) -> f64 {
    part.0
        .windows(2)
        .map(|pair| distance(pair[0], pair[1]))
        .sum()
}
