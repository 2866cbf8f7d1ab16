mod must_not_be_disconnected;
mod must_not_conflict;
mod must_not_have_dangles;
mod must_not_overlap;
mod must_not_self_intersect;

pub use must_not_be_disconnected::{
    disconnected_from, find_disconnected, Disconnected, MustNotBeDisconnected,
};
pub use must_not_conflict::{ConflictResult, MustNotConflict};
pub use must_not_have_dangles::{classify, classify_with, DangleResult, MustNotHaveDangles};
pub use must_not_overlap::{classify_overlap, MustNotOverlap, OverlapKind, OverlapResult};
pub use must_not_self_intersect::{
    find_self_intersections, IntersectionPoint, MustNotSelfIntersect,
};
