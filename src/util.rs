mod geometry;
mod io;

pub use geometry::{
    chain_length, distance, distance_sq, extent_of, extents_intersect, feature_endpoints,
    is_finite, orient, segment_contact, usable_parts, Orientation, SegmentContact,
    ORIENTATION_EPSILON,
};
pub use io::{read_features, read_json, read_polygon_features, write_json};
