//! Standalone 2D geometry layer: polygons, bounding boxes, boolean set
//! operations, buffering and spatial indexing.
//!
//! Everything here works in plain world coordinates (f64 meters) and knows
//! nothing about floor plans. Higher layers own the semantics.

mod bbox;
pub use bbox::BBox;

mod error;
pub use error::GeometryError;

mod index;
pub use index::SpatialIndex;

mod kernel;
pub use kernel::{FallbackKernel, Kernel, KernelMode, RobustKernel};

mod poly;
pub use poly::{
    convex_hull, orient, seg_distance, segments_cross,
    segments_cross_properly, Poly,
};

mod region;
pub use region::{Face, Region};

/// Geometric tolerance in meters. Results closer than this to a boundary
/// are unspecified either way.
pub const EPSILON: f64 = 1e-3;

/// Segment count used when a disc is approximated by a regular polygon.
pub const DISC_SEGMENTS: usize = 16;
