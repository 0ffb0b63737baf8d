//! Layout pipeline machinery.
//!
//! The pipeline is a pure synchronous transform: `FloorPlan` in, `Layout`
//! out, deterministic for a fixed seed. Stages run in order (constraint
//! model, îlot placement, corridor network), each bounded by its own
//! wall-clock budget and the caller's cancellation token.

pub mod constraint;
pub use constraint::{Constraints, ForbiddenRegion, ForbiddenSource};

mod candidate;

mod corridor;

mod guard;

mod navgrid;
pub use navgrid::NavGrid;

mod network;

mod pathing;

mod placement;

mod pipeline;
pub use pipeline::{produce_layout, produce_layout_with_kernel};

/// Concrete deterministic rng for candidate generation and improvement.
pub type LayoutRng = rand_xorshift::XorShiftRng;
