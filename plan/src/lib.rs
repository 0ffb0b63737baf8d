//! Floor plan datatypes: the input model, the layout output model, run
//! configuration and the error taxonomy. Pure data, no algorithms.

mod cancel;
pub use cancel::CancelToken;

mod config;
pub use config::{CorridorCfg, PlacementCfg, RunCfg, Strategy, Weights};

mod corridor;
pub use corridor::Corridor;

mod error;
pub use error::CoreError;

mod floorplan;
pub use floorplan::{Door, FloorPlan, Wall};

mod ilot;
pub use ilot::{Ilot, IlotKind};

mod layout;
pub use layout::{
    CorridorStats, FailureKind, Layout, PlacementStats, RunStats,
    StageTimings,
};
