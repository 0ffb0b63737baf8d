use std::collections::BTreeMap;

use glam::{dvec2, DVec2};
use serde::{Deserialize, Serialize};

use crate::{CoreError, IlotKind};

/// Candidate generation strategy for the placement engine.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    /// Regular lattice stepped by îlot size plus spacing.
    Grid,
    /// Rejection sampling over the boundary bbox.
    Random,
    /// Bridson Poisson-disk sampling over the allowed region.
    #[default]
    Optimized,
}

/// Score combination weights; must sum to 1 within tolerance.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub space: f64,
    pub accessibility: f64,
    pub workflow: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            space: 0.4,
            accessibility: 0.3,
            workflow: 0.3,
        }
    }
}

fn default_kind_multipliers() -> BTreeMap<IlotKind, f64> {
    BTreeMap::from([
        (IlotKind::Workspace, 1.0),
        (IlotKind::Meeting, 1.3),
        (IlotKind::Social, 1.5),
        (IlotKind::Storage, 0.8),
        (IlotKind::Break, 1.2),
    ])
}

fn default_kind_mix() -> Vec<IlotKind> {
    vec![
        IlotKind::Workspace,
        IlotKind::Workspace,
        IlotKind::Meeting,
        IlotKind::Workspace,
        IlotKind::Storage,
        IlotKind::Break,
    ]
}

/// Placement engine configuration. Unknown keys are rejected.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementCfg {
    pub strategy: Strategy,
    /// Wall inflation when computing forbidden regions, meters.
    pub min_wall_distance: f64,
    /// Required separation between any two îlots, meters.
    pub min_ilot_distance: f64,
    /// Forbidden radius around doors, meters.
    pub min_door_clearance: f64,
    /// Fraction of usable area the generator aims to fill.
    pub target_coverage: f64,
    /// Base width x height before the kind multiplier, meters.
    pub default_size: DVec2,
    /// Rectangle scaling per kind; kinds not listed scale by 1.
    pub kind_multipliers: BTreeMap<IlotKind, f64>,
    /// Kind cycle; candidates take kinds from it round-robin.
    pub kind_mix: Vec<IlotKind>,
    pub max_ilots: u32,
    /// Minimum candidate separation for the optimized strategy, meters.
    pub poisson_radius: f64,
    /// Dart throws per active Poisson point.
    pub poisson_tries: u32,
    /// Candidate-generation budget.
    pub max_iterations: u32,
    /// Wall-clock budget for the placement stage.
    pub timeout_ms: u64,
    pub weights: Weights,
    /// PRNG seed; identical seeds and inputs yield identical layouts.
    pub seed: u64,
}

impl Default for PlacementCfg {
    fn default() -> Self {
        PlacementCfg {
            strategy: Strategy::default(),
            min_wall_distance: 0.5,
            min_ilot_distance: 2.0,
            min_door_clearance: 1.5,
            target_coverage: 0.30,
            default_size: dvec2(3.0, 2.0),
            kind_multipliers: default_kind_multipliers(),
            kind_mix: default_kind_mix(),
            max_ilots: 50,
            poisson_radius: 3.0,
            poisson_tries: 30,
            max_iterations: 1000,
            timeout_ms: 30_000,
            weights: Weights::default(),
            seed: 1,
        }
    }
}

impl PlacementCfg {
    pub fn multiplier(&self, kind: IlotKind) -> f64 {
        self.kind_multipliers.get(&kind).copied().unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let bad = |msg: &str| Err(CoreError::InvalidInput(msg.into()));

        for (name, v) in [
            ("min_wall_distance", self.min_wall_distance),
            ("min_ilot_distance", self.min_ilot_distance),
            ("min_door_clearance", self.min_door_clearance),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(CoreError::InvalidInput(format!(
                    "{name} must be finite and non-negative, got {v}"
                )));
            }
        }
        if !self.target_coverage.is_finite()
            || !(0.0..=1.0).contains(&self.target_coverage)
        {
            return bad("target_coverage must lie in [0, 1]");
        }
        if !self.default_size.is_finite()
            || self.default_size.min_element() <= 0.0
        {
            return bad("default_size must be positive");
        }
        if self.kind_mix.is_empty() {
            return bad("kind_mix must not be empty");
        }
        if self
            .kind_multipliers
            .values()
            .any(|&m| !m.is_finite() || m <= 0.0)
        {
            return bad("kind_multipliers must be positive");
        }
        if !self.poisson_radius.is_finite() || self.poisson_radius <= 0.0 {
            return bad("poisson_radius must be positive");
        }
        let w = self.weights;
        let sum = w.space + w.accessibility + w.workflow;
        if !sum.is_finite() || (sum - 1.0).abs() > 1e-3 {
            return bad("weights must sum to 1");
        }
        if w.space < 0.0 || w.accessibility < 0.0 || w.workflow < 0.0 {
            return bad("weights must be non-negative");
        }
        Ok(())
    }
}

/// Corridor generator configuration. Unknown keys are rejected.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorridorCfg {
    /// Extrusion width, meters.
    pub default_width: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Navigation cell size, meters.
    pub grid_resolution: f64,
    /// Allow 8-connected movement.
    pub diagonal: bool,
    pub diagonal_cost: f64,
    /// Passes of centerline smoothing.
    pub smoothing_iters: u32,
    pub connect_all_entrances: bool,
    /// Also route every edge no longer than 1.2x the longest tree edge,
    /// giving the network short alternative paths.
    pub require_redundant_paths: bool,
    /// Per-path upper bound, meters.
    pub max_path_length: f64,
    /// A* expansion cap.
    pub max_nodes: u32,
    /// Wall-clock budget for the corridor stage.
    pub timeout_ms: u64,
    /// Subtract inflated îlot footprints from the navigation grid.
    pub corridor_avoids_ilots: bool,
}

impl Default for CorridorCfg {
    fn default() -> Self {
        CorridorCfg {
            default_width: 1.8,
            min_width: 1.5,
            max_width: 3.0,
            grid_resolution: 0.5,
            diagonal: true,
            diagonal_cost: std::f64::consts::SQRT_2,
            smoothing_iters: 3,
            connect_all_entrances: true,
            require_redundant_paths: false,
            max_path_length: 100.0,
            max_nodes: 10_000,
            timeout_ms: 30_000,
            corridor_avoids_ilots: true,
        }
    }
}

impl CorridorCfg {
    /// Width actually used for extrusion: `default_width` clamped into
    /// the validation bounds. The flag reports whether clamping fired.
    pub fn effective_width(&self) -> (f64, bool) {
        let clamped = self.default_width.clamp(self.min_width, self.max_width);
        (clamped, clamped != self.default_width)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let bad = |msg: &str| Err(CoreError::InvalidInput(msg.into()));

        if !self.min_width.is_finite()
            || !self.max_width.is_finite()
            || !self.default_width.is_finite()
            || self.min_width <= 0.0
            || self.min_width > self.max_width
        {
            return bad("corridor width bounds must satisfy 0 < min <= max");
        }
        if !self.grid_resolution.is_finite() || self.grid_resolution <= 0.0 {
            return bad("grid_resolution must be positive");
        }
        if !self.diagonal_cost.is_finite() || self.diagonal_cost < 1.0 {
            return bad("diagonal_cost must be at least 1");
        }
        if !self.max_path_length.is_finite() || self.max_path_length <= 0.0 {
            return bad("max_path_length must be positive");
        }
        Ok(())
    }
}

/// On-disk configuration file: both sections optional.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunCfg {
    pub placement: PlacementCfg,
    pub corridor: CorridorCfg,
}
