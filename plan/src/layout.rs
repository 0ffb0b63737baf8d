use std::fmt::Write;

use geom::KernelMode;
use serde::{Deserialize, Serialize};

use crate::{Corridor, Ilot, Strategy};

/// Per-stage wall-clock spend in milliseconds.
///
/// The only nondeterministic part of a layout; comparisons for the
/// determinism guarantee exclude it.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub constraints_ms: f64,
    pub placement_ms: f64,
    pub corridors_ms: f64,
    pub total_ms: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PlacementStats {
    pub strategy: Strategy,
    pub candidates_generated: u32,
    pub candidates_tried: u32,
    pub accepted: u32,
    pub invalid_ilots: u32,
    /// Count the coverage target asked for.
    pub target_count: u32,
    /// Fraction of allowed area actually covered by accepted îlots.
    pub coverage: f64,
    pub improvement_moves: u32,
    pub timed_out: bool,
}

impl Default for PlacementStats {
    fn default() -> Self {
        PlacementStats {
            strategy: Strategy::default(),
            candidates_generated: 0,
            candidates_tried: 0,
            accepted: 0,
            invalid_ilots: 0,
            target_count: 0,
            coverage: 0.0,
            improvement_moves: 0,
            timed_out: false,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CorridorStats {
    pub key_points: u32,
    pub mst_edges: u32,
    pub paths_found: u32,
    pub paths_dropped: u32,
    pub total_length: f64,
    pub total_area: f64,
    pub timed_out: bool,
}

/// Abort-class failures that empty a stage's output without failing the
/// whole call.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoFeasibleSpace,
    NavGridEmpty,
}

/// Everything a run wants to tell the caller besides the geometry.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RunStats {
    pub kernel_mode: KernelMode,
    /// Coordinate snapping factor the kernel applied.
    pub kernel_scale: f64,
    /// Inputs or intermediates the kernel clamped to empty.
    pub kernel_errors: u32,
    pub cancelled: bool,
    pub timings: StageTimings,
    pub placement: PlacementStats,
    pub corridors: CorridorStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Human-readable warnings, in the order they occurred.
    pub warnings: Vec<String>,
}

impl Default for RunStats {
    fn default() -> Self {
        RunStats {
            kernel_mode: KernelMode::Robust,
            kernel_scale: 1.0,
            kernel_errors: 0,
            cancelled: false,
            timings: StageTimings::default(),
            placement: PlacementStats::default(),
            corridors: CorridorStats::default(),
            failure: None,
            warnings: Vec::new(),
        }
    }
}

impl RunStats {
    pub fn timed_out(&self) -> bool {
        self.placement.timed_out || self.corridors.timed_out
    }

    /// Multi-line human summary for CLI and log output.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "kernel: {} (scale {}, {} errors)",
            self.kernel_mode, self.kernel_scale, self.kernel_errors
        );
        let _ = writeln!(
            out,
            "placement: {}/{} ilots from {} candidates ({} tried), coverage {:.1}%",
            self.placement.accepted,
            self.placement.target_count,
            self.placement.candidates_generated,
            self.placement.candidates_tried,
            self.placement.coverage * 100.0,
        );
        let _ = writeln!(
            out,
            "corridors: {} paths over {} key points ({} dropped), {:.1} m / {:.1} m2",
            self.corridors.paths_found,
            self.corridors.key_points,
            self.corridors.paths_dropped,
            self.corridors.total_length,
            self.corridors.total_area,
        );
        let _ = writeln!(
            out,
            "time: {:.1} ms (constraints {:.1}, placement {:.1}, corridors {:.1})",
            self.timings.total_ms,
            self.timings.constraints_ms,
            self.timings.placement_ms,
            self.timings.corridors_ms,
        );
        if self.cancelled {
            let _ = writeln!(out, "cancelled mid-run, results are partial");
        }
        if let Some(failure) = self.failure {
            let _ = writeln!(out, "failure: {failure:?}");
        }
        for w in &self.warnings {
            let _ = writeln!(out, "warning: {w}");
        }
        out
    }
}

/// The finished product: îlots, corridors and the run report.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Layout {
    pub ilots: Vec<Ilot>,
    pub corridors: Vec<Corridor>,
    #[serde(default)]
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_round_trip() {
        let mut stats = RunStats::default();
        stats.placement.accepted = 12;
        stats.failure = Some(FailureKind::NoFeasibleSpace);
        stats.warnings.push("NoFeasibleIlots: nothing fits".into());
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"no_feasible_space\""));
        assert!(json.contains("\"kernel_mode\":\"robust\""));
        let back: RunStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }

    #[test]
    fn summary_mentions_warnings() {
        let mut stats = RunStats::default();
        stats.warnings.push("PathNotFound: a to b".into());
        assert!(stats.summary().contains("PathNotFound"));
    }
}
