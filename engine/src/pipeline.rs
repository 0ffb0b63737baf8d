//! Pipeline orchestrator: constraints, placement, corridors, one shot.

use std::time::Instant;

use geom::{Kernel, RobustKernel};
use plan::{
    CancelToken, CoreError, CorridorCfg, FailureKind, FloorPlan, Layout,
    PlacementCfg, RunStats,
};

use crate::{constraint, corridor, guard::StageGuard, placement};

fn ms_since(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

/// Run the full pipeline with the production geometry kernel.
///
/// Borrows the plan, returns a freshly allocated layout. Deterministic
/// for fixed inputs and seed. Only input-invariant violations surface as
/// errors; every recoverable condition is captured in the returned stats.
pub fn produce_layout(
    floor_plan: &FloorPlan,
    placement_cfg: &PlacementCfg,
    corridor_cfg: &CorridorCfg,
    cancel: Option<&CancelToken>,
) -> Result<Layout, CoreError> {
    produce_layout_with_kernel(
        &RobustKernel::new(),
        floor_plan,
        placement_cfg,
        corridor_cfg,
        cancel,
    )
}

/// As [`produce_layout`], with an explicit kernel backend. Degraded
/// backends are for smoke testing; the run records the mode it used.
pub fn produce_layout_with_kernel<K: Kernel>(
    kernel: &K,
    floor_plan: &FloorPlan,
    placement_cfg: &PlacementCfg,
    corridor_cfg: &CorridorCfg,
    cancel: Option<&CancelToken>,
) -> Result<Layout, CoreError> {
    let run_start = Instant::now();

    floor_plan.validate()?;
    placement_cfg.validate()?;
    corridor_cfg.validate()?;
    let floor_plan = floor_plan.scaled()?;

    let mut stats = RunStats::default();
    if kernel.mode() == geom::KernelMode::Degraded {
        stats
            .warnings
            .push("KernelDegraded: boolean results are approximate".into());
    }

    let finish = |mut stats: RunStats, kernel: &K, start: Instant| {
        stats.kernel_mode = kernel.mode();
        stats.kernel_scale = kernel.scale();
        stats.kernel_errors = kernel.errors();
        stats.timings.total_ms = ms_since(start);
        stats
    };

    // Constraint model.
    let stage_start = Instant::now();
    let constraints = match constraint::build(kernel, &floor_plan, placement_cfg)
    {
        Ok(constraints) => constraints,
        Err(CoreError::NoFeasibleSpace) => {
            stats.failure = Some(FailureKind::NoFeasibleSpace);
            stats
                .warnings
                .push("NoFeasibleSpace: allowed region is empty".into());
            stats.timings.constraints_ms = ms_since(stage_start);
            return Ok(Layout {
                stats: finish(stats, kernel, run_start),
                ..Default::default()
            });
        }
        Err(other) => return Err(other),
    };
    stats.timings.constraints_ms = ms_since(stage_start);

    // Placement.
    let stage_start = Instant::now();
    let doors: Vec<_> =
        floor_plan.doors.iter().map(|d| d.position).collect();
    let placement_guard = StageGuard::new(placement_cfg.timeout_ms, cancel);
    let placed =
        placement::place(&constraints, &doors, placement_cfg, &placement_guard);
    stats.timings.placement_ms = ms_since(stage_start);
    stats.placement = placed.stats;
    stats.warnings.extend(placed.warnings);
    if placement_guard.timed_out() {
        stats
            .warnings
            .push("TimeoutExpired: placement returned partial results".into());
    }
    stats.cancelled |= placement_guard.cancelled();

    // Corridors; skipped outright when the run was already cancelled.
    let stage_start = Instant::now();
    let corridors = if stats.cancelled {
        Vec::new()
    } else {
        let corridor_guard = StageGuard::new(corridor_cfg.timeout_ms, cancel);
        let built = corridor::generate(
            &constraints.allowed,
            &placed.ilots,
            &floor_plan.entrances,
            corridor_cfg,
            &corridor_guard,
        );
        stats.corridors = built.stats;
        stats.warnings.extend(built.warnings);
        stats.failure = stats.failure.or(built.failure);
        stats.cancelled |= corridor_guard.cancelled();
        built.corridors
    };
    stats.timings.corridors_ms = ms_since(stage_start);

    Ok(Layout {
        ilots: placed.ilots,
        corridors,
        stats: finish(stats, kernel, run_start),
    })
}
