//! Greedy score-ranked îlot placement with collision avoidance and a
//! bounded improvement pass.

use std::cmp::Ordering;

use geom::{Poly, SpatialIndex, EPSILON};
use glam::{dvec2, DVec2};
use plan::{Ilot, PlacementCfg, PlacementStats};
use rand::{Rng, SeedableRng};

use crate::{candidate, constraint::Constraints, guard::StageGuard, LayoutRng};

const IMPROVEMENT_PASSES: u32 = 50;
const IMPROVEMENT_SAMPLES: u32 = 8;
/// A perturbation must beat the old score by this factor to commit.
const IMPROVEMENT_GAIN: f64 = 1.10;

pub(crate) struct PlacementOutcome {
    pub ilots: Vec<Ilot>,
    pub stats: PlacementStats,
    pub warnings: Vec<String>,
}

/// Candidate score: weighted blend of spatial fit, door accessibility and
/// a workflow placeholder, capped at 1.
fn score_at(
    pos: DVec2,
    constraints: &Constraints,
    doors: &[DVec2],
    cfg: &PlacementCfg,
) -> f64 {
    let probe = Poly::rect(pos, cfg.default_size.x, cfg.default_size.y);
    let spatial = if constraints.allowed.contains_poly(&probe) {
        let mut s = 0.8;
        for soft in constraints.soft_regions() {
            if soft.region.intersects_poly(&probe) {
                s -= 0.2 * soft.priority;
            }
        }
        s.max(0.0)
    } else {
        0.0
    };

    let door_distance = doors
        .iter()
        .map(|&d| d.distance(pos))
        .fold(f64::INFINITY, f64::min);
    let access = if door_distance > 1.5 && door_distance < 10.0 {
        1.0
    } else {
        0.8
    };

    let workflow = 0.8;

    let w = cfg.weights;
    (spatial * w.space + access * w.accessibility + workflow * w.workflow)
        .min(1.0)
}

/// Hard-rule test for a concrete rectangle: inside the allowed region and
/// clear of every hard forbidden region.
fn rect_allowed(rect: &Poly, constraints: &Constraints) -> bool {
    constraints.allowed.contains_poly(rect)
        && !constraints
            .hard_regions()
            .any(|f| f.region.intersects_poly(rect))
}

pub(crate) fn place(
    constraints: &Constraints,
    doors: &[DVec2],
    cfg: &PlacementCfg,
    guard: &StageGuard,
) -> PlacementOutcome {
    let mut stats = PlacementStats {
        strategy: cfg.strategy,
        ..Default::default()
    };
    let mut warnings = Vec::new();
    let mut rng = LayoutRng::seed_from_u64(cfg.seed);

    let ilot_area = cfg.default_size.x * cfg.default_size.y;
    let target =
        (constraints.allowed.area() * cfg.target_coverage / ilot_area).floor()
            as u32;
    let cap = target.min(cfg.max_ilots);
    stats.target_count = target;

    let mut ilots: Vec<Ilot> = Vec::new();

    if cap > 0 {
        let candidates =
            candidate::generate(&constraints.allowed, cfg, &mut rng, guard);
        stats.candidates_generated = candidates.len() as u32;

        let mut ranked: Vec<(DVec2, f64)> = candidates
            .into_iter()
            .map(|p| (p, score_at(p, constraints, doors, cfg)))
            .collect();
        // Stable sort: ties keep generation order, so the whole ranking
        // is deterministic for a fixed seed.
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
        });

        // Accepted rectangles, each inflated by the spacing requirement:
        // any query hit means the candidate would crowd a neighbour.
        let mut index: SpatialIndex<u32> = SpatialIndex::new();

        for (idx, (pos, score)) in ranked.into_iter().enumerate() {
            if ilots.len() as u32 >= cap || !guard.keep_going() {
                break;
            }
            stats.candidates_tried += 1;

            // Round-robin over the mix per candidate, so a kind too big
            // for the remaining gaps cannot stall the cycle.
            let kind = cfg.kind_mix[idx % cfg.kind_mix.len()];
            let m = cfg.multiplier(kind);
            let (w, h) = (cfg.default_size.x * m, cfg.default_size.y * m);
            let rect = Poly::rect(pos, w, h);
            let bounds = rect.bbox();

            if index.search(&bounds).next().is_some() {
                continue;
            }
            if !rect_allowed(&rect, constraints) {
                continue;
            }

            index.insert(
                bounds.inflated(cfg.min_ilot_distance - EPSILON),
                ilots.len() as u32,
            );
            ilots.push(Ilot::new(ilots.len(), kind, pos, w, h, score));
        }
    }

    if ilots.is_empty() && cfg.target_coverage > 0.0 && cfg.max_ilots > 0 {
        warnings.push(format!(
            "NoFeasibleIlots: no {:.1}x{:.1} m rectangle fits the allowed region",
            cfg.default_size.x, cfg.default_size.y
        ));
    }

    stats.improvement_moves =
        improve(&mut ilots, constraints, doors, cfg, &mut rng, guard);

    stats.invalid_ilots = validate(&mut ilots, cfg);
    stats.accepted = ilots.iter().filter(|i| i.valid).count() as u32;
    let covered: f64 = ilots
        .iter()
        .filter(|i| i.valid)
        .map(|i| i.width * i.height)
        .sum();
    stats.coverage = covered / constraints.allowed.area();
    stats.timed_out = guard.timed_out();

    log::debug!(
        "placement: {} ilots of {} targeted, {} improvement moves",
        ilots.len(),
        target,
        stats.improvement_moves
    );

    PlacementOutcome {
        ilots,
        stats,
        warnings,
    }
}

/// Local perturbation passes. A move commits only when it keeps every
/// hard rule and beats the previous score by [`IMPROVEMENT_GAIN`].
fn improve(
    ilots: &mut [Ilot],
    constraints: &Constraints,
    doors: &[DVec2],
    cfg: &PlacementCfg,
    rng: &mut LayoutRng,
    guard: &StageGuard,
) -> u32 {
    let radius = (cfg.min_ilot_distance * 0.5).max(0.25);
    let mut moves = 0;

    'passes: for _ in 0..IMPROVEMENT_PASSES {
        let mut changed = false;
        for i in 0..ilots.len() {
            if !guard.keep_going() {
                break 'passes;
            }
            let mut best: Option<(DVec2, f64)> = None;
            for _ in 0..IMPROVEMENT_SAMPLES {
                let delta = dvec2(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                ) * radius;
                let pos = ilots[i].center + delta;
                let score = score_at(pos, constraints, doors, cfg);
                if score < ilots[i].score * IMPROVEMENT_GAIN {
                    continue;
                }
                let rect = Poly::rect(pos, ilots[i].width, ilots[i].height);
                if !rect_allowed(&rect, constraints) {
                    continue;
                }
                let bounds = rect.bbox();
                let crowded = ilots.iter().enumerate().any(|(j, other)| {
                    j != i
                        && other.bbox().gap(&bounds)
                            < cfg.min_ilot_distance - EPSILON
                });
                if crowded {
                    continue;
                }
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((pos, score));
                }
            }
            if let Some((pos, score)) = best {
                let mut moved = ilots[i].moved_to(pos);
                moved.score = score;
                ilots[i] = moved;
                changed = true;
                moves += 1;
            }
        }
        if !changed {
            break;
        }
    }
    moves
}

/// Pairwise spacing re-check. Violators stay in the output flagged
/// invalid; the later acceptance loses.
fn validate(ilots: &mut [Ilot], cfg: &PlacementCfg) -> u32 {
    let mut invalid = 0;
    for i in 0..ilots.len() {
        for j in 0..i {
            if !ilots[j].valid {
                continue;
            }
            if ilots[i].bbox().gap(&ilots[j].bbox())
                < cfg.min_ilot_distance - EPSILON
            {
                ilots[i].valid = false;
                invalid += 1;
                break;
            }
        }
    }
    invalid
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::RobustKernel;
    use plan::{FloorPlan, IlotKind};

    fn room_constraints(w: f64, h: f64, cfg: &PlacementCfg) -> Constraints {
        let plan = FloorPlan {
            boundary: Some(
                Poly::new(vec![
                    dvec2(0.0, 0.0),
                    dvec2(w, 0.0),
                    dvec2(w, h),
                    dvec2(0.0, h),
                ])
                .unwrap(),
            ),
            ..Default::default()
        };
        crate::constraint::build(&RobustKernel::new(), &plan, cfg).unwrap()
    }

    fn guard() -> StageGuard<'static> {
        StageGuard::new(30_000, None)
    }

    #[test]
    fn fills_an_empty_room_toward_target() {
        let cfg = PlacementCfg {
            seed: 42,
            ..Default::default()
        };
        let constraints = room_constraints(20.0, 15.0, &cfg);
        let out = place(&constraints, &[], &cfg, &guard());
        assert!(
            out.ilots.len() >= 10,
            "only {} ilots placed",
            out.ilots.len()
        );
        assert!(out.ilots.len() as u32 <= out.stats.target_count);
        assert!(out.ilots.iter().all(|i| i.valid));
    }

    #[test]
    fn respects_pairwise_spacing() {
        let cfg = PlacementCfg {
            seed: 9,
            ..Default::default()
        };
        let constraints = room_constraints(20.0, 15.0, &cfg);
        let out = place(&constraints, &[], &cfg, &guard());
        for i in 0..out.ilots.len() {
            for j in 0..i {
                let gap = out.ilots[i].bbox().gap(&out.ilots[j].bbox());
                assert!(
                    gap >= cfg.min_ilot_distance - 2.0 * EPSILON,
                    "gap {gap} between {} and {}",
                    out.ilots[i].id,
                    out.ilots[j].id
                );
            }
        }
    }

    #[test]
    fn zero_coverage_places_nothing() {
        let cfg = PlacementCfg {
            target_coverage: 0.0,
            ..Default::default()
        };
        let constraints = room_constraints(20.0, 15.0, &cfg);
        let out = place(&constraints, &[], &cfg, &guard());
        assert!(out.ilots.is_empty());
        assert_eq!(out.stats.target_count, 0);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn tight_room_reports_no_feasible_ilots() {
        let cfg = PlacementCfg {
            min_wall_distance: 0.0,
            ..Default::default()
        };
        // 2x2 room cannot hold the default 3x2 îlot.
        let constraints = room_constraints(2.0, 2.0, &cfg);
        let out = place(&constraints, &[], &cfg, &guard());
        assert!(out.ilots.is_empty());
        assert!(out
            .warnings
            .iter()
            .any(|w| w.starts_with("NoFeasibleIlots")));
    }

    #[test]
    fn kind_mix_cycles_over_candidates() {
        let cfg = PlacementCfg {
            seed: 42,
            kind_mix: vec![IlotKind::Workspace, IlotKind::Focus],
            ..Default::default()
        };
        let constraints = room_constraints(30.0, 20.0, &cfg);
        let out = place(&constraints, &[], &cfg, &guard());
        assert!(out.ilots.len() >= 4);
        // Both kinds of the mix get their turns.
        assert!(out.ilots.iter().any(|i| i.kind == IlotKind::Workspace));
        assert!(out.ilots.iter().any(|i| i.kind == IlotKind::Focus));
        assert!(out
            .ilots
            .iter()
            .all(|i| matches!(i.kind, IlotKind::Workspace | IlotKind::Focus)));
    }

    #[test]
    fn hard_zone_is_avoided() {
        let cfg = PlacementCfg {
            seed: 5,
            ..Default::default()
        };
        let plan = FloorPlan {
            boundary: Some(
                Poly::new(vec![
                    dvec2(0.0, 0.0),
                    dvec2(20.0, 0.0),
                    dvec2(20.0, 15.0),
                    dvec2(0.0, 15.0),
                ])
                .unwrap(),
            ),
            blue_zones: vec![Poly::new(vec![
                dvec2(9.0, 6.0),
                dvec2(11.0, 6.0),
                dvec2(11.0, 9.0),
                dvec2(9.0, 9.0),
            ])
            .unwrap()],
            ..Default::default()
        };
        let constraints =
            crate::constraint::build(&RobustKernel::new(), &plan, &cfg).unwrap();
        let column = &plan.blue_zones[0];
        let out = place(&constraints, &[], &cfg, &guard());
        assert!(!out.ilots.is_empty());
        for ilot in &out.ilots {
            assert!(
                !ilot.polygon.intersects(column),
                "{} overlaps the column",
                ilot.id
            );
        }
    }
}
