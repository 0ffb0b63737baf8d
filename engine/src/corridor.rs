//! Corridor generation: per-edge pathfinding, centerline smoothing and
//! extrusion to strip polygons.

use geom::{Poly, Region};
use glam::DVec2;
use itertools::Itertools;
use plan::{Corridor, CorridorCfg, CorridorStats, FailureKind, Ilot};

use crate::{
    guard::StageGuard,
    navgrid::NavGrid,
    network::{self, Components},
    pathing::{self, PathFailure},
};

pub(crate) struct CorridorOutcome {
    pub corridors: Vec<Corridor>,
    pub stats: CorridorStats,
    pub warnings: Vec<String>,
    pub failure: Option<FailureKind>,
}

/// Endpoint-preserving Laplacian smoothing. A step that would leave the
/// allowed region is reverted.
fn smooth(points: &mut Vec<DVec2>, allowed: &Region, iters: u32) {
    for _ in 0..iters {
        for i in 1..points.len().saturating_sub(1) {
            let relaxed =
                (points[i - 1] + points[i] * 2.0 + points[i + 1]) / 4.0;
            if allowed.contains(relaxed) {
                points[i] = relaxed;
            }
        }
    }
}

/// Extrude a centerline to a closed strip: offset every vertex along the
/// averaged perpendicular of its adjacent segments, then close left side
/// against reversed right side.
fn extrude(centerline: &[DVec2], width: f64) -> Option<Poly> {
    if centerline.len() < 2 {
        return None;
    }
    let half = width / 2.0;

    let normal_of = |a: DVec2, b: DVec2| -> DVec2 {
        let d = b - a;
        let len = d.length();
        if len < 1e-12 {
            DVec2::ZERO
        } else {
            d.perp() / len
        }
    };

    let n = centerline.len();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for i in 0..n {
        let before = if i > 0 {
            normal_of(centerline[i - 1], centerline[i])
        } else {
            DVec2::ZERO
        };
        let after = if i + 1 < n {
            normal_of(centerline[i], centerline[i + 1])
        } else {
            DVec2::ZERO
        };
        let mut normal = before + after;
        let len = normal.length();
        // A 180 degree turnback averages to zero; fall back to one side.
        normal = if len < 1e-9 {
            if before.length_squared() > 0.0 {
                before
            } else {
                after
            }
        } else {
            normal / len
        };
        left.push(centerline[i] + normal * half);
        right.push(centerline[i] - normal * half);
    }

    left.extend(right.into_iter().rev());
    Poly::new(left).ok()
}

/// Drop consecutive duplicate cells mapped to the same world point and
/// collapse collinear runs so the centerline stays compact.
fn compact(points: Vec<DVec2>) -> Vec<DVec2> {
    let mut out: Vec<DVec2> = Vec::with_capacity(points.len());
    for p in points {
        if let [.., a, b] = out[..] {
            let colinear = geom::orient(a, b, p).abs() < 1e-9;
            if colinear {
                let last = out.len() - 1;
                out[last] = p;
                continue;
            }
        }
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// The corridor stage: navigation grid, key points, MST, per-edge A*,
/// smoothing, extrusion.
pub(crate) fn generate(
    allowed: &Region,
    ilots: &[Ilot],
    entrances: &[DVec2],
    cfg: &CorridorCfg,
    guard: &StageGuard,
) -> CorridorOutcome {
    let mut out = CorridorOutcome {
        corridors: Vec::new(),
        stats: CorridorStats::default(),
        warnings: Vec::new(),
        failure: None,
    };

    let (width, clamped) = cfg.effective_width();
    if clamped {
        out.warnings.push(format!(
            "InvalidWidth: {} m clamped to {} m",
            cfg.default_width, width
        ));
    }

    let has_ilot_destinations = ilots.iter().any(|i| i.valid);
    if entrances.is_empty() && !has_ilot_destinations {
        return out;
    }

    let Some(grid) = NavGrid::build(allowed, ilots, width, cfg) else {
        return out;
    };
    if grid.walkable_count() == 0 {
        out.failure = Some(FailureKind::NavGridEmpty);
        out.warnings.push(
            "NavGridEmpty: no walkable cells, clearance too large for the plan"
                .into(),
        );
        return out;
    }

    let points = network::collect_key_points(
        entrances,
        ilots,
        allowed,
        &grid,
        cfg.connect_all_entrances,
    );
    out.stats.key_points = points.len() as u32;
    if points.len() < 2 {
        return out;
    }

    let mut edges =
        network::mst_edges(&points, cfg.require_redundant_paths);
    out.stats.mst_edges = edges.len() as u32;
    // Pathfind high-priority connections first so entrance links survive
    // a timeout.
    edges.sort_by(|&(a1, b1), &(a2, b2)| {
        let p1 = points[a1].priority.max(points[b1].priority);
        let p2 = points[a2].priority.max(points[b2].priority);
        p2.partial_cmp(&p1).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut components = Components::new(points.len());

    for (from, to) in edges {
        if !guard.keep_going() {
            out.warnings.push(format!(
                "TimeoutExpired: corridor stage stopped before {} - {}",
                points[from].id, points[to].id
            ));
            break;
        }

        let (start, goal) = (
            grid.nearest_walkable(points[from].pos),
            grid.nearest_walkable(points[to].pos),
        );
        let (Some(start), Some(goal)) = (start, goal) else {
            out.stats.paths_dropped += 1;
            continue;
        };

        let cells = match pathing::find_path(&grid, start, goal, cfg, guard) {
            Ok(cells) => cells,
            Err(failure) => {
                out.stats.paths_dropped += 1;
                let reason = match failure {
                    PathFailure::NoPath => "no path",
                    PathFailure::NodeCapExceeded => "node cap",
                    PathFailure::Interrupted => "interrupted",
                };
                out.warnings.push(format!(
                    "PathNotFound: {} - {} ({reason})",
                    points[from].id, points[to].id
                ));
                continue;
            }
        };

        let mut centerline =
            compact(cells.iter().map(|&c| grid.cell_center(c)).collect());
        smooth(&mut centerline, allowed, cfg.smoothing_iters);
        if centerline.len() < 2 {
            out.stats.paths_dropped += 1;
            continue;
        }

        let length: f64 = centerline
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.distance(*b))
            .sum();
        if length > cfg.max_path_length {
            out.stats.paths_dropped += 1;
            out.warnings.push(format!(
                "PathNotFound: {} - {} ({length:.1} m exceeds max_path_length)",
                points[from].id, points[to].id
            ));
            continue;
        }

        let Some(polygon) = extrude(&centerline, width) else {
            out.stats.paths_dropped += 1;
            continue;
        };

        let corridor = Corridor::new(
            out.corridors.len(),
            centerline,
            width,
            polygon,
            [points[from].id.clone(), points[to].id.clone()],
        );
        components.join(from, to);
        out.stats.paths_found += 1;
        out.stats.total_length += corridor.length;
        out.stats.total_area += corridor.area;
        out.corridors.push(corridor);
    }

    out.stats.timed_out = guard.timed_out();

    let component_count = components.count();
    if component_count > 1 && out.stats.paths_dropped > 0 {
        out.warnings.push(format!(
            "Disconnected: corridor network has {component_count} components"
        ));
    }

    log::debug!(
        "corridors: {} built, {} dropped over {} key points",
        out.stats.paths_found,
        out.stats.paths_dropped,
        out.stats.key_points
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use plan::IlotKind;

    fn room(w: f64, h: f64) -> Region {
        Poly::new(vec![
            dvec2(0.0, 0.0),
            dvec2(w, 0.0),
            dvec2(w, h),
            dvec2(0.0, h),
        ])
        .unwrap()
        .into()
    }

    fn guard() -> StageGuard<'static> {
        StageGuard::new(30_000, None)
    }

    #[test]
    fn extrusion_of_a_straight_line_is_a_rectangle() {
        let line = vec![dvec2(0.0, 0.0), dvec2(10.0, 0.0)];
        let strip = extrude(&line, 2.0).unwrap();
        assert!((strip.area() - 20.0).abs() < 1e-9);
        let bounds = strip.bbox();
        assert_eq!(bounds.min, dvec2(0.0, -1.0));
        assert_eq!(bounds.max, dvec2(10.0, 1.0));
    }

    #[test]
    fn extrusion_follows_turns() {
        let line =
            vec![dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)];
        let strip = extrude(&line, 2.0).unwrap();
        // Roughly an L of two 10 m legs, minus the shared corner.
        assert!(strip.area() > 30.0 && strip.area() < 45.0);
        assert!(strip.contains(dvec2(5.0, 0.0)));
        assert!(strip.contains(dvec2(10.0, 5.0)));
    }

    #[test]
    fn smoothing_preserves_endpoints() {
        let region = room(20.0, 20.0);
        let mut line = vec![
            dvec2(2.0, 2.0),
            dvec2(10.0, 3.0),
            dvec2(11.0, 10.0),
            dvec2(18.0, 18.0),
        ];
        let (first, last) = (line[0], line[3]);
        smooth(&mut line, &region, 3);
        assert_eq!(line[0], first);
        assert_eq!(line[3], last);
        assert!(region.contains(line[1]) && region.contains(line[2]));
    }

    #[test]
    fn compact_collapses_collinear_runs() {
        let line = vec![
            dvec2(0.0, 0.0),
            dvec2(1.0, 0.0),
            dvec2(2.0, 0.0),
            dvec2(3.0, 0.0),
            dvec2(3.0, 1.0),
            dvec2(3.0, 2.0),
        ];
        assert_eq!(
            compact(line),
            vec![dvec2(0.0, 0.0), dvec2(3.0, 0.0), dvec2(3.0, 2.0)]
        );
    }

    #[test]
    fn connects_entrance_to_ilots() {
        let region = room(20.0, 15.0);
        let ilots = vec![
            Ilot::new(0, IlotKind::Workspace, dvec2(6.0, 7.0), 3.0, 2.0, 0.8),
            Ilot::new(1, IlotKind::Workspace, dvec2(14.0, 7.0), 3.0, 2.0, 0.8),
        ];
        let out = generate(
            &region,
            &ilots,
            &[dvec2(0.5, 7.5)],
            &CorridorCfg::default(),
            &guard(),
        );
        assert!(out.stats.paths_found > 0);
        assert!(out.failure.is_none());
        // Every îlot shows up as a corridor endpoint.
        for ilot in &ilots {
            assert!(
                out.corridors
                    .iter()
                    .any(|c| c.endpoints.contains(&ilot.id)),
                "{} unreached",
                ilot.id
            );
        }
        // Corridors stay off the îlot footprints.
        for corridor in &out.corridors {
            for ilot in &ilots {
                for &p in &corridor.centerline {
                    assert!(
                        !ilot.bbox().inflated(0.5).contains(p),
                        "centerline enters {}",
                        ilot.id
                    );
                }
            }
        }
    }

    #[test]
    fn no_destinations_no_corridors() {
        let out = generate(
            &room(20.0, 15.0),
            &[],
            &[],
            &CorridorCfg::default(),
            &guard(),
        );
        assert!(out.corridors.is_empty());
        assert_eq!(out.stats.key_points, 0);
    }

    #[test]
    fn impossible_clearance_reports_empty_grid() {
        let cfg = CorridorCfg {
            default_width: 3.0,
            ..Default::default()
        };
        // 2.5 m wide hall cannot fit a 3 m corridor.
        let out = generate(
            &room(2.5, 20.0),
            &[],
            &[dvec2(1.0, 1.0), dvec2(1.0, 19.0)],
            &cfg,
            &guard(),
        );
        assert!(out.corridors.is_empty());
        assert_eq!(out.failure, Some(FailureKind::NavGridEmpty));
        assert!(out.warnings.iter().any(|w| w.starts_with("NavGridEmpty")));
    }
}
