//! Grid A* for corridor edges.
//!
//! Crate `pathfinding` ships an A*, but it exposes neither an expansion
//! cap, a timeout hook, nor the tie-breaking the corridor stage needs
//! (equal f prefers smaller h, then insertion order), so this one is
//! hand-rolled on a binary heap.

use std::{cmp::Ordering, collections::BinaryHeap};

use plan::CorridorCfg;
use rustc_hash::FxHashMap;

use crate::{
    guard::StageGuard,
    navgrid::{Cell, NavGrid, CARDINAL, DIAGONAL},
};

/// Integer cost scale: one cardinal step costs 1000.
const COST_SCALE: f64 = 1000.0;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PathFailure {
    /// Goal unreachable from start.
    NoPath,
    /// Expansion cap hit before the goal.
    NodeCapExceeded,
    /// Stage timeout or cancellation fired mid-search.
    Interrupted,
}

#[derive(Eq, PartialEq)]
struct Open {
    f: u64,
    h: u64,
    seq: u64,
    g: u64,
    cell: Cell,
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-by-f, ties by lower
        // h, then FIFO insertion order.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn diagonal_step_cost(cfg: &CorridorCfg) -> u64 {
    (cfg.diagonal_cost * COST_SCALE).round() as u64
}

/// Octile distance when diagonals are enabled, Manhattan otherwise.
/// Admissible as long as the diagonal step cost is at least one cardinal.
fn heuristic(a: Cell, b: Cell, cfg: &CorridorCfg) -> u64 {
    let dx = (a.0 - b.0).unsigned_abs() as u64;
    let dy = (a.1 - b.1).unsigned_abs() as u64;
    if cfg.diagonal {
        let (lo, hi) = (dx.min(dy), dx.max(dy));
        diagonal_step_cost(cfg) * lo + COST_SCALE as u64 * (hi - lo)
    } else {
        COST_SCALE as u64 * (dx + dy)
    }
}

/// A* from `start` to `goal` over walkable cells. Returns the cell path
/// including both endpoints.
pub(crate) fn find_path(
    grid: &NavGrid,
    start: Cell,
    goal: Cell,
    cfg: &CorridorCfg,
    guard: &StageGuard,
) -> Result<Vec<Cell>, PathFailure> {
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return Err(PathFailure::NoPath);
    }

    let diagonal_cost = diagonal_step_cost(cfg);
    let all_steps = [
        CARDINAL[0], CARDINAL[1], CARDINAL[2], CARDINAL[3],
        DIAGONAL[0], DIAGONAL[1], DIAGONAL[2], DIAGONAL[3],
    ];
    let steps: &[Cell] = if cfg.diagonal { &all_steps } else { &CARDINAL };

    let mut open = BinaryHeap::new();
    let mut best_g: FxHashMap<Cell, u64> = FxHashMap::default();
    let mut came_from: FxHashMap<Cell, Cell> = FxHashMap::default();
    let mut seq = 0u64;
    let mut expansions = 0u32;

    best_g.insert(start, 0);
    open.push(Open {
        f: heuristic(start, goal, cfg),
        h: heuristic(start, goal, cfg),
        seq,
        g: 0,
        cell: start,
    });

    while let Some(node) = open.pop() {
        if !guard.keep_going() {
            return Err(PathFailure::Interrupted);
        }
        // Stale queue entry for a cell already reached cheaper.
        if best_g.get(&node.cell).is_some_and(|&g| g < node.g) {
            continue;
        }
        if node.cell == goal {
            let mut path = vec![goal];
            let mut cur = goal;
            while let Some(&prev) = came_from.get(&cur) {
                path.push(prev);
                cur = prev;
            }
            path.reverse();
            return Ok(path);
        }

        expansions += 1;
        if expansions > cfg.max_nodes {
            return Err(PathFailure::NodeCapExceeded);
        }

        for (i, step) in steps.iter().enumerate() {
            let next = (node.cell.0 + step.0, node.cell.1 + step.1);
            if !grid.is_walkable(next) {
                continue;
            }
            let step_cost = if i < 4 {
                COST_SCALE as u64
            } else {
                diagonal_cost
            };
            let g = node.g + step_cost;
            if best_g.get(&next).is_some_and(|&old| old <= g) {
                continue;
            }
            best_g.insert(next, g);
            came_from.insert(next, node.cell);
            seq += 1;
            let h = heuristic(next, goal, cfg);
            open.push(Open {
                f: g + h,
                h,
                seq,
                g,
                cell: next,
            });
        }
    }

    Err(PathFailure::NoPath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::{Poly, Region};
    use glam::dvec2;

    fn grid_for(region: Region, cfg: &CorridorCfg) -> NavGrid {
        NavGrid::build(&region, &[], cfg.default_width, cfg).unwrap()
    }

    fn open_room(w: f64, h: f64) -> Region {
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
    fn straight_line_in_open_room() {
        let cfg = CorridorCfg::default();
        let grid = grid_for(open_room(20.0, 10.0), &cfg);
        let start = grid.nearest_walkable(dvec2(2.0, 5.0)).unwrap();
        let goal = grid.nearest_walkable(dvec2(18.0, 5.0)).unwrap();
        let path = find_path(&grid, start, goal, &cfg, &guard()).unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        // 32 columns apart, all on one row: 33 cells.
        assert_eq!(path.len(), 33);
    }

    #[test]
    fn diagonals_shorten_paths() {
        let cardinal_cfg = CorridorCfg {
            diagonal: false,
            ..Default::default()
        };
        let diagonal_cfg = CorridorCfg::default();
        let grid = grid_for(open_room(20.0, 20.0), &cardinal_cfg);
        let start = grid.nearest_walkable(dvec2(2.0, 2.0)).unwrap();
        let goal = grid.nearest_walkable(dvec2(18.0, 18.0)).unwrap();
        let straight =
            find_path(&grid, start, goal, &cardinal_cfg, &guard()).unwrap();
        let diagonal =
            find_path(&grid, start, goal, &diagonal_cfg, &guard()).unwrap();
        assert!(diagonal.len() < straight.len());
    }

    #[test]
    fn routes_around_an_obstacle() {
        // U-shaped room: a wall notch splits the middle.
        let region: Region = Poly::new(vec![
            dvec2(0.0, 0.0),
            dvec2(20.0, 0.0),
            dvec2(20.0, 10.0),
            dvec2(11.0, 10.0),
            dvec2(11.0, 3.0),
            dvec2(9.0, 3.0),
            dvec2(9.0, 10.0),
            dvec2(0.0, 10.0),
        ])
        .unwrap()
        .into();
        let cfg = CorridorCfg::default();
        let grid = grid_for(region, &cfg);
        let start = grid.nearest_walkable(dvec2(4.0, 8.0)).unwrap();
        let goal = grid.nearest_walkable(dvec2(16.0, 8.0)).unwrap();
        let path = find_path(&grid, start, goal, &cfg, &guard()).unwrap();
        // Every path cell keeps clear of the notch.
        for &cell in &path {
            let p = grid.cell_center(cell);
            assert!(
                !(p.x > 8.0 && p.x < 12.0 && p.y > 4.0),
                "path crosses the notch at {p:?}"
            );
        }
    }

    #[test]
    fn unreachable_goal_fails() {
        let cfg = CorridorCfg::default();
        // Two rooms with no connection.
        let left = open_room(5.0, 5.0);
        let grid = grid_for(left, &cfg);
        let start = grid.nearest_walkable(dvec2(2.5, 2.5)).unwrap();
        assert_eq!(
            find_path(&grid, start, (100, 100), &cfg, &guard()),
            Err(PathFailure::NoPath)
        );
    }

    #[test]
    fn node_cap_is_enforced() {
        let cfg = CorridorCfg {
            max_nodes: 4,
            ..Default::default()
        };
        let grid = grid_for(open_room(20.0, 20.0), &cfg);
        let start = grid.nearest_walkable(dvec2(2.0, 2.0)).unwrap();
        let goal = grid.nearest_walkable(dvec2(18.0, 18.0)).unwrap();
        assert_eq!(
            find_path(&grid, start, goal, &cfg, &guard()),
            Err(PathFailure::NodeCapExceeded)
        );
    }
}
