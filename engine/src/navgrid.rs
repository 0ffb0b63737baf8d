//! Navigation grid: the allowed region minus inflated îlot footprints,
//! rasterised into walkable cells for pathfinding.

use geom::{BBox, Region};
use glam::{dvec2, DVec2};
use plan::{CorridorCfg, Ilot};

/// Cell address, column then row.
pub type Cell = (i32, i32);

/// Neighbour steps in canonical order: cardinals clockwise from north,
/// then diagonals. Fixed order keeps expansion deterministic.
pub(crate) const CARDINAL: [Cell; 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
pub(crate) const DIAGONAL: [Cell; 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

pub struct NavGrid {
    origin: DVec2,
    resolution: f64,
    cols: i32,
    rows: i32,
    walkable: Vec<bool>,
}

impl NavGrid {
    /// Rasterise the allowed region. A cell is walkable when its center
    /// lies inside, four cardinal probes at the clearance radius lie
    /// inside, and the cell does not overlap any îlot rectangle inflated
    /// by the clearance radius.
    pub fn build(
        allowed: &Region,
        ilots: &[Ilot],
        width: f64,
        cfg: &CorridorCfg,
    ) -> Option<NavGrid> {
        let bounds = allowed.bbox()?;
        let res = cfg.grid_resolution;
        let cols = (bounds.width() / res).ceil().max(1.0) as i32;
        let rows = (bounds.height() / res).ceil().max(1.0) as i32;
        let clearance = width / 2.0;

        // Blocking boxes: îlot rectangles inflated by the clearance
        // radius, grown by a half cell so the overlap test reduces to a
        // center-in-box test.
        let blockers: Vec<BBox> = if cfg.corridor_avoids_ilots {
            ilots
                .iter()
                .filter(|i| i.valid)
                .map(|i| i.bbox().inflated(clearance + res / 2.0))
                .collect()
        } else {
            Vec::new()
        };

        let mut walkable = vec![false; (cols * rows) as usize];
        for row in 0..rows {
            for col in 0..cols {
                let center = bounds.min
                    + dvec2(
                        (col as f64 + 0.5) * res,
                        (row as f64 + 0.5) * res,
                    );
                let clear = allowed.contains(center)
                    && [
                        dvec2(clearance, 0.0),
                        dvec2(-clearance, 0.0),
                        dvec2(0.0, clearance),
                        dvec2(0.0, -clearance),
                    ]
                    .iter()
                    .all(|&probe| allowed.contains(center + probe))
                    && !blockers.iter().any(|b| b.contains(center));
                walkable[(row * cols + col) as usize] = clear;
            }
        }

        Some(NavGrid {
            origin: bounds.min,
            resolution: res,
            cols,
            rows,
            walkable,
        })
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|&&w| w).count()
    }

    pub fn is_walkable(&self, (col, row): Cell) -> bool {
        col >= 0
            && row >= 0
            && col < self.cols
            && row < self.rows
            && self.walkable[(row * self.cols + col) as usize]
    }

    pub fn cell_center(&self, (col, row): Cell) -> DVec2 {
        self.origin
            + dvec2(
                (col as f64 + 0.5) * self.resolution,
                (row as f64 + 0.5) * self.resolution,
            )
    }

    /// Cell containing a world point; may be outside the grid.
    pub fn cell_at(&self, p: DVec2) -> Cell {
        (
            ((p.x - self.origin.x) / self.resolution).floor() as i32,
            ((p.y - self.origin.y) / self.resolution).floor() as i32,
        )
    }

    /// Walkable cell whose center is nearest to the point. Ties break on
    /// row, then column, so the answer is deterministic.
    pub fn nearest_walkable(&self, p: DVec2) -> Option<Cell> {
        let mut best: Option<(f64, Cell)> = None;
        for row in 0..self.rows {
            for col in 0..self.cols {
                if !self.walkable[(row * self.cols + col) as usize] {
                    continue;
                }
                let d = self.cell_center((col, row)).distance_squared(p);
                let better = match best {
                    None => true,
                    Some((bd, _)) => d < bd - 1e-12,
                };
                if better {
                    best = Some((d, (col, row)));
                }
            }
        }
        best.map(|(_, cell)| cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::Poly;
    use plan::IlotKind;

    fn room_region(w: f64, h: f64) -> Region {
        Poly::new(vec![
            dvec2(0.0, 0.0),
            dvec2(w, 0.0),
            dvec2(w, h),
            dvec2(0.0, h),
        ])
        .unwrap()
        .into()
    }

    #[test]
    fn clearance_blocks_the_rim() {
        let cfg = CorridorCfg::default();
        let grid =
            NavGrid::build(&room_region(10.0, 10.0), &[], 1.8, &cfg).unwrap();
        assert_eq!((grid.cols(), grid.rows()), (20, 20));
        // Rim cell centers are within 0.9 m of the wall.
        assert!(!grid.is_walkable((0, 10)));
        assert!(grid.is_walkable((10, 10)));
        assert!(grid.walkable_count() > 0);
    }

    #[test]
    fn too_narrow_region_has_no_walkable_cells() {
        let cfg = CorridorCfg::default();
        let grid =
            NavGrid::build(&room_region(1.0, 10.0), &[], 1.8, &cfg).unwrap();
        assert_eq!(grid.walkable_count(), 0);
    }

    #[test]
    fn ilots_block_cells() {
        let cfg = CorridorCfg::default();
        let ilot =
            Ilot::new(0, IlotKind::Workspace, dvec2(10.0, 10.0), 3.0, 2.0, 0.8);
        let open =
            NavGrid::build(&room_region(20.0, 20.0), &[], 1.8, &cfg).unwrap();
        let blocked =
            NavGrid::build(&room_region(20.0, 20.0), &[ilot.clone()], 1.8, &cfg)
                .unwrap();
        assert!(blocked.walkable_count() < open.walkable_count());
        let center_cell = blocked.cell_at(dvec2(10.0, 10.0));
        assert!(open.is_walkable(center_cell));
        assert!(!blocked.is_walkable(center_cell));

        // Legacy mode routes straight through.
        let legacy_cfg = CorridorCfg {
            corridor_avoids_ilots: false,
            ..Default::default()
        };
        let legacy =
            NavGrid::build(&room_region(20.0, 20.0), &[ilot], 1.8, &legacy_cfg)
                .unwrap();
        assert!(legacy.is_walkable(center_cell));
    }

    #[test]
    fn nearest_walkable_is_deterministic() {
        let cfg = CorridorCfg::default();
        let grid =
            NavGrid::build(&room_region(10.0, 10.0), &[], 1.8, &cfg).unwrap();
        // A point outside the grid still resolves to its closest cell.
        let cell = grid.nearest_walkable(dvec2(-5.0, 5.0)).unwrap();
        assert!(grid.is_walkable(cell));
        assert_eq!(cell.0, 2, "nearest interior column");
    }
}
