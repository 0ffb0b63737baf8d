//! Key-point collection and minimum-spanning-tree topology for the
//! corridor network.

use geom::Region;
use glam::DVec2;
use pathfinding::prelude::kruskal;
use plan::Ilot;

use crate::navgrid::NavGrid;

/// A corridor network node: entrance, valid îlot center, or circulation
/// anchor.
#[derive(Clone, Debug)]
pub(crate) struct KeyPoint {
    pub id: String,
    pub pos: DVec2,
    /// Connection priority: 1.0 entrances, 0.5 îlots, 0.25 anchors.
    pub priority: f64,
}

/// Entrances, valid îlot centers and up to five circulation anchors (the
/// allowed-region center and quarter centers, kept only when they land on
/// walkable cells).
pub(crate) fn collect_key_points(
    entrances: &[DVec2],
    ilots: &[Ilot],
    allowed: &Region,
    grid: &NavGrid,
    connect_all_entrances: bool,
) -> Vec<KeyPoint> {
    let mut points = Vec::new();

    if connect_all_entrances {
        for (i, &pos) in entrances.iter().enumerate() {
            points.push(KeyPoint {
                id: format!("entrance_{i}"),
                pos,
                priority: 1.0,
            });
        }
    }

    for ilot in ilots.iter().filter(|i| i.valid) {
        points.push(KeyPoint {
            id: ilot.id.clone(),
            pos: ilot.center,
            priority: 0.5,
        });
    }

    if let Some(bounds) = allowed.bbox() {
        let center = bounds.center();
        let quarter = DVec2::new(bounds.width(), bounds.height()) / 4.0;
        let anchors = [
            center,
            center + quarter,
            center - quarter,
            center + DVec2::new(quarter.x, -quarter.y),
            center + DVec2::new(-quarter.x, quarter.y),
        ];
        for (i, &pos) in anchors.iter().enumerate() {
            if grid.is_walkable(grid.cell_at(pos)) {
                points.push(KeyPoint {
                    id: format!("anchor_{i}"),
                    pos,
                    priority: 0.25,
                });
            }
        }
    }

    points
}

/// Network topology over the complete Euclidean graph: a Kruskal minimum
/// spanning tree on integer millimeter weights (total, deterministic
/// ordering), plus, when `redundant` is set, every extra edge no longer
/// than 1.2x the longest tree edge as an alternative-route overlay.
pub(crate) fn mst_edges(
    points: &[KeyPoint],
    redundant: bool,
) -> Vec<(usize, usize)> {
    let mut edges: Vec<(usize, usize, u64)> = Vec::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let mm = (points[i].pos.distance(points[j].pos) * 1000.0).round()
                as u64;
            edges.push((i, j, mm));
        }
    }

    // kruskal yields (&N, &N, C); copy the node ends out.
    let tree: Vec<(usize, usize, u64)> =
        kruskal(&edges).map(|e| (*e.0, *e.1, e.2)).collect();
    let mut selected: Vec<(usize, usize)> =
        tree.iter().map(|&(a, b, _)| (a, b)).collect();

    if redundant {
        let bound = tree.iter().map(|&(_, _, w)| w).max().unwrap_or(0);
        let limit = bound + bound / 5;
        for &(a, b, w) in &edges {
            if w <= limit && !selected.contains(&(a, b)) {
                selected.push((a, b));
            }
        }
    }
    selected
}

/// Union-find over key-point indices, used to report disconnected
/// components after edge failures.
pub(crate) struct Components {
    parent: Vec<usize>,
}

impl Components {
    pub fn new(n: usize) -> Self {
        Components {
            parent: (0..n).collect(),
        }
    }

    fn root(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    pub fn join(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.root(a), self.root(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }

    pub fn count(&mut self) -> usize {
        let n = self.parent.len();
        (0..n).filter(|&i| self.root(i) == i).count()
    }
}
