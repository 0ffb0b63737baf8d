//! Constraint model: turn a floor plan into the allowed region and the
//! forbidden region set the later stages work against.

use geom::{convex_hull, Kernel, Poly, Region, DISC_SEGMENTS};
use glam::DVec2;
use plan::{CoreError, FloorPlan, PlacementCfg};

/// Where a forbidden region came from; used in log and warning text.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ForbiddenSource {
    Wall,
    Door,
    Window,
    RedZone,
    BlueZone,
}

/// A region îlots must avoid (hard) or are penalised for entering (soft).
#[derive(Clone, Debug)]
pub struct ForbiddenRegion {
    pub region: Region,
    pub hard: bool,
    /// Weight in (0, 1]; scales the soft score penalty.
    pub priority: f64,
    pub source: ForbiddenSource,
}

/// Output of the constraint stage.
#[derive(Clone, Debug)]
pub struct Constraints {
    /// Resolved outer envelope.
    pub boundary: Poly,
    /// Where îlots and corridors may appear.
    pub allowed: Region,
    pub forbidden: Vec<ForbiddenRegion>,
}

impl Constraints {
    /// Hard regions only; the set subtracted from the boundary.
    pub fn hard_regions(&self) -> impl Iterator<Item = &ForbiddenRegion> {
        self.forbidden.iter().filter(|f| f.hard)
    }

    pub fn soft_regions(&self) -> impl Iterator<Item = &ForbiddenRegion> {
        self.forbidden.iter().filter(|f| !f.hard)
    }
}

/// Thickness rectangle for one wall segment.
fn wall_strip(a: DVec2, b: DVec2, thickness: f64) -> Option<Poly> {
    let dir = b - a;
    let len = dir.length();
    if len < 1e-9 {
        return None;
    }
    let n = dir.perp() / len * (thickness / 2.0).max(1e-3);
    Poly::new(vec![a + n, b + n, b - n, a - n]).ok()
}

/// Resolve the outer envelope: explicit boundary, synthesised from
/// bounds, or the hull of all wall endpoints.
fn resolve_boundary(plan: &FloorPlan) -> Result<Poly, CoreError> {
    if let Some(boundary) = &plan.boundary {
        return Ok(boundary.clone());
    }
    if let Some(bounds) = &plan.bounds {
        return Ok(Poly::from_bbox(bounds));
    }
    let endpoints: Vec<DVec2> = plan
        .walls
        .iter()
        .flat_map(|w| [w.a, w.b])
        .collect();
    convex_hull(&endpoints).ok_or(CoreError::MissingBoundary)
}

/// Build the constraint model. `NoFeasibleSpace` when nothing is left of
/// the boundary after subtraction; the pipeline records it and returns an
/// empty layout.
pub fn build<K: Kernel>(
    kernel: &K,
    plan: &FloorPlan,
    cfg: &PlacementCfg,
) -> Result<Constraints, CoreError> {
    let boundary = resolve_boundary(plan)?;

    let mut forbidden = Vec::new();

    // Walls: thickness rectangle, then clearance buffer.
    let wall_parts: Vec<Region> = plan
        .walls
        .iter()
        .filter_map(|w| wall_strip(w.a, w.b, w.thickness))
        .map(|strip| kernel.buffer(&strip, cfg.min_wall_distance))
        .collect();
    if !wall_parts.is_empty() {
        forbidden.push(ForbiddenRegion {
            region: kernel.union(&wall_parts),
            hard: true,
            priority: 1.0,
            source: ForbiddenSource::Wall,
        });
    }

    // Door clearance discs are hard; window discs are soft and smaller.
    for door in &plan.doors {
        forbidden.push(ForbiddenRegion {
            region: Poly::disc(
                door.position,
                cfg.min_door_clearance,
                DISC_SEGMENTS,
            )
            .into(),
            hard: true,
            priority: 1.0,
            source: ForbiddenSource::Door,
        });
    }
    for &window in &plan.windows {
        forbidden.push(ForbiddenRegion {
            region: Poly::disc(
                window,
                cfg.min_door_clearance / 2.0,
                DISC_SEGMENTS,
            )
            .into(),
            hard: false,
            priority: 0.5,
            source: ForbiddenSource::Window,
        });
    }

    for zone in &plan.red_zones {
        forbidden.push(ForbiddenRegion {
            region: zone.clone().into(),
            hard: true,
            priority: 1.0,
            source: ForbiddenSource::RedZone,
        });
    }
    for zone in &plan.blue_zones {
        forbidden.push(ForbiddenRegion {
            region: zone.clone().into(),
            hard: true,
            priority: 1.0,
            source: ForbiddenSource::BlueZone,
        });
    }

    // The boundary itself keeps îlots at wall distance too.
    let base = if cfg.min_wall_distance > 0.0 {
        kernel.buffer(&boundary, -cfg.min_wall_distance)
    } else {
        boundary.clone().into()
    };

    let hard: Vec<Region> = forbidden
        .iter()
        .filter(|f| f.hard)
        .map(|f| f.region.clone())
        .collect();
    let allowed = kernel.difference(&base, &kernel.union(&hard));

    if allowed.is_empty() || allowed.area() < 1e-6 {
        return Err(CoreError::NoFeasibleSpace);
    }

    log::debug!(
        "constraints: allowed area {:.1} m2 over {} faces, {} forbidden regions",
        allowed.area(),
        allowed.faces().len(),
        forbidden.len()
    );

    Ok(Constraints {
        boundary,
        allowed,
        forbidden,
    })
}
