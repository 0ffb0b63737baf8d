use std::{cell::Cell, fmt};

use geo::{BooleanOps, LineString, MultiPolygon, Polygon as GeoPolygon};
use glam::{dvec2, DVec2};
use serde::{Deserialize, Serialize};

use crate::{Face, GeometryError, Poly, Region, DISC_SEGMENTS};

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelMode {
    Robust,
    Degraded,
}

impl fmt::Display for KernelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelMode::Robust => write!(f, "robust"),
            KernelMode::Degraded => write!(f, "degraded"),
        }
    }
}

/// Boolean set operations and buffering over [`Region`]s.
///
/// Implementations never panic and never abort a run: operations whose
/// result is geometrically empty return an empty region, and unexpected
/// non-finite values are clamped to empty results and tallied in
/// [`Kernel::errors`].
pub trait Kernel {
    fn mode(&self) -> KernelMode;

    /// Coordinate snapping factor applied before boolean evaluation.
    fn scale(&self) -> f64;

    /// Number of inputs or intermediate results clamped to empty so far.
    fn errors(&self) -> u32;

    /// Minkowski sum of the polygon with a disc of radius `|distance|`:
    /// outward for positive distances, inward for negative ones.
    fn buffer(&self, poly: &Poly, distance: f64) -> Region;

    fn union(&self, regions: &[Region]) -> Region;
    fn intersect(&self, a: &Region, b: &Region) -> Region;
    fn difference(&self, a: &Region, b: &Region) -> Region;
}

/// Production kernel delegating boolean evaluation to the `geo` crate.
///
/// Coordinates are snapped to a 1/SCALE lattice (0.1 mm) on the way in so
/// that equal inputs produce bit-equal outputs and near-degenerate slivers
/// collapse before they reach the boolean engine.
#[derive(Debug, Default)]
pub struct RobustKernel {
    errors: Cell<u32>,
}

/// Snapping factor; 0.1 mm resolution in a meter-denominated plan keeps
/// every product comfortably inside the f64 integer range for plans up to
/// a few hundred meters.
const SCALE: f64 = 1e4;

fn snap(x: f64) -> f64 {
    (x * SCALE).round() / SCALE
}

impl RobustKernel {
    pub fn new() -> Self {
        RobustKernel::default()
    }

    fn bump(&self) {
        self.errors.set(self.errors.get() + 1);
    }

    fn ring_to_geo(poly: &Poly) -> LineString<f64> {
        LineString::from(
            poly.points()
                .iter()
                .map(|p| (snap(p.x), snap(p.y)))
                .collect::<Vec<_>>(),
        )
    }

    fn to_geo(region: &Region) -> MultiPolygon<f64> {
        MultiPolygon::new(
            region
                .faces()
                .iter()
                .map(|f| {
                    GeoPolygon::new(
                        Self::ring_to_geo(&f.shell),
                        f.holes.iter().map(Self::ring_to_geo).collect(),
                    )
                })
                .collect(),
        )
    }

    fn ring_from_geo(&self, ls: &LineString<f64>) -> Option<Poly> {
        let points: Vec<DVec2> =
            ls.coords().map(|c| dvec2(c.x, c.y)).collect();
        match Poly::new(points) {
            Ok(p) => Some(p),
            // Sliver rings collapse to nothing; NaN output is an error.
            Err(GeometryError::InvalidPoint) => {
                self.bump();
                None
            }
            Err(_) => None,
        }
    }

    fn from_geo(&self, mp: MultiPolygon<f64>) -> Region {
        let mut faces = Vec::new();
        for gp in mp {
            let Some(shell) = self.ring_from_geo(gp.exterior()) else {
                continue;
            };
            let holes = gp
                .interiors()
                .iter()
                .filter_map(|ls| self.ring_from_geo(ls))
                .collect();
            faces.push(Face { shell, holes });
        }
        Region::from_faces(faces)
    }

    /// Union of capsules covering the polygon boundary: one rectangle per
    /// edge plus one disc per vertex, all at radius `d`.
    fn boundary_swell(&self, poly: &Poly, d: f64) -> Region {
        let mut parts: Vec<Region> = Vec::new();
        for (a, b) in poly.edges() {
            let dir = b - a;
            let len = dir.length();
            if len < 1e-12 {
                continue;
            }
            let n = dir.perp() / len * d;
            if let Ok(strip) = Poly::new(vec![a + n, b + n, b - n, a - n]) {
                parts.push(strip.into());
            }
        }
        for &v in poly.points() {
            parts.push(Poly::disc(v, d, DISC_SEGMENTS).into());
        }
        self.union(&parts)
    }
}

impl Kernel for RobustKernel {
    fn mode(&self) -> KernelMode {
        KernelMode::Robust
    }

    fn scale(&self) -> f64 {
        SCALE
    }

    fn errors(&self) -> u32 {
        self.errors.get()
    }

    fn buffer(&self, poly: &Poly, distance: f64) -> Region {
        if !distance.is_finite() {
            self.bump();
            return Region::empty();
        }
        if distance.abs() < 1e-12 {
            return poly.clone().into();
        }
        let swell = self.boundary_swell(poly, distance.abs());
        if distance > 0.0 {
            self.union(&[poly.clone().into(), swell])
        } else {
            self.difference(&poly.clone().into(), &swell)
        }
    }

    fn union(&self, regions: &[Region]) -> Region {
        let mut acc: Option<MultiPolygon<f64>> = None;
        for r in regions {
            if r.is_empty() {
                continue;
            }
            let g = Self::to_geo(r);
            acc = Some(match acc {
                None => g,
                Some(a) => a.union(&g),
            });
        }
        match acc {
            None => Region::empty(),
            Some(mp) => self.from_geo(mp),
        }
    }

    fn intersect(&self, a: &Region, b: &Region) -> Region {
        if a.is_empty() || b.is_empty() {
            return Region::empty();
        }
        self.from_geo(Self::to_geo(a).intersection(&Self::to_geo(b)))
    }

    fn difference(&self, a: &Region, b: &Region) -> Region {
        if a.is_empty() {
            return Region::empty();
        }
        if b.is_empty() {
            return a.clone();
        }
        self.from_geo(Self::to_geo(a).difference(&Self::to_geo(b)))
    }
}

/// Low-fidelity kernel with intentionally degraded semantics: union
/// collapses to the joint bounding rectangle, difference returns the
/// minuend untouched and buffering pushes vertices radially from the
/// centroid, which mishandles concave shapes. Smoke-test use only; runs
/// that used it surface `kernel_mode = "degraded"` in their stats.
#[derive(Debug, Default)]
pub struct FallbackKernel {
    errors: Cell<u32>,
}

impl FallbackKernel {
    pub fn new() -> Self {
        FallbackKernel::default()
    }

    fn bump(&self) {
        self.errors.set(self.errors.get() + 1);
    }
}

impl Kernel for FallbackKernel {
    fn mode(&self) -> KernelMode {
        KernelMode::Degraded
    }

    fn scale(&self) -> f64 {
        1.0
    }

    fn errors(&self) -> u32 {
        self.errors.get()
    }

    fn buffer(&self, poly: &Poly, distance: f64) -> Region {
        if !distance.is_finite() {
            self.bump();
            return Region::empty();
        }
        let c = poly.centroid();
        let pushed: Vec<DVec2> = poly
            .points()
            .iter()
            .map(|&v| {
                let dir = v - c;
                let len = dir.length();
                if len < 1e-12 {
                    v
                } else {
                    v + dir / len * distance
                }
            })
            .collect();
        match Poly::new(pushed) {
            Ok(p) => p.into(),
            Err(_) => {
                self.bump();
                Region::empty()
            }
        }
    }

    fn union(&self, regions: &[Region]) -> Region {
        let bounds = regions
            .iter()
            .filter_map(|r| r.bbox())
            .reduce(|a, b| a.unite(&b));
        match bounds {
            None => Region::empty(),
            Some(b) => Poly::from_bbox(&b).into(),
        }
    }

    fn intersect(&self, a: &Region, b: &Region) -> Region {
        let (Some(ba), Some(bb)) = (a.bbox(), b.bbox()) else {
            return Region::empty();
        };
        if !ba.intersects(&bb) {
            return Region::empty();
        }
        let min = ba.min.max(bb.min);
        let max = ba.max.min(bb.max);
        match Poly::new(vec![
            min,
            dvec2(max.x, min.y),
            max,
            dvec2(min.x, max.y),
        ]) {
            Ok(p) => p.into(),
            Err(_) => Region::empty(),
        }
    }

    fn difference(&self, a: &Region, _b: &Region) -> Region {
        a.clone()
    }
}
