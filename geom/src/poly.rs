use glam::{dvec2, DVec2};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{BBox, GeometryError, EPSILON};

/// Zero band for orientation determinants. Absolute, sized for coordinates
/// up to a few hundred meters.
const ORIENT_EPS: f64 = 1e-9;

/// Signed double area of the triangle `a b c`; positive when `c` lies to
/// the left of `a -> b`.
pub fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

fn in_segment_box(a: DVec2, b: DVec2, p: DVec2) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Distance from point `p` to the segment `a b`.
pub fn seg_distance(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Do segments `p1 p2` and `q1 q2` intersect? Touching endpoints and
/// collinear overlap both count.
pub fn segments_cross(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
    if segments_cross_properly(p1, p2, q1, q2) {
        return true;
    }

    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    (d1.abs() <= ORIENT_EPS && in_segment_box(q1, q2, p1))
        || (d2.abs() <= ORIENT_EPS && in_segment_box(q1, q2, p2))
        || (d3.abs() <= ORIENT_EPS && in_segment_box(p1, p2, q1))
        || (d4.abs() <= ORIENT_EPS && in_segment_box(p1, p2, q2))
}

/// Strict interior crossing; shared endpoints and collinear overlap do not
/// count.
pub fn segments_cross_properly(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    ((d1 > ORIENT_EPS && d2 < -ORIENT_EPS) || (d1 < -ORIENT_EPS && d2 > ORIENT_EPS))
        && ((d3 > ORIENT_EPS && d4 < -ORIENT_EPS)
            || (d3 < -ORIENT_EPS && d4 > ORIENT_EPS))
}

/// Convex hull of a point set via Andrew's monotone chain, CCW. `None`
/// when fewer than three non-collinear finite points remain.
pub fn convex_hull(points: &[DVec2]) -> Option<Poly> {
    let mut pts: Vec<DVec2> =
        points.iter().copied().filter(|p| p.is_finite()).collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return None;
    }

    let chain = |iter: &mut dyn Iterator<Item = DVec2>| {
        let mut half: Vec<DVec2> = Vec::new();
        for p in iter {
            while half.len() >= 2
                && orient(half[half.len() - 2], half[half.len() - 1], p)
                    <= ORIENT_EPS
            {
                half.pop();
            }
            half.push(p);
        }
        half.pop();
        half
    };

    let mut hull = chain(&mut pts.iter().copied());
    hull.extend(chain(&mut pts.iter().rev().copied()));
    Poly::new(hull).ok()
}

/// A simple polygon: one exterior ring, implicitly closed.
///
/// Construction validates vertex count and finiteness and drops a repeated
/// closing vertex; it does not reorder or reorient, callers that care about
/// winding check [`Poly::is_ccw`].
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(transparent)]
pub struct Poly(Vec<DVec2>);

impl<'de> Deserialize<'de> for Poly {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<DVec2>::deserialize(deserializer)?;
        Poly::new(points).map_err(serde::de::Error::custom)
    }
}

impl Poly {
    pub fn new(mut points: Vec<DVec2>) -> Result<Self, GeometryError> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidPoint);
        }
        while points.len() > 1 && points.last() == points.first() {
            points.pop();
        }
        if points.len() < 3 {
            return Err(GeometryError::InvalidPolygon(points.len()));
        }
        let ret = Poly(points);
        if ret.area() < ORIENT_EPS {
            return Err(GeometryError::Degenerate);
        }
        Ok(ret)
    }

    /// Axis-aligned rectangle around a center point, CCW.
    pub fn rect(center: DVec2, width: f64, height: f64) -> Self {
        let h = dvec2(width, height) / 2.0;
        Poly(vec![
            center - h,
            center + dvec2(h.x, -h.y),
            center + h,
            center + dvec2(-h.x, h.y),
        ])
    }

    /// Regular `n`-gon disc approximation around a center, CCW.
    pub fn disc(center: DVec2, radius: f64, n: usize) -> Self {
        let n = n.max(3);
        Poly(
            (0..n)
                .map(|i| {
                    let a = std::f64::consts::TAU * i as f64 / n as f64;
                    center + dvec2(a.cos(), a.sin()) * radius
                })
                .collect(),
        )
    }

    pub fn from_bbox(b: &BBox) -> Self {
        Poly(vec![
            b.min,
            dvec2(b.max.x, b.min.y),
            b.max,
            dvec2(b.min.x, b.max.y),
        ])
    }

    pub fn points(&self) -> &[DVec2] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edges in order, including the implicit closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        self.0.iter().copied().circular_tuple_windows()
    }

    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.perp_dot(b)).sum::<f64>() / 2.0
    }

    /// Absolute shoelace area; winding does not matter.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Vertex mean. Not the mass centroid, but a stable interior seed for
    /// convex-ish shapes.
    pub fn centroid(&self) -> DVec2 {
        self.0.iter().sum::<DVec2>() / self.0.len() as f64
    }

    pub fn bbox(&self) -> BBox {
        // Vertices are known finite after construction.
        BBox::from_points(self.0.iter().copied()).expect("empty polygon")
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn reversed(&self) -> Poly {
        Poly(self.0.iter().rev().copied().collect())
    }

    pub fn translated(&self, offset: DVec2) -> Poly {
        Poly(self.0.iter().map(|&p| p + offset).collect())
    }

    /// Uniform scale about the origin, revalidating the result.
    pub fn scaled(&self, factor: f64) -> Result<Poly, GeometryError> {
        Poly::new(self.0.iter().map(|&p| p * factor).collect())
    }

    /// True when no two non-adjacent edges intersect.
    pub fn is_simple(&self) -> bool {
        let n = self.0.len();
        for i in 0..n {
            for j in (i + 1)..n {
                // Edges sharing a vertex always touch.
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let (a1, a2) = (self.0[i], self.0[(i + 1) % n]);
                let (b1, b2) = (self.0[j], self.0[(j + 1) % n]);
                if segments_cross(a1, a2, b1, b2) {
                    return false;
                }
            }
        }
        true
    }

    /// Even-odd ray casting with a horizontal ray. The answer for points
    /// within [`EPSILON`] of an edge is unspecified.
    pub fn contains(&self, p: DVec2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) / (b.y - a.y);
                if p.x < a.x + t * (b.x - a.x) {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn boundary_distance(&self, p: DVec2) -> f64 {
        self.edges()
            .map(|(a, b)| seg_distance(a, b, p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Containment treating the boundary as inside, up to [`EPSILON`].
    pub fn contains_inclusive(&self, p: DVec2) -> bool {
        self.contains(p) || self.boundary_distance(p) <= EPSILON
    }

    /// Containment treating the boundary as outside, up to [`EPSILON`].
    pub fn contains_strict(&self, p: DVec2) -> bool {
        self.contains(p) && self.boundary_distance(p) > EPSILON
    }

    /// Collision test: bbox reject, then vertex containment either way,
    /// then edge crossing. Collinear overlap counts as intersecting.
    pub fn intersects(&self, other: &Poly) -> bool {
        if !self.bbox().intersects(&other.bbox()) {
            return false;
        }
        if other.0.iter().any(|&p| self.contains(p))
            || self.0.iter().any(|&p| other.contains(p))
        {
            return true;
        }
        self.edges().any(|(a1, a2)| {
            other.edges().any(|(b1, b2)| segments_cross(a1, a2, b1, b2))
        })
    }

    /// Does `other` lie entirely inside this polygon? The boundary counts
    /// as inside: shared edges are fine, proper crossings are not.
    pub fn contains_poly(&self, other: &Poly) -> bool {
        if !other.0.iter().all(|&p| self.contains_inclusive(p)) {
            return false;
        }
        !self.edges().any(|(a1, a2)| {
            other
                .edges()
                .any(|(b1, b2)| segments_cross_properly(a1, a2, b1, b2))
        })
    }
}
