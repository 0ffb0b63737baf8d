use glam::DVec2;

use crate::{BBox, Poly};

/// One connected area: an exterior shell and zero or more holes.
#[derive(Clone, PartialEq, Debug)]
pub struct Face {
    pub shell: Poly,
    pub holes: Vec<Poly>,
}

impl Face {
    pub fn new(shell: Poly) -> Self {
        Face {
            shell,
            holes: Vec::new(),
        }
    }

    pub fn area(&self) -> f64 {
        self.shell.area() - self.holes.iter().map(Poly::area).sum::<f64>()
    }

    pub fn contains(&self, p: DVec2) -> bool {
        self.shell.contains(p) && !self.holes.iter().any(|h| h.contains(p))
    }

    fn contains_inclusive(&self, p: DVec2) -> bool {
        self.shell.contains_inclusive(p)
            && !self.holes.iter().any(|h| h.contains_strict(p))
    }

    /// Is `poly` entirely inside the face, boundary included?
    pub fn contains_poly(&self, poly: &Poly) -> bool {
        if !self.shell.contains_poly(poly) {
            return false;
        }
        for hole in &self.holes {
            // A vertex inside a hole, or a hole inside the polygon, breaks
            // containment; so does any proper edge crossing.
            if poly.points().iter().any(|&p| hole.contains_strict(p)) {
                return false;
            }
            if hole.points().iter().any(|&p| poly.contains_strict(p)) {
                return false;
            }
            if poly.edges().any(|(a1, a2)| {
                hole.edges().any(|(b1, b2)| {
                    crate::segments_cross_properly(a1, a2, b1, b2)
                })
            }) {
                return false;
            }
        }
        true
    }

    /// Does `poly` overlap the face at all?
    pub fn intersects_poly(&self, poly: &Poly) -> bool {
        if !self.shell.intersects(poly) {
            return false;
        }
        // Entirely swallowed by a hole means no overlap with the face.
        !self.holes.iter().any(|h| h.contains_poly(poly))
    }
}

/// A planar area: zero or more disjoint faces. The result type of the
/// boolean kernel and the working representation of allowed space.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Region {
    faces: Vec<Face>,
}

impl From<Poly> for Region {
    fn from(poly: Poly) -> Self {
        Region {
            faces: vec![Face::new(poly)],
        }
    }
}

impl Region {
    pub fn empty() -> Self {
        Region::default()
    }

    pub fn from_faces(faces: Vec<Face>) -> Self {
        Region { faces }
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn area(&self) -> f64 {
        self.faces.iter().map(Face::area).sum()
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.faces
            .iter()
            .map(|f| f.shell.bbox())
            .reduce(|a, b| a.unite(&b))
    }

    pub fn contains(&self, p: DVec2) -> bool {
        self.faces.iter().any(|f| f.contains(p))
    }

    pub fn contains_inclusive(&self, p: DVec2) -> bool {
        self.faces.iter().any(|f| f.contains_inclusive(p))
    }

    pub fn contains_poly(&self, poly: &Poly) -> bool {
        self.faces.iter().any(|f| f.contains_poly(poly))
    }

    pub fn intersects_poly(&self, poly: &Poly) -> bool {
        self.faces.iter().any(|f| f.intersects_poly(poly))
    }

    /// Flattened ring view: every shell and hole with an explicit hole
    /// flag. This is the multi-ring shape contract at the kernel boundary.
    pub fn rings(&self) -> impl Iterator<Item = (&Poly, bool)> {
        self.faces.iter().flat_map(|f| {
            std::iter::once((&f.shell, false))
                .chain(f.holes.iter().map(|h| (h, true)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn annulus() -> Region {
        let shell = Poly::rect(dvec2(5.0, 5.0), 10.0, 10.0);
        let hole = Poly::rect(dvec2(5.0, 5.0), 4.0, 4.0);
        Region::from_faces(vec![Face {
            shell,
            holes: vec![hole],
        }])
    }

    #[test]
    fn hole_excluded() {
        let r = annulus();
        assert!(r.contains(dvec2(1.0, 1.0)));
        assert!(!r.contains(dvec2(5.0, 5.0)));
        assert!((r.area() - (100.0 - 16.0)).abs() < 1e-9);
    }

    #[test]
    fn poly_containment_respects_holes() {
        let r = annulus();
        let in_rim = Poly::rect(dvec2(1.5, 5.0), 2.0, 2.0);
        assert!(r.contains_poly(&in_rim));
        let over_hole = Poly::rect(dvec2(5.0, 5.0), 6.0, 6.0);
        assert!(!r.contains_poly(&over_hole));
        let in_hole = Poly::rect(dvec2(5.0, 5.0), 1.0, 1.0);
        assert!(!r.contains_poly(&in_hole));
        assert!(!r.intersects_poly(&in_hole));
        assert!(r.intersects_poly(&over_hole));
    }

    #[test]
    fn ring_view() {
        let r = annulus();
        let rings: Vec<bool> = r.rings().map(|(_, hole)| hole).collect();
        assert_eq!(rings, vec![false, true]);
    }
}
