use glam::{dvec2, DVec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box with inclusive corners, `min <= max`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

// Serialized as the flat corner list [min_x, min_y, max_x, max_y].
impl Serialize for BBox {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        [self.min.x, self.min.y, self.max.x, self.max.y]
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BBox {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let e = <[f64; 4]>::deserialize(deserializer)?;
        if e[0] > e[2] || e[1] > e[3] {
            return Err(serde::de::Error::custom("bbox min exceeds max"));
        }
        Ok(BBox::new(dvec2(e[0], e[1]), dvec2(e[2], e[3])))
    }
}

impl BBox {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y);
        BBox { min, max }
    }

    /// Smallest box containing every finite point in the input. `None` when
    /// no finite point exists.
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Self> {
        let mut ret: Option<BBox> = None;
        for p in points {
            if !p.is_finite() {
                continue;
            }
            ret = Some(match ret {
                None => BBox { min: p, max: p },
                Some(b) => BBox {
                    min: b.min.min(p),
                    max: b.max.max(p),
                },
            });
        }
        ret
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Closed-interval overlap test; touching boxes intersect.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn unite(&self, other: &BBox) -> BBox {
        BBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow (or shrink, for negative `d`) by the same margin on every side.
    /// Shrinking collapses to the center point rather than inverting.
    pub fn inflated(&self, d: f64) -> BBox {
        let min = self.min - DVec2::splat(d);
        let max = self.max + DVec2::splat(d);
        if min.x > max.x || min.y > max.y {
            let c = self.center();
            BBox { min: c, max: c }
        } else {
            BBox { min, max }
        }
    }

    /// Axis-aligned (Chebyshev) gap between two boxes: the largest per-axis
    /// separation, zero when the boxes overlap on both axes.
    pub fn gap(&self, other: &BBox) -> f64 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y);
        dx.max(dy).max(0.0)
    }
}
