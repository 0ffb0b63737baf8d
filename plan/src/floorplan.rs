use geom::{BBox, Poly};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::CoreError;

fn default_thickness() -> f64 {
    0.2
}

fn default_scale() -> f64 {
    1.0
}

/// One interior wall segment.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wall {
    pub a: DVec2,
    pub b: DVec2,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
}

/// An entrance door: a center point with an optional facing angle in
/// radians.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Door {
    pub position: DVec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f64>,
}

/// The input plan. Coordinates are storage units times `scale` meters;
/// the pipeline applies `scale` once on entry.
///
/// Unknown keys are rejected so a typo surfaces as `InvalidInput` instead
/// of a silently different layout.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FloorPlan {
    /// Outer walkable envelope. Required unless `bounds` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<Poly>,
    /// Axis-aligned fallback envelope used to synthesise `boundary`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BBox>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub doors: Vec<Door>,
    #[serde(default)]
    pub windows: Vec<DVec2>,
    /// Hard forbidden: entrance mats, egress paths.
    #[serde(default)]
    pub red_zones: Vec<Poly>,
    /// Hard forbidden: fixed equipment, columns.
    #[serde(default)]
    pub blue_zones: Vec<Poly>,
    /// Mandatory corridor network connection targets.
    #[serde(default)]
    pub entrances: Vec<DVec2>,
    /// Linear storage-unit factor, e.g. 0.001 for a millimeter source.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for FloorPlan {
    fn default() -> Self {
        FloorPlan {
            boundary: None,
            bounds: None,
            walls: Vec::new(),
            doors: Vec::new(),
            windows: Vec::new(),
            red_zones: Vec::new(),
            blue_zones: Vec::new(),
            entrances: Vec::new(),
            scale: 1.0,
        }
    }
}

impl FloorPlan {
    /// Check the input invariants. Runs before any geometry work.
    pub fn validate(&self) -> Result<(), CoreError> {
        let bad = |msg: String| Err(CoreError::InvalidInput(msg));

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return bad(format!("scale must be finite positive, got {}", self.scale));
        }
        if let Some(boundary) = &self.boundary {
            if !boundary.is_simple() {
                return bad("boundary is self-intersecting".into());
            }
            if !boundary.is_ccw() {
                return bad("boundary must be counter-clockwise".into());
            }
        }
        if let Some(bounds) = &self.bounds {
            if !bounds.min.is_finite() || !bounds.max.is_finite() {
                return bad("bounds has non-finite coordinates".into());
            }
        }
        for (i, wall) in self.walls.iter().enumerate() {
            if !wall.a.is_finite() || !wall.b.is_finite() {
                return bad(format!("wall {i} has non-finite coordinates"));
            }
            if !wall.thickness.is_finite() || wall.thickness < 0.0 {
                return bad(format!("wall {i} thickness is invalid"));
            }
        }
        for (i, door) in self.doors.iter().enumerate() {
            if !door.position.is_finite()
                || door.orientation.is_some_and(|a| !a.is_finite())
            {
                return bad(format!("door {i} has non-finite coordinates"));
            }
        }
        for (i, p) in self.windows.iter().enumerate() {
            if !p.is_finite() {
                return bad(format!("window {i} has non-finite coordinates"));
            }
        }
        for (i, p) in self.entrances.iter().enumerate() {
            if !p.is_finite() {
                return bad(format!("entrance {i} has non-finite coordinates"));
            }
        }
        for (name, zones) in
            [("red_zone", &self.red_zones), ("blue_zone", &self.blue_zones)]
        {
            for (i, zone) in zones.iter().enumerate() {
                if !zone.is_simple() {
                    return bad(format!("{name} {i} is self-intersecting"));
                }
            }
        }
        Ok(())
    }

    /// Apply the storage-unit scale, producing a plan in plain meters.
    pub fn scaled(&self) -> Result<FloorPlan, CoreError> {
        if (self.scale - 1.0).abs() < f64::EPSILON {
            return Ok(self.clone());
        }
        let s = self.scale;
        let scale_poly = |p: &Poly| {
            p.scaled(s).map_err(|e| {
                CoreError::InvalidInput(format!("polygon degenerates under scale: {e}"))
            })
        };
        Ok(FloorPlan {
            boundary: self.boundary.as_ref().map(&scale_poly).transpose()?,
            bounds: self
                .bounds
                .as_ref()
                .map(|b| BBox::new(b.min * s, b.max * s)),
            walls: self
                .walls
                .iter()
                .map(|w| Wall {
                    a: w.a * s,
                    b: w.b * s,
                    thickness: w.thickness * s,
                })
                .collect(),
            doors: self
                .doors
                .iter()
                .map(|d| Door {
                    position: d.position * s,
                    orientation: d.orientation,
                })
                .collect(),
            windows: self.windows.iter().map(|&p| p * s).collect(),
            red_zones: self
                .red_zones
                .iter()
                .map(&scale_poly)
                .collect::<Result<_, _>>()?,
            blue_zones: self
                .blue_zones
                .iter()
                .map(&scale_poly)
                .collect::<Result<_, _>>()?,
            entrances: self.entrances.iter().map(|&p| p * s).collect(),
            scale: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use pretty_assertions::assert_eq;

    fn room() -> FloorPlan {
        FloorPlan {
            boundary: Some(
                Poly::new(vec![
                    dvec2(0.0, 0.0),
                    dvec2(20.0, 0.0),
                    dvec2(20.0, 15.0),
                    dvec2(0.0, 15.0),
                ])
                .unwrap(),
            ),
            entrances: vec![dvec2(0.0, 7.5)],
            ..Default::default()
        }
    }

    #[test]
    fn json_round_trip() {
        let mut plan = room();
        plan.walls.push(Wall {
            a: dvec2(5.0, 0.0),
            b: dvec2(5.0, 8.0),
            thickness: 0.2,
        });
        plan.doors.push(Door {
            position: dvec2(0.0, 7.5),
            orientation: None,
        });
        let json = serde_json::to_string(&plan).unwrap();
        let back: FloorPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_json::from_str::<FloorPlan>(
            r#"{"boundry": [[0,0],[1,0],[1,1]]}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn wall_thickness_defaults() {
        let wall: Wall =
            serde_json::from_str(r#"{"a": [0,0], "b": [4,0]}"#).unwrap();
        assert_eq!(wall.thickness, 0.2);
    }

    #[test]
    fn cw_boundary_is_invalid() {
        let mut plan = room();
        plan.boundary = Some(plan.boundary.unwrap().reversed());
        assert!(matches!(
            plan.validate(),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn bowtie_zone_is_invalid() {
        let mut plan = room();
        plan.red_zones.push(
            Poly::new(vec![
                dvec2(0.0, 0.0),
                dvec2(2.0, 2.0),
                dvec2(2.0, 0.0),
                dvec2(0.0, 2.0),
            ])
            .unwrap(),
        );
        assert!(plan.validate().is_err());
    }

    #[test]
    fn scale_applies_once() {
        let mut plan = room();
        plan.scale = 0.001;
        let scaled = plan.scaled().unwrap();
        assert_eq!(scaled.scale, 1.0);
        let max = scaled.boundary.unwrap().bbox().max;
        assert!((max - dvec2(0.02, 0.015)).length() < 1e-12);
    }
}
