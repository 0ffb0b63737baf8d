use geom::Poly;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A uniform-width strip connecting two key points of the network.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Corridor {
    pub id: String,
    /// Smoothed path through the navigation grid, at least two points.
    pub centerline: Vec<DVec2>,
    pub width: f64,
    /// The centerline extruded to a closed strip.
    pub polygon: Poly,
    /// Centerline length, meters.
    pub length: f64,
    /// Strip area, square meters.
    pub area: f64,
    /// IDs of the two key points this corridor connects.
    pub endpoints: [String; 2],
}

impl Corridor {
    pub fn new(
        index: usize,
        centerline: Vec<DVec2>,
        width: f64,
        polygon: Poly,
        endpoints: [String; 2],
    ) -> Corridor {
        let length = centerline
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum();
        let area = polygon.area();
        Corridor {
            id: format!("corridor_{index}"),
            centerline,
            width,
            polygon,
            length,
            area,
            endpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn derived_measures() {
        let centerline = vec![dvec2(0.0, 0.0), dvec2(4.0, 0.0), dvec2(4.0, 3.0)];
        let polygon = Poly::rect(dvec2(2.0, 0.0), 4.0, 1.8);
        let c = Corridor::new(
            2,
            centerline,
            1.8,
            polygon,
            ["entrance_0".into(), "workspace_1".into()],
        );
        assert_eq!(c.id, "corridor_2");
        assert!((c.length - 7.0).abs() < 1e-9);
        assert!((c.area - 7.2).abs() < 1e-9);
    }
}
