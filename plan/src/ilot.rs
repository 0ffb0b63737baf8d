use geom::{BBox, Poly};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Functional kind of a workstation island.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IlotKind {
    Workspace,
    Meeting,
    Social,
    Storage,
    Break,
    Focus,
    Collaboration,
}

impl IlotKind {
    pub const ALL: [IlotKind; 7] = [
        IlotKind::Workspace,
        IlotKind::Meeting,
        IlotKind::Social,
        IlotKind::Storage,
        IlotKind::Break,
        IlotKind::Focus,
        IlotKind::Collaboration,
    ];

    /// Nominal seat count.
    pub fn capacity(self) -> u32 {
        match self {
            IlotKind::Workspace => 4,
            IlotKind::Meeting => 8,
            IlotKind::Social => 6,
            IlotKind::Storage => 0,
            IlotKind::Break => 4,
            IlotKind::Focus => 1,
            IlotKind::Collaboration => 6,
        }
    }

    pub fn equipment(self) -> &'static [&'static str] {
        match self {
            IlotKind::Workspace => &["desk", "chair", "monitor"],
            IlotKind::Meeting => &["table", "chairs", "screen"],
            IlotKind::Social => &["sofa", "coffee_table"],
            IlotKind::Storage => &["shelving", "lockers"],
            IlotKind::Break => &["counter", "stools", "sink"],
            IlotKind::Focus => &["desk", "chair", "acoustic_panel"],
            IlotKind::Collaboration => &["whiteboard", "standing_table"],
        }
    }
}

/// One placed workstation island: an axis-aligned rectangle plus the
/// placement engine's own quality estimate.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Ilot {
    pub id: String,
    pub kind: IlotKind,
    pub center: DVec2,
    pub width: f64,
    pub height: f64,
    /// Derived rectangle; kept consistent with center/width/height.
    pub polygon: Poly,
    pub capacity: u32,
    pub equipment: Vec<String>,
    /// Placement score in [0, 1].
    pub score: f64,
    /// False when post-validation found a hard-rule violation.
    pub valid: bool,
}

impl Ilot {
    pub fn new(
        index: usize,
        kind: IlotKind,
        center: DVec2,
        width: f64,
        height: f64,
        score: f64,
    ) -> Ilot {
        Ilot {
            id: format!("{kind}_{index}"),
            kind,
            center,
            width,
            height,
            polygon: Poly::rect(center, width, height),
            capacity: kind.capacity(),
            equipment: kind.equipment().iter().map(|s| s.to_string()).collect(),
            score,
            valid: true,
        }
    }

    /// Move the îlot, rederiving its polygon.
    pub fn moved_to(&self, center: DVec2) -> Ilot {
        Ilot {
            center,
            polygon: Poly::rect(center, self.width, self.height),
            ..self.clone()
        }
    }

    pub fn bbox(&self) -> BBox {
        let half = DVec2::new(self.width, self.height) / 2.0;
        BBox::new(self.center - half, self.center + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(IlotKind::Break.to_string(), "break");
        assert_eq!(
            serde_json::to_string(&IlotKind::Workspace).unwrap(),
            "\"workspace\""
        );
        assert_eq!("meeting".parse::<IlotKind>(), Ok(IlotKind::Meeting));
    }

    #[test]
    fn polygon_tracks_rectangle() {
        let ilot = Ilot::new(3, IlotKind::Meeting, dvec2(5.0, 4.0), 3.9, 2.6, 0.8);
        assert_eq!(ilot.id, "meeting_3");
        assert_eq!(ilot.polygon.bbox(), ilot.bbox());
        assert!((ilot.polygon.area() - 3.9 * 2.6).abs() < 1e-9);

        let moved = ilot.moved_to(dvec2(8.0, 4.0));
        assert_eq!(moved.polygon.bbox(), moved.bbox());
        assert_eq!(moved.width, ilot.width);
    }

    #[test]
    fn json_round_trip() {
        let ilot = Ilot::new(0, IlotKind::Workspace, dvec2(1.5, 1.0), 3.0, 2.0, 0.92);
        let json = serde_json::to_string(&ilot).unwrap();
        let back: Ilot = serde_json::from_str(&json).unwrap();
        assert_eq!(ilot, back);
    }
}
