use rstar::{RTree, RTreeObject, AABB};

use crate::BBox;

struct Entry<T> {
    envelope: AABB<[f64; 2]>,
    payload: T,
}

impl<T> RTreeObject for Entry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn to_envelope(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y])
}

/// R-tree of bbox-keyed payloads.
///
/// `search` returns every payload whose stored box intersects the query
/// box; it may not miss any, extra hits from the closed-interval overlap
/// test are the caller's problem.
pub struct SpatialIndex<T> {
    tree: RTree<Entry<T>>,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        SpatialIndex { tree: RTree::new() }
    }
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bulk_load(items: impl IntoIterator<Item = (BBox, T)>) -> Self {
        SpatialIndex {
            tree: RTree::bulk_load(
                items
                    .into_iter()
                    .map(|(bbox, payload)| Entry {
                        envelope: to_envelope(&bbox),
                        payload,
                    })
                    .collect(),
            ),
        }
    }

    pub fn insert(&mut self, bbox: BBox, payload: T) {
        self.tree.insert(Entry {
            envelope: to_envelope(&bbox),
            payload,
        });
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn search<'a>(&'a self, bbox: &BBox) -> impl Iterator<Item = &'a T> {
        self.tree
            .locate_in_envelope_intersecting(&to_envelope(bbox))
            .map(|e| &e.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn b(x0: f64, y0: f64, x1: f64, y1: f64) -> BBox {
        BBox::new(dvec2(x0, y0), dvec2(x1, y1))
    }

    #[test]
    fn search_has_no_false_negatives() {
        let mut index = SpatialIndex::new();
        for i in 0..10 {
            for j in 0..10 {
                let x = i as f64 * 3.0;
                let y = j as f64 * 3.0;
                index.insert(b(x, y, x + 2.0, y + 2.0), (i, j));
            }
        }
        let hits: Vec<(i32, i32)> =
            index.search(&b(1.0, 1.0, 4.0, 4.0)).copied().collect();
        for expected in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert!(hits.contains(&expected), "missing {expected:?}");
        }
    }

    #[test]
    fn touching_boxes_are_reported() {
        let index =
            SpatialIndex::bulk_load([(b(0.0, 0.0, 1.0, 1.0), "corner")]);
        assert_eq!(
            index.search(&b(1.0, 1.0, 2.0, 2.0)).count(),
            1,
            "closed-interval overlap must count"
        );
    }

    #[test]
    fn clear_empties_the_index() {
        let mut index = SpatialIndex::new();
        index.insert(b(0.0, 0.0, 1.0, 1.0), 0u32);
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.search(&b(0.0, 0.0, 5.0, 5.0)).count(), 0);
    }
}
