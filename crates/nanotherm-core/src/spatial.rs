use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::BBox;

/// A placed footprint in the R-tree, referencing its owner by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub index: usize,
    pub bbox: BBox,
}

impl RTreeObject for Footprint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.bbox)
    }
}

/// Spatial index over placed footprints, used for the instance spacing
/// check.
pub struct SpatialIndex {
    tree: RTree<Footprint>,
}

impl SpatialIndex {
    pub fn build(entries: Vec<Footprint>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// All footprints intersecting `viewport`.
    pub fn query_viewport(&self, viewport: &BBox) -> Vec<&Footprint> {
        self.tree
            .locate_in_envelope_intersecting(&envelope_of(viewport))
            .collect()
    }

    /// Pairs `(a, b)` with `a < b` whose boxes overlap by more than
    /// `tolerance` in both axes. Touching edges do not count.
    pub fn overlapping_pairs(&self, tolerance: f64) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for entry in self.tree.iter() {
            let shrunk = entry.bbox.expand(-tolerance);
            if shrunk.width() <= 0.0 || shrunk.height() <= 0.0 {
                continue;
            }
            for other in self.query_viewport(&shrunk) {
                if other.index > entry.index && overlaps(&shrunk, &other.bbox) {
                    pairs.push((entry.index, other.index));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}

fn envelope_of(bbox: &BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y])
}

fn overlaps(a: &BBox, b: &BBox) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn footprint(index: usize, x0: f64, y0: f64, x1: f64, y1: f64) -> Footprint {
        Footprint {
            index,
            bbox: BBox::new(Point::new(x0, y0), Point::new(x1, y1)),
        }
    }

    #[test]
    fn test_query_viewport_hits_only_intersecting() {
        let index = SpatialIndex::build(vec![
            footprint(0, 0.0, 0.0, 10.0, 10.0),
            footprint(1, 20.0, 20.0, 30.0, 30.0),
        ]);

        let hits = index.query_viewport(&BBox::new(Point::new(-5.0, -5.0), Point::new(15.0, 15.0)));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);

        let everything = BBox::new(Point::new(-5.0, -5.0), Point::new(25.0, 25.0));
        assert_eq!(index.query_viewport(&everything).len(), 2);
    }

    #[test]
    fn test_overlapping_pairs_ignores_touching() {
        let index = SpatialIndex::build(vec![
            footprint(0, 0.0, 0.0, 10.0, 10.0),
            footprint(1, 10.0, 0.0, 20.0, 10.0),
            footprint(2, 15.0, 5.0, 25.0, 15.0),
        ]);
        assert_eq!(index.overlapping_pairs(1e-6), vec![(1, 2)]);
    }
}
