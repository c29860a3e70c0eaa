//! Layer-tagged leaf shapes and the small value types they are built from.
//!
//! Coordinates are micrometres with y up, matching the GDS-II database unit
//! the exporter writes.

use serde::{Deserialize, Serialize};

use crate::cell::Transform;
use crate::LayerId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned extent, `min` lower-left and `max` upper-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Tightest box around `points`; `None` when there are none.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |bb, p| Self {
            min: Point::new(bb.min.x.min(p.x), bb.min.y.min(p.y)),
            max: Point::new(bb.max.x.max(p.x), bb.max.y.max(p.y)),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + self.width() / 2.0,
            self.min.y + self.height() / 2.0,
        )
    }

    /// Inclusive of the boundary.
    pub fn contains_point(&self, p: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &BBox) -> Self {
        Self::from_points(&[self.min, self.max, other.min, other.max]).unwrap_or(*self)
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: self.min.translate(-margin, -margin),
            max: self.max.translate(margin, margin),
        }
    }

    pub fn merge_all<I: IntoIterator<Item = BBox>>(boxes: I) -> Option<Self> {
        boxes.into_iter().reduce(|acc, bb| acc.union(&bb))
    }
}

/// A layer-tagged rectangle, as read back from a four-corner GDS boundary or
/// placed directly by tests and fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub layer_id: LayerId,
    pub extent: BBox,
}

impl Rect {
    /// Corners may be given in any order.
    pub fn new(layer_id: LayerId, x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let extent = BBox::new(
            Point::new(x1.min(x2), y1.min(y2)),
            Point::new(x1.max(x2), y1.max(y2)),
        );
        Self { layer_id, extent }
    }

    /// Counter-clockwise from the lower-left corner.
    pub fn to_polygon(&self) -> Polygon {
        let BBox { min, max } = self.extent;
        Polygon::new(
            self.layer_id,
            vec![min, Point::new(max.x, min.y), max, Point::new(min.x, max.y)],
        )
    }
}

/// A hole-free polygon on a single layer. This is the leaf shape that ends
/// up as a GDS boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub layer_id: LayerId,
    /// Open ring: the closing vertex is implied.
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(layer_id: LayerId, vertices: Vec<Point>) -> Self {
        Self { layer_id, vertices }
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        if self.vertices.len() < 3 {
            return 0.0;
        }
        let next = self.vertices.iter().cycle().skip(1);
        self.vertices
            .iter()
            .zip(next)
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            layer_id: self.layer_id,
            vertices: self.vertices.iter().map(|p| transform.apply(p)).collect(),
        }
    }
}

/// A shape stored in a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeomPrimitive {
    Rect(Rect),
    Polygon(Polygon),
}

impl GeomPrimitive {
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            GeomPrimitive::Rect(r) => Some(r.extent),
            GeomPrimitive::Polygon(p) => p.bbox(),
        }
    }

    pub fn layer_id(&self) -> LayerId {
        match self {
            GeomPrimitive::Rect(r) => r.layer_id,
            GeomPrimitive::Polygon(p) => p.layer_id,
        }
    }

    pub fn to_polygon(&self) -> Polygon {
        match self {
            GeomPrimitive::Rect(r) => r.to_polygon(),
            GeomPrimitive::Polygon(p) => p.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        assert!((Point::new(1.0, 1.0).distance_to(&Point::new(4.0, 5.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rect_corners_in_any_order() {
        let r = Rect::new(0, 10.0, 5.0, 0.0, 0.0);
        assert_eq!(r.extent.min, Point::new(0.0, 0.0));
        assert_eq!(r.extent.max, Point::new(10.0, 5.0));
        assert!((r.to_polygon().area() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_contains_boundary() {
        let bb = BBox::from_points(&[Point::new(2.0, -1.0), Point::new(-3.0, 4.0)]).unwrap();
        assert!(bb.contains_point(&Point::new(-3.0, -1.0)));
        assert!(bb.contains_point(&Point::new(0.0, 0.0)));
        assert!(!bb.contains_point(&Point::new(2.5, 0.0)));
        assert_eq!(bb.center(), Point::new(-0.5, 1.5));
        assert!(BBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_polygon_winding() {
        let ccw = Rect::new(1, 0.0, 0.0, 4.0, 2.0).to_polygon();
        assert!((ccw.signed_area() - 8.0).abs() < 1e-10);

        let mut cw = ccw.clone();
        cw.vertices.reverse();
        assert!((cw.signed_area() + 8.0).abs() < 1e-10);
        assert!((cw.area() - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_merge_all_boxes() {
        let boxes = vec![
            BBox::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0)),
            BBox::new(Point::new(-2.0, 3.0), Point::new(0.5, 4.0)),
        ];
        let merged = BBox::merge_all(boxes).unwrap();
        assert_eq!(merged.min, Point::new(-2.0, 0.0));
        assert_eq!(merged.max, Point::new(1.0, 4.0));
        assert!(BBox::merge_all(Vec::new()).is_none());
    }
}
