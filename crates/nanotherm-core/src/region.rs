//! Untagged construction geometry.
//!
//! A [`Region`] is a set of filled polygons (with holes) that has not yet been
//! assigned to a mask layer. All primitive construction and boolean work
//! happens on regions; [`Region::tag`] is the single exit point that turns a
//! region into layer-tagged, hole-free [`Polygon`]s ready for a cell.
//!
//! Boolean operations go through Clipper on an integer grid of
//! [`PRECISION`] layout units.

use std::f64::consts::PI;

use geo_clipper::Clipper;
use geo_types::{Coord, LineString, MultiPolygon, Polygon as GeoPolygon};

use crate::error::{positive, GeometryError};
use crate::geometry::{BBox, Point, Polygon};
use crate::LayerId;

/// Boolean operation tolerance in layout units.
pub const PRECISION: f64 = 1e-6;

const CLIPPER_FACTOR: f64 = 1.0 / PRECISION;

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    shape: MultiPolygon<f64>,
}

impl Default for Region {
    fn default() -> Self {
        Self::empty()
    }
}

impl Region {
    pub fn empty() -> Self {
        Self {
            shape: MultiPolygon::new(Vec::new()),
        }
    }

    /// Axis-aligned rectangle with its lower-left corner at the origin.
    pub fn rect(width: f64, height: f64) -> Result<Self, GeometryError> {
        let w = positive("rectangle width", width)?;
        let h = positive("rectangle height", height)?;
        Ok(Self::from_ring(&[
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]))
    }

    /// Linear taper along +x from `width1` at x = 0 to `width2` at
    /// x = `length`, centred on y = 0. A zero `width2` gives a point.
    pub fn taper(length: f64, width1: f64, width2: f64) -> Result<Self, GeometryError> {
        let l = positive("taper length", length)?;
        let w1 = positive("taper start width", width1)?;
        if !(width2.is_finite() && width2 >= 0.0) {
            return Err(GeometryError::InvalidDimension {
                what: "taper end width",
                value: width2,
            });
        }
        let mut ring = vec![Point::new(0.0, -w1 / 2.0), Point::new(l, -width2 / 2.0)];
        if width2 > 0.0 {
            ring.push(Point::new(l, width2 / 2.0));
        }
        ring.push(Point::new(0.0, w1 / 2.0));
        Ok(Self::from_ring(&ring))
    }

    /// Annulus centred on the origin. `radius` is the centreline radius.
    pub fn ring(radius: f64, width: f64, angle_resolution_deg: f64) -> Result<Self, GeometryError> {
        let r = positive("ring radius", radius)?;
        let w = positive("ring width", width)?;
        let step = positive("ring angle resolution", angle_resolution_deg)?;
        let inner = r - w / 2.0;
        positive("ring inner radius", inner)?;

        let outer = circle_points(r + w / 2.0, step);
        let mut hole = circle_points(inner, step);
        hole.reverse();
        let polygon = GeoPolygon::new(to_line_string(&outer), vec![to_line_string(&hole)]);
        Ok(Self {
            shape: MultiPolygon::new(vec![polygon]),
        })
    }

    /// A simple polygon from an outline. Winding is normalised.
    pub fn from_ring(points: &[Point]) -> Self {
        let mut ring: Vec<Point> = points.to_vec();
        if ring_signed_area(&ring) < 0.0 {
            ring.reverse();
        }
        Self {
            shape: MultiPolygon::new(vec![GeoPolygon::new(to_line_string(&ring), Vec::new())]),
        }
    }

    // ── Booleans ─────────────────────────────────────────────────────

    pub fn union(&self, other: &Region) -> Region {
        Region {
            shape: self.shape.union(&other.shape, CLIPPER_FACTOR),
        }
    }

    pub fn difference(&self, other: &Region) -> Region {
        Region {
            shape: self.shape.difference(&other.shape, CLIPPER_FACTOR),
        }
    }

    pub fn intersection(&self, other: &Region) -> Region {
        Region {
            shape: self.shape.intersection(&other.shape, CLIPPER_FACTOR),
        }
    }

    /// Symmetric difference: area covered by exactly one operand.
    pub fn xor(&self, other: &Region) -> Region {
        Region {
            shape: self.shape.xor(&other.shape, CLIPPER_FACTOR),
        }
    }

    /// Union any number of regions in one Clipper pass.
    pub fn merge<I: IntoIterator<Item = Region>>(parts: I) -> Region {
        let polygons: Vec<GeoPolygon<f64>> = parts
            .into_iter()
            .flat_map(|r| r.shape.0.into_iter())
            .collect();
        let all = MultiPolygon::new(polygons);
        Region {
            shape: all.union(&MultiPolygon::<f64>::new(Vec::new()), CLIPPER_FACTOR),
        }
    }

    // ── Transforms ───────────────────────────────────────────────────

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        self.map_points(|p| p.translate(dx, dy))
    }

    /// Rotate counter-clockwise about the origin.
    pub fn rotate_deg(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        self.map_points(|p| Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos))
    }

    /// Move so that the bounding box centre sits on the origin.
    pub fn centered(self) -> Self {
        match self.bbox() {
            Some(bb) => {
                let c = bb.center();
                self.translate(-c.x, -c.y)
            }
            None => self,
        }
    }

    /// Move so that the bounding box lower-left corner sits at `(x, y)`.
    pub fn with_min_at(self, x: f64, y: f64) -> Self {
        match self.bbox() {
            Some(bb) => {
                let (dx, dy) = (x - bb.min.x, y - bb.min.y);
                self.translate(dx, dy)
            }
            None => self,
        }
    }

    fn map_points<F: Fn(Point) -> Point>(self, f: F) -> Self {
        let map_ring = |ring: &LineString<f64>| -> LineString<f64> {
            ring.0
                .iter()
                .map(|c| {
                    let p = f(Point::new(c.x, c.y));
                    Coord { x: p.x, y: p.y }
                })
                .collect::<Vec<_>>()
                .into()
        };
        let polygons = self
            .shape
            .0
            .iter()
            .map(|poly| {
                GeoPolygon::new(
                    map_ring(poly.exterior()),
                    poly.interiors().iter().map(&map_ring).collect(),
                )
            })
            .collect();
        Self {
            shape: MultiPolygon::new(polygons),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.shape.0.is_empty()
    }

    /// Number of disjoint filled pieces.
    pub fn piece_count(&self) -> usize {
        self.shape.0.len()
    }

    pub fn hole_count(&self) -> usize {
        self.shape.0.iter().map(|p| p.interiors().len()).sum()
    }

    pub fn bbox(&self) -> Option<BBox> {
        let points: Vec<Point> = self
            .shape
            .0
            .iter()
            .flat_map(|p| p.exterior().0.iter())
            .map(|c| Point::new(c.x, c.y))
            .collect();
        BBox::from_points(&points)
    }

    /// Filled area (holes excluded).
    pub fn area(&self) -> f64 {
        self.shape
            .0
            .iter()
            .map(|poly| {
                let outer = ring_signed_area(&line_points(poly.exterior())).abs();
                let holes: f64 = poly
                    .interiors()
                    .iter()
                    .map(|h| ring_signed_area(&line_points(h)).abs())
                    .sum();
                outer - holes
            })
            .sum()
    }

    /// Whether `other` lies inside `self`, up to the boolean tolerance.
    pub fn contains(&self, other: &Region) -> bool {
        other.difference(self).area() <= PRECISION
    }

    // ── Tagging ──────────────────────────────────────────────────────

    /// Assign the region to `layer`, fracturing holes away.
    ///
    /// GDS boundaries cannot carry holes, so every piece with interior rings
    /// is split by vertical cuts through its holes until none remain.
    pub fn tag(&self, layer: LayerId) -> Vec<Polygon> {
        let mut out = Vec::new();
        for poly in &self.shape.0 {
            for piece in fracture(poly) {
                let mut vertices = line_points(piece.exterior());
                if vertices.len() > 1 && vertices.first() == vertices.last() {
                    vertices.pop();
                }
                if vertices.len() < 3 {
                    continue;
                }
                if ring_signed_area(&vertices) < 0.0 {
                    vertices.reverse();
                }
                out.push(Polygon::new(layer, vertices));
            }
        }
        out
    }
}

fn fracture(poly: &GeoPolygon<f64>) -> Vec<GeoPolygon<f64>> {
    let Some(hole) = poly.interiors().first() else {
        return vec![poly.clone()];
    };
    let (Some(outer), Some(hole_box)) = (
        BBox::from_points(&line_points(poly.exterior())),
        BBox::from_points(&line_points(hole)),
    ) else {
        return vec![poly.clone()];
    };

    let cut = hole_box.center().x;
    let outer = outer.expand(1.0);
    let halves = [
        (outer.min.x, cut),
        (cut, outer.max.x),
    ];

    let mut pieces = Vec::new();
    for (x0, x1) in halves {
        let window = GeoPolygon::new(
            to_line_string(&[
                Point::new(x0, outer.min.y),
                Point::new(x1, outer.min.y),
                Point::new(x1, outer.max.y),
                Point::new(x0, outer.max.y),
            ]),
            Vec::new(),
        );
        for half in poly.intersection(&window, CLIPPER_FACTOR).0 {
            pieces.extend(fracture(&half));
        }
    }
    pieces
}

fn circle_points(radius: f64, step_deg: f64) -> Vec<Point> {
    let n = ((360.0 / step_deg).ceil() as usize).max(3);
    (0..n)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / n as f64;
            Point::new(radius * t.cos(), radius * t.sin())
        })
        .collect()
}

fn to_line_string(points: &[Point]) -> LineString<f64> {
    // geo-types closes rings on polygon construction.
    points
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect::<Vec<_>>()
        .into()
}

fn line_points(ring: &LineString<f64>) -> Vec<Point> {
    ring.0.iter().map(|c| Point::new(c.x, c.y)).collect()
}

fn ring_signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-6;

    fn square(x: f64, y: f64, side: f64) -> Region {
        Region::rect(side, side).unwrap().translate(x, y)
    }

    #[test]
    fn test_rect_rejects_bad_sizes() {
        assert!(Region::rect(0.0, 1.0).is_err());
        assert!(Region::rect(1.0, -2.0).is_err());
        assert!(Region::rect(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let u = square(0.0, 0.0, 10.0).union(&square(5.0, 0.0, 10.0));
        assert_eq!(u.piece_count(), 1);
        assert!((u.area() - 150.0).abs() < TOL);
    }

    #[test]
    fn test_difference_splits_region() {
        let bar = Region::rect(30.0, 10.0).unwrap();
        let cut = Region::rect(10.0, 10.0).unwrap().translate(10.0, 0.0);
        let d = bar.difference(&cut);
        assert_eq!(d.piece_count(), 2);
        assert!((d.area() - 200.0).abs() < TOL);
    }

    #[test]
    fn test_xor_of_nested_squares_leaves_a_hole() {
        let ring = square(0.0, 0.0, 10.0).xor(&square(3.0, 3.0, 4.0));
        assert_eq!(ring.piece_count(), 1);
        assert_eq!(ring.hole_count(), 1);
        assert!((ring.area() - 84.0).abs() < TOL);
    }

    #[test]
    fn test_merge_matches_pairwise_union() {
        let parts = vec![
            square(0.0, 0.0, 4.0),
            square(2.0, 2.0, 4.0),
            square(100.0, 100.0, 1.0),
        ];
        let merged = Region::merge(parts.clone());
        let folded = parts
            .iter()
            .fold(Region::empty(), |acc, r| acc.union(r));
        assert_eq!(merged.piece_count(), 2);
        assert!((merged.area() - folded.area()).abs() < TOL);
        assert!((merged.area() - 29.0).abs() < TOL);
    }

    #[test]
    fn test_taper_to_point_is_triangle() {
        let t = Region::taper(10.0, 4.0, 0.0).unwrap();
        assert!((t.area() - 20.0).abs() < TOL);
        let bb = t.bbox().unwrap();
        assert!((bb.min.y + 2.0).abs() < TOL && (bb.max.x - 10.0).abs() < TOL);
    }

    #[test]
    fn test_rotate_and_center() {
        let r = Region::rect(10.0, 2.0).unwrap().rotate_deg(90.0).centered();
        let bb = r.bbox().unwrap();
        assert!((bb.width() - 2.0).abs() < TOL);
        assert!((bb.height() - 10.0).abs() < TOL);
        assert!(bb.center().x.abs() < TOL && bb.center().y.abs() < TOL);
    }

    #[test]
    fn test_with_min_at_moves_lower_left_corner() {
        let r = Region::taper(10.0, 4.0, 2.0).unwrap().with_min_at(-3.0, 7.0);
        let bb = r.bbox().unwrap();
        assert!((bb.min.x + 3.0).abs() < TOL && (bb.min.y - 7.0).abs() < TOL);
        assert!((bb.max.y - 11.0).abs() < TOL);
        assert!(Region::empty().with_min_at(1.0, 1.0).is_empty());
    }

    #[test]
    fn test_contains() {
        let outer = Region::rect(10.0, 10.0).unwrap();
        assert!(outer.contains(&square(2.0, 2.0, 3.0)));
        assert!(!outer.contains(&square(8.0, 8.0, 3.0)));
    }

    #[test]
    fn test_ring_area_and_hole() {
        let ring = Region::ring(100.0, 10.0, 1.0).unwrap();
        assert_eq!(ring.hole_count(), 1);
        let expected = PI * (105.0f64.powi(2) - 95.0f64.powi(2));
        assert!((ring.area() - expected).abs() / expected < 1e-3);
        assert!(Region::ring(4.0, 10.0, 1.0).is_err());
    }

    #[test]
    fn test_tag_fractures_holes() {
        let frame = Region::rect(10.0, 10.0)
            .unwrap()
            .difference(&square(3.0, 3.0, 4.0));
        assert_eq!(frame.hole_count(), 1);

        let polygons = frame.tag(crate::layer::GOLD);
        assert!(polygons.len() >= 2);
        let total: f64 = polygons.iter().map(|p| p.area()).sum();
        assert!((total - 84.0).abs() < 1e-4);
        for p in &polygons {
            assert_eq!(p.layer_id, crate::layer::GOLD);
            assert!(p.signed_area() > 0.0);
            assert_ne!(p.vertices.first(), p.vertices.last());
        }
    }
}
