//! Centreline paths: corner smoothing and extrusion into ribbons.

use crate::error::{positive, GeometryError};
use crate::geometry::Point;
use crate::region::Region;

/// Default arc discretisation, in degrees per segment.
pub const ARC_RESOLUTION_DEG: f64 = 2.5;

const EPS: f64 = 1e-9;

/// Profile swept along a path. `offset` shifts the ribbon to the left of the
/// direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossSection {
    pub width: f64,
    pub offset: f64,
}

impl CrossSection {
    pub fn new(width: f64) -> Self {
        Self { width, offset: 0.0 }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// Replace every interior corner with a tangent circular arc of `radius`.
///
/// Fails when the arcs of two neighbouring corners would overlap on the
/// segment between them.
pub fn smooth(points: &[Point], radius: f64) -> Result<Vec<Point>, GeometryError> {
    let radius = positive("corner radius", radius)?;
    let pts = dedup(points);
    if pts.len() < 2 {
        return Err(GeometryError::DegeneratePath(pts.len()));
    }

    let n = pts.len();
    // Tangent length consumed at each vertex (0 at the ends).
    let mut tangents = vec![0.0; n];
    let mut turns = vec![0.0; n];
    for i in 1..n - 1 {
        let d_in = direction(pts[i - 1], pts[i]);
        let d_out = direction(pts[i], pts[i + 1]);
        let turn = cross(d_in, d_out).atan2(dot(d_in, d_out));
        turns[i] = turn;
        tangents[i] = radius * (turn.abs() / 2.0).tan();
    }
    for i in 0..n - 1 {
        let available = pts[i].distance_to(&pts[i + 1]);
        if tangents[i] + tangents[i + 1] > available + EPS {
            let index = if tangents[i] >= tangents[i + 1] { i } else { i + 1 };
            return Err(GeometryError::RadiusTooLarge { index, radius });
        }
    }

    let mut out = vec![pts[0]];
    for i in 1..n - 1 {
        let turn = turns[i];
        if turn.abs() < EPS {
            push_distinct(&mut out, pts[i]);
            continue;
        }
        let d_in = direction(pts[i - 1], pts[i]);
        let start = Point::new(pts[i].x - d_in.x * tangents[i], pts[i].y - d_in.y * tangents[i]);
        let side = turn.signum();
        let center = Point::new(start.x - d_in.y * radius * side, start.y + d_in.x * radius * side);
        let phi0 = (start.y - center.y).atan2(start.x - center.x);
        let steps = ((turn.abs().to_degrees() / ARC_RESOLUTION_DEG - EPS).ceil() as usize).max(1);
        for k in 0..=steps {
            let phi = phi0 + turn * k as f64 / steps as f64;
            push_distinct(
                &mut out,
                Point::new(center.x + radius * phi.cos(), center.y + radius * phi.sin()),
            );
        }
    }
    push_distinct(&mut out, pts[n - 1]);
    Ok(out)
}

/// Sweep `section` along the polyline, giving a filled ribbon.
pub fn extrude(points: &[Point], section: &CrossSection) -> Result<Region, GeometryError> {
    let width = positive("cross-section width", section.width)?;
    let pts = dedup(points);
    if pts.len() < 2 {
        return Err(GeometryError::DegeneratePath(pts.len()));
    }

    let normals: Vec<Point> = pts
        .windows(2)
        .map(|w| {
            let d = direction(w[0], w[1]);
            Point::new(-d.y, d.x)
        })
        .collect();

    let n = pts.len();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for i in 0..n {
        let miter = if i == 0 {
            normals[0]
        } else if i == n - 1 {
            normals[n - 2]
        } else {
            let (a, b) = (normals[i - 1], normals[i]);
            let sum = Point::new(a.x + b.x, a.y + b.y);
            let len = (sum.x * sum.x + sum.y * sum.y).sqrt();
            if len < EPS {
                b
            } else {
                let m = Point::new(sum.x / len, sum.y / len);
                let scale = 1.0 / dot(m, b).max(0.1);
                Point::new(m.x * scale, m.y * scale)
            }
        };
        let outer = section.offset + width / 2.0;
        let inner = section.offset - width / 2.0;
        left.push(Point::new(pts[i].x + miter.x * outer, pts[i].y + miter.y * outer));
        right.push(Point::new(pts[i].x + miter.x * inner, pts[i].y + miter.y * inner));
    }

    right.reverse();
    left.extend(right);
    // A pass through the boolean engine resolves any fold-over at tight arcs.
    Ok(Region::merge([Region::from_ring(&left)]))
}

fn dedup(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        push_distinct(&mut out, p);
    }
    out
}

fn push_distinct(out: &mut Vec<Point>, p: Point) {
    if out.last().map_or(true, |last| last.distance_to(&p) > EPS) {
        out.push(p);
    }
}

fn direction(a: Point, b: Point) -> Point {
    let len = a.distance_to(&b);
    Point::new((b.x - a.x) / len, (b.y - a.y) / len)
}

fn dot(a: Point, b: Point) -> f64 {
    a.x * b.x + a.y * b.y
}

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_right_angle() {
        let pts = [Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)];
        let smoothed = smooth(&pts, 20.0).unwrap();

        assert_eq!(smoothed.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(smoothed.last(), Some(&Point::new(100.0, 100.0)));
        // The sharp corner is gone; every arc point sits on the circle about (80, 20).
        assert!(!smoothed.contains(&Point::new(100.0, 0.0)));
        for p in &smoothed[1..smoothed.len() - 1] {
            let r = p.distance_to(&Point::new(80.0, 20.0));
            assert!((r - 20.0).abs() < 1e-9, "point {p:?} off the arc");
        }
        // 90 degrees at 2.5 degrees per step
        assert_eq!(smoothed.len(), 2 + 37);
    }

    #[test]
    fn test_smooth_rejects_oversized_radius() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 30.0),
            Point::new(0.0, 30.0),
        ];
        assert!(matches!(
            smooth(&pts, 20.0),
            Err(GeometryError::RadiusTooLarge { .. })
        ));
        assert!(smooth(&pts, 15.0).is_ok());
    }

    #[test]
    fn test_smooth_needs_two_points() {
        let p = Point::new(1.0, 1.0);
        assert_eq!(smooth(&[p, p], 5.0), Err(GeometryError::DegeneratePath(1)));
    }

    #[test]
    fn test_extrude_straight_segment() {
        let ribbon = extrude(
            &[Point::new(0.0, 0.0), Point::new(50.0, 0.0)],
            &CrossSection::new(10.0),
        )
        .unwrap();
        let bb = ribbon.bbox().unwrap();
        assert!((ribbon.area() - 500.0).abs() < 1e-6);
        assert!((bb.min.y + 5.0).abs() < 1e-9 && (bb.max.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_extrude_with_offset() {
        let ribbon = extrude(
            &[Point::new(0.0, 0.0), Point::new(50.0, 0.0)],
            &CrossSection::new(10.0).with_offset(20.0),
        )
        .unwrap();
        let bb = ribbon.bbox().unwrap();
        assert!((bb.min.y - 15.0).abs() < 1e-9 && (bb.max.y - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_extrude_smoothed_corner_keeps_width() {
        let pts = smooth(
            &[Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)],
            20.0,
        )
        .unwrap();
        let ribbon = extrude(&pts, &CrossSection::new(10.0)).unwrap();
        assert_eq!(ribbon.piece_count(), 1);
        // Centreline length times width, within the arc discretisation error.
        let centreline: f64 = pts.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
        assert!((ribbon.area() - centreline * 10.0).abs() / (centreline * 10.0) < 1e-3);
    }
}
