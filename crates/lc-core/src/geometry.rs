use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Default chord tolerance for arc/spline tessellation, in millimetres.
pub const DEFAULT_CHORD_TOLERANCE_MM: f64 = 0.1;

/// Tolerance for deciding two endpoints coincide, in millimetres.
pub const ENDPOINT_TOLERANCE_MM: f64 = 0.1;

/// Segments shorter than this are merged into their neighbour before
/// statistics are computed, to absorb duplicate points from drawing import.
pub const COLLINEAR_MERGE_TOLERANCE_MM: f64 = 0.01;

/// A 2D point, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance_to(self, other: Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// True if the two points coincide within the given tolerance.
    pub fn coincides_with(self, other: Point2D, tolerance_mm: f64) -> bool {
        self.distance_to(other) <= tolerance_mm
    }
}

impl Add<Vector2D> for Point2D {
    type Output = Point2D;
    fn add(self, v: Vector2D) -> Point2D {
        Point2D {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }
}

impl Sub for Point2D {
    type Output = Vector2D;
    fn sub(self, other: Point2D) -> Vector2D {
        Vector2D {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// A 2D vector, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(self, other: Vector2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn normalized(self) -> Option<Vector2D> {
        let len = self.length();
        if len <= f64::EPSILON {
            None
        } else {
            Some(Vector2D::new(self.x / len, self.y / len))
        }
    }
}

/// An axis-aligned rectangle. Origin is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point2D,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(origin: Point2D, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.height
    }

    /// True if `other` lies entirely within this rect (used to pick the
    /// outermost contour of a part by bounding-box containment).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }

    fn from_points<'a>(points: impl Iterator<Item = &'a Point2D>) -> Option<Rect> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut any = false;
        for p in points {
            any = true;
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if !any {
            return None;
        }
        Some(Rect::new(
            Point2D::new(min_x, min_y),
            max_x - min_x,
            max_y - min_y,
        ))
    }
}

/// A straight segment between two points, the atomic unit of a toolpath
/// once arcs and splines have been tessellated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    pub fn direction(&self) -> Vector2D {
        self.end - self.start
    }
}

/// Interior angle between two consecutive segments sharing an endpoint
/// (`s1` ends where `s2` starts), in degrees, clamped to [0, 180].
///
/// 0 means `s2` doubles back along `s1`; 180 means straight continuation.
pub fn junction_angle_deg(s1: &Segment, s2: &Segment) -> f64 {
    let incoming = s1.direction();
    let outgoing = s2.direction();
    let (Some(u), Some(v)) = (incoming.normalized(), outgoing.normalized()) else {
        return 180.0;
    };
    // Angle between the *reverse* of the incoming direction and the outgoing
    // direction: a straight pass-through has u == v, giving 180 degrees.
    let cos_theta = (-u.dot(v)).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

/// An ordered chain of segments: a single cut path, open or closed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contour {
    pub segments: Vec<Segment>,
}

impl Contour {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn length_mm(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    pub fn is_closed(&self, tolerance_mm: f64) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => first.start.coincides_with(last.end, tolerance_mm),
            _ => false,
        }
    }

    /// Vertex loop: start point of every segment, in order.
    fn vertices(&self) -> impl Iterator<Item = &Point2D> {
        self.segments.iter().map(|s| &s.start)
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        let all_points = self
            .segments
            .iter()
            .flat_map(|s| [&s.start, &s.end].into_iter());
        Rect::from_points(all_points)
    }

    /// Area via the shoelace formula. Sign is discarded; containment, not
    /// winding direction, decides which contour is the outer one.
    pub fn area_mm2(&self) -> f64 {
        if self.segments.len() < 3 {
            return 0.0;
        }
        let verts: Vec<&Point2D> = self.vertices().collect();
        let mut sum = 0.0;
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        (sum / 2.0).abs()
    }

    /// Merge adjacent segments shorter than `tolerance_mm` into their
    /// neighbour so stray duplicate points don't skew statistics.
    pub fn merge_short_segments(&self, tolerance_mm: f64) -> Contour {
        let mut merged: Vec<Segment> = Vec::with_capacity(self.segments.len());
        for seg in &self.segments {
            if seg.length() < tolerance_mm {
                if let Some(last) = merged.last_mut() {
                    last.end = seg.end;
                    continue;
                }
            }
            merged.push(*seg);
        }
        Contour::new(merged)
    }
}

/// A set of contours sharing an origin: the unit the Toolpath Extractor
/// consumes. Identified externally by a content hash over its segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drawing {
    pub contours: Vec<Contour>,
}

impl Drawing {
    pub fn new(contours: Vec<Contour>) -> Self {
        Self { contours }
    }
}

/// Tessellate a circular arc into a polyline whose chord error stays within
/// `chord_tolerance_mm` of the true arc. `start_angle`/`end_angle` are in
/// radians; sweep follows their sign (positive = counter-clockwise).
pub fn tessellate_arc(
    center: Point2D,
    radius: f64,
    start_angle_rad: f64,
    end_angle_rad: f64,
    chord_tolerance_mm: f64,
) -> Vec<Point2D> {
    if radius <= 0.0 {
        return vec![
            Point2D::new(
                center.x + radius * start_angle_rad.cos(),
                center.y + radius * start_angle_rad.sin(),
            ),
            Point2D::new(
                center.x + radius * end_angle_rad.cos(),
                center.y + radius * end_angle_rad.sin(),
            ),
        ];
    }
    let sweep = end_angle_rad - start_angle_rad;
    let tol = chord_tolerance_mm.clamp(0.05, 0.2).min(radius * 0.99);
    // Max angular step for a given chord tolerance: tol = r(1 - cos(step/2)).
    let max_step = 2.0 * (1.0 - tol / radius).clamp(-1.0, 1.0).acos();
    let max_step = if max_step <= 0.0 { sweep.abs() } else { max_step };
    let steps = ((sweep.abs() / max_step).ceil() as usize).max(1);
    (0..=steps)
        .map(|i| {
            let t = start_angle_rad + sweep * (i as f64 / steps as f64);
            Point2D::new(center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_point_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_rect_area() {
        let r = Rect::new(Point2D::origin(), 1500.0, 3000.0);
        assert!((r.area() - 4_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_rect_contains_rect() {
        let sheet = Rect::new(Point2D::origin(), 1500.0, 3000.0);
        let part = Rect::new(Point2D::new(100.0, 100.0), 200.0, 200.0);
        assert!(sheet.contains_rect(&part));
        let outside = Rect::new(Point2D::new(1400.0, 100.0), 200.0, 200.0);
        assert!(!sheet.contains_rect(&outside));
    }

    #[test]
    fn test_junction_angle_straight() {
        let s1 = Segment::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        let s2 = Segment::new(Point2D::new(10.0, 0.0), Point2D::new(20.0, 0.0));
        assert!((junction_angle_deg(&s1, &s2) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_junction_angle_right_angle() {
        let s1 = Segment::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        let s2 = Segment::new(Point2D::new(10.0, 0.0), Point2D::new(10.0, 10.0));
        assert!((junction_angle_deg(&s1, &s2) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_junction_angle_full_reversal() {
        let s1 = Segment::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        let s2 = Segment::new(Point2D::new(10.0, 0.0), Point2D::new(0.0, 0.0));
        assert!(junction_angle_deg(&s1, &s2).abs() < 1e-9);
    }

    #[test]
    fn test_square_contour_area_and_closure() {
        let p0 = Point2D::new(0.0, 0.0);
        let p1 = Point2D::new(100.0, 0.0);
        let p2 = Point2D::new(100.0, 100.0);
        let p3 = Point2D::new(0.0, 100.0);
        let contour = Contour::new(vec![
            Segment::new(p0, p1),
            Segment::new(p1, p2),
            Segment::new(p2, p3),
            Segment::new(p3, p0),
        ]);
        assert!(contour.is_closed(0.1));
        assert!((contour.area_mm2() - 10_000.0).abs() < 1e-6);
        assert!((contour.length_mm() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_open_contour_not_closed() {
        let contour = Contour::new(vec![Segment::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(1000.0, 0.0),
        )]);
        assert!(!contour.is_closed(0.1));
    }

    #[test]
    fn test_merge_short_segments() {
        let contour = Contour::new(vec![
            Segment::new(Point2D::new(0.0, 0.0), Point2D::new(50.0, 0.0)),
            Segment::new(Point2D::new(50.0, 0.0), Point2D::new(50.002, 0.0)),
            Segment::new(Point2D::new(50.002, 0.0), Point2D::new(100.0, 0.0)),
        ]);
        let merged = contour.merge_short_segments(0.01);
        assert_eq!(merged.segments.len(), 2);
    }

    #[test]
    fn test_tessellate_arc_quarter_circle() {
        let pts = tessellate_arc(Point2D::origin(), 50.0, 0.0, PI / 2.0, 0.1);
        assert!(pts.len() >= 3);
        assert!((pts.first().unwrap().x - 50.0).abs() < 1e-6);
        assert!((pts.last().unwrap().y - 50.0).abs() < 1e-6);
    }
}
