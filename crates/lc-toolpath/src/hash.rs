use lc_core::Drawing;
use sha2::{Digest, Sha256};

/// Round coordinates to this many millimetres before hashing, so that
/// floating-point noise below the drawing's own precision doesn't produce
/// spurious cache misses.
const HASH_COORDINATE_PRECISION_MM: f64 = 0.001;

/// SHA-256 over the canonicalised segment list: coordinates rounded to
/// [`HASH_COORDINATE_PRECISION_MM`], ordered by contour then by endpoint.
/// The tessellation tolerance is mixed in so two extractions of the same
/// drawing at different chord tolerances never collide.
pub fn drawing_hash(drawing: &Drawing, chord_tolerance_mm: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("tol={chord_tolerance_mm:.6}\n").as_bytes());
    for contour in &drawing.contours {
        hasher.update(b"contour\n");
        for seg in &contour.segments {
            let line = format!(
                "{:.3},{:.3}->{:.3},{:.3}\n",
                round(seg.start.x),
                round(seg.start.y),
                round(seg.end.x),
                round(seg.end.y),
            );
            hasher.update(line.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

fn round(v: f64) -> f64 {
    (v / HASH_COORDINATE_PRECISION_MM).round() * HASH_COORDINATE_PRECISION_MM
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_core::{Contour, Point2D, Segment};

    fn square() -> Drawing {
        let p0 = Point2D::new(0.0, 0.0);
        let p1 = Point2D::new(100.0, 0.0);
        let p2 = Point2D::new(100.0, 100.0);
        let p3 = Point2D::new(0.0, 100.0);
        Drawing::new(vec![Contour::new(vec![
            Segment::new(p0, p1),
            Segment::new(p1, p2),
            Segment::new(p2, p3),
            Segment::new(p3, p0),
        ])])
    }

    #[test]
    fn test_hash_is_deterministic() {
        let drawing = square();
        assert_eq!(drawing_hash(&drawing, 0.1), drawing_hash(&drawing, 0.1));
    }

    #[test]
    fn test_hash_differs_by_tolerance() {
        let drawing = square();
        assert_ne!(drawing_hash(&drawing, 0.1), drawing_hash(&drawing, 0.2));
    }

    #[test]
    fn test_hash_is_stable_under_sub_precision_noise() {
        let mut drawing = square();
        drawing.contours[0].segments[0].end.x += 0.00001;
        assert_eq!(drawing_hash(&drawing, 0.1), drawing_hash(&square(), 0.1));
    }
}
