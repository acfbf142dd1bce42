use crate::error::{ExtractWarning, ToolpathError};
use lc_core::geometry::{COLLINEAR_MERGE_TOLERANCE_MM, ENDPOINT_TOLERANCE_MM};
use lc_core::{Contour, Drawing, junction_angle_deg};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A segment length paired with the junction angle at its trailing endpoint
/// and the index of the contour it belongs to. Endpoints of an open contour
/// and the final entry of any contour are clamped to 0 degrees (full stop),
/// matching the Motion Planner's boundary condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionInputEntry {
    pub contour_index: u32,
    pub segment_length_mm: f64,
    pub junction_angle_deg: f64,
}

/// Ordered per-contour motion inputs, suitable for feeding the Motion
/// Planner directly. Optional Tier-2 cache payload alongside ToolpathStats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MotionInputs {
    pub entries: Vec<MotionInputEntry>,
}

impl MotionInputs {
    /// Split the pooled entries back into one (lengths, junction_angles)
    /// pair per contour, each in the shape `plan_cut_time` expects: every
    /// contour is pierced and cut as its own path starting and ending at
    /// rest, so the trailing junction angle of each contour (a wrap-around
    /// for closed contours, an unused 0.0 for open ones) is dropped rather
    /// than fed to the planner as a real corner.
    pub fn per_contour(&self) -> Vec<(Vec<f64>, Vec<f64>)> {
        let mut contours: Vec<(Vec<f64>, Vec<f64>)> = Vec::new();
        for entry in &self.entries {
            let idx = entry.contour_index as usize;
            while contours.len() <= idx {
                contours.push((Vec::new(), Vec::new()));
            }
            let (lengths, angles) = &mut contours[idx];
            lengths.push(entry.segment_length_mm);
            angles.push(entry.junction_angle_deg);
        }
        for (lengths, angles) in &mut contours {
            angles.truncate(lengths.len().saturating_sub(1));
        }
        contours
    }
}

/// Histogram of primitive kinds in a drawing. Diagnostic only; it plays no
/// role in costing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityCounts {
    pub contour_count: u32,
    pub segment_count: u32,
}

/// Derived, immutable statistics for one drawing, as stored in the Stats
/// Cache keyed by drawing hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolpathStats {
    pub cut_length_mm: f64,
    pub pierce_count: u32,
    pub contour_count: u32,
    pub short_segment_ratio: f64,
    pub occupied_area_mm2: f64,
    pub net_area_mm2: f64,
    pub entity_counts: EntityCounts,
}

const SHORT_SEGMENT_THRESHOLD_MM: f64 = 5.0;

/// Turn a drawing into ToolpathStats plus pooled MotionInputs.
///
/// Every primitive is assumed already tessellated into straight segments by
/// the drawing-file reader; this stage stitches them into contours, derives
/// per-contour statistics, and picks the outermost contour by bounding-box
/// containment for occupied-area purposes.
pub fn extract(drawing: &Drawing) -> Result<(ToolpathStats, MotionInputs, Vec<ExtractWarning>), ToolpathError> {
    if drawing.contours.is_empty() {
        return Err(ToolpathError::DegenerateGeometry(
            "drawing has no contours".into(),
        ));
    }

    let mut warnings = Vec::new();
    let merged: Vec<Contour> = drawing
        .contours
        .iter()
        .map(|c| c.merge_short_segments(COLLINEAR_MERGE_TOLERANCE_MM))
        .collect();

    let mut cut_length_mm = 0.0;
    let mut pierce_count = 0u32;
    let mut short_length_mm = 0.0;
    let mut segment_count = 0u32;
    let mut entries = Vec::new();

    for (idx, contour) in merged.iter().enumerate() {
        if contour.segments.is_empty() || contour.length_mm() <= 0.0 {
            return Err(ToolpathError::DegenerateGeometry(format!(
                "contour {idx} has zero length"
            )));
        }

        let closed = contour.is_closed(ENDPOINT_TOLERANCE_MM);
        if !closed {
            warnings.push(ExtractWarning::OpenContour { contour_index: idx });
        } else {
            pierce_count += 1;
        }

        let n = contour.segments.len();
        for (i, seg) in contour.segments.iter().enumerate() {
            let len = seg.length();
            cut_length_mm += len;
            segment_count += 1;
            if len < SHORT_SEGMENT_THRESHOLD_MM {
                short_length_mm += len;
            }

            let next = if i + 1 < n {
                Some(&contour.segments[i + 1])
            } else if closed {
                contour.segments.first()
            } else {
                None
            };
            let junction_deg = match next {
                Some(next_seg) => junction_angle_deg(seg, next_seg),
                None => 0.0,
            };
            entries.push(MotionInputEntry {
                contour_index: idx as u32,
                segment_length_mm: len,
                junction_angle_deg: junction_deg,
            });
        }
    }

    let short_segment_ratio = if cut_length_mm > 0.0 {
        (short_length_mm / cut_length_mm).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let (occupied_area_mm2, net_area_mm2) = occupied_and_net_area(&merged);

    let stats = ToolpathStats {
        cut_length_mm,
        pierce_count,
        contour_count: merged.len() as u32,
        short_segment_ratio,
        occupied_area_mm2,
        net_area_mm2,
        entity_counts: EntityCounts {
            contour_count: merged.len() as u32,
            segment_count,
        },
    };

    Ok((stats, MotionInputs { entries }, warnings))
}

/// Pick the outermost contour by bounding-box containment and return its
/// area as `occupied_area_mm2`, plus `net_area_mm2` after subtracting every
/// contour whose bounding box it contains (treated as a hole).
fn occupied_and_net_area(contours: &[Contour]) -> (f64, f64) {
    let boxes: Vec<_> = contours.iter().map(|c| c.bounding_box()).collect();

    let outer_idx = (0..contours.len())
        .max_by(|&a, &b| {
            let area_a = boxes[a].map(|r| r.area()).unwrap_or(0.0);
            let area_b = boxes[b].map(|r| r.area()).unwrap_or(0.0);
            area_a.total_cmp(&area_b)
        })
        .unwrap_or(0);

    let occupied_area_mm2 = contours[outer_idx].area_mm2();

    let Some(outer_box) = boxes[outer_idx] else {
        return (occupied_area_mm2, occupied_area_mm2);
    };

    let mut hole_area = 0.0;
    for (i, contour) in contours.iter().enumerate() {
        if i == outer_idx {
            continue;
        }
        if let Some(bbox) = boxes[i] {
            if outer_box.contains_rect(&bbox) {
                hole_area += contour.area_mm2();
            }
        }
    }

    (occupied_area_mm2, (occupied_area_mm2 - hole_area).max(0.0))
}

/// Reduce cut_length to a HashMap keyed by an arbitrary label, exposed for
/// callers that want a breakdown rather than the flat total. Not part of
/// ToolpathStats itself; a convenience for diagnostics/tests.
pub fn contour_lengths(drawing: &Drawing) -> HashMap<usize, f64> {
    drawing
        .contours
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.length_mm()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_core::{Point2D, Segment};

    fn square(side: f64, origin: Point2D) -> Contour {
        let p0 = origin;
        let p1 = Point2D::new(origin.x + side, origin.y);
        let p2 = Point2D::new(origin.x + side, origin.y + side);
        let p3 = Point2D::new(origin.x, origin.y + side);
        Contour::new(vec![
            Segment::new(p0, p1),
            Segment::new(p1, p2),
            Segment::new(p2, p3),
            Segment::new(p3, p0),
        ])
    }

    #[test]
    fn test_extract_empty_drawing_fails() {
        let drawing = Drawing::new(vec![]);
        assert!(extract(&drawing).is_err());
    }

    #[test]
    fn test_extract_single_square() {
        let drawing = Drawing::new(vec![square(100.0, Point2D::origin())]);
        let (stats, motion, warnings) = extract(&drawing).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(stats.pierce_count, 1);
        assert_eq!(stats.contour_count, 1);
        assert!((stats.cut_length_mm - 400.0).abs() < 1e-6);
        assert!((stats.occupied_area_mm2 - 10_000.0).abs() < 1e-6);
        assert!((stats.net_area_mm2 - 10_000.0).abs() < 1e-6);
        assert_eq!(motion.entries.len(), 4);
    }

    #[test]
    fn test_extract_outer_with_hole() {
        let outer = square(100.0, Point2D::origin());
        let hole = square(20.0, Point2D::new(40.0, 40.0));
        let drawing = Drawing::new(vec![outer, hole]);
        let (stats, _, _) = extract(&drawing).unwrap();
        assert_eq!(stats.pierce_count, 2);
        assert!((stats.occupied_area_mm2 - 10_000.0).abs() < 1e-6);
        assert!((stats.net_area_mm2 - 9_600.0).abs() < 1e-6);
    }

    #[test]
    fn test_open_contour_is_a_warning_not_an_error() {
        let open = Contour::new(vec![Segment::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(1000.0, 0.0),
        )]);
        let drawing = Drawing::new(vec![open]);
        let (stats, motion, warnings) = extract(&drawing).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(stats.pierce_count, 0);
        assert!((stats.cut_length_mm - 1000.0).abs() < 1e-6);
        assert_eq!(motion.entries[0].junction_angle_deg, 0.0);
    }

    #[test]
    fn test_short_segment_ratio() {
        let contour = Contour::new(vec![
            Segment::new(Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0)),
            Segment::new(Point2D::new(3.0, 0.0), Point2D::new(3.0, 997.0)),
            Segment::new(Point2D::new(3.0, 997.0), Point2D::new(0.0, 997.0)),
            Segment::new(Point2D::new(0.0, 997.0), Point2D::new(0.0, 0.0)),
        ]);
        let drawing = Drawing::new(vec![contour]);
        let (stats, _, _) = extract(&drawing).unwrap();
        assert!(stats.short_segment_ratio > 0.0 && stats.short_segment_ratio < 0.01);
    }
}
