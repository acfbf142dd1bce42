use crate::error::MotionError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Angles within this many degrees of 180 (straight-through) bypass the
/// cornering formula entirely and are treated as unconstrained.
const STRAIGHT_ANGLE_TOLERANCE_DEG: f64 = 1.0;

/// The two mutually exclusive cornering models a machine profile selects
/// between via `use_junction_deviation`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CornerModel {
    /// `V_junc = min(v_max, v_corner_90 * max(0.2, 1 + (angle-90)/90))`.
    SquareCornerVelocity { v_corner_90_mm_s: f64 },
    /// `V_junc = sqrt(a_max * delta * sin(theta/2) / (1 - sin(theta/2)))`,
    /// with `theta = pi - angle_deg.to_radians()`.
    JunctionDeviation { junction_deviation_mm: f64 },
}

/// Reduce the nominal feedrate for sheets dominated by short segments: dense
/// lacy geometry can't sustain full cornering speed long enough to matter.
/// Applied once per sheet (or per contour; callers must be consistent)
/// based on the pooled `short_segment_ratio`.
pub fn effective_v_max(v_max_mm_s: f64, short_segment_ratio: f64) -> f64 {
    let ratio = short_segment_ratio.clamp(0.0, 1.0);
    (v_max_mm_s * 0.3).max(v_max_mm_s * (1.0 - 0.7 * ratio))
}

fn junction_speed_limit(
    angle_deg: f64,
    v_max_mm_s: f64,
    a_max_mm_s2: f64,
    corner_model: CornerModel,
) -> f64 {
    if (angle_deg - 180.0).abs() <= STRAIGHT_ANGLE_TOLERANCE_DEG {
        return v_max_mm_s;
    }
    match corner_model {
        CornerModel::SquareCornerVelocity { v_corner_90_mm_s } => {
            let factor = (1.0 + (angle_deg - 90.0) / 90.0).max(0.2);
            (v_corner_90_mm_s * factor).min(v_max_mm_s)
        }
        CornerModel::JunctionDeviation {
            junction_deviation_mm,
        } => {
            let theta = PI - angle_deg.to_radians();
            let sin_half = (theta / 2.0).sin();
            let denom = 1.0 - sin_half;
            if denom <= 1e-9 {
                v_max_mm_s
            } else {
                let v_squared = a_max_mm_s2 * junction_deviation_mm * sin_half / denom;
                v_squared.max(0.0).sqrt().min(v_max_mm_s)
            }
        }
    }
}

/// Exact trapezoidal (possibly triangular) time for one segment given its
/// entry/exit speeds, per the four-quantity formula: peak velocity, then
/// accel/decel/cruise distances derived from it.
fn trapezoidal_time(length_mm: f64, v_entry: f64, v_exit: f64, v_max: f64, a_max: f64) -> f64 {
    if length_mm <= 0.0 {
        return 0.0;
    }
    let v_peak_sq = a_max * length_mm + (v_entry * v_entry + v_exit * v_exit) / 2.0;
    let v_peak = v_max.min(v_peak_sq.max(0.0).sqrt());
    if v_peak <= 0.0 {
        return 0.0;
    }
    let s_accel = ((v_peak * v_peak - v_entry * v_entry) / (2.0 * a_max)).max(0.0);
    let s_decel = ((v_peak * v_peak - v_exit * v_exit) / (2.0 * a_max)).max(0.0);
    let s_cruise = (length_mm - s_accel - s_decel).max(0.0);
    (v_peak - v_entry) / a_max + s_cruise / v_peak + (v_peak - v_exit) / a_max
}

/// Per-segment result of a motion plan: the speeds the lookahead settled on
/// at each end of the segment, and the time that implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTime {
    pub entry_speed_mm_s: f64,
    pub exit_speed_mm_s: f64,
    pub time_s: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionPlanResult {
    pub segment_times: Vec<SegmentTime>,
    pub cut_time_s: f64,
}

/// Run the forward/backward lookahead over one cut path (a contour's worth
/// of segments with their internal junction angles) and return the total
/// cut time plus a per-segment breakdown.
///
/// `junction_angles_deg` has exactly `lengths_mm.len() - 1` entries: the
/// angle between segment `k` and `k+1`. Both path endpoints are implicitly
/// clamped to zero speed (a cut path starts and ends at rest).
pub fn plan_cut_time(
    lengths_mm: &[f64],
    junction_angles_deg: &[f64],
    v_max_mm_s: f64,
    a_max_mm_s2: f64,
    corner_model: CornerModel,
) -> Result<MotionPlanResult, MotionError> {
    let n = lengths_mm.len();
    if n == 0 {
        return Ok(MotionPlanResult {
            segment_times: Vec::new(),
            cut_time_s: 0.0,
        });
    }
    if junction_angles_deg.len() != n - 1 {
        return Err(MotionError::InvalidInputs(format!(
            "expected {} junction angles for {} segments, got {}",
            n - 1,
            n,
            junction_angles_deg.len()
        )));
    }
    if v_max_mm_s <= 0.0 || a_max_mm_s2 <= 0.0 {
        return Err(MotionError::InvalidInputs(
            "v_max and a_max must be positive".into(),
        ));
    }

    // V_junc[0] and V_junc[n] are path boundaries, clamped to 0.
    let mut v_junc = vec![0.0; n + 1];
    for k in 1..n {
        v_junc[k] = junction_speed_limit(
            junction_angles_deg[k - 1],
            v_max_mm_s,
            a_max_mm_s2,
            corner_model,
        );
    }

    let mut v = vec![0.0; n + 1];
    for k in 1..=n {
        let reachable = (v[k - 1] * v[k - 1] + 2.0 * a_max_mm_s2 * lengths_mm[k - 1]).sqrt();
        v[k] = v_junc[k].min(v_max_mm_s).min(reachable);
    }

    v[n] = 0.0;
    for k in (0..n).rev() {
        let reachable = (v[k + 1] * v[k + 1] + 2.0 * a_max_mm_s2 * lengths_mm[k]).sqrt();
        v[k] = v[k].min(reachable);
    }

    let mut segment_times = Vec::with_capacity(n);
    let mut cut_time_s = 0.0;
    for k in 0..n {
        let t = trapezoidal_time(lengths_mm[k], v[k], v[k + 1], v_max_mm_s, a_max_mm_s2);
        cut_time_s += t;
        segment_times.push(SegmentTime {
            entry_speed_mm_s: v[k],
            exit_speed_mm_s: v[k + 1],
            time_s: t,
        });
    }

    Ok(MotionPlanResult {
        segment_times,
        cut_time_s,
    })
}
