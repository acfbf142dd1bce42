use crate::error::{CostError, CostWarning};
use crate::model::{RateBook, RateEntry};

/// A rate is accepted if the nearest available thickness is within this
/// fraction of the requested thickness.
const THICKNESS_TOLERANCE_FRACTION: f64 = 0.20;

/// Default thickness ceiling below which a stainless-like material
/// auto-enables foil removal, absent an explicit job override.
pub const DEFAULT_FOIL_THRESHOLD_MM: f64 = 5.0;

/// Look up the rate for (material_id, thickness_mm): exact match preferred,
/// else the nearest thickness within ±20%, else `RateMissing`.
pub fn resolve_rate(
    book: &RateBook,
    material_id: &str,
    thickness_mm: f64,
) -> Result<(RateEntry, Option<CostWarning>), CostError> {
    let candidates = book.entries.get(material_id).ok_or(CostError::RateMissing {
        material_id: material_id.to_string(),
        thickness_mm,
    })?;

    if let Some(exact) = candidates
        .iter()
        .find(|e| (e.thickness_mm - thickness_mm).abs() < 1e-9)
    {
        return Ok((exact.rate, None));
    }

    let tolerance_mm = thickness_mm * THICKNESS_TOLERANCE_FRACTION;
    let nearest = candidates
        .iter()
        .filter(|e| (e.thickness_mm - thickness_mm).abs() <= tolerance_mm)
        .min_by(|a, b| {
            (a.thickness_mm - thickness_mm)
                .abs()
                .total_cmp(&(b.thickness_mm - thickness_mm).abs())
        });

    match nearest {
        Some(entry) => Ok((
            entry.rate,
            Some(CostWarning::RateSubstituted {
                material_id: material_id.to_string(),
                requested_thickness_mm: thickness_mm,
                resolved_thickness_mm: entry.thickness_mm,
            }),
        )),
        None => Err(CostError::RateMissing {
            material_id: material_id.to_string(),
            thickness_mm,
        }),
    }
}

/// Whether foil removal auto-enables for this rate entry at this thickness,
/// absent an explicit job override.
pub fn foil_removal_auto_enabled(rate: &RateEntry, thickness_mm: f64) -> bool {
    match &rate.foil_removal {
        Some(rule) => rule.stainless_like && thickness_mm <= rule.thickness_max_mm,
        None => false,
    }
}
