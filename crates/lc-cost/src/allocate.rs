use crate::error::CostError;
use crate::model::{AllocationModel, MaterialPrice, RateEntry, Sheet, SheetMode};

/// Sheets with `used_ratio` at or above this threshold are billed as if
/// they were a full fixed sheet; the off-cut strip is treated as scrap.
pub const FULL_SHEET_THRESHOLD: f64 = 0.94;

/// Residual rounding tolerance the per-part allocation must reconcile to.
pub const ALLOCATION_RECONCILE_TOLERANCE_PLN: f64 = 0.01;

/// Effective billed area for a sheet under its mode and the 94% rule.
pub fn effective_sheet_area_mm2(sheet: &Sheet) -> f64 {
    match sheet.sheet_mode {
        SheetMode::FixedSheet => sheet.sheet_width_mm * sheet.sheet_length_mm_nominal,
        SheetMode::CutToLength => {
            if sheet.sheet_length_mm_nominal <= 0.0 {
                return 0.0;
            }
            let used_ratio = sheet.used_length_y_mm / sheet.sheet_length_mm_nominal;
            if used_ratio >= FULL_SHEET_THRESHOLD {
                sheet.sheet_width_mm * sheet.sheet_length_mm_nominal
            } else {
                sheet.sheet_width_mm * (sheet.used_length_y_mm + sheet.trim_margin_y_mm)
            }
        }
    }
}

/// Material cost of the whole sheet, from its effective area and the
/// resolved rate's pricing model.
pub fn sheet_material_cost_pln(area_mm2: f64, thickness_mm: f64, rate: &RateEntry) -> f64 {
    match rate.material_price {
        MaterialPrice::PricePerM2 { pln_per_m2 } => area_mm2 / 1_000_000.0 * pln_per_m2,
        MaterialPrice::PricePerKg { pln_per_kg } => {
            let mass_kg = area_mm2 / 1_000_000.0 * thickness_mm / 1000.0 * rate.density_kg_m3;
            mass_kg * pln_per_kg
        }
    }
}

/// Divide a sheet's material cost across its parts. Both models must
/// reconcile to `sheet_cost` within [`ALLOCATION_RECONCILE_TOLERANCE_PLN`];
/// any rounding residual is folded into the last part's share.
///
/// Returns one entry per part, in the sheet's part order.
pub fn allocate_material_cost(
    sheet: &Sheet,
    sheet_cost_pln: f64,
    model: AllocationModel,
) -> Result<Vec<f64>, CostError> {
    if sheet.parts.is_empty() {
        return Ok(Vec::new());
    }

    let total_occupied = sheet.sum_part_occupied_area_mm2();
    if total_occupied <= 0.0 {
        return Err(CostError::InvariantViolation {
            sheet_id: sheet.sheet_id.clone(),
            detail: "sheet has parts but zero total occupied area".into(),
        });
    }

    let mut shares: Vec<f64> = match model {
        AllocationModel::OccupiedArea => sheet
            .parts
            .iter()
            .map(|p| sheet_cost_pln * p.occupied_area_mm2 / total_occupied)
            .collect(),
        AllocationModel::LegacyUtilization => {
            let utilization = sheet.utilization();
            if utilization <= 0.0 {
                return Err(CostError::InvariantViolation {
                    sheet_id: sheet.sheet_id.clone(),
                    detail: "utilization is zero under legacy allocation".into(),
                });
            }
            sheet
                .parts
                .iter()
                .map(|p| {
                    (p.occupied_area_mm2 * sheet_cost_pln / sheet.sheet_area_used_mm2)
                        / utilization
                })
                .collect()
        }
    };

    rebalance_residual(&mut shares, sheet_cost_pln);
    Ok(shares)
}

/// Fold the rounding residual (the gap between the sum of shares and the
/// target total) into the last element, so callers always see an exact
/// reconciliation rather than a tolerance they must re-check themselves.
fn rebalance_residual(shares: &mut [f64], target_total: f64) {
    if shares.is_empty() {
        return;
    }
    let sum: f64 = shares.iter().sum();
    let residual = target_total - sum;
    let last = shares.len() - 1;
    shares[last] += residual;
}
