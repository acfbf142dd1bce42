use crate::engine::{attribute_job_costs, cost_sheet};
use crate::error::{CostError, CostWarning};
use crate::model::{
    CostSummary, JobOverrides, MachineProfile, NestingResult, RateBook, VariantASummary,
    VariantBSummary,
};

/// Single entry point: given a nesting run and the rates/profile/overrides
/// that govern billing, produce a full cost summary plus any warnings
/// collected along the way. Sheets are processed independently and in the
/// order they're supplied; the result does not depend on that order.
pub fn compute_cost_summary(
    nesting_result: &NestingResult,
    job_overrides: &JobOverrides,
    rate_book: &RateBook,
    machine_profile: &MachineProfile,
) -> Result<(CostSummary, Vec<CostWarning>), CostError> {
    let mut warnings = Vec::new();
    let mut per_sheet = Vec::with_capacity(nesting_result.sheets.len());

    for sheet in &nesting_result.sheets {
        let result = cost_sheet(sheet, machine_profile, rate_book, job_overrides, &mut warnings)?;
        per_sheet.push(result);
    }

    let variant_a_sheets: Vec<_> = per_sheet
        .iter()
        .map(|r| (r.sheet_id.clone(), r.variant_a))
        .collect();
    let variant_b_sheets: Vec<_> = per_sheet
        .iter()
        .map(|r| (r.sheet_id.clone(), r.variant_b))
        .collect();

    let (per_part, job_costs) =
        attribute_job_costs(&per_sheet, &nesting_result.sheets, job_overrides);

    let sheet_total_a: f64 = variant_a_sheets.iter().map(|(_, b)| b.total).sum();
    let sheet_total_b: f64 = variant_b_sheets.iter().map(|(_, b)| b.total).sum();
    let job_total = job_costs.tech + job_costs.packaging + job_costs.transport;

    let summary = CostSummary {
        allocation_model: job_overrides.allocation_model,
        buffer_factor: job_overrides.buffer_factor,
        machine_profile_id: nesting_result.machine_profile_id.clone(),
        variant_a: VariantASummary {
            total_pln: sheet_total_a + job_total,
            sheets: variant_a_sheets,
            job_costs,
        },
        variant_b: VariantBSummary {
            total_pln: sheet_total_b + job_total,
            sheets: variant_b_sheets,
            job_costs,
        },
        per_part,
    };

    Ok((summary, warnings))
}
