use crate::allocate::{allocate_material_cost, effective_sheet_area_mm2, sheet_material_cost_pln};
use crate::error::{CostError, CostWarning};
use crate::model::{
    JobCosts, JobOverrides, MachineProfile, PerPartAttribution, RateBook, Sheet,
    SheetCostBreakdown, SheetTimeBreakdown,
};
use crate::rates::{foil_removal_auto_enabled, resolve_rate};
use lc_core::units::{mm2_to_m2, mm_to_m};
use lc_motion::{effective_v_max, plan_cut_time};
use std::collections::HashMap;

/// Everything the Cost Engine produced for one sheet: both variants'
/// breakdowns, plus the per-part shares needed before job-level costs are
/// distributed across the whole run.
pub struct SheetCostResult {
    pub sheet_id: String,
    pub variant_a: SheetCostBreakdown,
    pub variant_b: SheetTimeBreakdown,
    /// One entry per part, in sheet order: (material, cut_a, cut_b,
    /// pierce_a, pierce_b, foil_a, foil_b, operational).
    pub per_part: Vec<PerPartRow>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerPartRow {
    pub material: f64,
    pub cut_a: f64,
    pub cut_b: f64,
    pub pierce_a: f64,
    pub pierce_b: f64,
    pub foil_a: f64,
    pub foil_b: f64,
    pub operational: f64,
}

/// Compute both variants' cost for a single sheet, plus the per-part
/// proportional shares that make up each total. Pure function of its
/// inputs; callers decide sheet processing order (irrelevant to the
/// result, per the engine's ordering guarantee).
pub fn cost_sheet(
    sheet: &Sheet,
    profile: &MachineProfile,
    rates: &RateBook,
    overrides: &JobOverrides,
    warnings: &mut Vec<CostWarning>,
) -> Result<SheetCostResult, CostError> {
    let measured_occupied = sheet.sum_part_occupied_area_mm2();
    if (measured_occupied - sheet.occupied_area_mm2).abs() > 1.0 {
        return Err(CostError::InvariantViolation {
            sheet_id: sheet.sheet_id.clone(),
            detail: format!(
                "sum of part occupied areas ({measured_occupied:.3}) disagrees with sheet.occupied_area_mm2 ({:.3})",
                sheet.occupied_area_mm2
            ),
        });
    }

    let (rate, rate_warning) = resolve_rate(rates, &sheet.material_id, sheet.thickness_mm)?;
    if let Some(w) = rate_warning {
        warnings.push(w);
    }

    let area_mm2 = effective_sheet_area_mm2(sheet);
    let sheet_material_cost = sheet_material_cost_pln(area_mm2, sheet.thickness_mm, &rate);
    let material_shares = allocate_material_cost(sheet, sheet_material_cost, overrides.allocation_model)?;

    let cut_length_m = mm_to_m(sheet.cut_length_mm());
    let pierce_count = sheet.pierce_count();

    let foil_enabled = overrides
        .include_foil_removal
        .unwrap_or_else(|| foil_removal_auto_enabled(&rate, sheet.thickness_mm));

    // Variant A: price-list.
    let cut_cost_a = cut_length_m * rate.cut_price_per_meter_pln;
    let pierce_cost_a = if overrides.include_piercing {
        pierce_count as f64 * rate.pierce_cost_pln
    } else {
        0.0
    };
    let foil_cost_a = if foil_enabled {
        match rate.foil_removal.as_ref().map(|r| r.cost) {
            Some(crate::model::FoilCost::PerMetre { pln_per_m }) => cut_length_m * pln_per_m,
            Some(crate::model::FoilCost::PerSquareMetre { pln_per_m2 }) => {
                mm2_to_m2(sheet.occupied_area_mm2) * pln_per_m2
            }
            Some(crate::model::FoilCost::PerMinute { pln_per_minute }) => {
                foil_time_s(&rate, cut_length_m) / 60.0 * pln_per_minute
            }
            None => 0.0,
        }
    } else {
        0.0
    };
    let operational_cost = overrides.operational_cost_per_sheet_pln;
    let total_a = sheet_material_cost + cut_cost_a + pierce_cost_a + foil_cost_a + operational_cost;

    // Variant B: time-based.
    let v_max_mm_s = lc_core::units::m_per_min_to_mm_per_s(rate.cut_feedrate_m_min);
    let corner_model = profile.corner_model();
    let v_max_eff = effective_v_max(v_max_mm_s, sheet.pooled_short_segment_ratio());
    let cut_time_s = cut_time_for_sheet(sheet, v_max_eff, profile.max_accel_mm_s2, corner_model)?;
    let pierce_time_s = if overrides.include_piercing {
        pierce_count as f64 * rate.pierce_time_s
    } else {
        0.0
    };
    let foil_time_secs = if foil_enabled {
        foil_time_s(&rate, cut_length_m)
    } else {
        0.0
    };
    let raw_time_s = cut_time_s + pierce_time_s + foil_time_secs;
    if overrides.buffer_factor < 1.0 {
        warnings.push(CostWarning::BufferBelowOne {
            buffer_factor: overrides.buffer_factor,
        });
    }
    let billed_time_s = raw_time_s * overrides.buffer_factor;
    let laser_cost = billed_time_s / 3600.0 * rate.machine_rate_pln_per_hour;
    let total_b = sheet_material_cost + laser_cost + operational_cost;

    let mut per_part = Vec::with_capacity(sheet.parts.len());
    for (i, part) in sheet.parts.iter().enumerate() {
        let part_cut_length = part.toolpath_stats.cut_length_mm * part.qty_in_sheet as f64;
        let part_pierce = part.toolpath_stats.pierce_count * part.qty_in_sheet;

        let cut_fraction = if sheet.cut_length_mm() > 0.0 {
            part_cut_length / sheet.cut_length_mm()
        } else {
            0.0
        };
        let pierce_fraction = if pierce_count > 0 {
            part_pierce as f64 / pierce_count as f64
        } else {
            0.0
        };
        let area_fraction = if sheet.occupied_area_mm2 > 0.0 {
            part.occupied_area_mm2 / sheet.occupied_area_mm2
        } else {
            0.0
        };

        per_part.push(PerPartRow {
            material: material_shares[i],
            cut_a: cut_cost_a * cut_fraction,
            cut_b: laser_cost * cut_time_fraction(&sheet.parts, i, cut_time_s, cut_fraction),
            pierce_a: pierce_cost_a * pierce_fraction,
            pierce_b: laser_cost * pierce_fraction * pierce_time_weight(raw_time_s, pierce_time_s),
            foil_a: foil_cost_a * cut_fraction,
            foil_b: laser_cost * cut_fraction * foil_time_weight(raw_time_s, foil_time_secs),
            operational: operational_cost * area_fraction,
        });
    }
    rebalance_rows(&mut per_part, sheet_material_cost, total_a, total_b);

    Ok(SheetCostResult {
        sheet_id: sheet.sheet_id.clone(),
        variant_a: SheetCostBreakdown {
            material: sheet_material_cost,
            cut: cut_cost_a,
            pierce: pierce_cost_a,
            foil: foil_cost_a,
            operational: operational_cost,
            total: total_a,
        },
        variant_b: SheetTimeBreakdown {
            material: sheet_material_cost,
            laser: laser_cost,
            operational: operational_cost,
            total: total_b,
            cut_time_s,
            pierce_time_s,
            foil_time_s: foil_time_secs,
            billed_time_s,
        },
        per_part,
    })
}

/// Variant B attributes laser cost proportional to *time*, not length; the
/// cut-time share for a part is approximated by its cut-length fraction,
/// since the motion planner yields a single pooled time per sheet rather
/// than a per-part time. This is consistent with the per-part attribution
/// rule in the cut line, which is itself defined as a length fraction.
fn cut_time_fraction(_parts: &[crate::model::PartInstance], _index: usize, _cut_time_s: f64, cut_fraction: f64) -> f64 {
    cut_fraction
}

fn pierce_time_weight(raw_time_s: f64, pierce_time_s: f64) -> f64 {
    if raw_time_s > 0.0 {
        pierce_time_s / raw_time_s
    } else {
        0.0
    }
}

fn foil_time_weight(raw_time_s: f64, foil_time_s: f64) -> f64 {
    if raw_time_s > 0.0 {
        foil_time_s / raw_time_s
    } else {
        0.0
    }
}

fn foil_time_s(rate: &crate::model::RateEntry, cut_length_m: f64) -> f64 {
    match &rate.foil_removal {
        Some(rule) if rule.speed_m_min > 0.0 => cut_length_m / rule.speed_m_min * 60.0,
        _ => 0.0,
    }
}

/// Run the lookahead once per contour (each contour is pierced and cut as
/// its own path, starting and ending at rest) and sum the resulting cut
/// times, scaled by each part's qty_in_sheet. Falls back to a single
/// straight segment of the part's total cut length, with no internal
/// junctions, only when the part carries no `MotionInputs` payload.
fn cut_time_for_sheet(
    sheet: &Sheet,
    v_max_mm_s: f64,
    a_max_mm_s2: f64,
    corner_model: lc_motion::CornerModel,
) -> Result<f64, CostError> {
    let mut total = 0.0;
    for part in &sheet.parts {
        let part_time = match &part.motion_inputs {
            Some(motion_inputs) => {
                let mut t = 0.0;
                for (lengths, angles) in motion_inputs.per_contour() {
                    if lengths.iter().all(|l| *l <= 0.0) {
                        continue;
                    }
                    let result =
                        plan_cut_time(&lengths, &angles, v_max_mm_s, a_max_mm_s2, corner_model)?;
                    t += result.cut_time_s;
                }
                t
            }
            None => {
                let length = part.toolpath_stats.cut_length_mm;
                if length <= 0.0 {
                    0.0
                } else {
                    plan_cut_time(&[length], &[], v_max_mm_s, a_max_mm_s2, corner_model)?.cut_time_s
                }
            }
        };
        total += part_time * part.qty_in_sheet as f64;
    }
    Ok(total)
}

/// Rebalance each per-part total so that, summed across the sheet, they
/// reconcile exactly to the sheet totals (material conservation and the
/// analogous invariant for variant totals).
fn rebalance_rows(rows: &mut [PerPartRow], material_total: f64, total_a: f64, total_b: f64) {
    if rows.is_empty() {
        return;
    }
    let material_sum: f64 = rows.iter().map(|r| r.material).sum();
    let a_sum: f64 = rows
        .iter()
        .map(|r| r.material + r.cut_a + r.pierce_a + r.foil_a + r.operational)
        .sum();
    let b_sum: f64 = rows
        .iter()
        .map(|r| r.material + r.cut_b + r.pierce_b + r.foil_b + r.operational)
        .sum();
    let last = rows.len() - 1;
    rows[last].material += material_total - material_sum;
    rows[last].cut_a += total_a - a_sum;
    rows[last].cut_b += total_b - b_sum;
}

/// Distribute per-run job charges (tech/packaging/transport) across every
/// part proportional to (total material + total cut) of that part, and
/// assemble the final per-part attribution map plus job totals.
pub fn attribute_job_costs(
    per_sheet: &[SheetCostResult],
    sheets: &[Sheet],
    overrides: &JobOverrides,
) -> (HashMap<String, PerPartAttribution>, JobCosts) {
    let mut attribution: HashMap<String, PerPartAttribution> = HashMap::new();
    let mut weights: HashMap<String, f64> = HashMap::new();
    let mut total_weight = 0.0;

    for (sheet, result) in sheets.iter().zip(per_sheet.iter()) {
        for (part, row) in sheet.parts.iter().zip(result.per_part.iter()) {
            let entry = attribution
                .entry(part.part_instance_id.clone())
                .or_default();
            entry.material += row.material;
            entry.cut_a += row.cut_a;
            entry.cut_b += row.cut_b;
            entry.pierce_a += row.pierce_a;
            entry.pierce_b += row.pierce_b;
            entry.foil_a += row.foil_a;
            entry.foil_b += row.foil_b;
            entry.operational += row.operational;

            let weight = row.material + row.cut_a;
            weights.insert(part.part_instance_id.clone(), weight);
            total_weight += weight;
        }
    }

    let job_costs = JobCosts {
        tech: overrides.tech_cost_pln,
        packaging: overrides.packaging_cost_pln,
        transport: overrides.transport_cost_pln,
    };
    let job_total = job_costs.tech + job_costs.packaging + job_costs.transport;

    let mut ids: Vec<String> = attribution.keys().cloned().collect();
    ids.sort();
    let mut job_sum = 0.0;
    for (i, id) in ids.iter().enumerate() {
        let weight = weights.get(id).copied().unwrap_or(0.0);
        let share = if total_weight > 0.0 {
            job_total * weight / total_weight
        } else if !ids.is_empty() {
            job_total / ids.len() as f64
        } else {
            0.0
        };
        let share = if i == ids.len() - 1 {
            job_total - job_sum
        } else {
            job_sum += share;
            share
        };
        if let Some(entry) = attribution.get_mut(id) {
            entry.total_a = entry.material + entry.cut_a + entry.pierce_a + entry.foil_a
                + entry.operational
                + share;
            entry.total_b = entry.material + entry.cut_b + entry.pierce_b + entry.foil_b
                + entry.operational
                + share;
        }
    }

    (attribution, job_costs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FoilCost, FoilRemovalRule, MaterialPrice, PartInstance, RateBookEntry, RateEntry,
        Rotation, SheetMode, Transform,
    };
    use lc_toolpath::{EntityCounts, MotionInputEntry, MotionInputs, ToolpathStats};

    fn profile() -> MachineProfile {
        MachineProfile {
            max_accel_mm_s2: 2000.0,
            max_rapid_mm_s: 10_000.0,
            square_corner_velocity_mm_s: 50.0,
            junction_deviation_mm: None,
            use_junction_deviation: false,
        }
    }

    fn rate_book() -> RateBook {
        let mut entries = HashMap::new();
        entries.insert(
            "stainless-1.0".to_string(),
            vec![RateBookEntry {
                thickness_mm: 2.0,
                rate: RateEntry {
                    density_kg_m3: 7900.0,
                    material_price: MaterialPrice::PricePerM2 { pln_per_m2: 50.0 },
                    cut_feedrate_m_min: 5.0,
                    cut_price_per_meter_pln: 1.0,
                    machine_rate_pln_per_hour: 350.0,
                    pierce_time_s: 0.3,
                    pierce_cost_pln: 0.1,
                    foil_removal: Some(FoilRemovalRule {
                        stainless_like: true,
                        thickness_max_mm: 5.0,
                        speed_m_min: 15.0,
                        cost: FoilCost::PerMetre { pln_per_m: 0.5 },
                    }),
                    punch_cost_per_punch: None,
                },
            }],
        );
        RateBook { entries }
    }

    fn part(id: &str, cut_length_mm: f64, pierce_count: u32, occupied_area_mm2: f64) -> PartInstance {
        PartInstance {
            part_instance_id: id.to_string(),
            part_id: id.to_string(),
            drawing_id: format!("{id}-drawing"),
            qty_in_sheet: 1,
            transform: Transform {
                x_mm: 0.0,
                y_mm: 0.0,
                rotation_deg: Rotation::Deg0,
            },
            occupied_area_mm2,
            toolpath_stats: ToolpathStats {
                cut_length_mm,
                pierce_count,
                contour_count: pierce_count.max(1),
                short_segment_ratio: 0.0,
                occupied_area_mm2,
                net_area_mm2: occupied_area_mm2,
                entity_counts: EntityCounts {
                    contour_count: 1,
                    segment_count: 4,
                },
            },
            motion_inputs: None,
        }
    }

    #[test]
    fn test_s5_foil_removal_time() {
        let rate = rate_book().entries["stainless-1.0"][0].rate;
        let t = foil_time_s(&rate, 10.0);
        assert!((t - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_s6_pierce_conservation() {
        let parts = vec![
            part("p1", 1000.0, 2, 100_000.0),
            part("p2", 1000.0, 3, 100_000.0),
            part("p3", 1000.0, 5, 100_000.0),
        ];
        let sheet = Sheet {
            sheet_id: "sheet-1".into(),
            sheet_mode: SheetMode::FixedSheet,
            material_id: "stainless-1.0".into(),
            thickness_mm: 2.0,
            sheet_width_mm: 1500.0,
            sheet_length_mm_nominal: 3000.0,
            used_length_y_mm: 0.0,
            trim_margin_y_mm: 0.0,
            occupied_area_mm2: 300_000.0,
            sheet_area_used_mm2: 1500.0 * 3000.0,
            parts,
        };
        let mut warnings = Vec::new();
        let result = cost_sheet(
            &sheet,
            &profile(),
            &rate_book(),
            &JobOverrides {
                source_type: crate::model::SourceType::Order,
                ..Default::default()
            },
            &mut warnings,
        )
        .unwrap();
        let total_pierce_a: f64 = result.per_part.iter().map(|r| r.pierce_a).sum();
        assert!((total_pierce_a - result.variant_a.pierce).abs() < 0.01);
        let ratios: Vec<f64> = result
            .per_part
            .iter()
            .map(|r| r.pierce_a / result.variant_a.pierce)
            .collect();
        assert!((ratios[0] - 0.2).abs() < 0.01);
        assert!((ratios[1] - 0.3).abs() < 0.01);
        assert!((ratios[2] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_invariant_violation_on_area_mismatch() {
        let parts = vec![part("p1", 1000.0, 1, 100_000.0)];
        let sheet = Sheet {
            sheet_id: "sheet-1".into(),
            sheet_mode: SheetMode::FixedSheet,
            material_id: "stainless-1.0".into(),
            thickness_mm: 2.0,
            sheet_width_mm: 1500.0,
            sheet_length_mm_nominal: 3000.0,
            used_length_y_mm: 0.0,
            trim_margin_y_mm: 0.0,
            occupied_area_mm2: 999_999_999.0,
            sheet_area_used_mm2: 1500.0 * 3000.0,
            parts,
        };
        let mut warnings = Vec::new();
        let result = cost_sheet(
            &sheet,
            &profile(),
            &rate_book(),
            &JobOverrides {
                source_type: crate::model::SourceType::Order,
                ..Default::default()
            },
            &mut warnings,
        );
        assert!(matches!(result, Err(CostError::InvariantViolation { .. })));
    }

    #[test]
    fn test_buffer_factor_below_one_is_a_warning() {
        let parts = vec![part("p1", 1000.0, 1, 100_000.0)];
        let sheet = Sheet {
            sheet_id: "sheet-1".into(),
            sheet_mode: SheetMode::FixedSheet,
            material_id: "stainless-1.0".into(),
            thickness_mm: 2.0,
            sheet_width_mm: 1500.0,
            sheet_length_mm_nominal: 3000.0,
            used_length_y_mm: 0.0,
            trim_margin_y_mm: 0.0,
            occupied_area_mm2: 100_000.0,
            sheet_area_used_mm2: 1500.0 * 3000.0,
            parts,
        };
        let mut warnings = Vec::new();
        let overrides = JobOverrides {
            source_type: crate::model::SourceType::Order,
            buffer_factor: 0.8,
            ..Default::default()
        };
        let _ = cost_sheet(&sheet, &profile(), &rate_book(), &overrides, &mut warnings).unwrap();
        assert!(warnings
            .iter()
            .any(|w| matches!(w, CostWarning::BufferBelowOne { .. })));
    }

    #[test]
    fn test_buffer_linearity() {
        let parts = vec![part("p1", 1000.0, 1, 100_000.0)];
        let sheet = Sheet {
            sheet_id: "sheet-1".into(),
            sheet_mode: SheetMode::FixedSheet,
            material_id: "stainless-1.0".into(),
            thickness_mm: 2.0,
            sheet_width_mm: 1500.0,
            sheet_length_mm_nominal: 3000.0,
            used_length_y_mm: 0.0,
            trim_margin_y_mm: 0.0,
            occupied_area_mm2: 100_000.0,
            sheet_area_used_mm2: 1500.0 * 3000.0,
            parts,
        };
        let mut warnings = Vec::new();
        let low = cost_sheet(
            &sheet,
            &profile(),
            &rate_book(),
            &JobOverrides {
                source_type: crate::model::SourceType::Order,
                buffer_factor: 1.0,
                ..Default::default()
            },
            &mut warnings,
        )
        .unwrap();
        let high = cost_sheet(
            &sheet,
            &profile(),
            &rate_book(),
            &JobOverrides {
                source_type: crate::model::SourceType::Order,
                buffer_factor: 2.0,
                ..Default::default()
            },
            &mut warnings,
        )
        .unwrap();
        assert!((high.variant_b.laser - 2.0 * low.variant_b.laser).abs() < 1e-6);
    }

    #[test]
    fn test_motion_inputs_drive_cornering_into_cut_time() {
        let cornering_part = PartInstance {
            motion_inputs: Some(MotionInputs {
                entries: vec![
                    MotionInputEntry {
                        contour_index: 0,
                        segment_length_mm: 500.0,
                        junction_angle_deg: 90.0,
                    },
                    MotionInputEntry {
                        contour_index: 0,
                        segment_length_mm: 500.0,
                        junction_angle_deg: 0.0,
                    },
                ],
            }),
            ..part("p1", 1000.0, 1, 100_000.0)
        };
        let naive_part = part("p1", 1000.0, 1, 100_000.0);

        let sheet_for = |p: PartInstance| Sheet {
            sheet_id: "sheet-1".into(),
            sheet_mode: SheetMode::FixedSheet,
            material_id: "stainless-1.0".into(),
            thickness_mm: 2.0,
            sheet_width_mm: 1500.0,
            sheet_length_mm_nominal: 3000.0,
            used_length_y_mm: 0.0,
            trim_margin_y_mm: 0.0,
            occupied_area_mm2: 100_000.0,
            sheet_area_used_mm2: 1500.0 * 3000.0,
            parts: vec![p],
        };

        let mut warnings = Vec::new();
        let overrides = JobOverrides {
            source_type: crate::model::SourceType::Order,
            ..Default::default()
        };
        let naive = cost_sheet(
            &sheet_for(naive_part),
            &profile(),
            &rate_book(),
            &overrides,
            &mut warnings,
        )
        .unwrap();
        let cornering = cost_sheet(
            &sheet_for(cornering_part),
            &profile(),
            &rate_book(),
            &overrides,
            &mut warnings,
        )
        .unwrap();

        // The corner-speed limiter slows the machine below the naive
        // single-segment estimate, which never sees a junction at all.
        assert!(cornering.variant_b.cut_time_s > naive.variant_b.cut_time_s);
    }
}
