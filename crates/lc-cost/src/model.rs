use lc_motion::CornerModel;
use lc_toolpath::{MotionInputs, ToolpathStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Translation plus one of the four axis-aligned rotations a nester places
/// a part at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x_mm: f64,
    pub y_mm: f64,
    pub rotation_deg: Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

/// A single part placement on a sheet, as produced by the external nester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartInstance {
    pub part_instance_id: String,
    pub part_id: String,
    pub drawing_id: String,
    #[serde(default = "default_qty")]
    pub qty_in_sheet: u32,
    pub transform: Transform,
    pub occupied_area_mm2: f64,
    pub toolpath_stats: ToolpathStats,
    /// Per-contour segment lengths and junction angles, as extracted
    /// alongside `toolpath_stats`. When present, the Motion Planner runs
    /// the real lookahead over the part's actual path instead of
    /// approximating it as one straight cut of its total length.
    #[serde(default)]
    pub motion_inputs: Option<MotionInputs>,
}

fn default_qty() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetMode {
    FixedSheet,
    CutToLength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub sheet_id: String,
    pub sheet_mode: SheetMode,
    pub material_id: String,
    pub thickness_mm: f64,
    pub sheet_width_mm: f64,
    pub sheet_length_mm_nominal: f64,
    #[serde(default)]
    pub used_length_y_mm: f64,
    #[serde(default)]
    pub trim_margin_y_mm: f64,
    /// Authoritative, as supplied by the nester. The engine re-validates
    /// this against the sum of part occupied areas but does not recompute
    /// it from geometry.
    pub occupied_area_mm2: f64,
    /// Authoritative effective area billed for the sheet (post 94%-rule,
    /// as the nester or an earlier pass already decided it). The Sheet
    /// Allocator recomputes this from `sheet_mode`/dimensions and checks
    /// it against this field within tolerance rather than trusting it
    /// blindly, since it is what material cost is billed against.
    #[serde(default)]
    pub sheet_area_used_mm2: f64,
    pub parts: Vec<PartInstance>,
}

impl Sheet {
    pub fn sum_part_occupied_area_mm2(&self) -> f64 {
        self.parts.iter().map(|p| p.occupied_area_mm2).sum()
    }

    pub fn utilization(&self) -> f64 {
        if self.sheet_area_used_mm2 <= 0.0 {
            return 0.0;
        }
        (self.occupied_area_mm2 / self.sheet_area_used_mm2).clamp(0.0, 1.0)
    }

    pub fn cut_length_mm(&self) -> f64 {
        self.parts
            .iter()
            .map(|p| p.toolpath_stats.cut_length_mm * p.qty_in_sheet as f64)
            .sum()
    }

    pub fn pierce_count(&self) -> u32 {
        self.parts
            .iter()
            .map(|p| p.toolpath_stats.pierce_count * p.qty_in_sheet)
            .sum()
    }

    /// Area-weighted `short_segment_ratio` across every part, the pooled
    /// statistic the Motion Planner's effective-v_max reduction consumes
    /// when applied per-sheet.
    pub fn pooled_short_segment_ratio(&self) -> f64 {
        let total_length: f64 = self
            .parts
            .iter()
            .map(|p| p.toolpath_stats.cut_length_mm * p.qty_in_sheet as f64)
            .sum();
        if total_length <= 0.0 {
            return 0.0;
        }
        self.parts
            .iter()
            .map(|p| {
                p.toolpath_stats.short_segment_ratio
                    * p.toolpath_stats.cut_length_mm
                    * p.qty_in_sheet as f64
            })
            .sum::<f64>()
            / total_length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Order,
    Quotation,
}

/// The external nester's output: sheets, each with placed parts. Consumed,
/// never produced, by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingResult {
    pub source_type: SourceType,
    pub source_id: String,
    pub machine_profile_id: String,
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineProfile {
    pub max_accel_mm_s2: f64,
    pub max_rapid_mm_s: f64,
    pub square_corner_velocity_mm_s: f64,
    #[serde(default)]
    pub junction_deviation_mm: Option<f64>,
    #[serde(default)]
    pub use_junction_deviation: bool,
}

impl MachineProfile {
    /// The single `CornerModel` selected by `use_junction_deviation`; the
    /// two cornering models are mutually exclusive.
    pub fn corner_model(&self) -> CornerModel {
        if self.use_junction_deviation {
            CornerModel::JunctionDeviation {
                junction_deviation_mm: self.junction_deviation_mm.unwrap_or(0.02),
            }
        } else {
            CornerModel::SquareCornerVelocity {
                v_corner_90_mm_s: self.square_corner_velocity_mm_s,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialPrice {
    PricePerM2 { pln_per_m2: f64 },
    PricePerKg { pln_per_kg: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoilCost {
    PerMinute { pln_per_minute: f64 },
    PerSquareMetre { pln_per_m2: f64 },
    PerMetre { pln_per_m: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoilRemovalRule {
    pub stainless_like: bool,
    pub thickness_max_mm: f64,
    pub speed_m_min: f64,
    pub cost: FoilCost,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub density_kg_m3: f64,
    pub material_price: MaterialPrice,
    pub cut_feedrate_m_min: f64,
    pub cut_price_per_meter_pln: f64,
    pub machine_rate_pln_per_hour: f64,
    #[serde(default)]
    pub pierce_time_s: f64,
    #[serde(default)]
    pub pierce_cost_pln: f64,
    #[serde(default)]
    pub foil_removal: Option<FoilRemovalRule>,
    #[serde(default)]
    pub punch_cost_per_punch: Option<f64>,
}

/// Keyed by (material_id, thickness_mm). `thickness_mm` is carried on each
/// entry rather than in the key so the Rate Resolver can scan for a nearest
/// match within tolerance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateBook {
    pub entries: HashMap<String, Vec<RateBookEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBookEntry {
    pub thickness_mm: f64,
    pub rate: RateEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationModel {
    OccupiedArea,
    LegacyUtilization,
}

impl Default for AllocationModel {
    fn default() -> Self {
        AllocationModel::OccupiedArea
    }
}

fn default_buffer_factor() -> f64 {
    1.25
}

fn default_operational_cost() -> f64 {
    40.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOverrides {
    pub source_type: SourceType,
    pub source_id: String,
    #[serde(default)]
    pub tech_cost_pln: f64,
    #[serde(default)]
    pub packaging_cost_pln: f64,
    #[serde(default)]
    pub transport_cost_pln: f64,
    #[serde(default = "default_operational_cost")]
    pub operational_cost_per_sheet_pln: f64,
    #[serde(default = "default_true")]
    pub include_piercing: bool,
    #[serde(default)]
    pub include_foil_removal: Option<bool>,
    #[serde(default)]
    pub include_punch: bool,
    #[serde(default)]
    pub allocation_model: AllocationModel,
    #[serde(default = "default_buffer_factor")]
    pub buffer_factor: f64,
    #[serde(default)]
    pub margin_percent: f64,
}

impl Default for JobOverrides {
    fn default() -> Self {
        Self {
            source_type: SourceType::Order,
            source_id: String::new(),
            tech_cost_pln: 0.0,
            packaging_cost_pln: 0.0,
            transport_cost_pln: 0.0,
            operational_cost_per_sheet_pln: default_operational_cost(),
            include_piercing: true,
            include_foil_removal: None,
            include_punch: false,
            allocation_model: AllocationModel::default(),
            buffer_factor: default_buffer_factor(),
            margin_percent: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetCostBreakdown {
    pub material: f64,
    pub cut: f64,
    pub pierce: f64,
    pub foil: f64,
    pub operational: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetTimeBreakdown {
    pub material: f64,
    pub laser: f64,
    pub operational: f64,
    pub total: f64,
    pub cut_time_s: f64,
    pub pierce_time_s: f64,
    pub foil_time_s: f64,
    pub billed_time_s: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JobCosts {
    pub tech: f64,
    pub packaging: f64,
    pub transport: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantASummary {
    pub total_pln: f64,
    pub sheets: Vec<(String, SheetCostBreakdown)>,
    pub job_costs: JobCosts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantBSummary {
    pub total_pln: f64,
    pub sheets: Vec<(String, SheetTimeBreakdown)>,
    pub job_costs: JobCosts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerPartAttribution {
    pub material: f64,
    pub cut_a: f64,
    pub cut_b: f64,
    pub pierce_a: f64,
    pub pierce_b: f64,
    pub foil_a: f64,
    pub foil_b: f64,
    pub operational: f64,
    pub total_a: f64,
    pub total_b: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub allocation_model: AllocationModel,
    pub buffer_factor: f64,
    pub machine_profile_id: String,
    pub variant_a: VariantASummary,
    pub variant_b: VariantBSummary,
    pub per_part: HashMap<String, PerPartAttribution>,
}
