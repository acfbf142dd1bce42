pub mod allocate;
pub mod engine;
pub mod error;
pub mod facade;
pub mod model;
pub mod rates;

pub use error::{CostError, CostWarning};
pub use facade::compute_cost_summary;
pub use model::{
    AllocationModel, CostSummary, FoilCost, FoilRemovalRule, JobCosts, JobOverrides,
    MachineProfile, MaterialPrice, NestingResult, PartInstance, PerPartAttribution, RateBook,
    RateBookEntry, RateEntry, Rotation, Sheet, SheetCostBreakdown, SheetMode, SheetTimeBreakdown,
    SourceType, Transform, VariantASummary, VariantBSummary,
};
