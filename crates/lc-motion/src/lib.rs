pub mod error;
pub mod planner;

pub use error::MotionError;
pub use planner::{CornerModel, MotionPlanResult, SegmentTime, effective_v_max, plan_cut_time};
