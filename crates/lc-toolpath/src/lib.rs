pub mod cache;
pub mod error;
pub mod extract;
pub mod hash;

pub use cache::{InMemoryStatsCache, StatsCache};
pub use error::{ExtractWarning, ToolpathError};
pub use extract::{EntityCounts, MotionInputEntry, MotionInputs, ToolpathStats, extract};
pub use hash::drawing_hash;
