use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no rate for material {material_id} at thickness {thickness_mm} mm")]
    RateMissing {
        material_id: String,
        thickness_mm: f64,
    },

    #[error("no stats for drawing {drawing_id} (part instance {part_instance_id})")]
    StatsMissing {
        drawing_id: String,
        part_instance_id: String,
    },

    #[error("sheet {sheet_id}: occupied-area invariant violated ({detail})")]
    InvariantViolation { sheet_id: String, detail: String },

    #[error(transparent)]
    Toolpath(#[from] lc_toolpath::ToolpathError),

    #[error(transparent)]
    Motion(#[from] lc_motion::MotionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Non-fatal conditions collected alongside a successful CostSummary.
#[derive(Debug, Clone, PartialEq)]
pub enum CostWarning {
    /// A requested (material, thickness) rate was satisfied by the nearest
    /// entry within the rate resolver's tolerance, not an exact match.
    RateSubstituted {
        material_id: String,
        requested_thickness_mm: f64,
        resolved_thickness_mm: f64,
    },
    /// `buffer_factor` was below 1.0, which is permitted but unusual.
    BufferBelowOne { buffer_factor: f64 },
    /// A contour did not close within tolerance; stats were still computed.
    OpenContour { drawing_id: String },
}

impl std::fmt::Display for CostWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostWarning::RateSubstituted {
                material_id,
                requested_thickness_mm,
                resolved_thickness_mm,
            } => write!(
                f,
                "rate for {material_id} at {requested_thickness_mm} mm substituted with {resolved_thickness_mm} mm entry"
            ),
            CostWarning::BufferBelowOne { buffer_factor } => {
                write!(f, "buffer_factor {buffer_factor} is below 1.0")
            }
            CostWarning::OpenContour { drawing_id } => {
                write!(f, "drawing {drawing_id} has an open outer contour")
            }
        }
    }
}
