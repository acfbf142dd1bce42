use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolpathError {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error(transparent)]
    Core(#[from] lc_core::Error),
}

/// Non-fatal conditions surfaced alongside a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractWarning {
    /// The outer contour of a part did not close within tolerance; stats
    /// were still computed from the open path.
    OpenContour { contour_index: usize },
}

impl std::fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractWarning::OpenContour { contour_index } => {
                write!(f, "contour {contour_index} is not closed")
            }
        }
    }
}
