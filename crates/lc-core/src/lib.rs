pub mod error;
pub mod geometry;
pub mod units;

pub use error::Error;
pub use geometry::{Contour, Drawing, Point2D, Rect, Segment, Vector2D, junction_angle_deg};
