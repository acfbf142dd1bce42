use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("value out of range: {name} = {value} (expected {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_dimension() {
        let err = Error::InvalidDimension("chord tolerance must be positive".into());
        assert_eq!(
            err.to_string(),
            "invalid dimension: chord tolerance must be positive"
        );
    }

    #[test]
    fn test_error_display_out_of_range() {
        let err = Error::OutOfRange {
            name: "chord_tolerance_mm".into(),
            value: 5.0,
            min: 0.05,
            max: 0.2,
        };
        assert!(err.to_string().contains("5"));
    }
}
