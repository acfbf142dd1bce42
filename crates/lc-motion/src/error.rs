use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("invalid motion inputs: {0}")]
    InvalidInputs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_error_display() {
        let err = MotionError::InvalidInputs("mismatched segment/angle counts".into());
        assert_eq!(
            err.to_string(),
            "invalid motion inputs: mismatched segment/angle counts"
        );
    }
}
