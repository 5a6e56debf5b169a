//! Agronomic model error types

use thiserror::Error;

/// Errors raised by the agronomic calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgroError {
    /// A required input is missing or not a finite number
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An input is outside its physical range
    #[error("Out of range: {name} = {value} (expected {expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// The culture is not present in the crop tables
    #[error("Unknown culture: {0}")]
    UnknownCulture(String),

    /// Lookup table has no entry for the requested key
    #[error("Unsupported lookup: {0}")]
    Unsupported(String),
}

/// Result type alias for agronomic calculations
pub type AgroResult<T> = Result<T, AgroError>;

/// Check that `value` is finite
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> AgroResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AgroError::InvalidInput(format!("{} must be a finite number", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgroError::UnknownCulture("kale".to_string());
        assert_eq!(err.to_string(), "Unknown culture: kale");

        let err = AgroError::OutOfRange {
            name: "latitude",
            value: 91.0,
            expected: "-90..=90",
        };
        assert_eq!(
            err.to_string(),
            "Out of range: latitude = 91 (expected -90..=90)"
        );
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("x", 1.5), Ok(1.5));
        assert!(ensure_finite("x", f64::NAN).is_err());
        assert!(ensure_finite("x", f64::INFINITY).is_err());
    }
}
