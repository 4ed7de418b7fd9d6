//! Validation helper functions for configuration types.

use crate::core::errors::{GlossaError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(GlossaError::config_field(
            format!("{} must be greater than 0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is finite and greater than zero.
pub fn validate_positive_f64(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GlossaError::config_field(
            format!("{} must be a finite value greater than 0.0", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that an f64 value is finite and non-negative.
pub fn validate_non_negative(value: f64, field: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GlossaError::config_field(
            format!("{} must be non-negative", field),
            field,
        ));
    }
    Ok(())
}

/// Validate that a string value is not blank.
pub fn validate_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GlossaError::config_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_usize_rejects_zero() {
        assert!(validate_positive_usize(0, "semantic.k").is_err());
        assert!(validate_positive_usize(3, "semantic.k").is_ok());
    }

    #[test]
    fn positive_f64_rejects_nan_and_zero() {
        assert!(validate_positive_f64(0.0, "graph.resolution").is_err());
        assert!(validate_positive_f64(f64::NAN, "graph.resolution").is_err());
        assert!(validate_positive_f64(0.5, "graph.resolution").is_ok());
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert!(validate_non_negative(0.0, "graph.min_improvement").is_ok());
        assert!(validate_non_negative(-1e-9, "graph.min_improvement").is_err());
    }

    #[test]
    fn non_empty_names_the_field() {
        let err = validate_non_empty("  ", "dataset.glossary").unwrap_err();
        assert!(err.to_string().contains("dataset.glossary"));
    }
}
