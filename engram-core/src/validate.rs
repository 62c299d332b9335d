//! Field validation shared by the tool boundary and the engines.

use crate::constants::MAX_CONTENT_LENGTH;
use crate::errors::{EngramError, EngramResult};

/// Content must be non-empty and at most 8 000 characters.
pub fn content(content: &str) -> EngramResult<()> {
    if content.trim().is_empty() {
        return Err(EngramError::validation("content must not be empty"));
    }
    let len = content.chars().count();
    if len > MAX_CONTENT_LENGTH {
        return Err(EngramError::validation(format!(
            "content too long: {len} chars (maximum {MAX_CONTENT_LENGTH})"
        )));
    }
    Ok(())
}

/// Importance must sit in 1..=10.
pub fn importance(value: u8) -> EngramResult<()> {
    if !(1..=10).contains(&value) {
        return Err(EngramError::validation(format!(
            "importance must be in 1..=10, got {value}"
        )));
    }
    Ok(())
}

/// Confidence and edge strength must sit in 0.0..=1.0.
pub fn unit_interval(name: &str, value: f64) -> EngramResult<()> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(EngramError::validation(format!(
            "{name} must be in 0.0..=1.0, got {value}"
        )));
    }
    Ok(())
}

/// Clamp importance into the valid range.
pub fn clamp_importance(value: i32) -> u8 {
    value.clamp(1, 10) as u8
}

/// Clamp a confidence-like value into the unit interval.
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_empty_and_oversized_content() {
        assert!(content("").is_err());
        assert!(content("   ").is_err());
        assert!(content("ok").is_ok());
        assert!(content(&"x".repeat(8_001)).is_err());
        assert!(content(&"x".repeat(8_000)).is_ok());
    }

    #[test]
    fn importance_bounds() {
        assert!(importance(0).is_err());
        assert!(importance(1).is_ok());
        assert!(importance(10).is_ok());
        assert!(importance(11).is_err());
    }

    proptest! {
        #[test]
        fn clamped_importance_always_valid(v in i32::MIN..i32::MAX) {
            let clamped = clamp_importance(v);
            prop_assert!((1..=10).contains(&clamped));
        }

        #[test]
        fn clamped_unit_always_valid(v in -100.0f64..100.0) {
            let clamped = clamp_unit(v);
            prop_assert!((0.0..=1.0).contains(&clamped));
        }
    }
}
