// Grading domain models - the Grade value type and the format it is rendered with.
//
// These are pure domain types with no Discord dependencies.
// The codec (grade_codec.rs) turns a Grade into display text and back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grade_codec::LETTER_GRADES;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    /// A finite number outside `(0, limit]` reached the strict constructor.
    #[error("Grade {value} is outside the supported range (0, {limit}]")]
    OutOfRange { value: f64, limit: u32 },

    /// Text that is neither a label, a letter grade, nor an integer.
    #[error("`{0}` is not a grade")]
    Parse(String),

    #[error("Invalid grade format: {0}")]
    InvalidFormat(String),
}

// ============================================================================
// GRADE
// ============================================================================

/// A single grade.
///
/// A grade is either a number in `(0, limit]` or one of two sentinels:
/// *temporary* (pending, not graded yet) and *special* (excused or otherwise
/// flagged). Sentinels always carry a magnitude of `0`.
///
/// Grades are never mutated. "Changing" a grade means building a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grade {
    magnitude: f64,
    is_temporary: bool,
    is_special: bool,
}

impl Grade {
    /// Build a numeric grade for a scale topping out at `limit`.
    ///
    /// This never fails: non-finite or out-of-range input silently becomes
    /// the temporary sentinel. Use [`Grade::try_from_number`] when bad input
    /// should be reported instead.
    pub fn new(magnitude: f64, limit: u32) -> Self {
        Self::with_flags(magnitude, false, false, limit)
    }

    /// Build a grade with explicit sentinel flags.
    ///
    /// When either flag is set the magnitude is dropped.
    pub fn with_flags(magnitude: f64, is_temporary: bool, is_special: bool, limit: u32) -> Self {
        if is_temporary || is_special {
            return Self {
                magnitude: 0.0,
                is_temporary,
                is_special,
            };
        }

        if in_range(magnitude, limit) {
            Self {
                magnitude,
                is_temporary: false,
                is_special: false,
            }
        } else {
            Self::temporary()
        }
    }

    /// The "pending" sentinel.
    pub fn temporary() -> Self {
        Self {
            magnitude: 0.0,
            is_temporary: true,
            is_special: false,
        }
    }

    /// The "excused / special" sentinel.
    pub fn special() -> Self {
        Self {
            magnitude: 0.0,
            is_temporary: false,
            is_special: true,
        }
    }

    /// The best grade a scale can express.
    pub fn best(limit: u32) -> Self {
        Self::new(f64::from(limit), limit)
    }

    /// Strict numeric conversion.
    ///
    /// Finite values outside `(0, limit]` fail with [`GradeError::OutOfRange`].
    /// Non-finite values are not rejected here; they fall through to
    /// [`Grade::new`] and come back as the temporary sentinel.
    pub fn try_from_number(value: f64, limit: u32) -> Result<Self, GradeError> {
        if value.is_finite() && !in_range(value, limit) {
            return Err(GradeError::OutOfRange { value, limit });
        }
        Ok(Self::new(value, limit))
    }

    /// Strict integer conversion. Anything outside `1..=limit` fails.
    pub fn try_from_int(value: i64, limit: u32) -> Result<Self, GradeError> {
        if value < 1 || value > i64::from(limit) {
            return Err(GradeError::OutOfRange {
                value: value as f64,
                limit,
            });
        }
        Ok(Self::new(value as f64, limit))
    }

    /// The numeric value. Always `0` for sentinels.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    pub fn is_special(&self) -> bool {
        self.is_special
    }

    pub fn is_sentinel(&self) -> bool {
        self.is_temporary || self.is_special
    }

    /// Magnitude rounded half away from zero.
    pub fn rounded(&self) -> i64 {
        self.magnitude.round() as i64
    }
}

fn in_range(value: f64, limit: u32) -> bool {
    value.is_finite() && value > 0.0 && value <= f64::from(limit)
}

// ============================================================================
// FORMAT
// ============================================================================

/// How grades are written and read back.
///
/// One of these is kept per guild; every encode/decode call takes it
/// explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeFormat {
    /// Highest valid grade.
    pub scale_limit: u32,
    /// Render through the letter alphabet instead of digits.
    pub use_letters: bool,
    /// Invert the scale before rendering.
    pub descending: bool,
    /// Text shown for special grades.
    pub special_label: String,
    /// Text shown for temporary grades.
    pub temporary_label: String,
}

impl Default for GradeFormat {
    fn default() -> Self {
        Self {
            scale_limit: 10,
            use_letters: false,
            descending: false,
            special_label: "Sp".to_string(),
            temporary_label: "T".to_string(),
        }
    }
}

/// Longest special or temporary label; grade lists are sent as embeds.
pub const MAX_LABEL_LEN: usize = 16;

impl GradeFormat {
    /// Check that the format can round-trip every grade it renders.
    pub fn validate(&self) -> Result<(), GradeError> {
        if self.scale_limit == 0 {
            return Err(GradeError::InvalidFormat(
                "the scale limit must be at least 1".to_string(),
            ));
        }

        for (what, label) in [
            ("special", &self.special_label),
            ("temporary", &self.temporary_label),
        ] {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                return Err(GradeError::InvalidFormat(format!(
                    "the {what} label cannot be empty"
                )));
            }
            if label.chars().count() > MAX_LABEL_LEN {
                return Err(GradeError::InvalidFormat(format!(
                    "the {what} label can be at most {MAX_LABEL_LEN} characters"
                )));
            }
            if LETTER_GRADES.contains(&trimmed) {
                return Err(GradeError::InvalidFormat(format!(
                    "the {what} label `{label}` collides with a letter grade"
                )));
            }
            if trimmed.parse::<i64>().is_ok() {
                return Err(GradeError::InvalidFormat(format!(
                    "the {what} label `{label}` would be read as a number"
                )));
            }
        }

        if self.special_label == self.temporary_label {
            return Err(GradeError::InvalidFormat(
                "the special and temporary labels must differ".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_values_are_kept_verbatim() {
        for m in [0.01, 0.5, 1.0, 3.7, 9.99, 10.0] {
            let grade = Grade::new(m, 10);
            assert!(!grade.is_sentinel(), "{m} should be numeric");
            assert_eq!(grade.magnitude(), m);
        }
    }

    #[test]
    fn test_non_finite_values_become_temporary() {
        for m in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let grade = Grade::new(m, 10);
            assert!(grade.is_temporary());
            assert_eq!(grade.magnitude(), 0.0);
        }
    }

    // Explicit construction degrades instead of failing. Surprising, but kept:
    // a typo'd 11 on a 10-point scale shows up as "pending", not as an error.
    #[test]
    fn test_out_of_range_construction_silently_degrades_to_temporary() {
        for m in [0.0, -1.0, 10.01, 11.0] {
            let grade = Grade::new(m, 10);
            assert!(grade.is_temporary(), "{m} should degrade");
            assert!(!grade.is_special());
            assert_eq!(grade.magnitude(), 0.0);
        }
    }

    #[test]
    fn test_flags_force_zero_magnitude() {
        let special = Grade::with_flags(7.0, false, true, 10);
        assert!(special.is_special());
        assert_eq!(special.magnitude(), 0.0);

        let temporary = Grade::with_flags(7.0, true, false, 10);
        assert!(temporary.is_temporary());
        assert_eq!(temporary.magnitude(), 0.0);
    }

    #[test]
    fn test_strict_conversion_rejects_finite_out_of_range() {
        assert_eq!(
            Grade::try_from_number(11.0, 10),
            Err(GradeError::OutOfRange {
                value: 11.0,
                limit: 10
            })
        );
        assert!(Grade::try_from_number(0.0, 10).is_err());
        assert!(Grade::try_from_number(-2.5, 10).is_err());
        assert!(Grade::new(11.0, 10).is_temporary());
    }

    #[test]
    fn test_strict_conversion_passes_non_finite_through() {
        let grade = Grade::try_from_number(f64::NAN, 10).unwrap();
        assert!(grade.is_temporary());
        let grade = Grade::try_from_number(f64::INFINITY, 10).unwrap();
        assert!(grade.is_temporary());
    }

    #[test]
    fn test_strict_int_conversion() {
        assert_eq!(Grade::try_from_int(7, 10).unwrap().magnitude(), 7.0);
        assert!(matches!(
            Grade::try_from_int(11, 10),
            Err(GradeError::OutOfRange { .. })
        ));
        assert!(Grade::try_from_int(0, 10).is_err());
    }

    #[test]
    fn test_best_and_rounding() {
        assert_eq!(Grade::best(12).magnitude(), 12.0);
        assert_eq!(Grade::new(2.5, 10).rounded(), 3);
        assert_eq!(Grade::new(2.49, 10).rounded(), 2);
    }

    #[test]
    fn test_format_rejects_long_labels() {
        let long = GradeFormat {
            temporary_label: "p".repeat(MAX_LABEL_LEN + 1),
            ..Default::default()
        };
        assert!(matches!(long.validate(), Err(GradeError::InvalidFormat(_))));

        let at_limit = GradeFormat {
            temporary_label: "p".repeat(MAX_LABEL_LEN),
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_format_validation() {
        assert!(GradeFormat::default().validate().is_ok());

        let zero = GradeFormat {
            scale_limit: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let empty = GradeFormat {
            special_label: "  ".to_string(),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let same = GradeFormat {
            special_label: "X".to_string(),
            temporary_label: "X".to_string(),
            ..Default::default()
        };
        assert!(same.validate().is_err());

        let letter = GradeFormat {
            temporary_label: "A+".to_string(),
            ..Default::default()
        };
        assert!(letter.validate().is_err());

        let numeric = GradeFormat {
            special_label: "5".to_string(),
            ..Default::default()
        };
        assert!(numeric.validate().is_err());
    }
}
