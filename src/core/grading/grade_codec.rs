// Text encoding for grades.
//
// Rendering rule, by (letters, descending), with r = rank of the magnitude:
//   letters + descending  -> LETTER_GRADES[limit - (r + 1)], else `limit - r`
//   letters + ascending   -> LETTER_GRADES[r - 1],           else `r`
//   digits  + descending  -> `limit - r`
//   digits  + ascending   -> `r`
// Decoding inverts each mapping. Both letter branches use the same bounds rule:
// the index is computed as a signed integer and must land in 0..10.

use std::fmt;

use super::grading_models::{Grade, GradeError, GradeFormat};

/// Letter alphabet, worst to best.
pub const LETTER_GRADES: [&str; 10] = ["F", "E", "D", "C", "B", "A", "A+", "A++", "S", "S+"];

fn letter_at(index: i64) -> Option<&'static str> {
    usize::try_from(index)
        .ok()
        .and_then(|i| LETTER_GRADES.get(i).copied())
}

impl GradeFormat {
    /// Integer rank used for rendering.
    ///
    /// Rounds half away from zero. Magnitudes below 0.5 still count as rank 1,
    /// so the rendered text always decodes back to a valid grade.
    fn rank(grade: &Grade) -> i64 {
        grade.rounded().max(1)
    }

    /// Render a grade as display text.
    pub fn encode(&self, grade: &Grade) -> String {
        if grade.is_special() {
            return self.special_label.clone();
        }
        if grade.is_temporary() {
            return self.temporary_label.clone();
        }

        let limit = i64::from(self.scale_limit);
        let rank = Self::rank(grade);

        match (self.use_letters, self.descending) {
            (true, true) => letter_at(limit - (rank + 1))
                .map(str::to_string)
                .unwrap_or_else(|| (limit - rank).to_string()),
            (true, false) => letter_at(rank - 1)
                .map(str::to_string)
                .unwrap_or_else(|| rank.to_string()),
            (false, true) => (limit - rank).to_string(),
            (false, false) => rank.to_string(),
        }
    }

    /// Read display text back into a grade.
    ///
    /// Labels must match exactly. Integers that map outside the scale go
    /// through [`Grade::new`] and therefore come back as temporary.
    pub fn decode(&self, text: &str) -> Result<Grade, GradeError> {
        if text == self.special_label {
            return Ok(Grade::special());
        }
        if text == self.temporary_label {
            return Ok(Grade::temporary());
        }

        let limit = i64::from(self.scale_limit);

        if self.use_letters {
            if let Some(index) = LETTER_GRADES.iter().position(|letter| *letter == text) {
                let index = index as i64;
                let rank = if self.descending {
                    limit - 1 - index
                } else {
                    index + 1
                };
                return Ok(Grade::new(rank as f64, self.scale_limit));
            }
        }

        let number: i64 = text
            .trim()
            .parse()
            .map_err(|_| GradeError::Parse(text.to_string()))?;

        let rank = if self.descending {
            limit.saturating_sub(number)
        } else {
            number
        };

        Ok(Grade::new(rank as f64, self.scale_limit))
    }

    /// Borrowing adapter so grades can go straight into `format!`.
    pub fn display<'a>(&'a self, grade: &'a Grade) -> GradeDisplay<'a> {
        GradeDisplay {
            format: self,
            grade,
        }
    }
}

pub struct GradeDisplay<'a> {
    format: &'a GradeFormat,
    grade: &'a Grade,
}

impl fmt::Display for GradeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format.encode(self.grade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(scale_limit: u32, use_letters: bool, descending: bool) -> GradeFormat {
        GradeFormat {
            scale_limit,
            use_letters,
            descending,
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_ascending() {
        let fmt = format(10, false, false);
        assert_eq!(fmt.encode(&Grade::new(7.0, 10)), "7");
        assert_eq!(fmt.encode(&Grade::new(6.5, 10)), "7");
        assert_eq!(fmt.encode(&Grade::new(10.0, 10)), "10");
    }

    #[test]
    fn test_plain_descending() {
        let fmt = format(10, false, true);
        assert_eq!(fmt.encode(&Grade::new(3.0, 10)), "7");
        assert_eq!(fmt.encode(&Grade::new(10.0, 10)), "0");
    }

    #[test]
    fn test_letters_ascending() {
        let fmt = format(10, true, false);
        assert_eq!(fmt.encode(&Grade::new(6.0, 10)), "A");
        assert_eq!(fmt.encode(&Grade::new(1.0, 10)), "F");
        assert_eq!(fmt.encode(&Grade::new(10.0, 10)), "S+");
    }

    #[test]
    fn test_letters_ascending_falls_back_to_digits_past_alphabet() {
        let fmt = format(20, true, false);
        assert_eq!(fmt.encode(&Grade::new(10.0, 20)), "S+");
        assert_eq!(fmt.encode(&Grade::new(11.0, 20)), "11");
    }

    #[test]
    fn test_letters_descending() {
        let fmt = format(10, true, true);
        // index = 10 - (1 + 1) = 8
        assert_eq!(fmt.encode(&Grade::new(1.0, 10)), "S");
        // index = 10 - (9 + 1) = 0
        assert_eq!(fmt.encode(&Grade::new(9.0, 10)), "F");
        // index = -1, out of the alphabet: digits
        assert_eq!(fmt.encode(&Grade::new(10.0, 10)), "0");

        let wide = format(100, true, true);
        assert_eq!(wide.encode(&Grade::new(5.0, 100)), "95");
        // index = 100 - (94 + 1) = 5
        assert_eq!(wide.encode(&Grade::new(94.0, 100)), "A");
    }

    #[test]
    fn test_sentinels_use_labels() {
        let fmt = GradeFormat {
            use_letters: true,
            descending: true,
            ..Default::default()
        };
        assert_eq!(fmt.encode(&Grade::with_flags(0.0, false, true, 10)), "Sp");
        assert_eq!(fmt.encode(&Grade::temporary()), "T");
        // special wins when both flags are set
        assert_eq!(fmt.encode(&Grade::with_flags(0.0, true, true, 10)), "Sp");
    }

    #[test]
    fn test_tiny_magnitudes_render_as_lowest_rank() {
        let fmt = format(10, false, false);
        assert_eq!(fmt.encode(&Grade::new(0.2, 10)), "1");
    }

    #[test]
    fn test_decode_labels() {
        let fmt = GradeFormat::default();
        assert!(fmt.decode("Sp").unwrap().is_special());
        assert!(fmt.decode("T").unwrap().is_temporary());
    }

    #[test]
    fn test_decode_numbers_and_letters() {
        assert_eq!(format(10, false, false).decode("7").unwrap().magnitude(), 7.0);
        assert_eq!(format(10, false, true).decode("7").unwrap().magnitude(), 3.0);
        assert_eq!(format(10, true, false).decode("A").unwrap().magnitude(), 6.0);
        assert_eq!(format(10, true, true).decode("S").unwrap().magnitude(), 1.0);
        // letters mode still accepts plain integers
        assert_eq!(format(10, true, false).decode(" 4 ").unwrap().magnitude(), 4.0);
    }

    #[test]
    fn test_decode_out_of_scale_integer_degrades() {
        let fmt = format(10, false, false);
        assert!(fmt.decode("42").unwrap().is_temporary());
        assert!(fmt.decode("-3").unwrap().is_temporary());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let fmt = format(10, true, false);
        assert_eq!(fmt.decode("Z"), Err(GradeError::Parse("Z".to_string())));
        assert!(fmt.decode("").is_err());
        assert!(fmt.decode("7.5").is_err());
        // letters are not recognised when letter mode is off
        assert!(format(10, false, false).decode("A").is_err());
    }

    #[test]
    fn test_display_adapter() {
        let fmt = format(10, true, false);
        let grade = Grade::new(6.0, 10);
        assert_eq!(format!("[{}]", fmt.display(&grade)), "[A]");
    }

    #[test]
    fn test_reencoding_decoded_text_is_stable() {
        let mut checked = 0;

        for limit in [1u32, 3, 5, 10, 12, 20, 100] {
            for use_letters in [false, true] {
                for descending in [false, true] {
                    let fmt = format(limit, use_letters, descending);
                    let top = f64::from(limit);

                    let mut grades = vec![Grade::special(), Grade::temporary()];
                    for m in [0.2, 0.5, 1.0, 1.49, 2.5, top / 2.0, top - 0.4, top] {
                        grades.push(Grade::new(m, limit));
                    }

                    for grade in grades {
                        let text = fmt.encode(&grade);
                        let decoded = fmt
                            .decode(&text)
                            .unwrap_or_else(|e| panic!("{text} failed for {fmt:?}: {e}"));
                        assert_eq!(
                            fmt.encode(&decoded),
                            text,
                            "unstable for {grade:?} under {fmt:?}"
                        );
                        checked += 1;
                    }
                }
            }
        }

        assert!(checked >= 50);
    }
}
