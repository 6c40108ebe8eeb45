/// Converts a percentage grade into a letter grade.
///
/// | Range   | Grade |
/// |---------|-------|
/// | >= 90   | A     |
/// | >= 80   | B     |
/// | >= 70   | C     |
/// | >= 60   | D     |
/// | < 60    | F     |
pub fn letter_grade(percent: f64) -> String {
    match percent {
        p if p >= 90.0 => "A".into(),
        p if p >= 80.0 => "B".into(),
        p if p >= 70.0 => "C".into(),
        p if p >= 60.0 => "D".into(),
        _ => "F".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_grade_boundaries() {
        assert_eq!(letter_grade(104.0), "A");
        assert_eq!(letter_grade(90.0), "A");
        assert_eq!(letter_grade(89.9), "B");
        assert_eq!(letter_grade(80.0), "B");
        assert_eq!(letter_grade(79.5), "C");
        assert_eq!(letter_grade(70.0), "C");
        assert_eq!(letter_grade(69.0), "D");
        assert_eq!(letter_grade(60.0), "D");
        assert_eq!(letter_grade(59.9), "F");
        assert_eq!(letter_grade(0.0), "F");
    }

    #[test]
    fn test_nan_is_failing() {
        assert_eq!(letter_grade(f64::NAN), "F");
    }
}
