//! Grade computation
//!
//! Maps five subject marks onto a total, an average, a letter grade and a
//! grade point. The mapping is pure and total over `f32`: anything outside the
//! graded bands (including NaN and averages above 100) lands on `D`/0.

use std::fmt;

/// Number of subject marks per student
pub const SUBJECT_COUNT: usize = 5;

/// Fixed divisor for the average, independent of how many marks were supplied
pub const AVERAGE_DIVISOR: f32 = 5.0;

/// Letter grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    O,
    APlus,
    A,
    BPlus,
    B,
    C,
    D,
}

impl Grade {
    /// Ordered decision list, first match wins
    pub fn from_average(avg: f32) -> Self {
        if (91.0..=100.0).contains(&avg) {
            Grade::O
        } else if (81.0..91.0).contains(&avg) {
            Grade::APlus
        } else if (71.0..81.0).contains(&avg) {
            Grade::A
        } else if (61.0..71.0).contains(&avg) {
            Grade::BPlus
        } else if (51.0..61.0).contains(&avg) {
            Grade::B
        } else if (40.0..51.0).contains(&avg) {
            Grade::C
        } else {
            Grade::D
        }
    }

    /// Parse a letter as written in a stored block
    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "O" => Some(Grade::O),
            "A+" => Some(Grade::APlus),
            "A" => Some(Grade::A),
            "B+" => Some(Grade::BPlus),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::O => "O",
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }

    /// Grade point on the 10-point scale
    pub fn point(&self) -> u8 {
        match self {
            Grade::O => 10,
            Grade::APlus => 9,
            Grade::A => 8,
            Grade::BPlus => 7,
            Grade::B => 6,
            Grade::C => 5,
            Grade::D => 0,
        }
    }

    /// A student passes iff the grade point is non-zero
    pub fn is_pass(&self) -> bool {
        self.point() != 0
    }

    pub fn status(&self) -> &'static str {
        if self.is_pass() {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived fields for one set of marks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeReport {
    pub total: f32,
    pub average: f32,
    pub grade: Grade,
}

impl GradeReport {
    pub fn point(&self) -> u8 {
        self.grade.point()
    }
}

/// Compute total, average and grade from five marks
pub fn compute_grade(marks: &[f32; SUBJECT_COUNT]) -> GradeReport {
    let total: f32 = marks.iter().sum();
    let average = total / AVERAGE_DIVISOR;

    GradeReport {
        total,
        average,
        grade: Grade::from_average(average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Grade::from_average(100.0), Grade::O);
        assert_eq!(Grade::from_average(91.0), Grade::O);
        assert_eq!(Grade::from_average(90.999), Grade::APlus);
        assert_eq!(Grade::from_average(81.0), Grade::APlus);
        assert_eq!(Grade::from_average(80.999), Grade::A);
        assert_eq!(Grade::from_average(71.0), Grade::A);
        assert_eq!(Grade::from_average(70.999), Grade::BPlus);
        assert_eq!(Grade::from_average(61.0), Grade::BPlus);
        assert_eq!(Grade::from_average(60.999), Grade::B);
        assert_eq!(Grade::from_average(51.0), Grade::B);
        assert_eq!(Grade::from_average(50.999), Grade::C);
        assert_eq!(Grade::from_average(40.0), Grade::C);
        assert_eq!(Grade::from_average(39.999), Grade::D);
    }

    #[test]
    fn test_out_of_range_is_d() {
        assert_eq!(Grade::from_average(100.01), Grade::D);
        assert_eq!(Grade::from_average(-1.0), Grade::D);
        assert_eq!(Grade::from_average(f32::NAN), Grade::D);
        assert_eq!(Grade::from_average(f32::INFINITY), Grade::D);
    }

    #[test]
    fn test_points_and_status() {
        assert_eq!(Grade::O.point(), 10);
        assert_eq!(Grade::APlus.point(), 9);
        assert_eq!(Grade::C.point(), 5);
        assert_eq!(Grade::D.point(), 0);
        assert_eq!(Grade::C.status(), "PASS");
        assert_eq!(Grade::D.status(), "FAIL");
    }

    #[test]
    fn test_letter_round_trip() {
        for grade in [
            Grade::O,
            Grade::APlus,
            Grade::A,
            Grade::BPlus,
            Grade::B,
            Grade::C,
            Grade::D,
        ] {
            assert_eq!(Grade::from_letter(grade.as_str()), Some(grade));
        }
        assert_eq!(Grade::from_letter("E"), None);
    }

    #[test]
    fn test_compute_grade() {
        let report = compute_grade(&[95.0, 90.0, 88.0, 92.0, 97.0]);
        assert_eq!(report.total, 462.0);
        assert!((report.average - 92.4).abs() < 1e-4);
        assert_eq!(report.grade, Grade::O);
        assert_eq!(report.point(), 10);
    }

    #[test]
    fn test_missing_marks_use_fixed_divisor() {
        // Only two marks supplied, the rest zero-padded
        let report = compute_grade(&[100.0, 100.0, 0.0, 0.0, 0.0]);
        assert_eq!(report.average, 40.0);
        assert_eq!(report.grade, Grade::C);
    }
}
