//! Student record types
//!
//! `StudentRecord` is what a calculate request carries; its derived fields are
//! always computed from the marks on demand, never stored alongside them.
//! `QueryRecord` is the reduced projection recovered from a stored block.

use crate::grade::{compute_grade, Grade, GradeReport, SUBJECT_COUNT};

/// Maximum characters kept for free-text fields
pub const MAX_TEXT_LEN: usize = 99;

/// A student submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentRecord {
    pub name: String,
    pub branch: String,
    pub roll: i32,
    pub semester: i32,
    pub year: i32,
    pub marks: [f32; SUBJECT_COUNT],
}

impl StudentRecord {
    /// Total, average and grade for the current marks
    pub fn report(&self) -> GradeReport {
        compute_grade(&self.marks)
    }

    /// Set the name, truncated to [`MAX_TEXT_LEN`] characters
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate(name);
    }

    /// Set the branch, truncated to [`MAX_TEXT_LEN`] characters
    pub fn set_branch(&mut self, branch: &str) {
        self.branch = truncate(branch);
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_TEXT_LEN).collect()
}

/// The fields a listing returns for one stored block
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub name: String,
    pub roll: i32,
    pub branch: String,
    pub semester: i32,
    pub year: i32,
    pub average: f32,
    /// Letter as stored; kept verbatim so hand-edited files still list
    pub grade: String,
}

impl QueryRecord {
    /// The letter parsed back into a [`Grade`], if it is one
    pub fn grade(&self) -> Option<Grade> {
        Grade::from_letter(&self.grade)
    }
}

impl From<&StudentRecord> for QueryRecord {
    fn from(record: &StudentRecord) -> Self {
        let report = record.report();
        QueryRecord {
            name: record.name.clone(),
            roll: record.roll,
            branch: record.branch.clone(),
            semester: record.semester,
            year: record.year,
            average: report.average,
            grade: report.grade.as_str().to_string(),
        }
    }
}
