//! JSON response bodies
//!
//! Key order is fixed by field order. Averages and totals are emitted with
//! exactly two fractional digits, so they go out as raw JSON numbers rather
//! than through the float formatter. String fields are escaped.

use crate::record::{QueryRecord, StudentRecord};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

/// Result type for rendering
pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize an `f32` as a number with two decimals
///
/// JSON has no representation for infinities or NaN; those render as 0.00.
fn two_places<S: Serializer>(value: &f32, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let value = if value.is_finite() { *value } else { 0.0 };
    let raw = RawValue::from_string(format!("{:.2}", value)).map_err(S::Error::custom)?;
    raw.serialize(serializer)
}

#[derive(Serialize)]
struct RecordView<'a> {
    name: &'a str,
    roll: i32,
    branch: &'a str,
    semester: i32,
    year: i32,
    #[serde(serialize_with = "two_places")]
    average: f32,
    grade: &'a str,
}

#[derive(Serialize)]
struct RecordList<'a> {
    records: Vec<RecordView<'a>>,
}

#[derive(Serialize)]
struct CalculateView<'a> {
    success: bool,
    name: &'a str,
    #[serde(rename = "rollNumber")]
    roll_number: i32,
    branch: &'a str,
    semester: i32,
    year: i32,
    #[serde(serialize_with = "two_places")]
    total: f32,
    #[serde(serialize_with = "two_places")]
    average: f32,
    grade: &'static str,
    #[serde(rename = "gradePoint")]
    grade_point: u8,
}

#[derive(Serialize)]
struct Outcome {
    success: bool,
}

/// `{"records":[...]}` for a listing
pub fn records(records: &[QueryRecord]) -> Result<String> {
    let list = RecordList {
        records: records
            .iter()
            .map(|r| RecordView {
                name: &r.name,
                roll: r.roll,
                branch: &r.branch,
                semester: r.semester,
                year: r.year,
                average: r.average,
                grade: &r.grade,
            })
            .collect(),
    };
    Ok(serde_json::to_string(&list)?)
}

/// Result of a calculate request, derived fields computed from the marks
pub fn calculated(record: &StudentRecord) -> Result<String> {
    let report = record.report();
    let view = CalculateView {
        success: true,
        name: &record.name,
        roll_number: record.roll,
        branch: &record.branch,
        semester: record.semester,
        year: record.year,
        total: report.total,
        average: report.average,
        grade: report.grade.as_str(),
        grade_point: report.point(),
    };
    Ok(serde_json::to_string(&view)?)
}

/// `{"success":true}` or `{"success":false}`
pub fn outcome(success: bool) -> String {
    // A single bool field cannot fail to encode
    serde_json::to_string(&Outcome { success })
        .unwrap_or_else(|_| format!("{{\"success\":{}}}", success))
}
