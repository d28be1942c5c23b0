//! Stored block format
//!
//! One student occupies one block of labelled text lines, bracketed by
//! separator lines:
//!
//! ```text
//! ===================================================
//! Student Name    : Alice
//! Roll Number     : 12
//! Branch          : CS
//! Semester        : 3
//! Year            : 2
//! ---------------------------------------------------
//! Subject Marks:
//!   Subject 1     : 95.00
//!   ...
//! ---------------------------------------------------
//! Total Marks     : 462.00 / 500
//! Average         : 92.40%
//! Grade Letter    : O
//! Grade Point     : 10
//! Status          : PASS
//! ===================================================
//!
//! ```
//!
//! Reading goes through [`BlockDecoder`], a state machine over classified
//! lines. Labels are compared whole, so `Average` and `Grade Letter` can never
//! be confused with each other.

use crate::form::{parse_float, parse_int};
use crate::record::{QueryRecord, StudentRecord};
use std::fmt;
use std::io::{self, BufRead, Write};

/// Block boundary: 51 `=` characters
pub const SEPARATOR: &str = "===================================================";

/// Divider between the identity, marks and result sections
pub const RULE: &str = "---------------------------------------------------";

/// Prefix of the roll line, spacing included
pub const ROLL_PREFIX: &str = "Roll Number     : ";

const LABEL_NAME: &str = "Student Name";
const LABEL_ROLL: &str = "Roll Number";
const LABEL_BRANCH: &str = "Branch";
const LABEL_SEMESTER: &str = "Semester";
const LABEL_YEAR: &str = "Year";
const LABEL_AVERAGE: &str = "Average";
const LABEL_GRADE: &str = "Grade Letter";

/// Render a record as a stored block, trailing blank line included
pub fn encode(record: &StudentRecord) -> String {
    let mut out = String::with_capacity(768);
    // fmt::Write for String is infallible
    let _ = write_block(&mut out, record);
    out
}

fn write_block<W: fmt::Write>(out: &mut W, record: &StudentRecord) -> fmt::Result {
    let report = record.report();

    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "Student Name    : {}", single_line(&record.name))?;
    writeln!(out, "{}{}", ROLL_PREFIX, record.roll)?;
    writeln!(out, "Branch          : {}", single_line(&record.branch))?;
    writeln!(out, "Semester        : {}", record.semester)?;
    writeln!(out, "Year            : {}", record.year)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Subject Marks:")?;
    for (i, mark) in record.marks.iter().enumerate() {
        writeln!(out, "  Subject {}     : {:.2}", i + 1, mark)?;
    }
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Total Marks     : {:.2} / 500", report.total)?;
    writeln!(out, "Average         : {:.2}%", report.average)?;
    writeln!(out, "Grade Letter    : {}", report.grade)?;
    writeln!(out, "Grade Point     : {}", report.point())?;
    writeln!(out, "Status          : {}", report.grade.status())?;
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out)
}

/// Line breaks inside a value would split the block
fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

fn is_separator(line: &[u8]) -> bool {
    line.starts_with(SEPARATOR.as_bytes())
}

/// A field recognized on a labelled line
#[derive(Debug, Clone, PartialEq)]
enum Field {
    Name(String),
    Roll(i32),
    Branch(String),
    Semester(i32),
    Year(i32),
    Average(f32),
    GradeLetter(String),
}

/// Classification of one line of the store
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Separator,
    Field(Field),
    Other,
}

fn classify(line: &str) -> Line {
    if is_separator(line.as_bytes()) {
        return Line::Separator;
    }

    let Some((label, value)) = line.split_once(':') else {
        return Line::Other;
    };
    let value = value.trim_start();

    let field = match label.trim() {
        LABEL_NAME => Field::Name(value.to_string()),
        LABEL_ROLL => Field::Roll(parse_int(value)),
        LABEL_BRANCH => Field::Branch(value.to_string()),
        LABEL_SEMESTER => Field::Semester(parse_int(value)),
        LABEL_YEAR => Field::Year(parse_int(value)),
        LABEL_AVERAGE => Field::Average(parse_float(value)),
        LABEL_GRADE => Field::GradeLetter(
            value
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .chars()
                .take(9)
                .collect(),
        ),
        _ => return Line::Other,
    };

    Line::Field(field)
}

/// Fields gathered so far for the block being read
#[derive(Debug, Default)]
struct Partial {
    name: String,
    roll: i32,
    branch: String,
    semester: i32,
    year: i32,
    average: f32,
}

impl Partial {
    fn apply(&mut self, field: Field) {
        match field {
            Field::Name(v) => self.name = v,
            Field::Roll(v) => self.roll = v,
            Field::Branch(v) => self.branch = v,
            Field::Semester(v) => self.semester = v,
            Field::Year(v) => self.year = v,
            Field::Average(v) => self.average = v,
            Field::GradeLetter(_) => {}
        }
    }

    fn finish(self, grade: String) -> QueryRecord {
        QueryRecord {
            name: self.name,
            roll: self.roll,
            branch: self.branch,
            semester: self.semester,
            year: self.year,
            average: self.average,
            grade,
        }
    }
}

#[derive(Debug)]
enum DecoderState {
    /// Outside any block, or after a block's grade line
    Between,
    /// Collecting fields of a block
    InBlock(Partial),
}

/// Line-driven decoder from stored blocks to query records
///
/// A record is emitted when its grade letter line is read; that line is the
/// last field the listing needs. A separator always starts a fresh block, so
/// an unfinished block never leaks fields into its successor.
#[derive(Debug)]
pub struct BlockDecoder {
    state: DecoderState,
    records: Vec<QueryRecord>,
}

impl BlockDecoder {
    pub fn new() -> Self {
        BlockDecoder {
            state: DecoderState::Between,
            records: Vec::new(),
        }
    }

    /// Feed one line, without its line terminator
    pub fn feed(&mut self, line: &str) {
        let state = std::mem::replace(&mut self.state, DecoderState::Between);

        self.state = match (state, classify(line)) {
            (DecoderState::InBlock(partial), Line::Separator) => {
                if partial.roll != 0 || !partial.name.is_empty() {
                    tracing::debug!(roll = partial.roll, "Discarding block without grade line");
                }
                DecoderState::InBlock(Partial::default())
            }
            (DecoderState::Between, Line::Separator) => DecoderState::InBlock(Partial::default()),
            (DecoderState::InBlock(partial), Line::Field(Field::GradeLetter(grade))) => {
                self.records.push(partial.finish(grade));
                DecoderState::Between
            }
            (DecoderState::Between, Line::Field(Field::GradeLetter(grade))) => {
                self.records.push(Partial::default().finish(grade));
                DecoderState::Between
            }
            // Files written without separators still decode
            (DecoderState::Between, Line::Field(field)) => {
                let mut partial = Partial::default();
                partial.apply(field);
                DecoderState::InBlock(partial)
            }
            (DecoderState::InBlock(mut partial), Line::Field(field)) => {
                partial.apply(field);
                DecoderState::InBlock(partial)
            }
            (state, Line::Other) => state,
        };
    }

    /// Records decoded so far, in file order
    pub fn finish(self) -> Vec<QueryRecord> {
        self.records
    }
}

impl Default for BlockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode every record from a reader
pub fn decode_all<R: BufRead>(reader: R) -> io::Result<Vec<QueryRecord>> {
    let mut decoder = BlockDecoder::new();
    let mut reader = reader;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        decoder.feed(text.trim_end_matches(['\n', '\r']));
    }

    Ok(decoder.finish())
}

/// Whether a raw block holds the roll line for `roll`
///
/// The line must carry the writer's exact spacing and the value must be the
/// whole roll, so roll 5 does not match roll 50.
pub fn block_has_roll(block: &[u8], roll: i32) -> bool {
    let wanted = roll.to_string();
    block
        .split(|&b| b == b'\n')
        .filter_map(|line| line.strip_prefix(ROLL_PREFIX.as_bytes()))
        .map(|value| value.strip_suffix(b"\r").unwrap_or(value))
        .any(|value| value == wanted.as_bytes())
}

/// Copy `reader` to `writer`, leaving out every block that holds `roll`
///
/// A block is a separator line plus every following line up to the next
/// separator; text before the first separator and the tail after the last
/// one count as blocks too. Kept blocks are copied byte for byte. Returns the
/// number of blocks left out.
pub fn rewrite_without<R: BufRead, W: Write>(reader: R, writer: &mut W, roll: i32) -> io::Result<usize> {
    let mut reader = reader;
    let mut block = Vec::new();
    let mut line = Vec::new();
    let mut removed = 0;

    let mut flush = |block: &mut Vec<u8>, writer: &mut W| -> io::Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        if block_has_roll(block, roll) {
            removed += 1;
        } else {
            writer.write_all(block)?;
        }
        block.clear();
        Ok(())
    };

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if is_separator(&line) {
            flush(&mut block, writer)?;
        }
        block.extend_from_slice(&line);
    }
    flush(&mut block, writer)?;

    Ok(removed)
}
