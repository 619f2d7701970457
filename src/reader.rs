//! CSV reader for pull-tester exports.
//!
//! The export begins with a fixed block of header rows (series, date, operator
//! and so on) followed by one row per pulled wire:
//!
//! ```text
//! row 3:  Operator,<name>
//! row 9+: <index>,<unused>,<grade>,<strength in grams>
//! ```
//!
//! Row indices are counted after any leading blank rows have been dropped.
//! A leading row counts as blank when it is an empty line or when every cell
//! is empty or whitespace (`,,,` or ` , `). Tester exports sometimes open with
//! such a row of separators, so it is skipped like an empty line.
//!
//! After the first non-blank row nothing is skipped. An empty line anywhere
//! between the header and the last wire is a [`ParseError::BlankRow`], and a
//! row of empty cells fails as a bad data row. Empty lines after the last wire
//! are accepted, since most exports end with one or more line breaks.
//!
//! Cells must be valid UTF-8. Anything else is a [`ParseError::Encoding`]
//! rather than a silently replaced operator name.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, warn};

use crate::error::ParseError;

pub const OPERATOR_ROW: usize = 3;
pub const HEADER_COL: usize = 1;
pub const DATA_START_ROW: usize = 9;
pub const GRADE_COL: usize = 2;
pub const STRENGTH_COL: usize = 3;

/// Header block plus at least one wire.
pub const MIN_ROWS: usize = DATA_START_ROW + 1;

/// Who ran the test and when the export was created.
#[derive(Debug, Clone, PartialEq)]
pub struct TestMetadata {
    pub operator: String,
    pub timestamp_utc: DateTime<Utc>,
}

impl TestMetadata {
    /// ISO-8601 with millisecond precision and a trailing `Z`,
    /// e.g. `2021-11-05T16:16:47.434Z`.
    pub fn timestamp_iso(&self) -> String {
        format_timestamp(&self.timestamp_utc)
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A parsed pull-test export. `grades` and `strengths` are in file order and
/// always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct PullTestFile {
    pub path: Option<PathBuf>,
    pub metadata: TestMetadata,
    pub grades: Vec<i64>,
    pub strengths: Vec<f64>,
}

/// Reads a pull-test export from disk.
///
/// The test date comes from the file's creation time, not its contents. Not
/// every copy or transfer preserves creation time, so a file that has been
/// moved between machines may carry the date it was copied.
///
/// # Errors
///
/// Any unreadable file, truncated header block or non-numeric data cell aborts
/// the whole read. Malformed rows are never skipped.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn read_pull_test(path: &Path) -> Result<PullTestFile, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let timestamp = creation_time(path)?;

    let mut parsed = read_pull_test_from_reader(file, timestamp)?;
    parsed.path = Some(path.to_path_buf());
    Ok(parsed)
}

/// Parses export contents from any reader, stamping them with `timestamp`.
pub fn read_pull_test_from_reader<R: Read>(
    reader: R,
    timestamp: DateTime<Utc>,
) -> Result<PullTestFile, ParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        let line_before = rdr.position().line();
        if !rdr.read_byte_record(&mut record)? {
            break;
        }
        let lines_read = rdr.position().line() - line_before;
        let row = rows.len();
        let cells = decode(&record, row)?;

        // Only leading blank rows are dropped; later ones are data errors.
        if rows.is_empty() {
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
        } else if lines_read > 1 + embedded_newlines(&record) {
            // The csv reader drops empty lines silently, so they only show up
            // as extra line breaks consumed ahead of this record.
            return Err(ParseError::BlankRow { row });
        }
        rows.push(cells);
    }

    if rows.is_empty() {
        return Err(ParseError::Empty);
    }
    if rows.len() < MIN_ROWS {
        return Err(ParseError::TooFewRows {
            found: rows.len(),
            required: MIN_ROWS,
        });
    }

    let operator = cell(&rows[OPERATOR_ROW], OPERATOR_ROW, HEADER_COL)?.to_string();

    let wires = rows.len() - DATA_START_ROW;
    let mut grades = Vec::with_capacity(wires);
    let mut strengths = Vec::with_capacity(wires);

    for (row, cells) in rows.iter().enumerate().skip(DATA_START_ROW) {
        let raw_grade = cell(cells, row, GRADE_COL)?;
        let grade = raw_grade
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidGrade {
                row,
                value: raw_grade.to_string(),
            })?;

        let raw_strength = cell(cells, row, STRENGTH_COL)?;
        let strength =
            raw_strength
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidStrength {
                    row,
                    value: raw_strength.to_string(),
                })?;

        grades.push(grade);
        strengths.push(strength);
    }

    debug!(operator = %operator, wires, "Pull test file parsed");

    Ok(PullTestFile {
        path: None,
        metadata: TestMetadata {
            operator,
            timestamp_utc: timestamp,
        },
        grades,
        strengths,
    })
}

fn decode(record: &ByteRecord, row: usize) -> Result<Vec<String>, ParseError> {
    record
        .iter()
        .enumerate()
        .map(|(column, field)| {
            std::str::from_utf8(field)
                .map(str::to_string)
                .map_err(|_| ParseError::Encoding { row, column })
        })
        .collect()
}

/// Line breaks inside quoted fields, which advance the line count without
/// ending the record.
fn embedded_newlines(record: &ByteRecord) -> u64 {
    record
        .iter()
        .map(|field| field.iter().filter(|&&b| b == b'\n').count() as u64)
        .sum()
}

fn cell(cells: &[String], row: usize, column: usize) -> Result<&str, ParseError> {
    cells
        .get(column)
        .map(String::as_str)
        .ok_or(ParseError::MissingCell { row, column })
}

/// Creation time of `path`, falling back to modification time on platforms
/// and filesystems that do not record it.
fn creation_time(path: &Path) -> Result<DateTime<Utc>, ParseError> {
    let to_error = |source| ParseError::Timestamp {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(path).map_err(to_error)?;
    let created = match metadata.created() {
        Ok(created) => created,
        Err(e) => {
            warn!(error = %e, "Creation time unavailable, using modification time");
            metadata.modified().map_err(to_error)?
        }
    };

    Ok(DateTime::<Utc>::from(created))
}
