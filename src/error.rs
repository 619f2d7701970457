//! Error types for each stage of the pull-test pipeline.
//!
//! Every error is terminal for the current attempt: the operator re-runs the
//! whole pipeline rather than resuming partway.

use std::path::PathBuf;

use thiserror::Error;

use crate::services::test_database::Rejection;

/// The pull-test export could not be read or is malformed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("file contains no rows")]
    Empty,

    #[error("file has {found} rows, at least {required} are required")]
    TooFewRows { found: usize, required: usize },

    #[error("row {row} has no column {column}")]
    MissingCell { row: usize, column: usize },

    #[error("row {row} is blank")]
    BlankRow { row: usize },

    #[error("row {row}, column {column} is not valid UTF-8")]
    Encoding { row: usize, column: usize },

    #[error("row {row}: pull grade {value:?} is not an integer")]
    InvalidGrade { row: usize, value: String },

    #[error("row {row}: pull strength {value:?} is not a number")]
    InvalidStrength { row: usize, value: String },

    #[error("could not determine creation time of {path}: {source}")]
    Timestamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// Statistics are undefined for zero wires.
    #[error("no pull results to summarise")]
    EmptyInput,

    #[error("{grades} grades but {strengths} strengths")]
    LengthMismatch { grades: usize, strengths: usize },
}

/// Reading or summarising a pull-test file failed.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Required user input is absent. Lists every missing field at once.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing required input: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("access code {0} was not provided")]
    MissingAccessCode(u8),

    #[error("authentication rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("authentication request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication response did not contain a token")]
    MalformedToken,
}

/// Failure talking to the remote test database.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request to test database failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("test run rejected: {0}")]
    Rejected(Rejection),

    /// The test run exists remotely; only the raw file upload failed.
    #[error("test run {test_run_id} was created but attaching the data file failed: {source}")]
    Attachment {
        test_run_id: String,
        #[source]
        source: Box<CollaboratorError>,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected response from test database: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_field() {
        let err = ValidationError {
            missing: vec!["component", "problems", "file"],
        };
        assert_eq!(
            err.to_string(),
            "missing required input: component, problems, file"
        );
    }

    #[test]
    fn test_attachment_error_names_test_run() {
        let err = CollaboratorError::Attachment {
            test_run_id: "abc123".to_string(),
            source: Box::new(CollaboratorError::MalformedResponse("empty body".into())),
        };
        assert!(err.to_string().contains("abc123"));
    }
}
