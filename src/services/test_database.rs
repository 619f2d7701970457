//! Trait and types for submitting test runs to a remote test database.

use std::fmt;
use std::path::Path;

use crate::error::CollaboratorError;
use crate::record::TestRecord;

/// Why the database refused a test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The component is registered at a different institution.
    ComponentAtDifferentLocation,
    /// The component's current stage does not accept this test type. The
    /// database has also been seen to report this when the component is at a
    /// different location.
    StageWithoutTestType,
    /// Any other error code, passed through as reported.
    Other { code: String, message: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ComponentAtDifferentLocation => {
                f.write_str("component is not currently at the given location")
            }
            Rejection::StageWithoutTestType => f.write_str(
                "the component's current stage does not have this test type; \
                 update the component's stage in the database",
            ),
            Rejection::Other { code, message } if message.is_empty() => f.write_str(code),
            Rejection::Other { code, message } => write!(f, "{code}: {message}"),
        }
    }
}

/// Result of submitting a test record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { test_run_id: String },
    Rejected(Rejection),
}

/// Abstraction over the remote test database.
///
/// Implementations must not retry: a resubmission would create a duplicate
/// test run.
#[async_trait::async_trait]
pub trait TestDatabase: Send + Sync {
    /// Creates a test run from `record`.
    async fn submit_record(&self, record: &TestRecord) -> Result<SubmitOutcome, CollaboratorError>;

    /// Attaches the file at `path` to an existing test run.
    async fn attach_file(&self, test_run_id: &str, path: &Path) -> Result<(), CollaboratorError>;
}
