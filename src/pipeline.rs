//! Read, summarise, classify and submit a pull test.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::classify::Verdict;
use crate::config::SiteConfig;
use crate::error::{AnalysisError, CollaboratorError};
use crate::metrics::Metrics;
use crate::reader::{TestMetadata, read_pull_test};
use crate::record::{RecordDraft, TestRecord};
use crate::services::test_database::{SubmitOutcome, TestDatabase};

/// Everything derived from one pull-test file.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub metadata: TestMetadata,
    pub metrics: Metrics,
    pub verdict: Verdict,
    pub draft: RecordDraft,
}

/// Parses `path` and computes its metrics, verdict and record draft.
#[tracing::instrument(skip(path, site), fields(path = %path.display()))]
pub fn analyze_file(path: &Path, site: &SiteConfig) -> Result<Analysis, AnalysisError> {
    let file = read_pull_test(path)?;
    let metrics = Metrics::compute(&file.grades, &file.strengths)?;
    let verdict = site.thresholds.evaluate(&metrics);

    info!(
        wires = metrics.count,
        passed = verdict.passed(),
        "Pull test analysed"
    );

    let draft = RecordDraft::new(
        &metrics,
        &file.metadata,
        file.grades,
        file.strengths,
        verdict.passed(),
        Some(path),
        site,
    );

    Ok(Analysis {
        metadata: file.metadata,
        metrics,
        verdict,
        draft,
    })
}

/// What was created remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub test_run_id: String,
    pub attached: Option<PathBuf>,
}

/// Submits `record` once and, if accepted, attaches its data file.
///
/// Nothing is retried. If the attachment fails the error carries the id of
/// the test run that was already created so it is not submitted twice.
#[tracing::instrument(skip_all, fields(component = %record.component))]
pub async fn submit<D>(record: TestRecord, db: &D) -> Result<SubmitReport, CollaboratorError>
where
    D: TestDatabase + ?Sized,
{
    let test_run_id = match db.submit_record(&record).await? {
        SubmitOutcome::Accepted { test_run_id } => test_run_id,
        SubmitOutcome::Rejected(rejection) => {
            warn!(reason = %rejection, "Test run rejected");
            return Err(CollaboratorError::Rejected(rejection));
        }
    };
    info!(test_run_id = %test_run_id, "Test run uploaded");

    let Some(file) = record.results.file.map(PathBuf::from) else {
        warn!("Record has no data file, skipping attachment");
        return Ok(SubmitReport {
            test_run_id,
            attached: None,
        });
    };

    if let Err(e) = db.attach_file(&test_run_id, &file).await {
        return Err(CollaboratorError::Attachment {
            test_run_id,
            source: Box::new(e),
        });
    }
    info!(test_run_id = %test_run_id, "Data file attached");

    Ok(SubmitReport {
        test_run_id,
        attached: Some(file),
    })
}
