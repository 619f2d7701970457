//! The test-run record uploaded to the test database.
//!
//! Field names and nesting follow the database's `uploadTestRunResults`
//! contract and must not change.

use std::path::Path;

use serde::Serialize;

use crate::config::SiteConfig;
use crate::error::ValidationError;
use crate::metrics::Metrics;
use crate::reader::TestMetadata;

pub const TEST_TYPE: &str = "PULL_TEST";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub component: String,
    pub test_type: String,
    pub institution: String,
    pub run_number: String,
    pub date: String,
    pub passed: bool,
    pub problems: bool,
    pub properties: Properties,
    pub results: Results,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Properties {
    pub operator: String,
    pub pull_test_machine: String,
    pub number_wires: usize,
    pub wire_bond_machine: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Results {
    pub mean: f64,
    pub pull_strength: Vec<f64>,
    pub pull_grade: Vec<i64>,
    pub standard_deviation: f64,
    pub too_low: usize,
    pub minimum_strength: f64,
    pub maximum_strength: f64,
    pub heel_breaks: f64,
    pub file: Option<String>,
}

/// Everything known about a test once its file has been analysed, before the
/// operator's inputs are merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub institution: String,
    pub date: String,
    pub passed: bool,
    pub properties: Properties,
    pub results: Results,
}

impl RecordDraft {
    pub fn new(
        metrics: &Metrics,
        metadata: &TestMetadata,
        grades: Vec<i64>,
        strengths: Vec<f64>,
        passed: bool,
        file: Option<&Path>,
        site: &SiteConfig,
    ) -> Self {
        RecordDraft {
            institution: site.institution.clone(),
            date: metadata.timestamp_iso(),
            passed,
            properties: Properties {
                operator: metadata.operator.clone(),
                pull_test_machine: site.pull_test_machine.clone(),
                number_wires: metrics.count,
                wire_bond_machine: site.wire_bond_machine.clone(),
            },
            results: Results {
                mean: metrics.mean,
                pull_strength: strengths,
                pull_grade: grades,
                standard_deviation: metrics.std_dev,
                too_low: metrics.below_threshold_count,
                minimum_strength: metrics.min,
                maximum_strength: metrics.max,
                heel_breaks: metrics.heel_break_percent,
                file: file.map(|p| p.display().to_string()),
            },
        }
    }
}

/// Values the operator supplies. `None` means not yet entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInputs {
    pub component: Option<String>,
    pub run_number: Option<String>,
    pub problems: Option<bool>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Assembles the final record.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming every missing input when the serial
/// number, run number or problems selection is absent, or when no file has
/// been analysed (`draft` is `None` or has no file path). No partial record
/// is ever produced.
pub fn build_record(
    draft: Option<&RecordDraft>,
    inputs: &UserInputs,
) -> Result<TestRecord, ValidationError> {
    let component = present(&inputs.component);
    let run_number = present(&inputs.run_number);
    let file_chosen = draft.is_some_and(|d| d.results.file.is_some());

    let missing: Vec<&'static str> = [
        ("component", component.is_some()),
        ("runNumber", run_number.is_some()),
        ("problems", inputs.problems.is_some()),
        ("file", file_chosen),
    ]
    .into_iter()
    .filter(|(_, ok)| !ok)
    .map(|(name, _)| name)
    .collect();

    match (draft, component, run_number, inputs.problems) {
        (Some(draft), Some(component), Some(run_number), Some(problems)) if missing.is_empty() => {
            Ok(TestRecord {
                component,
                test_type: TEST_TYPE.to_string(),
                institution: draft.institution.clone(),
                run_number,
                date: draft.date.clone(),
                passed: draft.passed,
                problems,
                properties: draft.properties.clone(),
                results: draft.results.clone(),
            })
        }
        _ => Err(ValidationError { missing }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn draft(file: Option<&Path>) -> RecordDraft {
        let grades = vec![1, 2, 4, 1];
        let strengths = vec![3.0, 6.0, 10.0, 20.0];
        let metrics = Metrics::compute(&grades, &strengths).unwrap();
        let metadata = TestMetadata {
            operator: "J. Smith".to_string(),
            timestamp_utc: Utc.timestamp_millis_opt(1_636_129_007_434).unwrap(),
        };
        RecordDraft::new(
            &metrics,
            &metadata,
            grades,
            strengths,
            false,
            file,
            &SiteConfig::default(),
        )
    }

    fn inputs() -> UserInputs {
        UserInputs {
            component: Some("20USES50900418".into()),
            run_number: Some("3".into()),
            problems: Some(false),
        }
    }

    #[test]
    fn test_record_matches_upload_schema() {
        let d = draft(Some(Path::new("/data/pull.csv")));
        let record = build_record(Some(&d), &inputs()).unwrap();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["component"], "20USES50900418");
        assert_eq!(value["testType"], "PULL_TEST");
        assert_eq!(value["institution"], "SFU");
        assert_eq!(value["runNumber"], "3");
        assert_eq!(value["date"], "2021-11-05T16:16:47.434Z");
        assert_eq!(value["passed"], false);
        assert_eq!(value["problems"], false);
        assert_eq!(
            value["properties"],
            json!({
                "OPERATOR": "J. Smith",
                "PULL_TEST_MACHINE": "Dage Series 4000",
                "NUMBER_WIRES": 4,
                "WIRE_BOND_MACHINE": "Delvotec G5"
            })
        );

        let results = &value["results"];
        assert_eq!(results["MEAN"], 9.75);
        assert_eq!(results["PULL_STRENGTH"], json!([3.0, 6.0, 10.0, 20.0]));
        assert_eq!(results["PULL_GRADE"], json!([1, 2, 4, 1]));
        assert_eq!(results["TOO_LOW"], 1);
        assert_eq!(results["MINIMUM_STRENGTH"], 3.0);
        assert_eq!(results["MAXIMUM_STRENGTH"], 20.0);
        assert_eq!(results["HEEL_BREAKS"], 75.0);
        assert_eq!(results["FILE"], "/data/pull.csv");
        assert!(results["STANDARD_DEVIATION"].is_f64());
    }

    #[test]
    fn test_draft_without_file_serializes_null() {
        let d = draft(None);
        let value = serde_json::to_value(&d.results).unwrap();
        assert!(value["FILE"].is_null());
    }

    #[test]
    fn test_nothing_entered_lists_all_fields() {
        let err = build_record(None, &UserInputs::default()).unwrap_err();
        assert_eq!(err.missing, vec!["component", "runNumber", "problems", "file"]);
    }

    #[test]
    fn test_blank_strings_count_as_missing() {
        let d = draft(Some(Path::new("pull.csv")));
        let entered = UserInputs {
            component: Some("   ".into()),
            run_number: Some(String::new()),
            ..inputs()
        };

        let err = build_record(Some(&d), &entered).unwrap_err();
        assert_eq!(err.missing, vec!["component", "runNumber"]);
    }

    #[test]
    fn test_problems_must_be_selected() {
        let d = draft(Some(Path::new("pull.csv")));
        let entered = UserInputs {
            problems: None,
            ..inputs()
        };

        let err = build_record(Some(&d), &entered).unwrap_err();
        assert_eq!(err.missing, vec!["problems"]);
    }

    #[test]
    fn test_draft_without_file_is_not_submittable() {
        let d = draft(None);
        let err = build_record(Some(&d), &inputs()).unwrap_err();
        assert_eq!(err.missing, vec!["file"]);
    }

    #[test]
    fn test_inputs_are_trimmed() {
        let d = draft(Some(Path::new("pull.csv")));
        let entered = UserInputs {
            component: Some(" 20USES50900418 ".into()),
            ..inputs()
        };

        let record = build_record(Some(&d), &entered).unwrap();
        assert_eq!(record.component, "20USES50900418");
    }
}
