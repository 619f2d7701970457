//! Operator-facing presentation of analysis results and records.
//!
//! Values are rounded to two decimals here only; records keep full precision.

use tracing::debug;

use crate::pipeline::Analysis;

/// Multi-line summary of an analysed test, as shown to the operator.
pub fn summary(analysis: &Analysis, site_bonder: &str, site_tester: &str) -> String {
    let m = &analysis.metrics;
    let mut lines = vec![
        format!("Operator:                {}", analysis.metadata.operator),
        format!("Date:                    {}", analysis.metadata.timestamp_iso()),
        format!("Bonder:                  {site_bonder}"),
        format!("Tester:                  {site_tester}"),
        format!("Number of wires:         {}", m.count),
        format!("Number under threshold:  {}", m.below_threshold_count),
        format!("% heel breaks:           {:0.2}", m.heel_break_percent),
        format!("Min:                     {:0.2}", m.min),
        format!("Mean:                    {:0.2}", m.mean),
        format!("Max:                     {:0.2}", m.max),
        format!("St. dev:                 {:0.2}", m.std_dev),
    ];

    if analysis.verdict.passed() {
        lines.push("Test passed all parameters.".to_string());
    } else {
        lines.push("Test failed on one or more parameters:".to_string());
        lines.extend(
            analysis
                .verdict
                .failed
                .iter()
                .map(|c| format!("  - {}", c.describe())),
        );
    }

    lines.join("\n")
}

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Criterion, Verdict};
    use crate::config::SiteConfig;
    use crate::metrics::Metrics;
    use crate::reader::TestMetadata;
    use crate::record::RecordDraft;
    use chrono::TimeZone;
    use chrono::Utc;

    fn analysis(failed: Vec<Criterion>) -> Analysis {
        let grades = vec![1, 2, 4, 1];
        let strengths = vec![3.0, 6.0, 10.0, 20.0];
        let metrics = Metrics::compute(&grades, &strengths).unwrap();
        let metadata = TestMetadata {
            operator: "J. Smith".into(),
            timestamp_utc: Utc.with_ymd_and_hms(2021, 11, 5, 16, 16, 47).unwrap(),
        };
        let verdict = Verdict { failed };
        let draft = RecordDraft::new(
            &metrics,
            &metadata,
            grades,
            strengths,
            verdict.passed(),
            None,
            &SiteConfig::default(),
        );
        Analysis {
            metadata,
            metrics,
            verdict,
            draft,
        }
    }

    #[test]
    fn test_summary_rounds_to_two_decimals() {
        let text = summary(&analysis(vec![]), "Delvotec G5", "Dage Series 4000");

        assert!(text.contains("St. dev:                 6.42"));
        assert!(text.contains("Mean:                    9.75"));
        assert!(text.contains("% heel breaks:           75.00"));
        assert!(text.contains("Test passed all parameters."));
    }

    #[test]
    fn test_summary_lists_failed_criteria() {
        let text = summary(
            &analysis(vec![Criterion::MinimumStrength, Criterion::StandardDeviation]),
            "b",
            "t",
        );

        assert!(text.contains("Test failed on one or more parameters"));
        assert!(text.contains("minimum pull strength below limit"));
        assert!(text.contains("standard deviation above limit"));
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&analysis(vec![]).metrics);
    }
}
