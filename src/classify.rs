//! Pass/fail classification of a pull test.
//!
//! | Criterion          | Pass when   |
//! |--------------------|-------------|
//! | minimum strength   | >= 5.0 g    |
//! | heel breaks        | >= 0.9 %    |
//! | mean strength      | >= 8.0 g    |
//! | standard deviation | <= 1.5 g    |
//! | wire count         | >= 0        |
//!
//! All comparisons are inclusive. The wire-count floor of zero can never fail
//! for a parsed file; it is kept as written in the engineering threshold
//! table until the intended minimum is confirmed.

use serde::{Deserialize, Serialize};

use crate::metrics::Metrics;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub min_strength: f64,
    pub min_heel_break_percent: f64,
    pub min_mean: f64,
    pub max_std_dev: f64,
    pub min_wires: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_strength: 5.0,
            min_heel_break_percent: 0.9,
            min_mean: 8.0,
            max_std_dev: 1.5,
            min_wires: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    MinimumStrength,
    HeelBreaks,
    MeanStrength,
    StandardDeviation,
    WireCount,
}

impl Criterion {
    pub fn describe(&self) -> &'static str {
        match self {
            Criterion::MinimumStrength => "minimum pull strength below limit",
            Criterion::HeelBreaks => "too few heel breaks",
            Criterion::MeanStrength => "mean pull strength below limit",
            Criterion::StandardDeviation => "standard deviation above limit",
            Criterion::WireCount => "too few wires pulled",
        }
    }
}

/// Outcome of applying [`Thresholds`] to a set of metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub failed: Vec<Criterion>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Thresholds {
    pub fn evaluate(&self, m: &Metrics) -> Verdict {
        let checks = [
            (Criterion::MinimumStrength, m.min >= self.min_strength),
            (
                Criterion::HeelBreaks,
                m.heel_break_percent >= self.min_heel_break_percent,
            ),
            (Criterion::MeanStrength, m.mean >= self.min_mean),
            (Criterion::StandardDeviation, m.std_dev <= self.max_std_dev),
            (Criterion::WireCount, m.count >= self.min_wires),
        ];

        Verdict {
            failed: checks
                .into_iter()
                .filter(|(_, ok)| !ok)
                .map(|(criterion, _)| criterion)
                .collect(),
        }
    }
}

/// Classifies metrics against the default engineering thresholds.
pub fn classify(metrics: &Metrics) -> bool {
    Thresholds::default().evaluate(metrics).passed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(min: f64, heel: f64, mean: f64, sd: f64) -> Metrics {
        Metrics {
            count: 10,
            mean,
            min,
            max: mean + 2.0,
            std_dev: sd,
            below_threshold_count: 0,
            heel_break_percent: heel,
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(classify(&metrics(5.0, 0.9, 8.0, 1.5)));
    }

    #[test]
    fn test_reference_example_fails_on_minimum() {
        let m = Metrics::compute(&[1, 2, 4, 1], &[3.0, 6.0, 10.0, 20.0]).unwrap();
        let verdict = Thresholds::default().evaluate(&m);

        assert!(!classify(&m));
        assert!(verdict.failed.contains(&Criterion::MinimumStrength));
    }

    #[test]
    fn test_each_criterion_fails_alone() {
        let cases = [
            (metrics(4.99, 0.9, 8.0, 1.5), Criterion::MinimumStrength),
            (metrics(5.0, 0.89, 8.0, 1.5), Criterion::HeelBreaks),
            (metrics(5.0, 0.9, 7.99, 1.5), Criterion::MeanStrength),
            (metrics(5.0, 0.9, 8.0, 1.51), Criterion::StandardDeviation),
        ];

        for (m, expected) in cases {
            let verdict = Thresholds::default().evaluate(&m);
            assert_eq!(verdict.failed, vec![expected]);
            assert!(!verdict.passed());
        }
    }

    #[test]
    fn test_wire_count_floor_never_fails_by_default() {
        let mut m = metrics(5.0, 0.9, 8.0, 1.5);
        m.count = 1;
        assert!(classify(&m));
    }

    #[test]
    fn test_configured_wire_count_floor() {
        let thresholds = Thresholds {
            min_wires: 20,
            ..Default::default()
        };
        let verdict = thresholds.evaluate(&metrics(5.0, 0.9, 8.0, 1.5));
        assert_eq!(verdict.failed, vec![Criterion::WireCount]);
    }
}
