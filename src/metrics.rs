//! Summary statistics over one pull test.

use serde::Serialize;

use crate::error::MetricsError;

/// Pulls strictly below this strength (grams) count as too low.
pub const TOO_LOW_THRESHOLD: f64 = 5.0;

/// Grade codes the tester assigns to a break at the bond heel.
pub const HEEL_BREAK_GRADES: [i64; 3] = [1, 2, 3];

/// Derived statistics for a pull test. All arithmetic is `f64` and nothing is
/// rounded; rounding is left to presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (divides by N).
    pub std_dev: f64,
    pub below_threshold_count: usize,
    pub heel_break_percent: f64,
}

impl Metrics {
    /// Computes metrics from parallel grade and strength sequences.
    ///
    /// # Errors
    ///
    /// [`MetricsError::EmptyInput`] when there are no wires, and
    /// [`MetricsError::LengthMismatch`] when the sequences differ in length.
    pub fn compute(grades: &[i64], strengths: &[f64]) -> Result<Self, MetricsError> {
        if grades.len() != strengths.len() {
            return Err(MetricsError::LengthMismatch {
                grades: grades.len(),
                strengths: strengths.len(),
            });
        }
        if strengths.is_empty() {
            return Err(MetricsError::EmptyInput);
        }

        let min = strengths.iter().copied().fold(f64::INFINITY, f64::min);
        let max = strengths.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        // Summation rounding can push the mean one ulp outside the range.
        let mean = match mean(strengths) {
            m if m < min => min,
            m if m > max => max,
            m => m,
        };

        Ok(Metrics {
            count: strengths.len(),
            mean,
            min,
            max,
            std_dev: population_std_dev(strengths, mean),
            below_threshold_count: count_below(strengths, TOO_LOW_THRESHOLD),
            heel_break_percent: percent_in(grades, &HEEL_BREAK_GRADES),
        })
    }
}

/// Arithmetic mean. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

pub fn count_below(values: &[f64], threshold: f64) -> usize {
    values.iter().filter(|&&v| v < threshold).count()
}

/// Percentage (0-100) of `codes` that appear in `wanted`.
/// Returns 0.0 for empty input.
pub fn percent_in(codes: &[i64], wanted: &[i64]) -> f64 {
    if codes.is_empty() {
        return 0.0;
    }
    let hits = codes.iter().filter(|c| wanted.contains(*c)).count();
    hits as f64 / codes.len() as f64 * 100.0
}
