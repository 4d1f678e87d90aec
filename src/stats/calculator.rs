//! Statistics Calculator Module
//! Handles sums, means and the descriptive summary shown next to the metrics.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn empty(column: &str) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            p25: 0.0,
            median: 0.0,
            p75: 0.0,
            max: 0.0,
        }
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    pub fn sum(values: &[f64]) -> f64 {
        values.iter().sum()
    }

    /// Arithmetic mean; an empty slice averages to 0.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        Self::sum(values) / values.len() as f64
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(column: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::empty(column);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        // Sample standard deviation; a single observation has no spread
        let std = if n > 1 {
            Statistics::std_dev(values.iter())
        } else {
            0.0
        };

        ColumnSummary {
            column: column.to_string(),
            count: n,
            mean: Self::mean(values),
            std,
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(StatsCalculator::mean(&[]), 0.0);
        assert_eq!(StatsCalculator::sum(&[]), 0.0);
    }

    #[test]
    fn descriptive_stats_for_three_values() {
        let s = StatsCalculator::compute_descriptive_stats("Waste_kg", &[320.0, 280.0, 300.0]);
        assert_eq!(s.count, 3);
        assert!((s.mean - 300.0).abs() < 1e-9);
        assert!((s.std - 20.0).abs() < 1e-9);
        assert_eq!(s.min, 280.0);
        assert_eq!(s.p25, 290.0);
        assert_eq!(s.median, 300.0);
        assert_eq!(s.p75, 310.0);
        assert_eq!(s.max, 320.0);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let s = StatsCalculator::compute_descriptive_stats("Energy_kWh", &[15000.0]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, 0.0);
        assert_eq!(s.median, 15000.0);
    }

    #[test]
    fn empty_column_summary_is_zeroed() {
        let s = StatsCalculator::compute_descriptive_stats("Energy_kWh", &[]);
        assert_eq!(s, ColumnSummary::empty("Energy_kWh"));
    }
}
