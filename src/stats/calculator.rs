//! Statistics Calculator Module
//! Descriptive statistics of numeric columns.

use crate::data::column::present_numeric_values;
use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Summary of one numeric column (nulls excluded).
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
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// `describe()` over several columns, in the requested order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Description {
    pub columns: Vec<ColumnSummary>,
}

impl Description {
    pub fn get(&self, column: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|s| s.column == column)
    }
}

/// Five-number summary used to draw box and violin plots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within 1.5 IQR of q1
    pub whisker_low: f64,
    /// Highest value within 1.5 IQR of q3
    pub whisker_high: f64,
    pub mean: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn summarize(column: &str, values: &[f64]) -> ColumnSummary {
        let n = values.len();
        if n == 0 {
            return ColumnSummary::empty(column);
        }

        let sorted = Self::sorted(values);

        ColumnSummary {
            column: column.to_string(),
            count: n,
            mean: values.iter().mean(),
            // Sample standard deviation; NaN for a single value
            std: values.iter().std_dev(),
            min: sorted[0],
            p25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Describe the given numeric columns of a frame.
    pub fn describe(df: &DataFrame, columns: &[&str]) -> Result<Description> {
        let columns = columns
            .iter()
            .map(|&name| {
                let values = present_numeric_values(df, name)?;
                Ok(Self::summarize(name, &values))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Description { columns })
    }

    /// Quartiles, whiskers and mean of a sample. `None` when empty.
    pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
        if values.is_empty() {
            return None;
        }

        let sorted = Self::sorted(values);
        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= q1 - 1.5 * iqr)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= q3 + 1.5 * iqr)
            .unwrap_or(q3);

        Some(BoxSummary {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            mean: values.iter().sum::<f64>() / values.len() as f64,
        })
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
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

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_summarize_matches_pandas() {
        // pandas: pd.Series([1, 2, 3, 4, 100]).describe()
        let s = StatsCalculator::summarize("x", &[4.0, 1.0, 100.0, 3.0, 2.0]);
        assert_eq!(s.count, 5);
        assert!(close(s.mean, 22.0));
        assert!(close(s.std, 1902.5f64.sqrt()));
        assert_eq!(s.min, 1.0);
        assert_eq!(s.p25, 2.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.p75, 4.0);
        assert_eq!(s.max, 100.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(close(StatsCalculator::percentile(&sorted, 25.0), 1.75));
        assert!(close(StatsCalculator::percentile(&sorted, 50.0), 2.5));
        assert!(StatsCalculator::percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_empty_and_single() {
        let empty = StatsCalculator::summarize("x", &[]);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());

        let one = StatsCalculator::summarize("x", &[7.0]);
        assert_eq!(one.median, 7.0);
        assert!(one.std.is_nan());
    }

    #[test]
    fn test_describe_skips_nulls_and_keeps_outliers() {
        let df = df!(
            "Average Cost for two" => [Some(100.0f64), None, Some(800000.0), Some(300.0)]
        )
        .unwrap();
        let d = StatsCalculator::describe(&df, &["Average Cost for two"]).unwrap();
        let cost = d.get("Average Cost for two").unwrap();
        assert_eq!(cost.count, 3);
        assert_eq!(cost.max, 800000.0);
    }

    #[test]
    fn test_describe_text_column_fails() {
        let df = df!("City" => ["Goa"]).unwrap();
        assert!(StatsCalculator::describe(&df, &["City"]).is_err());
    }

    #[test]
    fn test_box_summary_whiskers_exclude_outliers() {
        let b = StatsCalculator::box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 4.0);
        assert!(StatsCalculator::box_summary(&[]).is_none());
    }
}
