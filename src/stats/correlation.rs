//! Pairwise Pearson correlation.

use crate::data::column::numeric_values;
use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Square correlation matrix; `values[i][j]` pairs `columns[i]` with `columns[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Pearson correlation over rows where both values are present.
///
/// NaN when fewer than two such rows exist or either side has no variance.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let (x, y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if x.len() < 2 {
        return f64::NAN;
    }

    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if sx == 0.0 || sy == 0.0 {
        return f64::NAN;
    }

    let r = x.iter().covariance(y.iter()) / (sx * sy);
    r.clamp(-1.0, 1.0)
}

/// Correlation matrix of the given numeric columns.
///
/// The diagonal is exactly 1.0 and the lower triangle mirrors the upper one.
pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix> {
    let data = columns
        .iter()
        .map(|&name| numeric_values(df, name))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let n = columns.len();
    let mut values = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}
