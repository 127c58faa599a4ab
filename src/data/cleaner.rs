//! Missing value imputation for the joined table.

use crate::data::column::{numeric_values, require, strict_text_values};
use crate::data::schema::{AGGREGATE_RATING, CUISINES};
use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use tracing::info;

/// What the cleaner changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub cuisines_filled: usize,
    pub ratings_filled: usize,
    /// Mean of the ratings present before imputation
    pub rating_mean: Option<f64>,
}

/// Fills missing cuisines with a placeholder label and missing ratings with
/// the mean rating.
///
/// The mean is taken over every non-missing rating of the frame it is given,
/// before anything is filled. The pipeline hands it the full joined table, so
/// country subsets later on inherit the global mean, not their own.
pub struct Cleaner {
    placeholder: String,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new("Others")
    }
}

impl Cleaner {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    pub fn clean(&self, df: &DataFrame) -> Result<(DataFrame, CleanReport)> {
        let cuisines_filled = strict_text_values(df, CUISINES)?
            .iter()
            .filter(|v| v.is_none())
            .count();

        let ratings = numeric_values(df, AGGREGATE_RATING)?;
        let present: Vec<f64> = ratings.iter().flatten().copied().collect();
        let ratings_filled = ratings.len() - present.len();
        let rating_mean = if present.is_empty() {
            None
        } else {
            Some(present.iter().sum::<f64>() / present.len() as f64)
        };

        let mut lazy = df.clone().lazy();
        if cuisines_filled > 0 {
            lazy = lazy.with_column(col(CUISINES).fill_null(lit(self.placeholder.as_str())));
        }
        let ratings_filled = match rating_mean {
            Some(mean) if ratings_filled > 0 => {
                let dtype = require(df, AGGREGATE_RATING)?.dtype().clone();
                // Integer ratings would truncate the mean
                let rating = if dtype == DataType::Float64 {
                    col(AGGREGATE_RATING)
                } else {
                    col(AGGREGATE_RATING).cast(DataType::Float64)
                };
                lazy = lazy.with_column(rating.fill_null(lit(mean)));
                ratings_filled
            }
            _ => 0,
        };

        let cleaned = lazy.collect()?;
        let report = CleanReport {
            cuisines_filled,
            ratings_filled,
            rating_mean,
        };

        info!(
            "Imputed {} cuisines with '{}' and {} ratings with mean {:?}",
            report.cuisines_filled, self.placeholder, report.ratings_filled, report.rating_mean
        );
        Ok((cleaned, report))
    }
}
