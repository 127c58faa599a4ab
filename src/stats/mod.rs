//! Stats module - descriptive statistics, correlation and grouping

mod calculator;
mod correlation;
pub mod density;
mod grouping;

pub use calculator::{BoxSummary, ColumnSummary, Description, StatsCalculator};
pub use correlation::{correlation_matrix, pearson, CorrelationMatrix};
pub use grouping::{
    column_info, group_by_mean, joined_text, mean_by, sort_category_keys, token_frequencies, top_n,
    value_counts,
    ColumnInfo, GroupMeanRow, GroupMeans, ValueCounts,
};

/// `describe()` of the given numeric columns.
pub fn describe(df: &polars::prelude::DataFrame, columns: &[&str]) -> crate::error::Result<Description> {
    StatsCalculator::describe(df, columns)
}
