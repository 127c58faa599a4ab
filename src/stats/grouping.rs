//! Group-by means, value counts and other categorical summaries.

use crate::data::column::{numeric_columns, numeric_values, require, text_values};
use crate::error::Result;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Mean of each value column within one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeanRow {
    pub key: String,
    pub count: usize,
    /// Aligned with `GroupMeans::value_columns`; NaN when the group has no values
    pub means: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeans {
    pub key_column: String,
    pub value_columns: Vec<String>,
    /// Sorted by key, ascending (numerically for numeric keys)
    pub rows: Vec<GroupMeanRow>,
}

impl GroupMeans {
    /// Mean of `value_column` for category `key`.
    pub fn mean(&self, key: &str, value_column: &str) -> Option<f64> {
        let j = self.value_columns.iter().position(|c| c == value_column)?;
        let row = self.rows.iter().find(|r| r.key == key)?;
        Some(row.means[j])
    }
}

/// Distinct values with their occurrence counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCounts {
    pub column: String,
    /// Descending by count; equal counts keep first-encounter order
    pub entries: Vec<(String, usize)>,
}

impl ValueCounts {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn get(&self, value: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, n)| *n)
    }

    pub fn truncated(mut self, n: usize) -> Self {
        self.entries.truncate(n);
        self
    }
}

/// One line of `DataFrame.info()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
}

/// Mean of every other numeric column for each distinct value of `key`.
///
/// Rows with a null key are left out, as are nulls inside each value column.
pub fn group_by_mean(df: &DataFrame, key: &str) -> Result<GroupMeans> {
    let value_columns: Vec<String> = numeric_columns(df)
        .into_iter()
        .filter(|c| c != key)
        .collect();
    grouped_means(df, key, value_columns)
}

/// Mean of a single value column per category of `key` (plotly's `histfunc="avg"`).
pub fn mean_by(df: &DataFrame, key: &str, value: &str) -> Result<GroupMeans> {
    grouped_means(df, key, vec![value.to_string()])
}

fn grouped_means(df: &DataFrame, key: &str, value_columns: Vec<String>) -> Result<GroupMeans> {
    let keys = text_values(df, key)?;
    let columns = value_columns
        .iter()
        .map(|name| numeric_values(df, name))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // per key: row count, then (sum, n) per value column
    let mut groups: BTreeMap<String, (usize, Vec<(f64, usize)>)> = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        let Some(key) = key else { continue };
        let entry = groups
            .entry(key.clone())
            .or_insert_with(|| (0, vec![(0.0, 0); columns.len()]));
        entry.0 += 1;
        for (acc, column) in entry.1.iter_mut().zip(&columns) {
            if let Some(v) = column[row] {
                acc.0 += v;
                acc.1 += 1;
            }
        }
    }

    let mut groups: Vec<_> = groups.into_iter().collect();
    sort_category_keys(&mut groups);

    let rows = groups
        .into_iter()
        .map(|(key, (count, sums))| GroupMeanRow {
            key,
            count,
            means: sums
                .into_iter()
                .map(|(sum, n)| if n == 0 { f64::NAN } else { sum / n as f64 })
                .collect(),
        })
        .collect();

    Ok(GroupMeans {
        key_column: key.to_string(),
        value_columns,
        rows,
    })
}

/// Sort categories by key, numerically when every key parses as a number
/// ("1" < "2" < "10"), otherwise as text.
pub fn sort_category_keys<T>(entries: &mut [(String, T)]) {
    let numeric: Option<Vec<f64>> = entries.iter().map(|(k, _)| k.trim().parse::<f64>().ok()).collect();
    match numeric {
        Some(_) => entries.sort_by(|a, b| {
            let a = a.0.trim().parse::<f64>().unwrap_or(f64::NAN);
            let b = b.0.trim().parse::<f64>().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }),
        None => entries.sort_by(|a, b| a.0.cmp(&b.0)),
    }
}

/// Count occurrences of each distinct value, most frequent first.
fn count_in_order<I: IntoIterator<Item = String>>(column: &str, values: I) -> ValueCounts {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(String, usize)> = Vec::new();

    for value in values {
        match index.get(&value) {
            Some(&i) => entries[i].1 += 1,
            None => {
                index.insert(value.clone(), entries.len());
                entries.push((value, 1));
            }
        }
    }

    // stable sort keeps encounter order among ties
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    ValueCounts {
        column: column.to_string(),
        entries,
    }
}

/// Occurrence count of every non-null value of `column`.
pub fn value_counts(df: &DataFrame, column: &str) -> Result<ValueCounts> {
    let values = text_values(df, column)?;
    Ok(count_in_order(column, values.into_iter().flatten()))
}

/// The `n` most frequent values of `column`.
pub fn top_n(df: &DataFrame, column: &str, n: usize) -> Result<ValueCounts> {
    Ok(value_counts(df, column)?.truncated(n))
}

/// Count the items of a delimited list column, e.g. `"North Indian, Chinese"`.
pub fn token_frequencies(df: &DataFrame, column: &str, separator: char) -> Result<ValueCounts> {
    let values = text_values(df, column)?;
    let tokens = values.into_iter().flatten().flat_map(|list| {
        list.split(separator)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect::<Vec<_>>()
    });
    Ok(count_in_order(column, tokens))
}

/// Non-null values of `column` joined into one string.
pub fn joined_text(df: &DataFrame, column: &str, separator: &str) -> Result<String> {
    let values: Vec<String> = text_values(df, column)?.into_iter().flatten().collect();
    Ok(values.join(separator))
}

/// Name, dtype and non-null count of every column.
pub fn column_info(df: &DataFrame) -> Result<Vec<ColumnInfo>> {
    df.get_column_names()
        .into_iter()
        .map(|name| {
            let column = require(df, name.as_str())?;
            Ok(ColumnInfo {
                name: name.to_string(),
                dtype: column.dtype().to_string(),
                non_null: column.len() - column.null_count(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{AVERAGE_COST_FOR_TWO, CITY, CUISINES, RATING_TEXT, VOTES};

    fn sample() -> DataFrame {
        df!(
            RATING_TEXT => [Some("Poor"), Some("Good"), Some("Poor"), None, Some("Good")],
            AVERAGE_COST_FOR_TWO => [Some(100i64), Some(500), Some(300), Some(50), None],
            VOTES => [1i64, 20, 3, 0, 40],
            CITY => ["Noida", "Gurgaon", "Noida", "Delhi", "Gurgaon"],
        )
        .unwrap()
    }

    #[test]
    fn test_group_by_mean_per_category() {
        let means = group_by_mean(&sample(), RATING_TEXT).unwrap();

        assert_eq!(means.value_columns, vec![AVERAGE_COST_FOR_TWO, VOTES]);
        assert_eq!(means.rows.len(), 2);
        assert_eq!(means.rows[0].key, "Good");
        assert_eq!(means.mean("Poor", AVERAGE_COST_FOR_TWO), Some(200.0));
        assert_eq!(means.mean("Good", AVERAGE_COST_FOR_TWO), Some(500.0));
        assert_eq!(means.mean("Good", VOTES), Some(30.0));
        assert_eq!(means.rows[1].count, 2);
    }

    #[test]
    fn test_mean_by_single_column() {
        let means = mean_by(&sample(), CITY, VOTES).unwrap();
        assert_eq!(means.value_columns, vec![VOTES]);
        assert_eq!(means.mean("Gurgaon", VOTES), Some(30.0));
        assert_eq!(means.mean("Delhi", VOTES), Some(0.0));
    }

    #[test]
    fn test_group_by_mean_numeric_keys_in_numeric_order() {
        let df = df!(
            "Price range" => ["10", "2", "1", "2", "10"],
            VOTES => [5i64, 2, 1, 4, 15],
        )
        .unwrap();
        let means = group_by_mean(&df, "Price range").unwrap();

        let keys: Vec<&str> = means.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "10"]);
        assert_eq!(means.mean("10", VOTES), Some(10.0));
    }

    #[test]
    fn test_sort_category_keys_text_fallback() {
        let mut entries = vec![("b".to_string(), 1), ("10".to_string(), 2), ("a".to_string(), 3)];
        sort_category_keys(&mut entries);
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["10", "a", "b"]);
    }

    #[test]
    fn test_value_counts_order_and_total() {
        let counts = value_counts(&sample(), RATING_TEXT).unwrap();
        assert_eq!(
            counts.entries,
            vec![("Poor".to_string(), 2), ("Good".to_string(), 2)]
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_value_counts_descending() {
        let df = df!(CITY => ["A", "B", "B", "C", "B", "C"]).unwrap();
        let counts = value_counts(&df, CITY).unwrap();
        let order: Vec<&str> = counts.entries.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_top_n() {
        let top = top_n(&sample(), CITY, 1).unwrap();
        assert_eq!(top.entries, vec![("Noida".to_string(), 2)]);
    }

    #[test]
    fn test_numeric_value_counts() {
        let counts = value_counts(&sample(), VOTES).unwrap();
        assert_eq!(counts.get("20"), Some(1));
    }

    #[test]
    fn test_token_frequencies_and_text() {
        let df = df!(CUISINES => ["North Indian, Chinese", "North Indian", "Italian, Chinese"]).unwrap();
        let tokens = token_frequencies(&df, CUISINES, ',').unwrap();
        assert_eq!(tokens.get("North Indian"), Some(2));
        assert_eq!(tokens.get("Chinese"), Some(2));
        assert_eq!(tokens.entries[0].0, "North Indian");

        let text = joined_text(&df, CUISINES, " ").unwrap();
        assert_eq!(text, "North Indian, Chinese North Indian Italian, Chinese");
    }

    #[test]
    fn test_column_info() {
        let info = column_info(&sample()).unwrap();
        assert_eq!(info.len(), 4);
        assert_eq!(info[0].name, RATING_TEXT);
        assert_eq!(info[0].non_null, 4);
        assert_eq!(info[2].dtype, "i64");
    }
}
