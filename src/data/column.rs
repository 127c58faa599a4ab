//! Typed access to DataFrame columns.
//!
//! Every aggregate in the crate pulls plain vectors out of the frame through
//! these helpers, so schema problems are reported the same way everywhere.

use crate::error::SchemaError;
use polars::prelude::*;

/// Whether a dtype holds numbers the statistics can use.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Look up a column, mapping absence to a schema error.
pub fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, SchemaError> {
    df.column(name).map_err(|_| SchemaError::MissingColumn {
        column: name.to_string(),
    })
}

fn wrong_type(column: &Column, expected: &'static str) -> SchemaError {
    SchemaError::WrongType {
        column: column.name().to_string(),
        expected,
        found: column.dtype().to_string(),
    }
}

/// Names of all numeric columns, in frame order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Values of a numeric column as `f64`, nulls kept as `None`.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, SchemaError> {
    let column = require(df, name)?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(wrong_type(column, "numeric"));
    }

    let as_f64 = column
        .cast(&DataType::Float64)
        .map_err(|_| wrong_type(column, "numeric"))?;
    let ca = as_f64.f64().map_err(|_| wrong_type(column, "numeric"))?;

    Ok(ca.into_iter().collect())
}

/// Non-null values of a numeric column.
pub fn present_numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, SchemaError> {
    Ok(numeric_values(df, name)?.into_iter().flatten().collect())
}

/// Values of an integer column as `i64`.
pub fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, SchemaError> {
    let column = require(df, name)?;
    if !is_integer_dtype(column.dtype()) {
        return Err(wrong_type(column, "integer"));
    }

    let as_i64 = column
        .cast(&DataType::Int64)
        .map_err(|_| wrong_type(column, "integer"))?;
    let ca = as_i64.i64().map_err(|_| wrong_type(column, "integer"))?;

    Ok(ca.into_iter().collect())
}

/// Values of a column rendered as text.
///
/// String columns are returned as-is; other types are cast, so counting a
/// numeric column such as `Price range` works the same as counting a label.
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, SchemaError> {
    let column = require(df, name)?;

    let as_text = match column.dtype() {
        DataType::String => column.clone(),
        _ => column
            .cast(&DataType::String)
            .map_err(|_| wrong_type(column, "text"))?,
    };
    let ca = as_text.str().map_err(|_| wrong_type(column, "text"))?;

    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Values of a column that must already be text.
pub fn strict_text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, SchemaError> {
    let column = require(df, name)?;
    if column.dtype() != &DataType::String {
        return Err(wrong_type(column, "text"));
    }
    text_values(df, name)
}

/// Number of null entries in a column.
pub fn null_count(df: &DataFrame, name: &str) -> Result<usize, SchemaError> {
    Ok(require(df, name)?.null_count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "Votes" => [Some(10i64), None, Some(3)],
            "City" => [Some("Goa"), Some("Pune"), None],
            "Aggregate rating" => [4.5f64, 3.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_numeric_values_keep_nulls() {
        let df = sample();
        let votes = numeric_values(&df, "Votes").unwrap();
        assert_eq!(votes, vec![Some(10.0), None, Some(3.0)]);
        assert_eq!(present_numeric_values(&df, "Votes").unwrap(), vec![10.0, 3.0]);
    }

    #[test]
    fn test_numeric_values_reject_text() {
        let df = sample();
        let err = numeric_values(&df, "City").unwrap_err();
        assert!(matches!(err, SchemaError::WrongType { expected: "numeric", .. }));
    }

    #[test]
    fn test_missing_column() {
        let df = sample();
        let err = text_values(&df, "Currency").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                column: "Currency".to_string()
            }
        );
    }

    #[test]
    fn test_text_values_cast_numbers() {
        let df = sample();
        let votes = text_values(&df, "Votes").unwrap();
        assert_eq!(votes, vec![Some("10".to_string()), None, Some("3".to_string())]);
        assert!(strict_text_values(&df, "Votes").is_err());
    }

    #[test]
    fn test_numeric_columns_in_order() {
        let df = sample();
        assert_eq!(numeric_columns(&df), vec!["Votes", "Aggregate rating"]);
        assert_eq!(null_count(&df, "City").unwrap(), 1);
    }
}
