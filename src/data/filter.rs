//! Row filtering by conjunctive column predicates.

use crate::data::column::{is_numeric_dtype, require};
use crate::error::{Result, SchemaError};
use polars::prelude::*;
use std::fmt;
use std::str::FromStr;

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl FilterValue {
    fn is_text(&self) -> bool {
        matches!(self, FilterValue::Text(_))
    }

    fn to_lit(&self) -> Expr {
        match self {
            FilterValue::Text(s) => lit(s.as_str()),
            FilterValue::Int(i) => lit(*i),
            FilterValue::Float(f) => lit(*f),
        }
    }

    /// Parse a literal: integers first, then floats, otherwise text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(i) = raw.parse::<i64>() {
            FilterValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            FilterValue::Float(f)
        } else {
            FilterValue::Text(raw.to_string())
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => write!(f, "{s}"),
            FilterValue::Int(i) => write!(f, "{i}"),
            FilterValue::Float(x) => write!(f, "{x}"),
        }
    }
}

/// A single-column condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Column equals the value
    Eq { column: String, value: FilterValue },
    /// Column lies in `[min, max]`
    Range {
        column: String,
        min: FilterValue,
        max: FilterValue,
    },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn range(
        column: impl Into<String>,
        min: impl Into<FilterValue>,
        max: impl Into<FilterValue>,
    ) -> Self {
        Predicate::Range {
            column: column.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } | Predicate::Range { column, .. } => column,
        }
    }

    fn values(&self) -> Vec<&FilterValue> {
        match self {
            Predicate::Eq { value, .. } => vec![value],
            Predicate::Range { min, max, .. } => vec![min, max],
        }
    }

    /// Check the predicate against the frame's schema.
    fn validate(&self, df: &DataFrame) -> std::result::Result<(), SchemaError> {
        let column = require(df, self.column())?;
        let dtype = column.dtype();

        for value in self.values() {
            let compatible = if value.is_text() {
                dtype == &DataType::String
            } else {
                is_numeric_dtype(dtype)
            };
            if !compatible {
                return Err(SchemaError::WrongType {
                    column: self.column().to_string(),
                    expected: if value.is_text() { "text" } else { "numeric" },
                    found: dtype.to_string(),
                });
            }
        }
        Ok(())
    }

    fn to_expr(&self) -> Expr {
        match self {
            Predicate::Eq { column, value } => col(column.as_str()).eq(value.to_lit()),
            Predicate::Range { column, min, max } => col(column.as_str())
                .gt_eq(min.to_lit())
                .and(col(column.as_str()).lt_eq(max.to_lit())),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq { column, value } => write!(f, "{column} = {value}"),
            Predicate::Range { column, min, max } => write!(f, "{column} in [{min}, {max}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateParseError(pub String);

impl fmt::Display for PredicateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid predicate '{}': expected COLUMN=VALUE or COLUMN=LOW..HIGH",
            self.0
        )
    }
}

impl std::error::Error for PredicateParseError {}

/// Parses `Country=India` and `Aggregate rating=3.5..5`.
impl FromStr for Predicate {
    type Err = PredicateParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (column, value) = s
            .split_once('=')
            .ok_or_else(|| PredicateParseError(s.to_string()))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(PredicateParseError(s.to_string()));
        }

        if let Some((low, high)) = value.split_once("..") {
            let (min, max) = (FilterValue::parse(low), FilterValue::parse(high));
            if min.is_text() || max.is_text() {
                return Err(PredicateParseError(s.to_string()));
            }
            Ok(Predicate::range(column, min, max))
        } else {
            Ok(Predicate::eq(column, FilterValue::parse(value)))
        }
    }
}

/// Rows satisfying every predicate. The input frame is left untouched.
pub fn filter(df: &DataFrame, predicates: &[Predicate]) -> Result<DataFrame> {
    for predicate in predicates {
        predicate.validate(df)?;
    }

    let Some(condition) = predicates
        .iter()
        .map(Predicate::to_expr)
        .reduce(|acc, expr| acc.and(expr))
    else {
        return Ok(df.clone());
    };

    let filtered = df.clone().lazy().filter(condition).collect()?;
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{COUNTRY, PRICE_RANGE, RATING_TEXT};
    use crate::error::Error;

    fn sample() -> DataFrame {
        df!(
            COUNTRY => ["India", "India", "UAE", "India"],
            PRICE_RANGE => [4i64, 2, 4, 4],
            RATING_TEXT => ["Poor", "Good", "Poor", "Excellent"],
            "Aggregate rating" => [2.1f64, 3.7, 2.0, 4.9],
        )
        .unwrap()
    }

    #[test]
    fn test_equality_filter() {
        let india = filter(&sample(), &[Predicate::eq(COUNTRY, "India")]).unwrap();
        assert_eq!(india.height(), 3);
    }

    #[test]
    fn test_conjunction() {
        let rows = filter(
            &sample(),
            &[
                Predicate::eq(COUNTRY, "India"),
                Predicate::eq(PRICE_RANGE, 4i64),
                Predicate::eq(RATING_TEXT, "Poor"),
            ],
        )
        .unwrap();
        assert_eq!(rows.height(), 1);
    }

    #[test]
    fn test_range_is_inclusive() {
        let rows = filter(&sample(), &[Predicate::range("Aggregate rating", 2.0, 3.7)]).unwrap();
        assert_eq!(rows.height(), 3);
    }

    #[test]
    fn test_no_predicates_returns_copy() {
        let df = sample();
        assert!(filter(&df, &[]).unwrap().equals(&df));
    }

    #[test]
    fn test_type_mismatch_is_schema_error() {
        let err = filter(&sample(), &[Predicate::eq(PRICE_RANGE, "four")]).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::WrongType { .. })));

        let err = filter(&sample(), &[Predicate::eq("Currency", "INR")]).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::MissingColumn { .. })));
    }

    #[test]
    fn test_parse_predicates() {
        assert_eq!(
            "Country=India".parse::<Predicate>().unwrap(),
            Predicate::eq("Country", "India")
        );
        assert_eq!(
            "Price range=4".parse::<Predicate>().unwrap(),
            Predicate::eq("Price range", 4i64)
        );
        assert_eq!(
            "Aggregate rating=3.5..5".parse::<Predicate>().unwrap(),
            Predicate::range("Aggregate rating", 3.5, 5i64)
        );
        assert!("Country".parse::<Predicate>().is_err());
        assert!("Votes=a..b".parse::<Predicate>().is_err());
    }
}
