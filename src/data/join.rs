//! Inner join of listings with the country lookup.

use crate::data::column::int_values;
use crate::data::schema::COUNTRY_CODE;
use crate::error::{Result, SchemaError};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

const ROW_INDEX: &str = "__listing_row";

/// What to do with listings whose country code has no lookup entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Drop them, count them and log a warning
    #[default]
    Lenient,
    /// Fail the run
    Strict,
}

/// Outcome of the join, kept so row loss is never silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub listing_rows: usize,
    pub joined_rows: usize,
    pub dropped_rows: usize,
    /// Distinct unresolved codes, ascending
    pub unmatched_codes: Vec<i64>,
}

impl JoinReport {
    pub fn is_complete(&self) -> bool {
        self.dropped_rows == 0
    }
}

/// Join `Country Code` against the lookup, keeping listing order.
///
/// Both key columns must be integers. Listings with a null code never match.
pub fn join_country_names(
    listings: &DataFrame,
    lookup: &DataFrame,
    policy: JoinPolicy,
) -> Result<(DataFrame, JoinReport)> {
    let listing_codes = int_values(listings, COUNTRY_CODE)?;
    let lookup_codes: HashSet<i64> = int_values(lookup, COUNTRY_CODE)?
        .into_iter()
        .flatten()
        .collect();

    let mut unmatched = BTreeSet::new();
    let mut dropped_rows = 0;
    for code in &listing_codes {
        match code {
            Some(code) if lookup_codes.contains(code) => {}
            Some(code) => {
                unmatched.insert(*code);
                dropped_rows += 1;
            }
            None => dropped_rows += 1,
        }
    }
    let unmatched_codes: Vec<i64> = unmatched.into_iter().collect();

    if dropped_rows > 0 && policy == JoinPolicy::Strict {
        return Err(SchemaError::UnmatchedCountryCodes {
            dropped: dropped_rows,
            codes: unmatched_codes,
        }
        .into());
    }

    let key = [col(COUNTRY_CODE)];
    let joined = listings
        .clone()
        .lazy()
        .with_column(col(COUNTRY_CODE).cast(DataType::Int64))
        .with_row_index(ROW_INDEX, None)
        .join(
            lookup
                .clone()
                .lazy()
                .with_column(col(COUNTRY_CODE).cast(DataType::Int64)),
            key.clone(),
            key,
            JoinArgs::new(JoinType::Inner),
        )
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    let report = JoinReport {
        listing_rows: listings.height(),
        joined_rows: joined.height(),
        dropped_rows,
        unmatched_codes,
    };

    if report.is_complete() {
        info!("Joined {} listings with country names", report.joined_rows);
    } else {
        warn!(
            "Join dropped {} of {} listings; unmatched country codes: {:?}",
            report.dropped_rows, report.listing_rows, report.unmatched_codes
        );
    }

    Ok((joined, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::COUNTRY;
    use crate::error::Error;

    fn lookup() -> DataFrame {
        df!(
            COUNTRY_CODE => [1i64, 216],
            COUNTRY => ["India", "United States"],
        )
        .unwrap()
    }

    fn listings() -> DataFrame {
        df!(
            "Restaurant ID" => [10i64, 11, 12, 13],
            COUNTRY_CODE => [216i64, 99, 1, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_inner_join_drops_and_counts_unmatched() {
        let (joined, report) = join_country_names(&listings(), &lookup(), JoinPolicy::Lenient).unwrap();

        assert_eq!(joined.height(), 3);
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(report.unmatched_codes, vec![99]);
        assert!(!report.is_complete());
        assert!(joined.column(ROW_INDEX).is_err());
    }

    #[test]
    fn test_join_keeps_listing_order() {
        let (joined, _) = join_country_names(&listings(), &lookup(), JoinPolicy::Lenient).unwrap();

        let ids = int_values(&joined, "Restaurant ID").unwrap();
        assert_eq!(ids, vec![Some(10), Some(12), Some(13)]);
        let countries = joined.column(COUNTRY).unwrap().str().unwrap().get(0);
        assert_eq!(countries, Some("United States"));
    }

    #[test]
    fn test_strict_join_fails_on_unmatched() {
        let err = join_country_names(&listings(), &lookup(), JoinPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::UnmatchedCountryCodes { dropped: 1, .. })
        ));
    }

    #[test]
    fn test_complete_join_keeps_every_row() {
        let listings = df!(COUNTRY_CODE => [1i32, 216, 1]).unwrap();
        let (joined, report) = join_country_names(&listings, &lookup(), JoinPolicy::Strict).unwrap();
        assert_eq!(joined.height(), listings.height());
        assert!(report.is_complete());
    }

    #[test]
    fn test_text_key_is_schema_error() {
        let listings = df!(COUNTRY_CODE => ["one"]).unwrap();
        let err = join_country_names(&listings, &lookup(), JoinPolicy::Lenient).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::WrongType { .. })));
    }
}
