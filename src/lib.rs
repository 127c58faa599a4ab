//! Zomato restaurant analysis
//!
//! Loads the restaurant listings and the country code lookup, joins and
//! cleans them, then derives the tables and charts of the exploratory
//! analysis.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use zomato_eda::{Analysis, AnalysisConfig};
//!
//! fn main() -> zomato_eda::Result<()> {
//!     let config = AnalysisConfig::default();
//!     let analysis = Analysis::load(Path::new("zomato.csv"), Path::new("Country-Code.csv"), &config)?;
//!     let report = analysis.report()?;
//!     println!("{} restaurants", report.rows);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod stats;

pub use analysis::{Analysis, EdaReport, Query, QueryResult, RowSample};
pub use config::{AnalysisConfig, ChartConfig, ImageFormat};
pub use error::{Error, Result, SchemaError};
