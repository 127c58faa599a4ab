//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::analysis::Query;
use crate::config::{AnalysisConfig, ConfigError, ImageFormat};
use crate::data::Predicate;

/// Exploratory analysis of the Zomato restaurant listings.
#[derive(Parser, Debug)]
#[command(name = "zomato_eda")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML file with analysis settings
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full analysis: tables on stdout, charts to a directory
    Report(ReportArgs),
    /// Filter the joined table and summarize the result
    Query(QueryArgs),
}

/// The two input tables.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    /// Restaurant listings CSV
    #[arg(long = "listings", value_name = "CSV")]
    pub listings: PathBuf,

    /// Country code lookup CSV
    #[arg(long = "countries", value_name = "CSV")]
    pub countries: PathBuf,

    /// Character encoding of the listings (default ISO-8859-1)
    #[arg(long = "encoding", value_name = "LABEL")]
    pub encoding: Option<String>,

    /// Fail when a listing's country code is missing from the lookup
    #[arg(long = "strict-join")]
    pub strict_join: bool,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Directory for chart files
    #[arg(short = 'o', long = "out", value_name = "DIR", default_value = "eda_output")]
    pub out: PathBuf,

    /// Image format of static charts
    #[arg(long = "format", value_enum)]
    pub format: Option<ImageFormat>,

    /// Print the report as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Skip chart rendering
    #[arg(long = "no-charts")]
    pub no_charts: bool,

    /// Open the chart gallery when done
    #[arg(long = "open")]
    pub open: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub inputs: Inputs,

    /// Keep rows where COL=VALUE or COL=LOW..HIGH (repeatable, all must hold)
    #[arg(short = 'w', long = "where", value_name = "PREDICATE")]
    pub predicates: Vec<Predicate>,

    /// Describe a numeric column (repeatable)
    #[arg(long = "describe", value_name = "COL")]
    pub describe: Vec<String>,

    /// Count the distinct values of a column
    #[arg(long = "value-counts", value_name = "COL")]
    pub value_counts: Option<String>,

    /// Only the N most frequent values
    #[arg(long = "top", value_name = "N", requires = "value_counts")]
    pub top: Option<usize>,

    /// Mean of every numeric column per category of COL
    #[arg(long = "group-mean", value_name = "COL")]
    pub group_mean: Option<String>,

    /// Show the first N matching rows
    #[arg(long = "head", value_name = "N")]
    pub head: Option<usize>,

    /// Print the result as JSON
    #[arg(long = "json")]
    pub json: bool,
}

impl Cli {
    /// Settings from `--config`, or the defaults.
    pub fn load_config(&self) -> Result<AnalysisConfig, ConfigError> {
        match &self.config {
            Some(path) => AnalysisConfig::load(path),
            None => Ok(AnalysisConfig::default()),
        }
    }
}

impl Inputs {
    /// Apply command-line overrides on top of file settings.
    pub fn apply(&self, config: &mut AnalysisConfig) -> Result<(), ConfigError> {
        if let Some(encoding) = &self.encoding {
            config.listings_encoding = encoding.clone();
        }
        if self.strict_join {
            config.strict_join = true;
        }
        config.validate()
    }
}

impl QueryArgs {
    pub fn to_query(&self) -> Query {
        Query {
            predicates: self.predicates.clone(),
            describe: self.describe.clone(),
            value_counts: self.value_counts.clone(),
            top: self.top,
            group_mean: self.group_mean.clone(),
            head: self.head,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let cli = Cli::parse_from([
            "zomato_eda",
            "-vv",
            "query",
            "--listings",
            "zomato.csv",
            "--countries",
            "codes.csv",
            "--where",
            "Country=India",
            "--where",
            "Aggregate rating=3.5..5",
            "--value-counts",
            "City",
            "--top",
            "3",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Query(args) = cli.command else {
            panic!("expected query");
        };
        let query = args.to_query();
        assert_eq!(query.predicates.len(), 2);
        assert_eq!(query.predicates[1].column(), "Aggregate rating");
        assert_eq!(query.top, Some(3));
    }

    #[test]
    fn test_parse_report_overrides() {
        let cli = Cli::parse_from([
            "zomato_eda",
            "report",
            "--listings",
            "zomato.csv",
            "--countries",
            "codes.csv",
            "--format",
            "svg",
            "--strict-join",
        ]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.format, Some(ImageFormat::Svg));
        assert_eq!(args.out, PathBuf::from("eda_output"));

        let mut config = AnalysisConfig::default();
        args.inputs.apply(&mut config).unwrap();
        assert!(config.strict_join);
    }

    #[test]
    fn test_bad_predicate_rejected() {
        let result = Cli::try_parse_from([
            "zomato_eda",
            "query",
            "--listings",
            "a.csv",
            "--countries",
            "b.csv",
            "--where",
            "India",
        ]);
        assert!(result.is_err());
    }
}
