//! Command-line interface: argument parsing and table output.

mod args;
mod output;

pub use args::{Cli, Command, Inputs, QueryArgs, ReportArgs};
pub use output::{
    correlation_table, counts_table, describe_table, group_means_table, info_table, rows_table,
    write_json, write_query, write_report,
};
