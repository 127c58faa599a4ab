//! Output formatting for reports and query results.
//!
//! Tables go through comfy-table; `--json` output is the serde form of the
//! same structures.

use std::io::Write;

use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;

use crate::analysis::{EdaReport, QueryResult, RowSample};
use crate::stats::{ColumnInfo, CorrelationMatrix, Description, GroupMeans, ValueCounts};

/// Pretty-print a value as JSON followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}

fn number(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v:.4}")
    }
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn heading<W: Write>(writer: &mut W, title: &str) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{title}")?;
    writeln!(writer, "{}", "=".repeat(title.chars().count()))
}

pub fn info_table(columns: &[ColumnInfo]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Column", "Non-Null Count", "Dtype"]);
    for (i, c) in columns.iter().enumerate() {
        table.add_row(vec![
            right(i.to_string()),
            Cell::new(&c.name),
            right(c.non_null.to_string()),
            Cell::new(&c.dtype),
        ]);
    }
    table
}

/// Statistics as rows, columns across (pandas `describe()` layout).
pub fn describe_table(description: &Description) -> Table {
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(description.columns.iter().map(|c| c.column.clone()));
    table.set_header(header);

    let rows: [(&str, fn(&crate::stats::ColumnSummary) -> f64); 8] = [
        ("count", |c| c.count as f64),
        ("mean", |c| c.mean),
        ("std", |c| c.std),
        ("min", |c| c.min),
        ("25%", |c| c.p25),
        ("50%", |c| c.median),
        ("75%", |c| c.p75),
        ("max", |c| c.max),
    ];
    for (name, get) in rows {
        let mut row = vec![Cell::new(name)];
        row.extend(description.columns.iter().map(|c| right(number(get(c)))));
        table.add_row(row);
    }
    table
}

pub fn correlation_table(matrix: &CorrelationMatrix) -> Table {
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(matrix.columns.iter().cloned());
    table.set_header(header);

    for (name, values) in matrix.columns.iter().zip(&matrix.values) {
        let mut row = vec![Cell::new(name)];
        row.extend(values.iter().map(|&v| right(format!("{v:.6}"))));
        table.add_row(row);
    }
    table
}

pub fn counts_table(counts: &ValueCounts) -> Table {
    let mut table = Table::new();
    table.set_header(vec![counts.column.as_str(), "count"]);
    for (value, n) in &counts.entries {
        table.add_row(vec![Cell::new(value), right(n.to_string())]);
    }
    table
}

pub fn group_means_table(means: &GroupMeans) -> Table {
    let mut table = Table::new();
    let mut header = vec![means.key_column.clone(), "rows".to_string()];
    header.extend(means.value_columns.iter().cloned());
    table.set_header(header);

    for row in &means.rows {
        let mut cells = vec![Cell::new(&row.key), right(row.count.to_string())];
        cells.extend(row.means.iter().map(|&m| right(number(m))));
        table.add_row(cells);
    }
    table
}

pub fn rows_table(sample: &RowSample) -> Table {
    let mut table = Table::new();
    table.set_header(sample.columns.clone());
    for row in &sample.rows {
        table.add_row(row.iter().map(|v| v.as_deref().unwrap_or("NaN")).collect::<Vec<_>>());
    }
    table
}

fn print_rows<W: Write>(writer: &mut W, sample: &RowSample) -> std::io::Result<()> {
    writeln!(writer, "{}", rows_table(sample))?;
    if sample.rows.len() < sample.total_rows {
        writeln!(writer, "({} of {} rows)", sample.rows.len(), sample.total_rows)?;
    }
    Ok(())
}

/// Print every section of the report in order.
pub fn write_report<W: Write>(report: &EdaReport, writer: &mut W) -> std::io::Result<()> {
    heading(writer, "Restaurant table")?;
    writeln!(writer, "{} rows x {} columns", report.rows, report.columns.len())?;
    if report.join.is_complete() {
        writeln!(writer, "every listing matched a country")?;
    } else {
        writeln!(
            writer,
            "{} of {} listings dropped, unknown country codes {:?}",
            report.join.dropped_rows, report.join.listing_rows, report.join.unmatched_codes
        )?;
    }
    writeln!(
        writer,
        "filled {} missing cuisines and {} missing ratings{}",
        report.cleaning.cuisines_filled,
        report.cleaning.ratings_filled,
        report
            .cleaning
            .rating_mean
            .map(|m| format!(" (mean {})", number(m)))
            .unwrap_or_default()
    )?;
    writeln!(writer, "{}", info_table(&report.columns))?;

    heading(writer, "Numeric columns")?;
    writeln!(writer, "{}", describe_table(&report.description))?;

    heading(writer, "Highest cost for two")?;
    print_rows(writer, &report.most_expensive)?;

    heading(writer, "Correlation")?;
    writeln!(writer, "{}", correlation_table(&report.correlation))?;

    heading(writer, "Restaurants per country")?;
    writeln!(writer, "{}", counts_table(&report.restaurants_per_country))?;

    let focus = &report.focus;
    heading(writer, &format!("{} ({} restaurants)", focus.country, focus.rows))?;
    writeln!(writer, "{}", group_means_table(&focus.rating_text_means))?;
    writeln!(writer, "{}", counts_table(&focus.price_range_counts))?;

    let expensive = &report.expensive;
    heading(
        writer,
        &format!("Price range {} in {} ({} restaurants)", expensive.price_range, focus.country, expensive.rows),
    )?;
    writeln!(writer, "{}", counts_table(&expensive.rating_text_counts))?;
    print_rows(writer, &expensive.poor_rated)?;
    writeln!(writer, "cuisines: {}", expensive.poor_cuisines_text)?;
    writeln!(writer, "{}", counts_table(&expensive.poor_cuisine_tokens))?;

    let poor = &report.poor_rated;
    heading(
        writer,
        &format!("{} rated in {} ({} restaurants)", poor.rating_text, focus.country, poor.rows),
    )?;
    writeln!(writer, "{}", counts_table(&poor.online_delivery))?;
    writeln!(writer, "{}", counts_table(&poor.delivering_now))?;
    writeln!(writer, "{}", counts_table(&poor.cities))?;

    heading(writer, &format!("Top cities in {}", focus.country))?;
    writeln!(writer, "{}", counts_table(&report.top_cities))?;

    heading(writer, "Average rating by service")?;
    for means in &report.rating_by_service {
        writeln!(writer, "{}", group_means_table(means))?;
    }

    Ok(())
}

pub fn write_query<W: Write>(result: &QueryResult, writer: &mut W) -> std::io::Result<()> {
    if result.filters.is_empty() {
        writeln!(writer, "{} rows", result.rows)?;
    } else {
        writeln!(writer, "{} rows where {}", result.rows, result.filters.join(" and "))?;
    }

    if let Some(description) = &result.description {
        writeln!(writer, "{}", describe_table(description))?;
    }
    if let Some(counts) = &result.value_counts {
        writeln!(writer, "{}", counts_table(counts))?;
    }
    if let Some(means) = &result.group_means {
        writeln!(writer, "{}", group_means_table(means))?;
    }
    if let Some(head) = &result.head {
        print_rows(writer, head)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::GroupMeanRow;

    #[test]
    fn test_counts_table_rows() {
        let counts = ValueCounts {
            column: "City".to_string(),
            entries: vec![("New Delhi".to_string(), 5473), ("Gurgaon".to_string(), 1118)],
        };
        let text = counts_table(&counts).to_string();
        assert!(text.contains("New Delhi"));
        assert!(text.contains("5473"));
        assert!(text.find("New Delhi") < text.find("Gurgaon"));
    }

    #[test]
    fn test_group_means_nan() {
        let means = GroupMeans {
            key_column: "Rating text".to_string(),
            value_columns: vec!["Votes".to_string()],
            rows: vec![GroupMeanRow {
                key: "Poor".to_string(),
                count: 2,
                means: vec![f64::NAN],
            }],
        };
        let text = group_means_table(&means).to_string();
        assert!(text.contains("NaN"));
    }

    #[test]
    fn test_write_query_json() {
        let result = QueryResult {
            filters: vec!["Country = India".to_string()],
            rows: 3,
            description: None,
            value_counts: None,
            group_means: None,
            head: None,
        };
        let mut out = Vec::new();
        write_json(&result, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["rows"], 3);
        assert!(value["head"].is_null());
    }

    #[test]
    fn test_number_format() {
        assert_eq!(number(3.0), "3.0");
        assert_eq!(number(2.66), "2.6600");
        assert_eq!(number(f64::NAN), "NaN");
    }
}
