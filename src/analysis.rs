//! The restaurant analysis: prepare the joined, cleaned table once, then
//! derive the report sections and the chart sequence from it.

use crate::charts::{Chart, ChartData, ChartKind, ChartOptions, HistFunc};
use crate::config::AnalysisConfig;
use crate::data::column::{present_numeric_values, text_values};
use crate::data::schema::{
    AGGREGATE_RATING, AVERAGE_COST_FOR_TWO, CITY, COUNTRY, CUISINES, HAS_ONLINE_DELIVERY,
    HAS_TABLE_BOOKING, IS_DELIVERING_NOW, KEY_NUMERIC_COLUMNS, PRICE_RANGE, RATING_TEXT, VOTES,
};
use crate::data::{filter, join_country_names, CleanReport, Cleaner, DataLoader, JoinPolicy, JoinReport, Predicate};
use crate::error::Result;
use crate::stats::{
    column_info, correlation_matrix, describe, group_by_mean, joined_text, mean_by, token_frequencies,
    top_n, value_counts, ColumnInfo, CorrelationMatrix, Description, GroupMeans, ValueCounts,
};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Service flags whose effect on the rating is compared.
const RATING_FLAGS: [&str; 3] = [HAS_ONLINE_DELIVERY, HAS_TABLE_BOOKING, IS_DELIVERING_NOW];

/// Rows of a frame rendered as text, for printing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSample {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Row count of the frame the sample was taken from
    pub total_rows: usize,
}

impl RowSample {
    /// The first `limit` rows of `df` (all of them when `None`).
    pub fn from_frame(df: &DataFrame, limit: Option<usize>) -> Result<Self> {
        let columns: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        let values = columns
            .iter()
            .map(|name| text_values(df, name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let n = limit.map_or(df.height(), |l| l.min(df.height()));
        let rows = (0..n)
            .map(|i| values.iter().map(|column| column[i].clone()).collect())
            .collect();

        Ok(Self {
            columns,
            rows,
            total_rows: df.height(),
        })
    }

    /// Values of one column across the sampled rows.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let j = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[j].as_deref()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusCountryReport {
    pub country: String,
    pub rows: usize,
    pub rating_text_means: GroupMeans,
    pub price_range_counts: ValueCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpensiveReport {
    pub price_range: i64,
    pub rows: usize,
    pub rating_text_counts: ValueCounts,
    pub poor_rated: RowSample,
    pub poor_cuisines_text: String,
    pub poor_cuisine_tokens: ValueCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoorRatedReport {
    pub rating_text: String,
    pub rows: usize,
    pub online_delivery: ValueCounts,
    pub delivering_now: ValueCounts,
    pub cities: ValueCounts,
}

/// Every table and statistic of the analysis, in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaReport {
    pub rows: usize,
    pub columns: Vec<ColumnInfo>,
    pub join: JoinReport,
    pub cleaning: CleanReport,
    pub description: Description,
    pub most_expensive: RowSample,
    pub correlation: CorrelationMatrix,
    pub restaurants_per_country: ValueCounts,
    pub focus: FocusCountryReport,
    pub expensive: ExpensiveReport,
    pub poor_rated: PoorRatedReport,
    pub top_cities: ValueCounts,
    pub rating_by_service: Vec<GroupMeans>,
}

/// An ad hoc question about the table: filter, then summarize.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub describe: Vec<String>,
    pub value_counts: Option<String>,
    /// Keep only the most frequent values of `value_counts`
    pub top: Option<usize>,
    pub group_mean: Option<String>,
    pub head: Option<usize>,
}

impl Query {
    fn asks_for_summary(&self) -> bool {
        !self.describe.is_empty() || self.value_counts.is_some() || self.group_mean.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub filters: Vec<String>,
    pub rows: usize,
    pub description: Option<Description>,
    pub value_counts: Option<ValueCounts>,
    pub group_means: Option<GroupMeans>,
    pub head: Option<RowSample>,
}

/// Rows shown by a query that asks for nothing else.
const DEFAULT_HEAD: usize = 5;

/// The joined and cleaned restaurant table with the settings it was built under.
pub struct Analysis {
    table: DataFrame,
    join: JoinReport,
    cleaning: CleanReport,
    config: AnalysisConfig,
}

impl Analysis {
    /// Join, then clean. The rating mean is taken over the whole joined table.
    pub fn prepare(listings: &DataFrame, countries: &DataFrame, config: &AnalysisConfig) -> Result<Self> {
        let policy = if config.strict_join {
            JoinPolicy::Strict
        } else {
            JoinPolicy::Lenient
        };

        let (joined, join) = join_country_names(listings, countries, policy)?;
        let (table, cleaning) = Cleaner::new(config.cuisines_placeholder.clone()).clean(&joined)?;

        info!(
            rows = table.height(),
            columns = table.width(),
            cuisines_filled = cleaning.cuisines_filled,
            ratings_filled = cleaning.ratings_filled,
            "Prepared restaurant table"
        );

        Ok(Self {
            table,
            join,
            cleaning,
            config: config.clone(),
        })
    }

    /// Load both files with the configured encoding, then prepare.
    pub fn load(listings: &Path, countries: &Path, config: &AnalysisConfig) -> Result<Self> {
        let loader = DataLoader::new(&config.listings_encoding, config.infer_schema_length)?;
        let listings = loader.load_listings(listings)?;
        let countries = loader.load_country_codes(countries)?;
        Self::prepare(&listings, &countries, config)
    }

    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    pub fn join_report(&self) -> &JoinReport {
        &self.join
    }

    pub fn clean_report(&self) -> &CleanReport {
        &self.cleaning
    }

    /// Restaurants of the focus country.
    pub fn focus_subset(&self) -> Result<DataFrame> {
        filter(&self.table, &[Predicate::eq(COUNTRY, self.config.focus_country.as_str())])
    }

    /// Focus-country restaurants in the top price range.
    pub fn expensive_subset(&self, focus: &DataFrame) -> Result<DataFrame> {
        filter(focus, &[Predicate::eq(PRICE_RANGE, self.config.top_price_range)])
    }

    /// Rows of `df` carrying the poor rating label.
    pub fn poor_rated(&self, df: &DataFrame) -> Result<DataFrame> {
        filter(df, &[Predicate::eq(RATING_TEXT, self.config.poor_rating_text.as_str())])
    }

    /// Restaurants sharing the highest cost for two.
    pub fn most_expensive(&self) -> Result<DataFrame> {
        let rows = self
            .table
            .clone()
            .lazy()
            .filter(col(AVERAGE_COST_FOR_TWO).eq(col(AVERAGE_COST_FOR_TWO).max()))
            .collect()?;
        Ok(rows)
    }

    pub fn report(&self) -> Result<EdaReport> {
        let table = &self.table;

        let description = describe(table, &KEY_NUMERIC_COLUMNS)?;
        let most_expensive = RowSample::from_frame(&self.most_expensive()?, None)?;
        let correlation = correlation_matrix(table, &KEY_NUMERIC_COLUMNS)?;
        let restaurants_per_country = value_counts(table, COUNTRY)?;

        let focus_df = self.focus_subset()?;
        debug!(country = %self.config.focus_country, rows = focus_df.height(), "Focus subset");
        let focus = FocusCountryReport {
            country: self.config.focus_country.clone(),
            rows: focus_df.height(),
            rating_text_means: group_by_mean(&focus_df, RATING_TEXT)?,
            price_range_counts: value_counts(&focus_df, PRICE_RANGE)?,
        };

        let expensive_df = self.expensive_subset(&focus_df)?;
        let poor_expensive = self.poor_rated(&expensive_df)?;
        let expensive = ExpensiveReport {
            price_range: self.config.top_price_range,
            rows: expensive_df.height(),
            rating_text_counts: value_counts(&expensive_df, RATING_TEXT)?,
            poor_rated: RowSample::from_frame(&poor_expensive, None)?,
            poor_cuisines_text: joined_text(&poor_expensive, CUISINES, " ")?,
            poor_cuisine_tokens: token_frequencies(&poor_expensive, CUISINES, ',')?,
        };

        let poor_df = self.poor_rated(&focus_df)?;
        let poor_rated = PoorRatedReport {
            rating_text: self.config.poor_rating_text.clone(),
            rows: poor_df.height(),
            online_delivery: value_counts(&poor_df, HAS_ONLINE_DELIVERY)?,
            delivering_now: value_counts(&poor_df, IS_DELIVERING_NOW)?,
            cities: value_counts(&poor_df, CITY)?,
        };

        let rating_by_service = RATING_FLAGS
            .iter()
            .map(|flag| mean_by(table, flag, AGGREGATE_RATING))
            .collect::<Result<Vec<_>>>()?;

        Ok(EdaReport {
            rows: table.height(),
            columns: column_info(table)?,
            join: self.join.clone(),
            cleaning: self.cleaning.clone(),
            description,
            most_expensive,
            correlation,
            restaurants_per_country,
            focus,
            expensive,
            poor_rated,
            top_cities: top_n(&focus_df, CITY, self.config.top_cities)?,
            rating_by_service,
        })
    }

    pub fn query(&self, query: &Query) -> Result<QueryResult> {
        let subset = filter(&self.table, &query.predicates)?;
        debug!(rows = subset.height(), filters = query.predicates.len(), "Query subset");

        let description = if query.describe.is_empty() {
            None
        } else {
            let columns: Vec<&str> = query.describe.iter().map(String::as_str).collect();
            Some(describe(&subset, &columns)?)
        };

        let value_counts = match (&query.value_counts, query.top) {
            (Some(column), Some(n)) => Some(top_n(&subset, column, n)?),
            (Some(column), None) => Some(value_counts(&subset, column)?),
            (None, _) => None,
        };

        let group_means = query
            .group_mean
            .as_deref()
            .map(|key| group_by_mean(&subset, key))
            .transpose()?;

        let head = match query.head {
            Some(n) => Some(RowSample::from_frame(&subset, Some(n))?),
            None if !query.asks_for_summary() => Some(RowSample::from_frame(&subset, Some(DEFAULT_HEAD))?),
            None => None,
        };

        Ok(QueryResult {
            filters: query.predicates.iter().map(ToString::to_string).collect(),
            rows: subset.height(),
            description,
            value_counts,
            group_means,
            head,
        })
    }

    /// The charts of the analysis, in presentation order.
    pub fn chart_plan(&self) -> Result<Vec<Chart>> {
        let table = &self.table;
        let focus_df = self.focus_subset()?;
        let poor_df = self.poor_rated(&focus_df)?;
        let mut charts = Vec::new();

        let correlation = correlation_matrix(table, &KEY_NUMERIC_COLUMNS)?;
        charts.push(Chart::new(
            "correlation_heatmap",
            ChartKind::Heatmap,
            ChartData::Matrix {
                labels: correlation.columns,
                values: correlation.values,
            },
            ChartOptions {
                value_range: Some((-1.0, 1.0)),
                ..ChartOptions::titled("Correlation of numeric columns")
            },
        ));

        charts.push(Chart::new(
            "rating_distribution",
            ChartKind::Distribution,
            ChartData::Values {
                label: AGGREGATE_RATING.to_string(),
                values: present_numeric_values(table, AGGREGATE_RATING)?,
            },
            ChartOptions::titled("Distribution of aggregate rating"),
        ));

        charts.push(Chart::new(
            "rating_vs_votes_scatter",
            ChartKind::Scatter,
            ChartData::pairs(table, AGGREGATE_RATING, VOTES)?,
            ChartOptions::titled("Votes by aggregate rating"),
        ));
        charts.push(Chart::new(
            "rating_vs_votes_line",
            ChartKind::Line,
            ChartData::pairs(table, AGGREGATE_RATING, VOTES)?,
            ChartOptions::titled("Mean votes by aggregate rating"),
        ));

        charts.push(Chart::new(
            "price_range_rating_violin",
            ChartKind::Violin,
            ChartData::groups(table, PRICE_RANGE, AGGREGATE_RATING)?,
            ChartOptions::titled("Aggregate rating by price range"),
        ));

        charts.push(count_chart(
            "restaurants_per_country",
            &value_counts(table, COUNTRY)?,
            ChartOptions {
                figure_size: Some((14.0, 6.0)),
                x_label_rotation: 45,
                ..ChartOptions::titled("# of Restaurants registered in Zomato in different Countries")
            },
        ));

        let country = &self.config.focus_country;
        charts.push(Chart::new(
            "focus_cost_by_rating_text",
            ChartKind::Box,
            ChartData::groups(&focus_df, RATING_TEXT, AVERAGE_COST_FOR_TWO)?,
            ChartOptions::titled(format!("Cost for two by rating text ({country})")),
        ));
        charts.push(Chart::new(
            "focus_price_range_by_rating_text",
            ChartKind::Box,
            ChartData::groups(&focus_df, RATING_TEXT, PRICE_RANGE)?,
            ChartOptions::titled(format!("Price range by rating text ({country})")),
        ));

        charts.push(count_chart(
            "poor_rated_cities",
            &value_counts(&poor_df, CITY)?,
            ChartOptions {
                x_label_rotation: 45,
                ..ChartOptions::titled(format!("Cities of {} rated restaurants", self.config.poor_rating_text))
            },
        ));

        let top = top_n(&focus_df, CITY, self.config.top_cities)?;
        charts.push(Chart::new(
            "top_cities",
            ChartKind::Bar,
            counts_data(&top),
            ChartOptions::titled(format!("Top {} cities in {country}", self.config.top_cities)),
        ));

        let mut scatter = ChartOptions::titled("Cost for two vs votes").xy(AVERAGE_COST_FOR_TWO, VOTES);
        scatter.size = Some(VOTES.to_string());
        scatter.color = Some(RATING_TEXT.to_string());
        scatter.log_x = true;
        scatter.size_max = 60.0;
        scatter.hover_name = Some(CITY.to_string());
        charts.push(Chart::new(
            "cost_vs_votes",
            ChartKind::InteractiveScatter,
            ChartData::records(table, &[AVERAGE_COST_FOR_TWO, VOTES, RATING_TEXT, CITY])?,
            scatter,
        ));

        let mut matrix_columns = KEY_NUMERIC_COLUMNS.to_vec();
        matrix_columns.push(RATING_TEXT);
        charts.push(Chart::new(
            "scatter_matrix",
            ChartKind::ScatterMatrix,
            ChartData::records(table, &matrix_columns)?,
            ChartOptions {
                dimensions: KEY_NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
                color: Some(RATING_TEXT.to_string()),
                ..ChartOptions::titled("Numeric columns by rating text")
            },
        ));

        let mut boxes = ChartOptions::titled(format!("Cost for two by rating text and price range ({country})"))
            .xy(RATING_TEXT, AVERAGE_COST_FOR_TWO);
        boxes.color = Some(PRICE_RANGE.to_string());
        boxes.notched = true;
        charts.push(Chart::new(
            "focus_cost_box",
            ChartKind::InteractiveBox,
            ChartData::records(&focus_df, &[RATING_TEXT, AVERAGE_COST_FOR_TWO, PRICE_RANGE])?,
            boxes,
        ));

        for flag in RATING_FLAGS {
            let mut options = ChartOptions::titled(format!("Average rating by {flag}")).xy(flag, AGGREGATE_RATING);
            options.hist_func = HistFunc::Avg;
            charts.push(Chart::new(
                format!("rating_by_{}", flag.to_lowercase().replace(' ', "_")),
                ChartKind::InteractiveHistogram,
                ChartData::records(table, &[flag, AGGREGATE_RATING])?,
                options,
            ));
        }

        Ok(charts)
    }
}

fn counts_data(counts: &ValueCounts) -> ChartData {
    ChartData::Counts {
        x_label: counts.column.clone(),
        y_label: "count".to_string(),
        entries: counts.entries.iter().map(|(k, n)| (k.clone(), *n as f64)).collect(),
    }
}

fn count_chart(name: &str, counts: &ValueCounts, options: ChartOptions) -> Chart {
    Chart::new(name, ChartKind::Count, counts_data(counts), options)
}
