//! Chart descriptions handed to the renderers.

use crate::data::column::{numeric_values, text_values};
use crate::error::Result;
use crate::stats::sort_category_keys;
use polars::prelude::*;
use serde::Serialize;

/// Kind of chart to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    Heatmap,
    /// Histogram with a density curve
    Distribution,
    Scatter,
    /// Mean of y per distinct x, with a 95% confidence band
    Line,
    Violin,
    Box,
    /// Bars of category frequencies
    Count,
    /// Bars of precomputed values
    Bar,
    InteractiveScatter,
    ScatterMatrix,
    InteractiveBox,
    InteractiveHistogram,
}

impl ChartKind {
    /// Whether this kind is written as an interactive HTML page.
    pub fn is_interactive(self) -> bool {
        matches!(
            self,
            ChartKind::InteractiveScatter
                | ChartKind::ScatterMatrix
                | ChartKind::InteractiveBox
                | ChartKind::InteractiveHistogram
        )
    }
}

/// A column carried into an interactive figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Numbers(Vec<Option<f64>>),
    Labels(Vec<Option<String>>),
}

impl Field {
    pub fn len(&self) -> usize {
        match self {
            Field::Numbers(v) => v.len(),
            Field::Labels(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text rendering of row `i`; empty for nulls.
    pub fn label(&self, i: usize) -> String {
        match self {
            Field::Numbers(v) => v[i].map(|x| x.to_string()).unwrap_or_default(),
            Field::Labels(v) => v[i].clone().unwrap_or_default(),
        }
    }
}

/// Data behind a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartData {
    /// Square matrix with row/column labels (heatmaps)
    Matrix {
        labels: Vec<String>,
        values: Vec<Vec<f64>>,
    },
    /// A single sample (distributions)
    Values { label: String, values: Vec<f64> },
    /// Paired observations (scatter and line)
    Pairs {
        x_label: String,
        y_label: String,
        points: Vec<(f64, f64)>,
    },
    /// One sample per category (violin and box)
    Groups {
        x_label: String,
        y_label: String,
        groups: Vec<(String, Vec<f64>)>,
    },
    /// Category to count or value (count and bar)
    Counts {
        x_label: String,
        y_label: String,
        entries: Vec<(String, f64)>,
    },
    /// Named columns of equal length (interactive figures)
    Records { fields: Vec<(String, Field)> },
}

impl ChartData {
    /// Collect the named columns of a frame. Numeric columns stay numeric.
    pub fn records(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let fields = columns
            .iter()
            .map(|&name| {
                let field = match numeric_values(df, name) {
                    Ok(values) => Field::Numbers(values),
                    Err(_) => Field::Labels(text_values(df, name)?),
                };
                Ok((name.to_string(), field))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ChartData::Records { fields })
    }

    /// Paired non-null values of two numeric columns.
    pub fn pairs(df: &DataFrame, x: &str, y: &str) -> Result<Self> {
        let xs = numeric_values(df, x)?;
        let ys = numeric_values(df, y)?;
        let points = xs
            .into_iter()
            .zip(ys)
            .filter_map(|(x, y)| Some((x?, y?)))
            .collect();

        Ok(ChartData::Pairs {
            x_label: x.to_string(),
            y_label: y.to_string(),
            points,
        })
    }

    /// Values of `value` split by the categories of `key`, categories sorted.
    pub fn groups(df: &DataFrame, key: &str, value: &str) -> Result<Self> {
        let keys = text_values(df, key)?;
        let values = numeric_values(df, value)?;

        let mut groups: std::collections::BTreeMap<String, Vec<f64>> = Default::default();
        for (k, v) in keys.into_iter().zip(values) {
            if let (Some(k), Some(v)) = (k, v) {
                groups.entry(k).or_default().push(v);
            }
        }

        let mut groups: Vec<(String, Vec<f64>)> = groups.into_iter().collect();
        sort_category_keys(&mut groups);

        Ok(ChartData::Groups {
            x_label: key.to_string(),
            y_label: value.to_string(),
            groups,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            ChartData::Records { fields } => fields.iter().find(|(n, _)| n == name).map(|(_, f)| f),
            _ => None,
        }
    }
}

/// Histogram aggregation for interactive histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum HistFunc {
    #[default]
    Count,
    Sum,
    Avg,
}

/// Presentation options; unset fields fall back to renderer defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub title: Option<String>,
    /// Figure size in inches, matplotlib style
    pub figure_size: Option<(f64, f64)>,
    /// Rotation of x tick labels in degrees
    pub x_label_rotation: u32,
    /// Colour scale bounds (heatmap vmin/vmax)
    pub value_range: Option<(f64, f64)>,
    pub log_x: bool,
    pub x: Option<String>,
    pub y: Option<String>,
    /// Column whose categories get separate colours
    pub color: Option<String>,
    /// Column mapped to marker size
    pub size: Option<String>,
    pub size_max: f64,
    /// Column shown as the hover title
    pub hover_name: Option<String>,
    /// Columns of a scatter matrix
    pub dimensions: Vec<String>,
    pub notched: bool,
    pub hist_func: HistFunc,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: None,
            figure_size: None,
            x_label_rotation: 0,
            value_range: None,
            log_x: false,
            x: None,
            y: None,
            color: None,
            size: None,
            size_max: 20.0,
            hover_name: None,
            dimensions: Vec::new(),
            notched: false,
            hist_func: HistFunc::Count,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn xy(mut self, x: &str, y: &str) -> Self {
        self.x = Some(x.to_string());
        self.y = Some(y.to_string());
        self
    }
}

/// A chart ready to render: file stem, kind, data and options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub name: String,
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

impl Chart {
    pub fn new(name: impl Into<String>, kind: ChartKind, data: ChartData, options: ChartOptions) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
            options,
        }
    }

    pub fn title(&self) -> &str {
        self.options.title.as_deref().unwrap_or(&self.name)
    }
}
