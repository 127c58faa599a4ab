//! Analysis configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. CLI flags override file values.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Output image format for static charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// Chart rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Pixels per figure-size unit (matplotlib inches)
    pub dpi: u32,
    /// Default figure size in inches
    pub figure_size: (f64, f64),
    pub format: ImageFormat,
    /// plotly.js bundle referenced by interactive pages
    pub plotly_url: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            dpi: 80,
            figure_size: (8.0, 6.0),
            format: ImageFormat::Png,
            plotly_url: "https://cdn.plot.ly/plotly-2.35.2.min.js".to_string(),
        }
    }
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Character encoding label of the listings file
    pub listings_encoding: String,
    /// Rows scanned for schema inference (None scans the whole file)
    pub infer_schema_length: Option<usize>,
    /// Label written into missing cuisines
    pub cuisines_placeholder: String,
    /// Country the report drills into
    pub focus_country: String,
    /// Price tier treated as "expensive"
    pub top_price_range: i64,
    /// Rating text marking badly rated restaurants
    pub poor_rating_text: String,
    /// Number of cities in the top-cities bar chart
    pub top_cities: usize,
    /// Fail instead of dropping rows whose country code has no lookup entry
    pub strict_join: bool,
    pub charts: ChartConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            listings_encoding: "ISO-8859-1".to_string(),
            infer_schema_length: Some(10000),
            cuisines_placeholder: "Others".to_string(),
            focus_country: "India".to_string(),
            top_price_range: 4,
            poor_rating_text: "Poor".to_string(),
            top_cities: 3,
            strict_join: false,
            charts: ChartConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source, &path.display().to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if encoding_rs::Encoding::for_label(self.listings_encoding.as_bytes()).is_none() {
            return Err(ConfigError::Invalid {
                field: "listings_encoding",
                reason: format!("unknown encoding '{}'", self.listings_encoding),
            });
        }
        if !(1..=4).contains(&self.top_price_range) {
            return Err(ConfigError::Invalid {
                field: "top_price_range",
                reason: format!("{} is outside 1..=4", self.top_price_range),
            });
        }
        if self.charts.dpi == 0 || self.charts.figure_size.0 <= 0.0 || self.charts.figure_size.1 <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "charts",
                reason: "figure size and dpi must be positive".to_string(),
            });
        }
        Ok(())
    }
}
