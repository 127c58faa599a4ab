//! Charts module - static rendering, interactive pages and the gallery

mod gallery;
mod interactive;
mod renderer;
mod spec;

use std::path::PathBuf;
use thiserror::Error;

pub use gallery::{render_all, write_gallery};
pub use interactive::{figure, page, write_html};
pub use renderer::{diverging_color, mean_with_band, StaticChartRenderer, PALETTE};
pub use spec::{Chart, ChartData, ChartKind, ChartOptions, Field, HistFunc};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Chart '{chart}' is not supported: {reason}")]
    Unsupported { chart: String, reason: String },

    #[error("Chart '{0}' has no data to draw")]
    NoData(String),

    #[error("Chart '{chart}' needs field '{field}'")]
    MissingField { chart: String, field: String },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode figure: {0}")]
    Json(#[from] serde_json::Error),
}
