//! Writes a batch of charts to a directory, plus an index page.

use crate::charts::interactive::{escape_html, write_html};
use crate::charts::renderer::StaticChartRenderer;
use crate::charts::spec::Chart;
use crate::charts::ChartError;
use crate::config::ChartConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ChartError + '_ {
    move |source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Render every chart into `out_dir`, returning the written files in order.
///
/// Static charts become `<name>.png` or `<name>.svg`, interactive charts
/// `<name>.html`. Charts without data are skipped with a warning.
pub fn render_all(charts: &[Chart], out_dir: &Path, config: &ChartConfig) -> Result<Vec<PathBuf>, ChartError> {
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;
    let renderer = StaticChartRenderer::new(config.dpi, config.figure_size);

    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = if chart.kind.is_interactive() {
            let path = out_dir.join(format!("{}.html", chart.name));
            write_html(chart, &path, &config.plotly_url)?;
            path
        } else {
            let path = out_dir.join(format!("{}.{}", chart.name, config.format.extension()));
            match renderer.render(chart, &path, config.format) {
                Ok(()) => {}
                Err(ChartError::NoData(name)) => {
                    warn!(chart = %name, "No data to draw, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            }
            path
        };
        debug!(path = %path.display(), "Chart written");
        written.push(path);
    }

    info!(count = written.len(), dir = %out_dir.display(), "Charts rendered");
    Ok(written)
}

/// Write `index.html` linking every rendered chart, images inline.
pub fn write_gallery(out_dir: &Path, rendered: &[PathBuf]) -> Result<PathBuf, ChartError> {
    let mut body = String::new();
    for path in rendered {
        let Some(file) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file);
        let (file, stem) = (escape_html(file), escape_html(stem));

        let item = match path.extension().and_then(|e| e.to_str()) {
            Some("html") => format!(r#"<iframe src="{file}" title="{stem}"></iframe>"#),
            _ => format!(r#"<img src="{file}" alt="{stem}">"#),
        };
        body.push_str(&format!(
            "<section>\n<h2><a href=\"{file}\">{stem}</a></h2>\n{item}\n</section>\n"
        ));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Zomato restaurant analysis</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
img {{ max-width: 100%; }}
iframe {{ width: 100%; height: 640px; border: none; }}
</style>
</head>
<body>
<h1>Zomato restaurant analysis</h1>
{body}</body>
</html>
"#
    );

    let index = out_dir.join("index.html");
    fs::write(&index, html).map_err(io_error(&index))?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::spec::{ChartData, ChartKind, ChartOptions, Field};
    use tempfile::tempdir;

    fn histogram_chart(name: &str) -> Chart {
        let data = ChartData::Records {
            fields: vec![
                (
                    "Has Online delivery".to_string(),
                    Field::Labels(vec![Some("Yes".into()), Some("No".into())]),
                ),
                (
                    "Aggregate rating".to_string(),
                    Field::Numbers(vec![Some(3.5), Some(2.0)]),
                ),
            ],
        };
        let mut options = ChartOptions::default().xy("Has Online delivery", "Aggregate rating");
        options.hist_func = crate::charts::HistFunc::Avg;
        Chart::new(name, ChartKind::InteractiveHistogram, data, options)
    }

    #[test]
    fn test_render_all_and_gallery() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("charts");
        let charts = vec![histogram_chart("online"), histogram_chart("booking")];

        let written = render_all(&charts, &out, &ChartConfig::default()).unwrap();
        assert_eq!(written, vec![out.join("online.html"), out.join("booking.html")]);
        assert!(written.iter().all(|p| p.exists()));

        let index = write_gallery(&out, &written).unwrap();
        let html = fs::read_to_string(index).unwrap();
        assert!(html.contains(r#"<iframe src="online.html""#));
        assert!(html.find("online.html") < html.find("booking.html"));
    }

    #[test]
    fn test_gallery_embeds_images() {
        let dir = tempdir().unwrap();
        let index = write_gallery(dir.path(), &[dir.path().join("heatmap.png")]).unwrap();
        let html = fs::read_to_string(index).unwrap();
        assert!(html.contains(r#"<img src="heatmap.png" alt="heatmap">"#));
    }
}
