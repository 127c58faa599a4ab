//! Interactive charts as plotly.js pages.
//!
//! A figure is the usual `{data, layout}` pair; categories of the colour
//! column become separate traces, in order of first appearance.

use crate::charts::spec::{Chart, ChartData, ChartKind, Field, HistFunc};
use crate::charts::ChartError;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Build the plotly figure for an interactive chart.
pub fn figure(chart: &Chart) -> Result<Value, ChartError> {
    let ChartData::Records { fields } = &chart.data else {
        return Err(ChartError::Unsupported {
            chart: chart.name.clone(),
            reason: "interactive charts need record data".to_string(),
        });
    };
    let rows = fields.first().map_or(0, |(_, f)| f.len());
    let groups = color_groups(chart, rows)?;

    let (data, mut layout) = match chart.kind {
        ChartKind::InteractiveScatter => scatter(chart, &groups)?,
        ChartKind::ScatterMatrix => scatter_matrix(chart, &groups)?,
        ChartKind::InteractiveBox => boxes(chart, &groups)?,
        ChartKind::InteractiveHistogram => histograms(chart, &groups)?,
        kind => {
            return Err(ChartError::Unsupported {
                chart: chart.name.clone(),
                reason: format!("{kind:?} is not an interactive chart"),
            })
        }
    };

    layout.insert("title".into(), json!({ "text": chart.title() }));
    if let Some(color) = &chart.options.color {
        layout.insert("legend".into(), json!({ "title": { "text": color } }));
    }

    Ok(json!({ "data": data, "layout": layout }))
}

/// Standalone HTML page showing the chart.
pub fn page(chart: &Chart, plotly_url: &str) -> Result<String, ChartError> {
    let figure = serde_json::to_string(&figure(chart)?)?;
    // keep "</script>" inside string values from closing the tag
    let figure = figure.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{plotly_url}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:90vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escape_html(chart.title()),
    ))
}

pub fn write_html(chart: &Chart, path: &Path, plotly_url: &str) -> Result<(), ChartError> {
    let html = page(chart, plotly_url)?;
    fs::write(path, html).map_err(|source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Row indices per colour category; one unnamed group without a colour column.
fn color_groups(chart: &Chart, rows: usize) -> Result<Vec<(Option<String>, Vec<usize>)>, ChartError> {
    let Some(color) = &chart.options.color else {
        return Ok(vec![(None, (0..rows).collect())]);
    };
    let field = field(chart, color)?;

    let mut groups: Vec<(Option<String>, Vec<usize>)> = Vec::new();
    for i in 0..rows {
        let key = field.label(i);
        match groups.iter_mut().find(|(k, _)| k.as_deref() == Some(key.as_str())) {
            Some((_, members)) => members.push(i),
            None => groups.push((Some(key), vec![i])),
        }
    }
    Ok(groups)
}

fn field<'a>(chart: &'a Chart, name: &str) -> Result<&'a Field, ChartError> {
    chart
        .data
        .field(name)
        .ok_or_else(|| ChartError::MissingField {
            chart: chart.name.clone(),
            field: name.to_string(),
        })
}

fn required<'a>(chart: &Chart, option: &'a Option<String>, what: &str) -> Result<&'a str, ChartError> {
    option.as_deref().ok_or_else(|| ChartError::MissingField {
        chart: chart.name.clone(),
        field: what.to_string(),
    })
}

/// JSON values of `field` at the given rows; nulls and NaN become `null`.
fn pick(field: &Field, rows: &[usize]) -> Vec<Value> {
    rows.iter()
        .map(|&i| match field {
            Field::Numbers(v) => v[i].map_or(Value::Null, Value::from),
            Field::Labels(v) => v[i].clone().map_or(Value::Null, Value::from),
        })
        .collect()
}

fn named(trace: Value, group: &Option<String>) -> Value {
    let mut trace = trace;
    if let (Some(name), Value::Object(map)) = (group, &mut trace) {
        map.insert("name".into(), json!(name));
        map.insert("legendgroup".into(), json!(name));
    }
    trace
}

fn axis_title(text: &str) -> Value {
    json!({ "title": { "text": text } })
}

type Figure = (Vec<Value>, Map<String, Value>);

fn scatter(chart: &Chart, groups: &[(Option<String>, Vec<usize>)]) -> Result<Figure, ChartError> {
    let opts = &chart.options;
    let x_name = required(chart, &opts.x, "x")?;
    let y_name = required(chart, &opts.y, "y")?;
    let (x, y) = (field(chart, x_name)?, field(chart, y_name)?);

    // plotly express: area sizing, largest marker `size_max` pixels across
    let size = opts.size.as_deref().map(|name| field(chart, name)).transpose()?;
    let sizeref = match size {
        Some(Field::Numbers(v)) => {
            let max = v.iter().flatten().copied().fold(0.0, f64::max);
            (max > 0.0).then(|| 2.0 * max / (opts.size_max * opts.size_max))
        }
        _ => None,
    };
    let hover = opts.hover_name.as_deref().map(|name| field(chart, name)).transpose()?;

    let data = groups
        .iter()
        .map(|(group, rows)| {
            let mut marker = Map::new();
            if let (Some(size), Some(sizeref)) = (size, sizeref) {
                marker.insert("size".into(), json!(pick(size, rows)));
                marker.insert("sizemode".into(), json!("area"));
                marker.insert("sizeref".into(), json!(sizeref));
                marker.insert("sizemin".into(), json!(1));
            }
            let mut trace = json!({
                "type": "scatter",
                "mode": "markers",
                "x": pick(x, rows),
                "y": pick(y, rows),
                "marker": marker,
            });
            if let (Some(hover), Value::Object(map)) = (hover, &mut trace) {
                let text: Vec<String> = rows.iter().map(|&i| hover.label(i)).collect();
                map.insert("text".into(), json!(text));
                map.insert("hoverinfo".into(), json!("text+x+y"));
            }
            named(trace, group)
        })
        .collect();

    let mut xaxis = axis_title(x_name);
    if opts.log_x {
        xaxis["type"] = json!("log");
    }
    let mut layout = Map::new();
    layout.insert("xaxis".into(), xaxis);
    layout.insert("yaxis".into(), axis_title(y_name));
    Ok((data, layout))
}

fn scatter_matrix(chart: &Chart, groups: &[(Option<String>, Vec<usize>)]) -> Result<Figure, ChartError> {
    let dimensions = chart
        .options
        .dimensions
        .iter()
        .map(|name| Ok((name.as_str(), field(chart, name)?)))
        .collect::<Result<Vec<_>, ChartError>>()?;
    if dimensions.is_empty() {
        return Err(ChartError::MissingField {
            chart: chart.name.clone(),
            field: "dimensions".to_string(),
        });
    }

    let data = groups
        .iter()
        .map(|(group, rows)| {
            let dims: Vec<Value> = dimensions
                .iter()
                .map(|(label, f)| json!({ "label": label, "values": pick(f, rows) }))
                .collect();
            named(
                json!({
                    "type": "splom",
                    "dimensions": dims,
                    "diagonal": { "visible": false },
                    "marker": { "size": 4, "opacity": 0.6 },
                }),
                group,
            )
        })
        .collect();

    let mut layout = Map::new();
    layout.insert("dragmode".into(), json!("select"));
    layout.insert("height".into(), json!(800));
    Ok((data, layout))
}

fn boxes(chart: &Chart, groups: &[(Option<String>, Vec<usize>)]) -> Result<Figure, ChartError> {
    let opts = &chart.options;
    let x_name = required(chart, &opts.x, "x")?;
    let y_name = required(chart, &opts.y, "y")?;
    let (x, y) = (field(chart, x_name)?, field(chart, y_name)?);

    let data = groups
        .iter()
        .map(|(group, rows)| {
            named(
                json!({
                    "type": "box",
                    "x": pick(x, rows),
                    "y": pick(y, rows),
                    "notched": opts.notched,
                    "boxpoints": "outliers",
                }),
                group,
            )
        })
        .collect();

    let mut layout = Map::new();
    layout.insert("boxmode".into(), json!("group"));
    layout.insert("xaxis".into(), axis_title(x_name));
    layout.insert("yaxis".into(), axis_title(y_name));
    Ok((data, layout))
}

fn histograms(chart: &Chart, groups: &[(Option<String>, Vec<usize>)]) -> Result<Figure, ChartError> {
    let opts = &chart.options;
    let x_name = required(chart, &opts.x, "x")?;
    let x = field(chart, x_name)?;
    let y = opts.y.as_deref().map(|name| field(chart, name)).transpose()?;

    let histfunc = match opts.hist_func {
        HistFunc::Count => "count",
        HistFunc::Sum => "sum",
        HistFunc::Avg => "avg",
    };

    let data = groups
        .iter()
        .map(|(group, rows)| {
            let mut trace = json!({
                "type": "histogram",
                "x": pick(x, rows),
                "histfunc": histfunc,
            });
            if let Some(y) = y {
                trace["y"] = json!(pick(y, rows));
            }
            named(trace, group)
        })
        .collect();

    let y_title = match &opts.y {
        Some(y) if opts.hist_func != HistFunc::Count => format!("{histfunc} of {y}"),
        _ => "count".to_string(),
    };
    let mut layout = Map::new();
    layout.insert("barmode".into(), json!("group"));
    layout.insert("xaxis".into(), axis_title(x_name));
    layout.insert("yaxis".into(), axis_title(&y_title));
    Ok((data, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::spec::ChartOptions;

    fn records() -> ChartData {
        ChartData::Records {
            fields: vec![
                (
                    "Votes".to_string(),
                    Field::Numbers(vec![Some(10.0), Some(250.0), None, Some(40.0)]),
                ),
                (
                    "Average Cost for two".to_string(),
                    Field::Numbers(vec![Some(300.0), Some(1500.0), Some(800.0), Some(0.0)]),
                ),
                (
                    "Rating text".to_string(),
                    Field::Labels(vec![
                        Some("Good".into()),
                        Some("Excellent".into()),
                        Some("Good".into()),
                        Some("Poor".into()),
                    ]),
                ),
                (
                    "City".to_string(),
                    Field::Labels(vec![
                        Some("Goa".into()),
                        Some("Pune".into()),
                        Some("Agra".into()),
                        Some("Ooty".into()),
                    ]),
                ),
            ],
        }
    }

    fn cost_vs_votes() -> Chart {
        let mut options = ChartOptions::titled("Cost vs votes").xy("Average Cost for two", "Votes");
        options.size = Some("Votes".into());
        options.color = Some("Rating text".into());
        options.log_x = true;
        options.size_max = 60.0;
        options.hover_name = Some("City".into());
        Chart::new("cost_vs_votes", ChartKind::InteractiveScatter, records(), options)
    }

    #[test]
    fn test_scatter_one_trace_per_color() {
        let fig = figure(&cost_vs_votes()).unwrap();
        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 3);
        assert_eq!(traces[0]["name"], "Good");
        assert_eq!(traces[0]["x"], json!([300.0, 800.0]));
        assert_eq!(traces[0]["marker"]["size"], json!([10.0, null]));
        assert_eq!(traces[1]["text"], json!(["Pune"]));
        assert_eq!(fig["layout"]["xaxis"]["type"], "log");

        let sizeref = traces[0]["marker"]["sizeref"].as_f64().unwrap();
        assert!((sizeref - 2.0 * 250.0 / 3600.0).abs() < 1e-12);
    }

    #[test]
    fn test_page_embeds_figure() {
        let html = page(&cost_vs_votes(), "https://cdn.example/plotly.js").unwrap();
        assert!(html.contains(r#"<script src="https://cdn.example/plotly.js"></script>"#));
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("\"type\":\"scatter\""));
        assert!(html.contains("<title>Cost vs votes</title>"));
    }

    #[test]
    fn test_notched_box_and_avg_histogram() {
        let mut options = ChartOptions::default().xy("Rating text", "Average Cost for two");
        options.notched = true;
        let fig = figure(&Chart::new("box", ChartKind::InteractiveBox, records(), options)).unwrap();
        assert_eq!(fig["data"][0]["notched"], true);
        assert_eq!(fig["layout"]["boxmode"], "group");

        let mut options = ChartOptions::default().xy("Rating text", "Votes");
        options.hist_func = HistFunc::Avg;
        let fig = figure(&Chart::new("hist", ChartKind::InteractiveHistogram, records(), options)).unwrap();
        assert_eq!(fig["data"].as_array().unwrap().len(), 1);
        assert_eq!(fig["data"][0]["histfunc"], "avg");
        assert_eq!(fig["layout"]["yaxis"]["title"]["text"], "avg of Votes");
    }

    #[test]
    fn test_scatter_matrix_dimensions() {
        let mut options = ChartOptions::default();
        options.dimensions = vec!["Votes".into(), "Average Cost for two".into()];
        options.color = Some("Rating text".into());
        let fig = figure(&Chart::new("splom", ChartKind::ScatterMatrix, records(), options)).unwrap();
        assert_eq!(fig["data"][0]["type"], "splom");
        assert_eq!(fig["data"][0]["dimensions"][1]["values"], json!([300.0, 800.0]));
    }

    #[test]
    fn test_missing_field() {
        let options = ChartOptions::default().xy("Rating text", "Nope");
        let err = figure(&Chart::new("box", ChartKind::InteractiveBox, records(), options)).unwrap_err();
        assert!(matches!(err, ChartError::MissingField { field, .. } if field == "Nope"));
    }
}
