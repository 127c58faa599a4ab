//! Static Chart Renderer
//! Draws the seaborn-style charts of the analysis with plotters.
//!
//! Every chart is drawn on a generic drawing area, so the same code writes
//! PNG (bitmap backend) and SVG files.

use crate::charts::spec::{Chart, ChartData, ChartKind};
use crate::charts::ChartError;
use crate::config::ImageFormat;
use crate::stats::{density, StatsCalculator};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::collections::BTreeMap;
use std::path::Path;

// Colors
const BAR_BLUE: RGBColor = RGBColor(76, 114, 176);
const GRID_GRAY: RGBColor = RGBColor(200, 200, 200);
const NAN_GRAY: RGBColor = RGBColor(230, 230, 230);

/// seaborn "deep" palette
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
    RGBColor(218, 139, 195),
    RGBColor(140, 140, 140),
    RGBColor(204, 185, 116),
    RGBColor(100, 181, 205),
];

const CAPTION_SIZE: u32 = 22;
const LABEL_SIZE: u32 = 13;

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> ChartError {
    ChartError::Draw(err.to_string())
}

pub struct StaticChartRenderer {
    dpi: u32,
    default_size: (f64, f64),
}

impl Default for StaticChartRenderer {
    fn default() -> Self {
        Self::new(80, (8.0, 6.0))
    }
}

impl StaticChartRenderer {
    pub fn new(dpi: u32, default_size: (f64, f64)) -> Self {
        Self { dpi, default_size }
    }

    /// Image size in pixels for a chart (figure inches times dpi).
    pub fn pixel_size(&self, chart: &Chart) -> (u32, u32) {
        let (w, h) = chart.options.figure_size.unwrap_or(self.default_size);
        let dpi = self.dpi as f64;
        ((w * dpi).round().max(1.0) as u32, (h * dpi).round().max(1.0) as u32)
    }

    /// Render a static chart to `path`.
    pub fn render(&self, chart: &Chart, path: &Path, format: ImageFormat) -> Result<(), ChartError> {
        if chart.kind.is_interactive() {
            return Err(ChartError::Unsupported {
                chart: chart.name.clone(),
                reason: "interactive charts are written as HTML".to_string(),
            });
        }

        let size = self.pixel_size(chart);
        match format {
            ImageFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                Self::draw(&root, chart)?;
                root.present().map_err(draw_error)?;
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                Self::draw(&root, chart)?;
                root.present().map_err(draw_error)?;
            }
        }
        Ok(())
    }

    fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &Chart) -> Result<(), ChartError> {
        root.fill(&WHITE).map_err(draw_error)?;

        match (chart.kind, &chart.data) {
            (ChartKind::Heatmap, ChartData::Matrix { labels, values }) => {
                Self::draw_heatmap(root, chart, labels, values)
            }
            (ChartKind::Distribution, ChartData::Values { label, values }) => {
                Self::draw_distribution(root, chart, label, values)
            }
            (ChartKind::Scatter, ChartData::Pairs { x_label, y_label, points }) => {
                Self::draw_scatter(root, chart, x_label, y_label, points)
            }
            (ChartKind::Line, ChartData::Pairs { x_label, y_label, points }) => {
                Self::draw_line(root, chart, x_label, y_label, points)
            }
            (ChartKind::Violin, ChartData::Groups { x_label, y_label, groups }) => {
                Self::draw_violin(root, chart, x_label, y_label, groups)
            }
            (ChartKind::Box, ChartData::Groups { x_label, y_label, groups }) => {
                Self::draw_box(root, chart, x_label, y_label, groups)
            }
            (ChartKind::Count | ChartKind::Bar, ChartData::Counts { x_label, y_label, entries }) => {
                Self::draw_bars(root, chart, x_label, y_label, entries)
            }
            (kind, _) => Err(ChartError::Unsupported {
                chart: chart.name.clone(),
                reason: format!("{kind:?} cannot draw this data"),
            }),
        }
    }

    fn draw_heatmap<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        labels: &[String],
        values: &[Vec<f64>],
    ) -> Result<(), ChartError> {
        let n = labels.len() as i32;
        if n == 0 {
            return Err(ChartError::NoData(chart.name.clone()));
        }
        let (vmin, vmax) = chart
            .options
            .value_range
            .unwrap_or_else(|| finite_bounds(values.iter().flatten().copied()).unwrap_or((-1.0, 1.0)));

        let mut ctx = ChartBuilder::on(root)
            .caption(chart.title(), ("sans-serif", CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(150)
            .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())
            .map_err(draw_error)?;

        // rows run top to bottom, so y segment k shows row n - 1 - k
        let column_label = |v: &SegmentValue<i32>| segment_label(labels, v, false);
        let row_label = |v: &SegmentValue<i32>| segment_label(labels, v, true);
        ctx.configure_mesh()
            .disable_mesh()
            .x_labels(n as usize)
            .y_labels(n as usize)
            .x_label_formatter(&column_label)
            .y_label_formatter(&row_label)
            .label_style(("sans-serif", LABEL_SIZE))
            .draw()
            .map_err(draw_error)?;

        let cells: Vec<(i32, i32, f64)> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, values[i as usize][j as usize]))
            .collect();

        ctx.draw_series(cells.iter().map(|&(i, j, v)| {
            let y = n - 1 - i;
            Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(y + 1)),
                ],
                diverging_color(v, vmin, vmax).filled(),
            )
        }))
        .map_err(draw_error)?;

        let centered = Pos::new(HPos::Center, VPos::Center);
        ctx.draw_series(cells.iter().map(|&(i, j, v)| {
            Text::new(
                format!("{v:.2}"),
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(n - 1 - i)),
                ("sans-serif", LABEL_SIZE).into_font().color(&BLACK).pos(centered),
            )
        }))
        .map_err(draw_error)?;

        Ok(())
    }

    fn draw_distribution<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        label: &str,
        values: &[f64],
    ) -> Result<(), ChartError> {
        if values.is_empty() {
            return Err(ChartError::NoData(chart.name.clone()));
        }

        let hist = density::histogram(values, density::auto_bins(values));
        let curve = density::kde(values, 256);

        let x_min = curve.first().map_or(hist.edges[0], |p| p.0.min(hist.edges[0]));
        let x_max = curve
            .last()
            .map_or(hist.edges[hist.edges.len() - 1], |p| p.0.max(hist.edges[hist.edges.len() - 1]));
        let y_max = hist
            .densities
            .iter()
            .copied()
            .chain(curve.iter().map(|p| p.1))
            .fold(0.0, f64::max)
            * 1.1;

        let mut ctx = ChartBuilder::on(root)
            .caption(chart.title(), ("sans-serif", CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max.max(f64::EPSILON))
            .map_err(draw_error)?;

        ctx.configure_mesh()
            .light_line_style(GRID_GRAY.mix(0.3))
            .x_desc(label)
            .y_desc("Density")
            .draw()
            .map_err(draw_error)?;

        ctx.draw_series(hist.densities.iter().enumerate().map(|(i, &d)| {
            Rectangle::new([(hist.edges[i], 0.0), (hist.edges[i + 1], d)], BAR_BLUE.mix(0.4).filled())
        }))
        .map_err(draw_error)?;

        ctx.draw_series(LineSeries::new(curve, BAR_BLUE.stroke_width(2)))
            .map_err(draw_error)?;

        Ok(())
    }

    fn draw_scatter<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
    ) -> Result<(), ChartError> {
        let (points, x_desc) = if chart.options.log_x {
            let logged: Vec<(f64, f64)> = points
                .iter()
                .filter(|(x, _)| *x > 0.0)
                .map(|&(x, y)| (x.log10(), y))
                .collect();
            (logged, format!("log10({x_label})"))
        } else {
            (points.to_vec(), x_label.to_string())
        };

        let (Some(x_range), Some(y_range)) = (
            padded(finite_bounds(points.iter().map(|p| p.0))),
            padded(finite_bounds(points.iter().map(|p| p.1))),
        ) else {
            return Err(ChartError::NoData(chart.name.clone()));
        };

        let mut ctx = ChartBuilder::on(root)
            .caption(chart.title(), ("sans-serif", CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
            .map_err(draw_error)?;

        ctx.configure_mesh()
            .light_line_style(GRID_GRAY.mix(0.3))
            .x_desc(x_desc)
            .y_desc(y_label)
            .draw()
            .map_err(draw_error)?;

        ctx.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, BAR_BLUE.mix(0.6).filled())),
        )
        .map_err(draw_error)?;

        Ok(())
    }

    fn draw_line<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
    ) -> Result<(), ChartError> {
        let trend = mean_with_band(points);
        if trend.is_empty() {
            return Err(ChartError::NoData(chart.name.clone()));
        }

        let (Some(x_range), Some(y_range)) = (
            padded(finite_bounds(trend.iter().map(|t| t.0))),
            padded(finite_bounds(trend.iter().flat_map(|t| [t.2, t.3]))),
        ) else {
            return Err(ChartError::NoData(chart.name.clone()));
        };

        let mut ctx = ChartBuilder::on(root)
            .caption(chart.title(), ("sans-serif", CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
            .map_err(draw_error)?;

        ctx.configure_mesh()
            .light_line_style(GRID_GRAY.mix(0.3))
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_error)?;

        let band: Vec<(f64, f64)> = trend
            .iter()
            .map(|t| (t.0, t.3))
            .chain(trend.iter().rev().map(|t| (t.0, t.2)))
            .collect();
        ctx.draw_series(std::iter::once(Polygon::new(band, BAR_BLUE.mix(0.2).filled())))
            .map_err(draw_error)?;

        ctx.draw_series(LineSeries::new(
            trend.iter().map(|t| (t.0, t.1)),
            BAR_BLUE.stroke_width(2),
        ))
        .map_err(draw_error)?;

        Ok(())
    }

    fn draw_violin<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        x_label: &str,
        y_label: &str,
        groups: &[(String, Vec<f64>)],
    ) -> Result<(), ChartError> {
        let curves: Vec<Vec<(f64, f64)>> = groups.iter().map(|(_, v)| density::kde(v, 100)).collect();
        let Some(y_range) = padded(finite_bounds(
            curves
                .iter()
                .flatten()
                .map(|p| p.0)
                .chain(groups.iter().flat_map(|(_, v)| v.iter().copied())),
        )) else {
            return Err(ChartError::NoData(chart.name.clone()));
        };

        let names: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
        let mut ctx = Self::category_axes(root, chart, &names, x_label, y_label, y_range)?;

        for (i, ((_, values), curve)) in groups.iter().zip(&curves).enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let center = i as f64;
            let peak = curve.iter().map(|p| p.1).fold(0.0, f64::max);
            if peak > 0.0 {
                let scale = 0.4 / peak;
                let outline: Vec<(f64, f64)> = curve
                    .iter()
                    .map(|&(y, d)| (center + d * scale, y))
                    .chain(curve.iter().rev().map(|&(y, d)| (center - d * scale, y)))
                    .collect();
                ctx.draw_series(std::iter::once(Polygon::new(outline, color.mix(0.8).filled())))
                    .map_err(draw_error)?;
            }

            if let Some(summary) = StatsCalculator::box_summary(values) {
                ctx.draw_series([
                    PathElement::new(
                        vec![(center, summary.whisker_low), (center, summary.whisker_high)],
                        BLACK.stroke_width(1),
                    ),
                    PathElement::new(
                        vec![(center, summary.q1), (center, summary.q3)],
                        BLACK.stroke_width(5),
                    ),
                ])
                .map_err(draw_error)?;
                ctx.draw_series(std::iter::once(Circle::new(
                    (center, summary.median),
                    3,
                    WHITE.filled(),
                )))
                .map_err(draw_error)?;
            }
        }

        Ok(())
    }

    fn draw_box<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        x_label: &str,
        y_label: &str,
        groups: &[(String, Vec<f64>)],
    ) -> Result<(), ChartError> {
        let Some(y_range) = padded(finite_bounds(groups.iter().flat_map(|(_, v)| v.iter().copied())))
        else {
            return Err(ChartError::NoData(chart.name.clone()));
        };

        let names: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
        let mut ctx = Self::category_axes(root, chart, &names, x_label, y_label, y_range)?;

        for (i, (_, values)) in groups.iter().enumerate() {
            let Some(summary) = StatsCalculator::box_summary(values) else {
                continue;
            };
            let color = PALETTE[i % PALETTE.len()];
            let (left, center, right) = (i as f64 - 0.3, i as f64, i as f64 + 0.3);
            let cap = 0.15;

            ctx.draw_series([
                Rectangle::new([(left, summary.q1), (right, summary.q3)], color.mix(0.8).filled()),
                Rectangle::new([(left, summary.q1), (right, summary.q3)], BLACK.stroke_width(1)),
            ])
            .map_err(draw_error)?;

            ctx.draw_series([
                PathElement::new(vec![(left, summary.median), (right, summary.median)], BLACK.stroke_width(2)),
                PathElement::new(vec![(center, summary.q3), (center, summary.whisker_high)], BLACK.stroke_width(1)),
                PathElement::new(vec![(center, summary.q1), (center, summary.whisker_low)], BLACK.stroke_width(1)),
                PathElement::new(
                    vec![(center - cap, summary.whisker_high), (center + cap, summary.whisker_high)],
                    BLACK.stroke_width(1),
                ),
                PathElement::new(
                    vec![(center - cap, summary.whisker_low), (center + cap, summary.whisker_low)],
                    BLACK.stroke_width(1),
                ),
            ])
            .map_err(draw_error)?;

            // fliers
            ctx.draw_series(
                values
                    .iter()
                    .filter(|&&v| v < summary.whisker_low || v > summary.whisker_high)
                    .map(|&v| Circle::new((center, v), 2, BLACK.stroke_width(1))),
            )
            .map_err(draw_error)?;
        }

        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &Chart,
        x_label: &str,
        y_label: &str,
        entries: &[(String, f64)],
    ) -> Result<(), ChartError> {
        if entries.is_empty() {
            return Err(ChartError::NoData(chart.name.clone()));
        }

        let top = entries.iter().map(|e| e.1).fold(0.0, f64::max);
        let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        let mut ctx = Self::category_axes(root, chart, &names, x_label, y_label, (0.0, top.max(1.0) * 1.1))?;

        ctx.draw_series(entries.iter().enumerate().map(|(i, &(_, v))| {
            Rectangle::new(
                [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, v)],
                PALETTE[i % PALETTE.len()].filled(),
            )
        }))
        .map_err(draw_error)?;

        Ok(())
    }

    /// Chart with one slot per category on the x axis, slot `i` centred at `i`.
    fn category_axes<'a, DB: DrawingBackend>(
        root: &'a DrawingArea<DB, Shift>,
        chart: &Chart,
        names: &[String],
        x_label: &str,
        y_label: &str,
        y_range: (f64, f64),
    ) -> Result<ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>, ChartError> {
        let k = names.len().max(1);
        let rotated = chart.options.x_label_rotation >= 45;

        let mut ctx = ChartBuilder::on(root)
            .caption(chart.title(), ("sans-serif", CAPTION_SIZE))
            .margin(15)
            .x_label_area_size(if rotated { 110 } else { 40 })
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(k as f64 - 0.5), y_range.0..y_range.1)
            .map_err(draw_error)?;

        let font = ("sans-serif", LABEL_SIZE).into_font();
        // plotters only rotates text in quarter turns
        let tick_font = if rotated {
            font.transform(FontTransform::Rotate90)
        } else {
            font
        };
        let formatter = |v: &f64| category_label(names, *v);

        ctx.configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID_GRAY.mix(0.3))
            .x_labels(k + 1)
            .x_label_formatter(&formatter)
            .x_label_style(tick_font)
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_error)?;

        Ok(ctx)
    }
}

/// Label of the category slot at `v`, empty between slots.
fn category_label(names: &[String], v: f64) -> String {
    let rounded = v.round();
    if (v - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    names.get(rounded as usize).cloned().unwrap_or_default()
}

fn segment_label(labels: &[String], v: &SegmentValue<i32>, reversed: bool) -> String {
    let idx = match v {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => *i,
        SegmentValue::Last => return String::new(),
    };
    let idx = if reversed { labels.len() as i32 - 1 - idx } else { idx };
    if idx < 0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Blue-white-red colour for `v` on the scale `[vmin, vmax]`.
pub fn diverging_color(v: f64, vmin: f64, vmax: f64) -> RGBColor {
    if !v.is_finite() || vmax <= vmin {
        return NAN_GRAY;
    }
    let t = ((v - vmin) / (vmax - vmin)).clamp(0.0, 1.0);
    let (cold, warm) = ((59.0, 76.0, 192.0), (180.0, 4.0, 38.0));
    let lerp = |a: f64, b: f64, t: f64| (a + (b - a) * t).round() as u8;

    if t < 0.5 {
        let s = t * 2.0;
        RGBColor(lerp(cold.0, 255.0, s), lerp(cold.1, 255.0, s), lerp(cold.2, 255.0, s))
    } else {
        let s = (t - 0.5) * 2.0;
        RGBColor(lerp(255.0, warm.0, s), lerp(255.0, warm.1, s), lerp(255.0, warm.2, s))
    }
}

/// Min and max of the finite values, if any.
fn finite_bounds<I: Iterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widen bounds by 5% on each side (one unit when the range is flat).
fn padded(bounds: Option<(f64, f64)>) -> Option<(f64, f64)> {
    let (lo, hi) = bounds?;
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    Some((lo - pad, hi + pad))
}

/// Mean y per distinct x with a 95% normal confidence band: (x, mean, low, high).
pub fn mean_with_band(points: &[(f64, f64)]) -> Vec<(f64, f64, f64, f64)> {
    let mut by_x: BTreeMap<u64, (f64, Vec<f64>)> = BTreeMap::new();
    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            // total order key for finite floats
            let key = if x >= 0.0 { x.to_bits() ^ (1 << 63) } else { !x.to_bits() };
            by_x.entry(key).or_insert_with(|| (x, Vec::new())).1.push(y);
        }
    }

    by_x
        .into_values()
        .map(|(x, ys)| {
            let summary = StatsCalculator::summarize("", &ys);
            let half = if summary.count > 1 {
                1.96 * summary.std / (summary.count as f64).sqrt()
            } else {
                0.0
            };
            (x, summary.mean, summary.mean - half, summary.mean + half)
        })
        .collect()
}
