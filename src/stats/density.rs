//! Histogram binning and Gaussian kernel density estimates.

use crate::stats::StatsCalculator;
use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

/// Equal-width histogram, normalised so bar areas sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `bins + 1` edges, ascending
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    pub densities: Vec<f64>,
}

/// Freedman-Diaconis bin count, capped at 50 (seaborn's distplot rule).
pub fn auto_bins(values: &[f64]) -> usize {
    let n = values.len();
    if n < 2 {
        return 1;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let iqr = StatsCalculator::percentile(&sorted, 75.0) - StatsCalculator::percentile(&sorted, 25.0);
    let range = sorted[n - 1] - sorted[0];

    let width = 2.0 * iqr / (n as f64).cbrt();
    if width <= 0.0 || range <= 0.0 {
        return (n as f64).sqrt().ceil().clamp(1.0, 50.0) as usize;
    }
    ((range / width).ceil() as usize).clamp(1, 50)
}

/// Bin `values` into `bins` equal-width bins spanning their range.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    if values.is_empty() {
        return Histogram {
            edges: vec![0.0, 1.0],
            counts: vec![0],
            densities: vec![0.0],
        };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        // the last edge is inclusive
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = values.len() as f64;
    let densities = counts.iter().map(|&c| c as f64 / (total * width)).collect();

    Histogram {
        edges,
        counts,
        densities,
    }
}

/// Scott's rule bandwidth for a Gaussian kernel.
pub fn scott_bandwidth(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let std = values.iter().std_dev();
    if !std.is_finite() || std == 0.0 {
        return 1.0;
    }
    std * n.powf(-0.2)
}

/// Gaussian KDE evaluated on `points` evenly spaced grid positions.
///
/// The grid extends three bandwidths past the data on both sides.
pub fn kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    if values.is_empty() || points < 2 {
        return Vec::new();
    }

    let h = scott_bandwidth(values);
    let Ok(kernel) = Normal::new(0.0, 1.0) else {
        return Vec::new();
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min) - 3.0 * h;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 3.0 * h;
    let step = (max - min) / (points - 1) as f64;
    let n = values.len() as f64;

    (0..points)
        .map(|i| {
            let x = min + i as f64 * step;
            let density = values.iter().map(|&v| kernel.pdf((x - v) / h)).sum::<f64>() / (n * h);
            (x, density)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_counts_every_value() {
        let values = [0.0, 0.0, 1.0, 2.5, 3.0, 4.9, 4.9];
        let h = histogram(&values, 5);
        assert_eq!(h.counts.iter().sum::<usize>(), values.len());
        assert_eq!(h.edges.len(), 6);
        assert_eq!(h.counts[0], 2);
        assert_eq!(h.counts[4], 2);

        let width = h.edges[1] - h.edges[0];
        let area: f64 = h.densities.iter().map(|d| d * width).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_constant_values() {
        let h = histogram(&[2.0, 2.0], 3);
        assert_eq!(h.counts.iter().sum::<usize>(), 2);
    }

    #[test]
    fn test_auto_bins_bounds() {
        assert_eq!(auto_bins(&[1.0]), 1);
        // narrow bulk plus one extreme outlier hits the cap
        let mut skewed: Vec<f64> = (0..10_000).map(|i| (i % 100) as f64 / 100.0).collect();
        skewed.push(800_000.0);
        assert_eq!(auto_bins(&skewed), 50);
        let even: Vec<f64> = (0..10_000).map(|i| i as f64).collect();
        assert_eq!(auto_bins(&even), 22);
        assert!(auto_bins(&[1.0, 2.0, 3.0, 4.0]) >= 1);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let values = [0.0, 3.1, 3.4, 3.5, 3.9, 4.2, 4.9];
        let curve = kde(&values, 512);
        assert_eq!(curve.len(), 512);

        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, y)| y * step).sum();
        assert!((area - 1.0).abs() < 0.02, "area was {area}");
    }

    #[test]
    fn test_kde_empty() {
        assert!(kde(&[], 100).is_empty());
    }
}
