use std::fmt;
use std::str::FromStr;

use plotters::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use super::{correlation, describe_column, format_correlation, DescriptiveStat};
use crate::ingest::TabularData;
use crate::types::{AppError, AppResult};

const SVG_SIZE: (u32, u32) = (800, 500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter,
    Line,
    Bar,
    Histogram,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Scatter,
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Histogram,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Histogram => "Histogram",
        }
    }

    pub fn needs_y(&self) -> bool {
        !matches!(self, ChartKind::Histogram)
    }

    fn title(&self, x: &str, y: Option<&str>) -> String {
        let y = y.unwrap_or_default();
        match self {
            ChartKind::Scatter | ChartKind::Line => format!("{} vs {}", y, x),
            ChartKind::Bar => format!("{} by {}", y, x),
            ChartKind::Histogram => format!("Histogram of {}", x),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ChartKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scatter plot" | "scatter" => Ok(ChartKind::Scatter),
            "line chart" | "line" => Ok(ChartKind::Line),
            "bar chart" | "bar" => Ok(ChartKind::Bar),
            "histogram" => Ok(ChartKind::Histogram),
            other => Err(AppError::InvalidRequest(format!("unknown chart kind '{}'", other))),
        }
    }
}

impl Serialize for ChartKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ChartKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The user's current chart selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub x: String,
    #[serde(default)]
    pub y: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: Option<String>,
    /// Row-wise (x, y) pairs with both values present; empty for histograms
    pub points: Vec<(f64, f64)>,
    pub bins: Vec<HistogramBin>,
    /// Rendered figure, absent if rendering failed
    pub svg: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    /// Two-decimal Pearson coefficient or "undefined"; absent for histograms
    pub correlation: Option<String>,
    pub x_stats: DescriptiveStat,
    pub y_stats: Option<DescriptiveStat>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartOutput {
    pub chart: Chart,
    pub insights: Insights,
}

/// Names of the numeric columns, in table order
pub fn numeric_column_names(table: &TabularData) -> Vec<String> {
    table.numeric_columns().map(|c| c.name.clone()).collect()
}

pub fn build_chart(table: &TabularData, spec: &ChartSpec) -> AppResult<ChartOutput> {
    let numeric = numeric_column_names(table);
    if numeric.len() < 2 {
        return Err(AppError::InsufficientNumericColumns {
            found: numeric.len(),
        });
    }

    let x_values = numeric_values(table, &spec.x)?;
    let y = if spec.kind.needs_y() {
        let name = spec
            .y
            .as_deref()
            .ok_or_else(|| AppError::InvalidColumn("<none>".to_string()))?;
        Some((name, numeric_values(table, name)?))
    } else {
        None
    };

    let title = spec.kind.title(&spec.x, y.as_ref().map(|(name, _)| *name));
    let (points, bins) = match &y {
        Some((_, y_values)) => (paired_points(x_values, y_values), Vec::new()),
        None => (Vec::new(), histogram_bins(x_values)),
    };

    let mut chart = Chart {
        kind: spec.kind,
        title,
        x_label: spec.x.clone(),
        y_label: y.as_ref().map(|(name, _)| name.to_string()),
        points,
        bins,
        svg: None,
    };
    chart.svg = match render_svg(&chart) {
        Ok(svg) => Some(svg),
        Err(e) => {
            warn!(error = %e, title = %chart.title, "Chart rendering failed");
            None
        }
    };

    let mut notes = Vec::new();
    let coefficient = y.as_ref().map(|(name, y_values)| {
        let formatted = format_correlation(correlation(x_values, y_values));
        notes.push(format!(
            "Correlation between {} and {}: {}",
            spec.x, name, formatted
        ));
        formatted
    });
    let x_stats = describe_column(&spec.x, x_values);
    notes.push(format!("Summary statistics for {}:", spec.x));
    let y_stats = y.as_ref().map(|(name, y_values)| {
        notes.push(format!("Summary statistics for {}:", name));
        describe_column(name, y_values)
    });

    debug!(kind = %spec.kind, title = %chart.title, "Chart built");
    Ok(ChartOutput {
        chart,
        insights: Insights {
            correlation: coefficient,
            x_stats,
            y_stats,
            notes,
        },
    })
}

fn numeric_values<'a>(table: &'a TabularData, name: &str) -> AppResult<&'a [Option<f64>]> {
    table
        .column(name)
        .and_then(|c| c.values.as_numeric())
        .ok_or_else(|| AppError::InvalidColumn(name.to_string()))
}

fn paired_points(x: &[Option<f64>], y: &[Option<f64>]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect()
}

/// Equal-width bins, count chosen by Sturges' rule
fn histogram_bins(values: &[Option<f64>]) -> Vec<HistogramBin> {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return Vec::new();
    }
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: present.len(),
        }];
    }

    let bin_count = ((present.len() as f64).log2().ceil() as usize + 1).max(1);
    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bin_count {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for v in present {
        let idx = (((v - min) / width) as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    bins
}

fn padded_range(mut lo: f64, mut hi: f64) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn render_svg(chart: &Chart) -> anyhow::Result<String> {
    let (x_range, y_range) = if chart.kind == ChartKind::Histogram {
        let lo = chart.bins.first().map(|b| b.start).unwrap_or(0.0);
        let hi = chart.bins.last().map(|b| b.end).unwrap_or(1.0);
        let top = chart.bins.iter().map(|b| b.count).max().unwrap_or(1) as f64;
        (padded_range(lo, hi), (0.0, top * 1.1 + 0.5))
    } else {
        let xs = chart.points.iter().map(|p| p.0);
        let ys = chart.points.iter().map(|p| p.1);
        let x_range = padded_range(
            xs.clone().fold(f64::INFINITY, f64::min),
            xs.fold(f64::NEG_INFINITY, f64::max),
        );
        let y_lo = ys.clone().fold(f64::INFINITY, f64::min);
        let y_hi = ys.fold(f64::NEG_INFINITY, f64::max);
        // bars grow from zero
        let y_range = if chart.kind == ChartKind::Bar {
            padded_range(y_lo.min(0.0), y_hi.max(0.0))
        } else {
            padded_range(y_lo, y_hi)
        };
        (x_range, y_range)
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SVG_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut plot = ChartBuilder::on(&root)
            .margin(20)
            .caption(&chart.title, ("sans-serif", 24))
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)?;

        plot.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_deref().unwrap_or("count"))
            .draw()?;

        match chart.kind {
            ChartKind::Scatter => {
                plot.draw_series(
                    chart
                        .points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
                )?;
            }
            ChartKind::Line => {
                plot.draw_series(std::iter::once(PathElement::new(chart.points.clone(), &BLUE)))?;
            }
            ChartKind::Bar => {
                let half = bar_half_width(&chart.points);
                plot.draw_series(chart.points.iter().map(|&(x, y)| {
                    Rectangle::new([(x - half, 0.0), (x + half, y)], BLUE.mix(0.6).filled())
                }))?;
            }
            ChartKind::Histogram => {
                plot.draw_series(chart.bins.iter().map(|b| {
                    Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLUE.mix(0.6).filled())
                }))?;
            }
        }

        root.present()?;
    }
    Ok(svg)
}

fn bar_half_width(points: &[(f64, f64)]) -> f64 {
    let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    xs.dedup();
    let gap = xs
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);
    if gap.is_finite() {
        gap * 0.4
    } else {
        0.4
    }
}
