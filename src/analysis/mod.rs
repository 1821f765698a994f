//! Descriptive statistics and correlation over loaded tables.
//!
//! Statistics follow the usual dataframe `describe()` conventions: missing
//! values are skipped, the standard deviation is the sample one (n - 1), and
//! quartiles interpolate linearly between the closest ranks.

pub mod chart;

pub use chart::{
    build_chart, numeric_column_names, Chart, ChartKind, ChartOutput, ChartSpec, Insights,
};

use std::collections::HashMap;

use serde::Serialize;

use crate::ingest::{ColumnValues, TabularData};

const STAT_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStat {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl DescriptiveStat {
    fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std_dev,
            self.min,
            self.q25,
            self.median,
            self.q75,
            self.max,
        ]
    }
}

pub fn describe_column(name: &str, values: &[Option<f64>]) -> DescriptiveStat {
    let mut col: Vec<f64> = values.iter().flatten().copied().filter(|v| !v.is_nan()).collect();
    col.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = col.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        col.iter().sum::<f64>() / count as f64
    };

    DescriptiveStat {
        column: name.to_string(),
        count,
        mean,
        std_dev: std_dev(&col, mean),
        min: col.first().copied().unwrap_or(f64::NAN),
        q25: quantile(&col, 0.25),
        median: quantile(&col, 0.5),
        q75: quantile(&col, 0.75),
        max: col.last().copied().unwrap_or(f64::NAN),
    }
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    variance.sqrt()
}

/// `sorted` must be ascending
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Pearson correlation over rows where both values are present.
///
/// NaN when fewer than two complete pairs exist or either side has zero variance.
pub fn correlation(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
            _ => None,
        })
        .collect();

    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;
    let mut num = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        num += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }
    if denom_x == 0.0 || denom_y == 0.0 {
        f64::NAN
    } else {
        (num / (denom_x.sqrt() * denom_y.sqrt())).clamp(-1.0, 1.0)
    }
}

/// Two-decimal rendering, `"undefined"` for NaN
pub fn format_correlation(value: f64) -> String {
    if value.is_nan() {
        "undefined".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// Summary of a non-numeric column: count, distinct values, most frequent value and its frequency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalStat {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

fn describe_categorical(name: &str, values: &[Option<String>]) -> CategoricalStat {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for v in values.iter().flatten() {
        let entry = counts.entry(v.as_str()).or_insert(0);
        if *entry == 0 {
            first_seen.push(v.as_str());
        }
        *entry += 1;
    }
    // ties resolve to the value seen first
    let top = first_seen
        .iter()
        .copied()
        .fold(None::<(&str, usize)>, |best, v| {
            let c = counts[v];
            match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((v, c)),
            }
        });

    CategoricalStat {
        column: name.to_string(),
        count: values.iter().flatten().count(),
        unique: counts.len(),
        top: top.map(|(v, _)| v.to_string()),
        freq: top.map(|(_, c)| c).unwrap_or(0),
    }
}

/// Table-wide summary. Numeric columns are described when present;
/// otherwise the text columns get a categorical summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "columns", rename_all = "snake_case")]
pub enum TableSummary {
    Numeric(Vec<DescriptiveStat>),
    Categorical(Vec<CategoricalStat>),
    Empty,
}

pub fn describe_table(table: &TabularData) -> TableSummary {
    let numeric: Vec<DescriptiveStat> = table
        .numeric_columns()
        .filter_map(|c| c.values.as_numeric().map(|v| describe_column(&c.name, v)))
        .collect();
    if !numeric.is_empty() {
        return TableSummary::Numeric(numeric);
    }

    let categorical: Vec<CategoricalStat> = table
        .columns()
        .iter()
        .filter_map(|c| match &c.values {
            ColumnValues::Text(v) => Some(describe_categorical(&c.name, v)),
            _ => None,
        })
        .collect();
    if categorical.is_empty() {
        TableSummary::Empty
    } else {
        TableSummary::Categorical(categorical)
    }
}

impl TableSummary {
    /// Aligned plain-text grid, one column per described table column
    pub fn to_text(&self) -> String {
        match self {
            TableSummary::Numeric(stats) => {
                let headers: Vec<String> = stats.iter().map(|s| s.column.clone()).collect();
                let rows: Vec<Vec<String>> = STAT_LABELS
                    .iter()
                    .enumerate()
                    .map(|(i, _)| stats.iter().map(|s| format_stat(s.values()[i])).collect())
                    .collect();
                render_grid(&STAT_LABELS, &headers, &rows)
            }
            TableSummary::Categorical(stats) => {
                let labels = ["count", "unique", "top", "freq"];
                let headers: Vec<String> = stats.iter().map(|s| s.column.clone()).collect();
                let rows = vec![
                    stats.iter().map(|s| s.count.to_string()).collect(),
                    stats.iter().map(|s| s.unique.to_string()).collect(),
                    stats
                        .iter()
                        .map(|s| s.top.clone().unwrap_or_else(|| "NaN".to_string()))
                        .collect(),
                    stats.iter().map(|s| s.freq.to_string()).collect(),
                ];
                render_grid(&labels, &headers, &rows)
            }
            TableSummary::Empty => "Empty DataFrame".to_string(),
        }
    }
}

fn format_stat(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.6}", value)
    }
}

fn render_grid(labels: &[&str], headers: &[String], rows: &[Vec<String>]) -> String {
    let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, h)| {
            rows.iter()
                .map(|r| r[col].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut header_line = " ".repeat(label_width);
    for (h, w) in headers.iter().zip(&widths) {
        header_line.push_str(&format!("  {:>w$}", h, w = *w));
    }
    lines.push(header_line);

    for (label, row) in labels.iter().zip(rows) {
        let mut line = format!("{:<w$}", label, w = label_width);
        for (cell, w) in row.iter().zip(&widths) {
            line.push_str(&format!("  {:>w$}", cell, w = *w));
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::read_csv;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_perfect_correlation() {
        let r = correlation(&some(&[1.0, 2.0, 3.0]), &some(&[2.0, 4.0, 6.0]));
        assert_eq!(format_correlation(r), "1.00");
    }

    #[test]
    fn test_partial_correlation_is_strictly_inside_bounds() {
        let r = correlation(&some(&[1.0, 2.0, 3.0]), &some(&[3.0, 1.0, 2.0]));
        assert!(r > -1.0 && r < 1.0, "r = {}", r);
        assert_eq!(format_correlation(r), "-0.50");
    }

    #[test]
    fn test_zero_variance_correlation_is_undefined() {
        let r = correlation(&some(&[1.0, 2.0, 3.0]), &some(&[5.0, 5.0, 5.0]));
        assert!(r.is_nan());
        assert_eq!(format_correlation(r), "undefined");
    }

    #[test]
    fn test_correlation_skips_incomplete_rows() {
        let x = vec![Some(1.0), None, Some(2.0), Some(3.0)];
        let y = vec![Some(2.0), Some(100.0), Some(4.0), Some(6.0)];
        assert_eq!(format_correlation(correlation(&x, &y)), "1.00");
    }

    #[test]
    fn test_describe_column() {
        let stat = describe_column("x", &[Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        assert_eq!(stat.count, 4);
        assert_eq!(stat.mean, 2.5);
        assert!((stat.std_dev - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(stat.min, 1.0);
        assert_eq!(stat.q25, 1.75);
        assert_eq!(stat.median, 2.5);
        assert_eq!(stat.q75, 3.25);
        assert_eq!(stat.max, 4.0);
    }

    #[test]
    fn test_describe_single_value_has_nan_std() {
        let stat = describe_column("x", &[Some(7.0)]);
        assert_eq!(stat.count, 1);
        assert!(stat.std_dev.is_nan());
        assert_eq!(stat.median, 7.0);
    }

    #[test]
    fn test_describe_table_text() {
        let table = read_csv(b"a,b,label\n1,10,x\n2,20,y\n3,30,z\n").unwrap();
        let text = describe_table(&table).to_text();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].contains('a') && lines[0].contains('b'));
        assert!(!lines[0].contains("label"));
        assert!(lines[1].starts_with("count"));
        assert!(lines[1].contains("3.000000"));
        assert!(lines[2].contains("20.000000"));
    }

    #[test]
    fn test_describe_table_falls_back_to_categorical() {
        let table = read_csv(b"fruit\napple\npear\napple\n").unwrap();
        match describe_table(&table) {
            TableSummary::Categorical(stats) => {
                assert_eq!(stats[0].count, 3);
                assert_eq!(stats[0].unique, 2);
                assert_eq!(stats[0].top.as_deref(), Some("apple"));
                assert_eq!(stats[0].freq, 2);
            }
            other => panic!("unexpected summary {:?}", other),
        }
    }
}
