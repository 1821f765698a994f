//! In-memory table model plus the CSV and spreadsheet readers that build it.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use serde::Serialize;
use tracing::debug;

use crate::types::{AppError, AppResult};

/// Values of one column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Integer(Vec<Option<f64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Temporal(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Integer(v) | ColumnValues::Float(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Temporal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dataframe-style dtype label shown in the data preview
    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnValues::Integer(_) => "int64",
            ColumnValues::Float(_) => "float64",
            ColumnValues::Text(_) => "object",
            ColumnValues::Temporal(_) => "datetime64[ns]",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnValues::Integer(_) | ColumnValues::Float(_))
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnValues::Integer(v) | ColumnValues::Float(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Display form of one cell, empty string for missing values
    pub fn display(&self, row: usize) -> String {
        match self {
            ColumnValues::Integer(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|x| format!("{}", x as i64))
                .unwrap_or_else(|| "NaN".to_string()),
            ColumnValues::Float(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|x| x.to_string())
                .unwrap_or_else(|| "NaN".to_string()),
            ColumnValues::Text(v) => v
                .get(row)
                .cloned()
                .flatten()
                .unwrap_or_else(|| "NaN".to_string()),
            ColumnValues::Temporal(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "NaT".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Named, equal-length columns loaded from a CSV or spreadsheet file.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularData {
    columns: Vec<Column>,
    row_count: usize,
}

impl TabularData {
    pub fn new(columns: Vec<Column>) -> AppResult<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != row_count) {
            return Err(AppError::MalformedInput(format!(
                "column '{}' has {} values, expected {}",
                bad.name,
                bad.values.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.values.is_numeric())
    }

    /// First `n` rows rendered as strings, for the preview table
    pub fn head(&self, n: usize) -> TablePreview {
        let rows = (0..self.row_count.min(n))
            .map(|row| self.columns.iter().map(|c| c.values.display(row)).collect())
            .collect();
        TablePreview {
            columns: self.columns.iter().map(|c| c.name.clone()).collect(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse delimited text with a header row.
pub fn read_csv(bytes: &[u8]) -> AppResult<TabularData> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| AppError::MalformedInput(format!("CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(AppError::MalformedInput("CSV has no header row".to_string()));
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record.map_err(|e| AppError::MalformedInput(format!("CSV row: {}", e)))?;
        for (idx, value) in record.iter().enumerate() {
            let trimmed = value.trim();
            cells[idx].push(if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            });
        }
    }

    let names = clean_headers(headers);
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column {
            name,
            values: infer_text_column(raw),
        })
        .collect();

    let table = TabularData::new(columns)?;
    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "Parsed CSV table"
    );
    Ok(table)
}

/// Parse the first worksheet of an xls/xlsx workbook, first row as header.
pub fn read_spreadsheet(bytes: &[u8]) -> AppResult<TabularData> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::MalformedInput(format!("spreadsheet: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::MalformedInput("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| AppError::MalformedInput(format!("sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| AppError::MalformedInput(format!("sheet '{}' is empty", sheet_name)))?;
    let headers: Vec<String> = header_row.iter().map(header_text).collect();

    let mut cells: Vec<Vec<Data>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(headers.len()) {
            cells[idx].push(cell.clone());
        }
    }

    let names = clean_headers(headers);
    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column {
            name,
            values: infer_sheet_column(raw),
        })
        .collect();

    let table = TabularData::new(columns)?;
    debug!(
        sheet = %sheet_name,
        rows = table.row_count(),
        columns = table.column_count(),
        "Parsed spreadsheet table"
    );
    Ok(table)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Blank names become `Unnamed: {idx}` and repeats get `.1`, `.2` suffixes.
fn clean_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let base = if raw.trim().is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                raw.trim().to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn infer_text_column(raw: Vec<Option<String>>) -> ColumnValues {
    let present = || raw.iter().flatten();

    if present().all(|v| v.parse::<i64>().is_ok()) && present().next().is_some() {
        return ColumnValues::Integer(
            raw.iter()
                .map(|v| v.as_ref().and_then(|s| s.parse::<i64>().ok()).map(|i| i as f64))
                .collect(),
        );
    }
    if present().all(|v| v.parse::<f64>().is_ok()) {
        return ColumnValues::Float(
            raw.iter()
                .map(|v| v.as_ref().and_then(|s| s.parse::<f64>().ok()))
                .collect(),
        );
    }
    ColumnValues::Text(raw)
}

fn infer_sheet_column(raw: Vec<Data>) -> ColumnValues {
    let present: Vec<&Data> = raw
        .iter()
        .filter(|d| !matches!(d, Data::Empty | Data::Error(_)))
        .collect();

    if present.is_empty() {
        return ColumnValues::Float(vec![None; raw.len()]);
    }
    if present.iter().all(|d| matches!(d, Data::Int(_))) {
        return ColumnValues::Integer(raw.iter().map(sheet_number).collect());
    }
    if present.iter().all(|d| matches!(d, Data::Int(_) | Data::Float(_))) {
        let values: Vec<Option<f64>> = raw.iter().map(sheet_number).collect();
        // Excel stores whole numbers as floats
        let whole = values.iter().flatten().all(|v| v.fract() == 0.0);
        return if whole {
            ColumnValues::Integer(values)
        } else {
            ColumnValues::Float(values)
        };
    }
    if present
        .iter()
        .all(|d| matches!(d, Data::DateTime(_) | Data::DateTimeIso(_)))
    {
        return ColumnValues::Temporal(raw.iter().map(sheet_datetime).collect());
    }

    ColumnValues::Text(
        raw.iter()
            .map(|d| match d {
                Data::Empty | Data::Error(_) => None,
                Data::String(s) => Some(s.clone()),
                Data::Bool(true) => Some("True".to_string()),
                Data::Bool(false) => Some("False".to_string()),
                Data::DateTime(_) | Data::DateTimeIso(_) => sheet_datetime(d)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
                other => Some(other.to_string()),
            })
            .collect(),
    )
}

fn sheet_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        _ => None,
    }
}

fn sheet_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .ok(),
        _ => None,
    }
}
