//! File ingestion
//!
//! Dispatches an uploaded file on its extension:
//! - `csv` - delimited table, first row is the header
//! - `xls` / `xlsx` - first worksheet, first row is the header
//! - `pdf` - concatenated page text

pub mod pdf;
pub mod table;

pub use pdf::{extract_text, TextDocument};
pub use table::{read_csv, read_spreadsheet, Column, ColumnValues, TablePreview, TabularData};

use tracing::info;

use crate::types::{AppError, AppResult};

pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["csv", "xls", "xlsx", "pdf"];

/// An uploaded file as received from the client. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: bytes::Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<bytes::Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased text after the last `.`, empty when there is none
    pub fn extension(&self) -> String {
        match self.filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }
}

/// Result of loading a file: either a table or extracted text.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedData {
    Table(TabularData),
    Text(TextDocument),
}

impl LoadedData {
    pub fn as_table(&self) -> Option<&TabularData> {
        match self {
            LoadedData::Table(t) => Some(t),
            LoadedData::Text(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LoadedData::Table(_) => "table",
            LoadedData::Text(_) => "text",
        }
    }
}

pub fn load_data(file: &UploadedFile) -> AppResult<LoadedData> {
    let extension = file.extension();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::UnsupportedFormat(extension));
    }
    if file.bytes.is_empty() {
        return Err(AppError::MalformedInput(format!(
            "'{}' is empty",
            file.filename
        )));
    }

    let data = match extension.as_str() {
        "csv" => LoadedData::Table(read_csv(&file.bytes)?),
        "xls" | "xlsx" => LoadedData::Table(read_spreadsheet(&file.bytes)?),
        _ => LoadedData::Text(extract_text(&file.bytes)?),
    };

    info!(
        filename = %file.filename,
        size = file.bytes.len(),
        kind = data.kind(),
        "File loaded"
    );
    Ok(data)
}
