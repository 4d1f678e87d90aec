//! ESG Data Loader Module
//! Turns CSV, XLSX or JSON bytes into a Polars DataFrame.

use log::{debug, info};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::xlsx;

/// Built-in dataset used whenever no input file is supplied.
pub const SAMPLE_CSV: &str = "Emissions_tCO2,Energy_kWh,Waste_kg
1200,15000,320
980,12200,280
1100,13800,300";

/// Source name reported for the built-in dataset.
pub const SAMPLE_SOURCE_NAME: &str = "sample data";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Failed to parse {format}: {message}")]
    ParseError { format: DataFormat, message: String },
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Recognized input encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// Comma-delimited text with a header row
    DelimitedText,
    /// Office Open XML workbook (first worksheet)
    Spreadsheet,
    /// JSON list of records
    RecordList,
}

impl DataFormat {
    /// Resolve a file extension, file name or media type to a format.
    pub fn from_hint(hint: &str) -> Result<Self, LoaderError> {
        let hint = hint.trim().to_ascii_lowercase();
        let media_type = hint.split(';').next().unwrap_or_default().trim();

        match media_type {
            "text/csv" | "application/csv" => return Ok(Self::DelimitedText),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel" => return Ok(Self::Spreadsheet),
            "application/json" | "text/json" => return Ok(Self::RecordList),
            _ => {}
        }

        match hint.rsplit('.').next().unwrap_or_default() {
            "csv" => Ok(Self::DelimitedText),
            "xlsx" | "xls" => Ok(Self::Spreadsheet),
            "json" => Ok(Self::RecordList),
            _ if hint.is_empty() => Err(LoaderError::UnsupportedFormat("(none)".to_string())),
            _ => Err(LoaderError::UnsupportedFormat(hint)),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::DelimitedText => write!(f, "delimited text (CSV)"),
            DataFormat::Spreadsheet => write!(f, "spreadsheet (XLSX)"),
            DataFormat::RecordList => write!(f, "record list (JSON)"),
        }
    }
}

/// Raw input bytes plus whatever tells us how to decode them.
#[derive(Debug, Clone)]
pub struct InputSource {
    pub name: String,
    pub bytes: Vec<u8>,
    pub format_hint: Option<String>,
}

impl InputSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            format_hint: None,
        }
    }

    /// Override the name-derived format (extension or media type).
    pub fn with_format_hint(mut self, hint: impl Into<String>) -> Self {
        self.format_hint = Some(hint.into());
        self
    }

    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let bytes = std::fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn format(&self) -> Result<DataFormat, LoaderError> {
        DataFormat::from_hint(self.format_hint.as_deref().unwrap_or(&self.name))
    }
}

/// Stateless loader; every call is a pure bytes -> DataFrame transform.
pub struct DataLoader;

impl DataLoader {
    /// Decode `bytes` under the declared format.
    pub fn load(bytes: &[u8], format: DataFormat) -> Result<DataFrame, LoaderError> {
        let parse_error = |message: String| LoaderError::ParseError { format, message };

        let df = match format {
            DataFormat::DelimitedText => {
                Self::read_csv(bytes).map_err(|e| parse_error(e.to_string()))?
            }
            DataFormat::Spreadsheet => {
                xlsx::read_first_sheet(bytes).map_err(|e| parse_error(e.to_string()))?
            }
            DataFormat::RecordList => Self::read_records(bytes).map_err(parse_error)?,
        };

        debug!(
            "Loaded {} rows x {} columns as {}",
            df.height(),
            df.width(),
            format
        );
        Ok(df)
    }

    pub fn load_source(source: &InputSource) -> Result<DataFrame, LoaderError> {
        let format = source.format()?;
        info!("Loading {} as {}", source.name, format);
        Self::load(&source.bytes, format)
    }

    /// Read a file from disk; the hint defaults to the path's extension.
    pub fn load_path(path: &Path, hint: Option<&str>) -> Result<DataFrame, LoaderError> {
        let mut source = InputSource::from_path(path)?;
        if let Some(hint) = hint {
            source = source.with_format_hint(hint);
        }
        Self::load_source(&source)
    }

    /// The built-in three-row dataset.
    pub fn sample() -> Result<DataFrame, LoaderError> {
        Self::load(SAMPLE_CSV.as_bytes(), DataFormat::DelimitedText)
    }

    /// Load the given source, or fall back to the sample dataset.
    pub fn load_or_sample(source: Option<&InputSource>) -> Result<DataFrame, LoaderError> {
        match source {
            Some(source) => Self::load_source(source),
            None => {
                info!("No file uploaded. Using sample data.");
                Self::sample()
            }
        }
    }

    fn read_csv(bytes: &[u8]) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
    }

    fn read_records(bytes: &[u8]) -> Result<DataFrame, String> {
        let records = Self::normalize_records(bytes)?;
        if records.is_empty() {
            return Ok(DataFrame::empty());
        }

        let json = serde_json::to_vec(&Value::Array(records)).map_err(|e| e.to_string())?;
        JsonReader::new(Cursor::new(json))
            .with_json_format(JsonFormat::Json)
            .finish()
            .map_err(|e| e.to_string())
    }

    /// Accept a list of records, a single record, or an object of column arrays.
    fn normalize_records(bytes: &[u8]) -> Result<Vec<Value>, String> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

        match value {
            Value::Array(items) => {
                if let Some(pos) = items.iter().position(|item| !item.is_object()) {
                    return Err(format!("record {} is not a JSON object", pos));
                }
                Ok(items)
            }
            Value::Object(map) if !map.is_empty() && map.values().all(Value::is_array) => {
                Self::columns_to_records(map)
            }
            Value::Object(map) => Ok(vec![Value::Object(map)]),
            other => Err(format!(
                "expected a list of records, found {}",
                match other {
                    Value::Null => "null",
                    Value::Bool(_) => "a boolean",
                    Value::Number(_) => "a number",
                    _ => "a string",
                }
            )),
        }
    }

    fn columns_to_records(columns: Map<String, Value>) -> Result<Vec<Value>, String> {
        let columns: Vec<(String, Vec<Value>)> = columns
            .into_iter()
            .map(|(name, values)| match values {
                Value::Array(values) => (name, values),
                other => (name, vec![other]),
            })
            .collect();

        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != rows) {
            return Err(format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                rows
            ));
        }

        Ok((0..rows)
            .map(|i| {
                let record: Map<String, Value> = columns
                    .iter()
                    .map(|(name, values)| (name.clone(), values[i].clone()))
                    .collect();
                Value::Object(record)
            })
            .collect())
    }

    /// Get list of column names in display order.
    pub fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Non-null values of a column as f64; `None` when the column is absent.
    ///
    /// Text cells are parsed as numbers where possible; anything that does not
    /// parse is skipped, like nulls and NaN.
    pub fn column_values(df: &DataFrame, name: &str) -> Option<Vec<f64>> {
        let column = df.column(name).ok()?;
        let casted = column.cast(&DataType::Float64).ok()?;
        let values = casted
            .f64()
            .ok()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();
        Some(values)
    }
}
