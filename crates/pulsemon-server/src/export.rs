//! Tabular export of in-memory data.
//!
//! Renders a sequence of row objects through a set of column definitions
//! into a downloadable artifact. CSV quoting is handled by the `csv` writer;
//! JSON serializes the rows as given.

use chrono::Utc;
use serde_json::Value;

/// Supported artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse a user-supplied format name. Unknown names yield `None` so the
    /// caller can reject the request.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// One exported column: which row key it reads, the header it renders, and
/// an optional value formatter.
pub struct ColumnSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub format: Option<fn(&Value) -> String>,
}

impl ColumnSpec {
    pub fn new(key: &'static str, title: &'static str) -> Self {
        Self {
            key,
            title,
            format: None,
        }
    }

    pub fn with_format(mut self, format: fn(&Value) -> String) -> Self {
        self.format = Some(format);
        self
    }
}

/// Errors raised while rendering an export artifact.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to finish CSV output: {0}")]
    Finish(String),
}

/// Render `rows` through `columns` into the requested format.
///
/// JSON ignores the column definitions and serializes the rows as-is,
/// matching the dashboard's raw-data download.
pub fn export_rows(
    rows: &[Value],
    columns: &[ColumnSpec],
    format: ExportFormat,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(columns.iter().map(|c| c.title))?;
            for row in rows {
                let record: Vec<String> =
                    columns.iter().map(|column| render_cell(row, column)).collect();
                writer.write_record(&record)?;
            }
            writer
                .into_inner()
                .map_err(|e| ExportError::Finish(e.to_string()))
        }
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
    }
}

/// Date-stamped default filename, e.g. `metrics_2026-08-07.csv`.
pub fn default_filename(prefix: &str, format: ExportFormat) -> String {
    format!(
        "{prefix}_{}.{}",
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    )
}

fn render_cell(row: &Value, column: &ColumnSpec) -> String {
    let value = row.get(column.key).cloned().unwrap_or(Value::Null);
    match column.format {
        Some(format) => format(&value),
        None => display_value(&value),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
