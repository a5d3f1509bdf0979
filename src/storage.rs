//! Reading and writing tables as CSV files.
//!
//! Loading infers one type per column from its non-empty cells, trying the
//! narrowest candidate first: integer, float, date, then text. Empty cells
//! are `NULL`.

use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, warn};

use crate::column::{Column, unique_name};
use crate::config::CsvConfig;
use crate::data_type::DataType;
use crate::date;
use crate::error::Result;
use crate::table::{Row, Table};
use crate::value::Value;

/// Candidate column types, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateType {
    Int,
    Float,
    Date,
    Text,
}

impl CandidateType {
    fn is_valid(self, input: &str) -> bool {
        match self {
            Self::Int => input.parse::<i64>().is_ok(),
            // `inf` and `NaN` stay text
            Self::Float => {
                input.bytes().any(|b| b.is_ascii_digit()) && input.parse::<f64>().is_ok()
            }
            Self::Date => date::parse_date(input).is_some(),
            Self::Text => true,
        }
    }

    /// Narrowest candidate accepting the first non-empty cell of a column.
    fn detect(input: &str) -> Self {
        [Self::Int, Self::Float, Self::Date]
            .into_iter()
            .find(|c| c.is_valid(input))
            .unwrap_or(Self::Text)
    }

    /// Widens `self` so it also accepts `input`. Numbers never widen to
    /// dates: a column mixing both is text.
    fn widen(self, input: &str) -> Self {
        match self {
            Self::Int if Self::Int.is_valid(input) => Self::Int,
            Self::Int | Self::Float if Self::Float.is_valid(input) => Self::Float,
            Self::Date if Self::Date.is_valid(input) => Self::Date,
            _ => Self::Text,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Int => DataType::Int,
            Self::Float => DataType::Float,
            Self::Date => DataType::Date,
            Self::Text => DataType::Text,
        }
    }

    fn convert(self, input: &str) -> Value {
        let value = match self {
            Self::Int => input.parse().ok().map(Value::Int),
            Self::Float => input.parse().ok().map(Value::Float),
            Self::Date => date::parse_date(input).map(Value::Date),
            Self::Text => None,
        };
        value.unwrap_or_else(|| Value::from(input))
    }
}

/// Loads a CSV file into a table named after the file stem.
///
/// # Errors
/// Returns [crate::Error::Io] or [crate::Error::Csv] when the file cannot be
/// read or is not valid CSV.
pub fn load(path: impl AsRef<Path>, config: &CsvConfig) -> Result<Table> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(config.delimiter)
        .quote(config.quote)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = reader.records();
    let header: Option<StringRecord> = if config.has_header {
        records.next().transpose()?
    } else {
        None
    };
    let raw: Vec<StringRecord> = records.collect::<std::result::Result<_, _>>()?;

    let width = header
        .as_ref()
        .map(StringRecord::len)
        .or_else(|| raw.iter().map(StringRecord::len).max())
        .unwrap_or(0);

    let mut columns: Vec<Column> = Vec::with_capacity(width);
    for i in 0..width {
        let name = match &header {
            Some(h) => h.get(i).unwrap_or_default().trim().to_string(),
            None => String::new(),
        };
        let name = if name.is_empty() {
            format!("column{}", i + 1)
        } else {
            name
        };
        let name = unique_name(&columns, &name);
        columns.push(Column::new(name, DataType::Text));
    }

    let mut candidates: Vec<Option<CandidateType>> = vec![None; width];
    for (line, record) in raw.iter().enumerate() {
        if record.len() > width {
            warn!(
                path = %path.display(),
                record = line + 1,
                fields = record.len(),
                expected = width,
                "truncating long CSV record"
            );
        }
        for (i, field) in record.iter().take(width).enumerate() {
            if field.is_empty() {
                continue;
            }
            candidates[i] = Some(match candidates[i] {
                None => CandidateType::detect(field),
                Some(current) => current.widen(field),
            });
        }
    }

    let rows: Vec<Row> = raw
        .iter()
        .map(|record| {
            (0..width)
                .map(|i| match (record.get(i), candidates[i]) {
                    (Some(field), Some(candidate)) if !field.is_empty() => {
                        candidate.convert(field)
                    }
                    _ => Value::Null,
                })
                .collect()
        })
        .collect();

    for (column, candidate) in columns.iter_mut().zip(&candidates) {
        column.data_type = candidate.unwrap_or(CandidateType::Text).data_type();
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!(path = %path.display(), rows = rows.len(), columns = width, "loaded CSV table");

    Ok(Table {
        name,
        columns,
        rows,
    })
}

/// Writes `table` to `path`, header first, replacing any existing file.
///
/// Fields containing the delimiter, the quote character or a line break are
/// quoted, with embedded quotes doubled. `NULL` is written as an empty
/// field.
pub fn save(path: impl AsRef<Path>, table: &Table, config: &CsvConfig) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .delimiter(config.delimiter)
        .quote(config.quote)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_path(path)?;

    writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        writer.write_record(row.iter().map(field_text))?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = table.row_count(), "saved CSV table");
    Ok(())
}

/// Cell value at `(row, col)`, `NULL` when out of range.
pub fn get_value(table: &Table, row: usize, col: usize) -> Value {
    table.get_value(row, col).cloned().unwrap_or(Value::Null)
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
