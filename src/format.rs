//! Rendering of result tables for people and for other programs.
//!
//! Every format walks the columns and rows of a [Table] the same way; none
//! of them feed back into evaluation.

use std::io::Write;
use std::str::FromStr;

use csv::{QuoteStyle, WriterBuilder};
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::{Error, Result};
use crate::table::Table;
use crate::value::Value;

/// Widest cell of the aligned table; longer text is cut with `...`.
const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Delimited text with a header line.
    Csv,
    /// Aligned text table with borders.
    #[default]
    Table,
    Markdown,
    /// A sequence of mappings, one per row.
    Yaml,
    /// An array of objects, one per row.
    Json,
}

impl OutputFormat {
    /// Case-insensitive format name; `md` and `yml` are accepted too.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "table" => Some(Self::Table),
            "markdown" | "md" => Some(Self::Markdown),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            Error::Eval(format!(
                "unknown output format {s:?}, expected csv, table, markdown, yaml or json"
            ))
        })
    }
}

/// Writes `table` to `writer` in `format`. `delimiter` only applies to
/// [OutputFormat::Csv].
///
/// # Errors
/// Fails when writing to `writer` fails.
pub fn write_table<W: Write>(
    writer: &mut W,
    table: &Table,
    format: OutputFormat,
    delimiter: u8,
) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(writer, table, delimiter),
        OutputFormat::Table => write_aligned(writer, table),
        OutputFormat::Markdown => write_markdown(writer, table),
        OutputFormat::Yaml => write_yaml(writer, table),
        OutputFormat::Json => write_json(writer, table),
    }
}

/// One `column: value` line per cell, rows separated by `*** N. row ***`.
pub fn write_vertical<W: Write>(writer: &mut W, table: &Table) -> Result<()> {
    let width = table
        .columns
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0);
    for (i, row) in table.rows.iter().enumerate() {
        writeln!(writer, "*** {}. row ***", i + 1)?;
        for (column, value) in table.columns.iter().zip(row) {
            writeln!(writer, "{:>width$}: {}", column.name, cell_text(value))?;
        }
    }
    Ok(())
}

fn cell_text(value: &Value) -> String {
    value.to_string()
}

fn write_csv<W: Write>(writer: &mut W, table: &Table, delimiter: u8) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);
    csv.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    for row in &table.rows {
        csv.write_record(row.iter().map(|v| match v {
            Value::Null => String::new(),
            other => other.to_string(),
        }))?;
    }
    csv.flush()?;
    Ok(())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

fn write_aligned<W: Write>(writer: &mut W, table: &Table) -> Result<()> {
    let header: Vec<String> = table.columns.iter().map(|c| truncate(&c.name)).collect();
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|v| truncate(&cell_text(v))).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let numeric: Vec<bool> = table
        .columns
        .iter()
        .map(|c| c.data_type.is_numeric())
        .collect();

    let border: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+";

    writeln!(writer, "{border}")?;
    write_aligned_row(writer, &header, &widths, &vec![false; widths.len()])?;
    writeln!(writer, "{border}")?;
    for row in &cells {
        write_aligned_row(writer, row, &widths, &numeric)?;
    }
    writeln!(writer, "{border}")?;
    Ok(())
}

fn write_aligned_row<W: Write>(
    writer: &mut W,
    cells: &[String],
    widths: &[usize],
    right_align: &[bool],
) -> Result<()> {
    for ((cell, width), right) in cells.iter().zip(widths).zip(right_align) {
        if *right {
            write!(writer, "| {cell:>width$} ")?;
        } else {
            write!(writer, "| {cell:<width$} ")?;
        }
    }
    writeln!(writer, "|")?;
    Ok(())
}

fn write_markdown<W: Write>(writer: &mut W, table: &Table) -> Result<()> {
    let escape = |text: &str| text.replace('|', "\\|");
    let header: Vec<String> = table.columns.iter().map(|c| escape(&c.name)).collect();
    writeln!(writer, "| {} |", header.join(" | "))?;
    let rule: Vec<&str> = table
        .columns
        .iter()
        .map(|c| if c.data_type.is_numeric() { "---:" } else { "---" })
        .collect();
    writeln!(writer, "| {} |", rule.join(" | "))?;
    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|v| escape(&cell_text(v))).collect();
        writeln!(writer, "| {} |", cells.join(" | "))?;
    }
    Ok(())
}

/// Scalar in YAML flow form. Text is written as a JSON string, which YAML
/// reads back unchanged.
fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Int(_) | Value::Float(_) => value.to_string(),
        other => JsonValue::String(other.to_string()).to_string(),
    }
}

fn write_yaml<W: Write>(writer: &mut W, table: &Table) -> Result<()> {
    if table.rows.is_empty() {
        writeln!(writer, "[]")?;
        return Ok(());
    }
    for row in &table.rows {
        for (i, (column, value)) in table.columns.iter().zip(row).enumerate() {
            let marker = if i == 0 { "- " } else { "  " };
            let key = JsonValue::String(column.name.clone());
            writeln!(writer, "{marker}{key}: {}", yaml_scalar(value))?;
        }
    }
    Ok(())
}

fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Int(i) => JsonValue::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        other => JsonValue::String(other.to_string()),
    }
}

fn write_json<W: Write>(writer: &mut W, table: &Table) -> Result<()> {
    let rows: Vec<JsonValue> = table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, JsonValue> = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.name.clone(), json_value(value)))
                .collect();
            JsonValue::Object(object)
        })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &rows).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    Ok(())
}
