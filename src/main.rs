use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use csvql::format::{self, OutputFormat};
use csvql::{CsvConfig, Database, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Runs one SQL statement over CSV files.
#[derive(Parser, Debug)]
#[command(name = "csvql", version)]
struct Arguments {
    /// SQL text to run; `-` reads it from stdin.
    #[arg(short, long, conflicts_with = "file")]
    query: Option<String>,

    /// File holding the SQL text to run.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Write the result to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format of the output file: csv, table, markdown, yaml or json.
    #[arg(short = 'O', long = "format", default_value = "csv")]
    output_format: OutputFormat,

    /// Print the result to stdout, as an aligned table unless a format is given.
    #[arg(short, long, num_args = 0..=1, default_missing_value = "table")]
    print: Option<OutputFormat>,

    /// Print the number of records and columns of the result.
    #[arg(short, long)]
    count: bool,

    /// Print one `column: value` line per cell.
    #[arg(short, long)]
    vertical: bool,

    /// Field separator of the input files.
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    separator: u8,

    /// Field separator of CSV output.
    #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: u8,
}

fn parse_delimiter(input: &str) -> Result<u8, String> {
    let unescaped = match input {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match unescaped.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got {input:?}")),
    }
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_query(args: &Arguments) -> csvql::Result<String> {
    match (&args.query, &args.file) {
        (Some(query), _) if query == "-" => {
            let mut sql = String::new();
            io::stdin().read_to_string(&mut sql)?;
            Ok(sql)
        }
        (Some(query), _) => Ok(query.clone()),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (None, None) => Err(csvql::Error::Parse(
            "no query given, use --query or --file".to_string(),
        )),
    }
}

fn run(args: &Arguments) -> csvql::Result<()> {
    let sql = read_query(args)?;
    let db = Database::with_config(CsvConfig::default().with_delimiter(args.separator));
    let table = db.query(&sql)?;
    debug!(rows = table.row_count(), "query finished");

    if let Some(path) = &args.output {
        let mut writer = BufWriter::new(File::create(path)?);
        format::write_table(&mut writer, &table, args.output_format, args.delimiter)?;
        writer.flush()?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.vertical {
        format::write_vertical(&mut out, &table)?;
    } else if let Some(print) = args.print {
        format::write_table(&mut out, &table, print, args.delimiter)?;
    }
    if args.count {
        print_counts(&mut out, &table)?;
    } else if args.output.is_none() && args.print.is_none() && !args.vertical {
        writeln!(out, "Count: {}", table.row_count())?;
    }
    Ok(())
}

fn print_counts(out: &mut impl Write, table: &Table) -> io::Result<()> {
    writeln!(out, "Records: {}", table.row_count())?;
    writeln!(out, "Columns: {}", table.column_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_arguments_are_consistent() {
        Arguments::command().debug_assert();
    }

    #[test]
    fn test_print_defaults_to_table() {
        let args = Arguments::try_parse_from(["csvql", "-q", "SELECT 1", "-p"]).unwrap();
        assert_eq!(args.print, Some(OutputFormat::Table));
        let args = Arguments::try_parse_from(["csvql", "-q", "x", "--print", "json"]).unwrap();
        assert_eq!(args.print, Some(OutputFormat::Json));
        assert_eq!(args.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter("ab").is_err());
        let args = Arguments::try_parse_from(["csvql", "-q", "x", "-s", "|"]).unwrap();
        assert_eq!(args.separator, b'|');
    }
}
