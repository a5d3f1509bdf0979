use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::ast::{CreateTable, CreateTableBody, Statement};
use crate::column::Column;
use crate::config::CsvConfig;
use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::parser::parse;
use crate::query::{QueryEvaluator, SourceResolver};
use crate::storage;
use crate::table::Table;
use crate::value::Value;

/// The main entry point of the engine.
///
/// A database holds the CSV settings used to read and write files, plus any
/// in-memory tables registered by the caller. Evaluation takes `&self`, so a
/// database can be shared between threads and queried concurrently.
#[derive(Debug, Default)]
pub struct Database {
    config: CsvConfig,
    /// Registered tables, keyed by lowercase name.
    tables: HashMap<String, Table>,
}

impl Database {
    /// Creates a database reading and writing CSV with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CsvConfig) -> Self {
        Self {
            config,
            tables: HashMap::new(),
        }
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Makes `table` available as a query source under `name`.
    ///
    /// Registered tables shadow files on disk with the same name. Names are
    /// matched case-insensitively; registering a name again replaces the
    /// previous table.
    pub fn register_table(&mut self, name: &str, table: Table) {
        self.tables.insert(name.to_lowercase(), table);
    }

    /// Parses and evaluates one statement.
    ///
    /// # Errors
    /// Returns an error if tokenization, parsing, or evaluation fails. See
    /// [Error::code] for the numeric classification.
    ///
    /// # Example
    /// ```
    /// use csvql::{Database, Table, Value};
    ///
    /// let mut db = Database::new();
    /// let people = Table::from_rows(
    ///     "people",
    ///     &["name", "age"],
    ///     vec![
    ///         vec!["Ann".into(), Value::Int(31)],
    ///         vec!["Bob".into(), Value::Int(17)],
    ///     ],
    /// )
    /// .unwrap();
    /// db.register_table("people", people);
    ///
    /// let result = db.query("SELECT name FROM people WHERE age >= 18").unwrap();
    /// assert_eq!(result.row_count(), 1);
    /// assert_eq!(result.get_string(0, 0).as_deref(), Some("Ann"));
    /// ```
    pub fn query(&self, sql: &str) -> Result<Table> {
        let statement = parse(sql)?;
        self.evaluate(&statement)
    }

    /// Evaluates an already parsed statement.
    ///
    /// A `SELECT` returns its result. `CREATE TABLE` writes the CSV file and
    /// returns a one-row table with the `path` written and `rows_written`.
    pub fn evaluate(&self, statement: &Statement) -> Result<Table> {
        match statement {
            Statement::Select(select) => QueryEvaluator::new(self).evaluate(select),
            Statement::CreateTable(create) => self.create_table(create),
        }
    }

    /// Evaluates `sql` and writes the result to `output` as CSV.
    ///
    /// Returns the number of rows written.
    pub fn execute_to_file(&self, sql: &str, output: impl AsRef<Path>) -> Result<usize> {
        let table = self.query(sql)?;
        storage::save(output.as_ref(), &table, &self.config)?;
        Ok(table.row_count())
    }

    fn create_table(&self, create: &CreateTable) -> Result<Table> {
        if create.path.trim().is_empty() {
            return Err(Error::InvalidTarget(
                "CREATE TABLE requires a non-empty file path".to_string(),
            ));
        }

        let table = match &create.body {
            CreateTableBody::Columns(defs) => Table::new(
                create.path.clone(),
                defs.iter()
                    .map(|def| Column::new(def.name.clone(), def.data_type))
                    .collect(),
            ),
            CreateTableBody::Query(select) => QueryEvaluator::new(self).evaluate(select)?,
        };
        storage::save(&create.path, &table, &self.config)?;
        debug!(path = %create.path, rows = table.row_count(), "CREATE TABLE wrote file");

        let rows_written = i64::try_from(table.row_count()).unwrap_or(i64::MAX);
        Ok(Table {
            name: "result".to_string(),
            columns: vec![
                Column::new("path", DataType::Text),
                Column::new("rows_written", DataType::Int),
            ],
            rows: vec![vec![
                Value::from(create.path.as_str()),
                Value::Int(rows_written),
            ]],
        })
    }
}

impl SourceResolver for Database {
    fn resolve_table(&self, name: &str) -> Result<Table> {
        if let Some(table) = self.tables.get(&name.to_lowercase()) {
            return Ok(table.clone());
        }
        let path = Path::new(name);
        if path.is_file() {
            return storage::load(path, &self.config);
        }
        let with_extension = format!("{name}.csv");
        if Path::new(&with_extension).is_file() {
            return storage::load(&with_extension, &self.config);
        }
        Err(Error::TableNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn people() -> Table {
        Table::from_rows(
            "people",
            &["name", "age"],
            vec![
                vec!["Ann".into(), Value::Int(31)],
                vec!["Bob".into(), Value::Int(17)],
                vec!["Cid".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_registered_table_lookup_ignores_case() {
        let mut db = Database::new();
        db.register_table("People", people());
        let result = db.query("SELECT COUNT(age) FROM PEOPLE").unwrap();
        assert_eq!(result.get_int(0, 0), 2);
    }

    #[test]
    fn test_file_source_with_and_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        fs::write(&path, "who,score\nann,3\nbob,5\n").unwrap();

        let db = Database::new();
        let full = path.display().to_string();
        let stem = dir.path().join("scores").display().to_string();

        let a = db.query(&format!("SELECT * FROM '{full}'")).unwrap();
        let b = db
            .query(&format!("SELECT scores.score FROM '{stem}' ORDER BY score DESC"))
            .unwrap();
        assert_eq!(a.row_count(), 2);
        assert_eq!(b.get_int(0, 0), 5);
    }

    #[test]
    fn test_create_table_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("adults.csv").display().to_string();
        let mut db = Database::new();
        db.register_table("people", people());

        let confirmation = db
            .query(&format!(
                "CREATE TABLE '{out}' AS SELECT name FROM people WHERE age >= 18"
            ))
            .unwrap();
        assert_eq!(confirmation.column_name(1), Some("rows_written"));
        assert_eq!(confirmation.get_int(0, 1), 1);
        assert_eq!(fs::read_to_string(&out).unwrap(), "name\nAnn\n");

        let schema = dir.path().join("empty.csv").display().to_string();
        db.query(&format!("CREATE TABLE '{schema}' (id INT, label)"))
            .unwrap();
        assert_eq!(fs::read_to_string(&schema).unwrap(), "id,label\n");
    }

    #[test]
    fn test_create_table_rejects_empty_path() {
        let db = Database::new();
        let err = db.query("CREATE TABLE '' (id INT)").unwrap_err();
        assert!(matches!(err, Error::InvalidTarget(_)));
        assert_eq!(err.code(), 3);
    }

    #[test]
    fn test_execute_to_file_uses_config() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        let mut db = Database::with_config(CsvConfig::default().with_delimiter(b';'));
        db.register_table("people", people());

        let written = db
            .execute_to_file("SELECT name, age FROM people ORDER BY name", &out)
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "name;age\nAnn;31\nBob;17\nCid;\n"
        );
    }

    #[test]
    fn test_missing_source() {
        let db = Database::new();
        let err = db.query("SELECT * FROM 'no/such/file'").unwrap_err();
        assert!(matches!(err, Error::TableNotFound(_)));
    }

    #[test]
    fn test_database_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Database>();
    }
}
