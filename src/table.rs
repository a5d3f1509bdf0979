use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{Result, eval_err};
use crate::value::Value;

/// One row of a table: a value per column, in column order.
pub type Row = Vec<Value>;

/// Column definition as written in a `CREATE TABLE` column list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

/// A relation: ordered columns plus ordered rows.
///
/// The same type backs tables loaded from CSV files and the results of every
/// query. A table exclusively owns its rows; every row has exactly
/// `column_count()` values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table whose column types are inferred from `rows`.
    ///
    /// # Errors
    /// Returns an error if a row's length differs from the number of names.
    pub fn from_rows(name: impl Into<String>, names: &[&str], rows: Vec<Row>) -> Result<Self> {
        let mut table = Self::new(
            name,
            names
                .iter()
                .map(|n| Column::new(*n, DataType::Text))
                .collect(),
        );
        for row in rows {
            table.insert(row)?;
        }
        table.infer_types();
        Ok(table)
    }

    /// insert a new row
    pub fn insert(&mut self, values: Row) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(eval_err!(
                "size of the row mismatched with the size of a table row, {} vs {}",
                values.len(),
                self.columns.len()
            ));
        }
        self.rows.push(values);
        Ok(())
    }

    /// Recomputes every column's type hint from the values it holds.
    pub fn infer_types(&mut self) {
        for (idx, column) in self.columns.iter_mut().enumerate() {
            column.data_type = DataType::infer(self.rows.iter().map(|row| &row[idx]));
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_name(&self, col: usize) -> Option<&str> {
        self.columns.get(col).map(|c| c.name.as_str())
    }

    pub fn get_value(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row)?.get(col)
    }

    /// Display text of a cell; `None` for `NULL` or an out-of-range cell.
    pub fn get_string(&self, row: usize, col: usize) -> Option<String> {
        match self.get_value(row, col)? {
            Value::Null => None,
            value => Some(value.to_string()),
        }
    }

    /// Integer view of a cell. Floats are truncated; anything else is 0.
    pub fn get_int(&self, row: usize, col: usize) -> i64 {
        match self.get_value(row, col) {
            Some(Value::Int(i)) => *i,
            Some(Value::Float(f)) => *f as i64,
            _ => 0,
        }
    }

    /// Float view of a cell. Integers are widened; anything else is 0.0.
    pub fn get_float(&self, row: usize, col: usize) -> f64 {
        self.get_value(row, col)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    /// True for `NULL` cells and for cells outside the table.
    pub fn is_null(&self, row: usize, col: usize) -> bool {
        self.get_value(row, col).is_none_or(Value::is_null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::from_rows(
            "users",
            &["id", "name", "score"],
            vec![
                vec![Value::Int(1), "Alice".into(), Value::Float(9.5)],
                vec![Value::Int(2), Value::Null, Value::Int(7)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_table_creation() {
        let table = users();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns[0].data_type, DataType::Int);
        assert_eq!(table.columns[1].data_type, DataType::Text);
        assert_eq!(table.columns[2].data_type, DataType::Float);
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut table = users();
        assert!(table.insert(vec![Value::Int(1)]).is_err());
        assert!(table.insert(vec![]).is_err());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_cell_accessors() {
        let table = users();
        assert_eq!(table.column_name(1), Some("name"));
        assert_eq!(table.column_name(9), None);
        assert_eq!(table.get_string(0, 1).as_deref(), Some("Alice"));
        assert_eq!(table.get_string(1, 1), None);
        assert_eq!(table.get_int(0, 2), 9);
        assert_eq!(table.get_float(1, 2), 7.0);
        assert_eq!(table.get_float(0, 1), 0.0);
        assert!(table.is_null(1, 1));
        assert!(!table.is_null(0, 0));
        assert!(table.is_null(5, 0));
    }
}
