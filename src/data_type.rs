use std::fmt;

use crate::value::Value;

/// Represents the inferred type of a column.
///
/// The type is a hint used for formatting and comparisons: a column of type
/// [DataType::Int] may still hold `NULL`, and expressions over it may
/// transiently produce other scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit floating-point number.
    Float,
    /// A variable-length UTF-8 character string.
    Text,
    /// A calendar date without a time component.
    Date,
}

impl DataType {
    /// Infers the narrowest type able to hold every non-null value.
    ///
    /// Integers widen to floats when both appear. Any other mix, or a column
    /// with no non-null values at all, falls back to [DataType::Text].
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred: Option<DataType> = None;
        for value in values {
            let Some(current) = value.data_type() else {
                continue;
            };
            inferred = Some(match (inferred, current) {
                (None, t) => t,
                (Some(a), b) if a == b => a,
                (Some(DataType::Int), DataType::Float) | (Some(DataType::Float), DataType::Int) => {
                    DataType::Float
                }
                _ => return DataType::Text,
            });
        }
        inferred.unwrap_or(DataType::Text)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    /// Parses a type name as written in a `CREATE TABLE` column list.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INT" | "INTEGER" | "BIGINT" => Some(DataType::Int),
            "FLOAT" | "DOUBLE" | "REAL" => Some(DataType::Float),
            "TEXT" | "STRING" | "VARCHAR" => Some(DataType::Text),
            "DATE" => Some(DataType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "INT",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_infer() {
        assert_eq!(DataType::infer(&[Value::Int(1), Value::Null]), DataType::Int);
        assert_eq!(
            DataType::infer(&[Value::Int(1), Value::Float(2.5)]),
            DataType::Float
        );
        assert_eq!(
            DataType::infer(&[Value::Int(1), Value::Text("a".into())]),
            DataType::Text
        );
        assert_eq!(DataType::infer(&[Value::Null]), DataType::Text);

        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(DataType::infer(&[Value::Date(d)]), DataType::Date);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DataType::from_name("integer"), Some(DataType::Int));
        assert_eq!(DataType::from_name("Double"), Some(DataType::Float));
        assert_eq!(DataType::from_name("date"), Some(DataType::Date));
        assert_eq!(DataType::from_name("blob"), None);
    }
}
