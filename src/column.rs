use crate::data_type::DataType;

/// Describes one column of a [crate::Table].
///
/// The name keeps its original case for storage and output, but lookups
/// against SQL identifiers ignore case.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The name of the column.
    pub name: String,
    /// The inferred type of the column, used as a hint for formatting.
    pub data_type: DataType,
}

impl Column {
    /// Creates a new column with the specified name and data type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Case-insensitive name match against a SQL identifier.
    pub fn matches(&self, ident: &str) -> bool {
        self.name.eq_ignore_ascii_case(ident)
    }
}

/// Returns `name` unchanged if no column in `existing` already uses it,
/// otherwise `name_2`, `name_3`, ... whichever is free first.
pub(crate) fn unique_name(existing: &[Column], name: &str) -> String {
    if !existing.iter().any(|c| c.matches(name)) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !existing.iter().any(|c| c.matches(candidate)))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_new() {
        let col = Column::new("age", DataType::Int);
        assert_eq!(col.name, "age");
        assert_eq!(col.data_type, DataType::Int);
    }

    #[test]
    fn test_matches_ignores_case() {
        let col = Column::new("FirstName", DataType::Text);
        assert!(col.matches("firstname"));
        assert!(col.matches("FIRSTNAME"));
        assert!(!col.matches("first_name"));
    }

    #[test]
    fn test_unique_name() {
        let cols = vec![
            Column::new("id", DataType::Int),
            Column::new("id_2", DataType::Int),
        ];
        assert_eq!(unique_name(&cols, "name"), "name");
        assert_eq!(unique_name(&cols, "ID"), "ID_3");
    }
}
