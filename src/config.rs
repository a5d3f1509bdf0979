/// How CSV files are read and written.
///
/// A configuration is owned by each [crate::Database] and passed explicitly
/// to [crate::storage::load] and [crate::storage::save], so databases with
/// different settings can be used side by side.
///
/// # Example
/// ```
/// # use csvql::CsvConfig;
/// let config = CsvConfig::default().with_delimiter(b';').with_header(false);
/// assert_eq!(config.delimiter, b';');
/// assert_eq!(config.quote, b'"');
/// assert!(!config.has_header);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvConfig {
    /// Field separator, `,` by default.
    pub delimiter: u8,
    /// Quote character, `"` by default.
    pub quote: u8,
    /// Whether the first record holds the column names. Files without a
    /// header get columns named `column1`, `column2`, ...
    pub has_header: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: true,
        }
    }
}

impl CsvConfig {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}
