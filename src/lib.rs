pub mod aggregate;
pub mod ast;
pub mod builder;
pub mod column;
pub mod config;
pub mod data_type;
pub mod database;
pub mod date;
pub mod error;
pub mod expr;
pub mod format;
pub mod functions;
pub mod parser;
pub mod query;
pub mod storage;
pub mod table;
pub mod tokenizer;
pub mod value;
pub mod window;

pub use column::Column;
pub use config::CsvConfig;
pub use data_type::DataType;
pub use database::Database;
pub use error::{Error, Result};
pub use parser::parse;
pub use table::{ColumnDef, Row, Table};
pub use value::Value;
