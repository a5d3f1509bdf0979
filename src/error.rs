/// Errors produced while compiling or evaluating a statement.
///
/// Expression-level problems that have a sensible NULL meaning (division by
/// zero, a function applied to the wrong type, ...) never surface here: they
/// evaluate to [crate::Value::Null] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lex error at offset {position}: {message}")]
    Lex { position: usize, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("join predicate type mismatch: {0}")]
    JoinTypeMismatch(String),

    #[error("invalid CREATE TABLE target: {0}")]
    InvalidTarget(String),

    #[error("evaluation error: {0}")]
    Eval(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Numeric code exposed at the library boundary.
    ///
    /// - `2`: the statement could not be compiled (lex or parse failure)
    /// - `3`: the statement could not be evaluated
    /// - `4`: reading or writing a CSV file failed
    pub fn code(&self) -> i32 {
        match self {
            Self::Lex { .. } | Self::Parse(_) => 2,
            Self::TableNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::JoinTypeMismatch(_)
            | Self::InvalidTarget(_)
            | Self::Eval(_) => 3,
            Self::Csv(_) | Self::Io(_) => 4,
        }
    }

    /// Returns true for failures that happen before an AST exists.
    pub fn is_compile_error(&self) -> bool {
        self.code() == 2
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

macro_rules! eval_err {
    ($($arg:tt)*) => {
        $crate::error::Error::Eval(std::format!($($arg)*))
    };
}
pub(crate) use eval_err;

macro_rules! parse_err {
    ($($arg:tt)*) => {
        $crate::error::Error::Parse(std::format!($($arg)*))
    };
}
pub(crate) use parse_err;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let lex = Error::Lex {
            position: 3,
            message: "unterminated string".into(),
        };
        assert_eq!(lex.code(), 2);
        assert!(lex.is_compile_error());
        assert_eq!(parse_err!("missing {}", "FROM").code(), 2);
        assert_eq!(Error::ColumnNotFound("age".into()).code(), 3);
        assert_eq!(eval_err!("boom").code(), 3);

        let io = Error::from(std::io::Error::other("disk"));
        assert_eq!(io.code(), 4);
        assert!(!io.is_compile_error());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            parse_err!("Expected {}, found {}", "FROM", "WHERE").to_string(),
            "parse error: Expected FROM, found WHERE"
        );
        assert_eq!(
            Error::TableNotFound("users.csv".into()).to_string(),
            "table not found: users.csv"
        );
    }
}
