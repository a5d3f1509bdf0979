use chrono::NaiveDate;

use crate::date;
use crate::error::{Error, Result};

/// Represents the smallest meaningful units (atoms) of the SQL language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- SQL Keywords ---
    Select,
    Distinct,
    From,
    Where,
    As,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,
    Group,
    Having,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,
    Union,
    All,
    Intersect,
    Except,
    Create,
    Table,
    Case,
    When,
    Then,
    Else,
    End,
    And,
    Or,
    Not,
    Between,
    Like,
    In,
    Is,
    Null,
    Over,
    Partition,

    // --- Identifiers & Literals ---
    /// A name representing a table, column or function (e.g., `users`, `id`).
    Ident(String),
    /// A name between double quotes or backticks, never a keyword.
    QuotedIdent(String),
    /// A 64-bit integer literal (e.g., `42`).
    Number(i64),
    /// A 64-bit floating-point literal (e.g., `3.14`).
    FloatNumber(f64),
    /// A string literal, defined between single quotes (e.g., `'Alice'`).
    String(String),
    /// A date literal written as `DATE '2025-01-31'`.
    Date(NaiveDate),
    /// The boolean literal `TRUE`.
    True,
    /// The boolean literal `FALSE`.
    False,

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Dot `.` between a qualifier and a column
    Dot,
    /// Multiplication or wildcard symbol `*`
    Star,
    Plus,
    Minus,
    Slash,
    Percent,
    /// Equal to
    Equal,
    /// `<>` or `!=`
    NotEqual,
    /// Greater than
    Greater,
    GreaterEqual,
    /// Lower than
    Lower,
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

/// Maps an upper-cased word to its keyword token, if it is one.
fn keyword(upper: &str) -> Option<Token> {
    let token = match upper {
        "SELECT" => Token::Select,
        "DISTINCT" => Token::Distinct,
        "FROM" => Token::From,
        "WHERE" => Token::Where,
        "AS" => Token::As,
        "JOIN" => Token::Join,
        "INNER" => Token::Inner,
        "LEFT" => Token::Left,
        "RIGHT" => Token::Right,
        "FULL" => Token::Full,
        "OUTER" => Token::Outer,
        "CROSS" => Token::Cross,
        "ON" => Token::On,
        "GROUP" => Token::Group,
        "HAVING" => Token::Having,
        "ORDER" => Token::Order,
        "BY" => Token::By,
        "ASC" => Token::Asc,
        "DESC" => Token::Desc,
        "LIMIT" => Token::Limit,
        "OFFSET" => Token::Offset,
        "UNION" => Token::Union,
        "ALL" => Token::All,
        "INTERSECT" => Token::Intersect,
        "EXCEPT" => Token::Except,
        "CREATE" => Token::Create,
        "TABLE" => Token::Table,
        "CASE" => Token::Case,
        "WHEN" => Token::When,
        "THEN" => Token::Then,
        "ELSE" => Token::Else,
        "END" => Token::End,
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "BETWEEN" => Token::Between,
        "LIKE" => Token::Like,
        "IN" => Token::In,
        "IS" => Token::Is,
        "NULL" => Token::Null,
        "OVER" => Token::Over,
        "PARTITION" => Token::Partition,
        "TRUE" => Token::True,
        "FALSE" => Token::False,
        _ => return None,
    };
    Some(token)
}

/// Whether `word` would be read back as a keyword rather than an identifier.
pub fn is_keyword(word: &str) -> bool {
    let upper = word.to_uppercase();
    upper == "DATE" || keyword(&upper).is_some()
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
///
/// Comments (`-- ...` up to the end of the line and `/* ... */`, possibly
/// spanning lines) are discarded.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens, always
    /// terminated by [Token::Eof].
    ///
    /// # Errors
    /// Returns [Error::Lex] if an invalid character is encountered or if a
    /// string, quoted identifier or block comment is unterminated.
    ///
    /// # Example
    /// ```
    /// # use csvql::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT * -- everything");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens, vec![Token::Select, Token::Star, Token::Eof]);
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        let single = match ch {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '*' => Some(Token::Star),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match ch {
            '<' => {
                self.advance();
                Ok(match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LowerEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::Lower,
                })
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::GreaterEqual);
                }
                Ok(Token::Greater)
            }
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(Token::NotEqual);
                }
                Err(self.error("expected '=' after '!'"))
            }
            '.' if self.next_char().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            '.' => {
                self.advance();
                Ok(Token::Dot)
            }
            '\'' => self.read_string().map(Token::String),
            '"' | '`' => self.read_quoted_identifier(ch),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            _ => Err(self.error(&format!("character: {ch:?} is not supported"))),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn next_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn error(&self, message: &str) -> Error {
        Error::Lex {
            position: self.position,
            message: message.to_string(),
        }
    }

    /// Consumes whitespace and comments until the next significant character.
    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            while !self.is_at_end() && self.current_char().is_whitespace() {
                self.advance();
            }
            match (self.peek_char(), self.next_char()) {
                (Some('-'), Some('-')) => {
                    while !self.is_at_end() && self.current_char() != '\n' {
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.position;
                    self.position += 2;
                    loop {
                        match (self.peek_char(), self.next_char()) {
                            (Some('*'), Some('/')) => {
                                self.position += 2;
                                break;
                            }
                            (Some(_), _) => self.advance(),
                            (None, _) => {
                                return Err(Error::Lex {
                                    position: start,
                                    message: "unterminated block comment".into(),
                                });
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // --- Extraction Logic ---

    /// Reads a sequence of alphanumeric characters and determines if it's
    /// a reserved SQL keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively. `DATE` directly followed by a
    /// string literal becomes a [Token::Date].
    fn read_identifier(&mut self) -> Result<Token> {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        let upper = ident.to_uppercase();
        if upper == "DATE" {
            return self.read_date_literal(ident);
        }
        Ok(keyword(&upper).unwrap_or(Token::Ident(ident)))
    }

    fn read_date_literal(&mut self, ident: String) -> Result<Token> {
        let mark = self.position;
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
        if self.peek_char() != Some('\'') {
            self.position = mark;
            return Ok(Token::Ident(ident));
        }
        let start = self.position;
        let text = self.read_string()?;
        date::parse_date(&text)
            .map(Token::Date)
            .ok_or_else(|| Error::Lex {
                position: start,
                message: format!("invalid date literal '{text}'"),
            })
    }

    /// Reads a numeric literal. If a dot `.` is encountered, it returns a
    /// [Token::FloatNumber], otherwise a [Token::Number].
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();
        let mut has_dot = false;

        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || (self.current_char() == '.' && !has_dot))
        {
            if self.current_char() == '.' {
                has_dot = true;
            }
            number.push(self.current_char());
            self.advance();
        }

        if !self.is_at_end() && self.current_char() == '.' {
            return Err(self.error("multiple dots are not allowed for a float"));
        }

        if has_dot {
            return number
                .parse::<f64>()
                .map(Token::FloatNumber)
                .map_err(|e| self.error(&e.to_string()));
        }

        number
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|e| self.error(&e.to_string()))
    }

    /// Reads a string literal enclosed in single quotes, where `''` stands
    /// for one embedded quote.
    fn read_string(&mut self) -> Result<String> {
        let start = self.position;
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(Error::Lex {
                        position: start,
                        message: "Unterminated string".into(),
                    });
                }
                Some('\'') if self.next_char() == Some('\'') => {
                    string.push('\'');
                    self.position += 2;
                }
                Some('\'') => {
                    self.advance();
                    return Ok(string);
                }
                Some(c) => {
                    string.push(c);
                    self.advance();
                }
            }
        }
    }

    fn read_quoted_identifier(&mut self, quote: char) -> Result<Token> {
        let start = self.position;
        self.advance();

        let mut ident = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(Error::Lex {
                        position: start,
                        message: "Unterminated quoted identifier".into(),
                    });
                }
                Some(c) if c == quote && self.next_char() == Some(quote) => {
                    ident.push(quote);
                    self.position += 2;
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(Token::QuotedIdent(ident));
                }
                Some(c) => {
                    ident.push(c);
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(sql: &str) -> Vec<Token> {
        Tokenizer::new(sql).tokenize().unwrap()
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            tokenize("SELECT name FROM users"),
            vec![
                Token::Select,
                Token::Ident("name".into()),
                Token::From,
                Token::Ident("users".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            tokenize("a<=b <> c != d >= e < f > g = h"),
            vec![
                Token::Ident("a".into()),
                Token::LowerEqual,
                Token::Ident("b".into()),
                Token::NotEqual,
                Token::Ident("c".into()),
                Token::NotEqual,
                Token::Ident("d".into()),
                Token::GreaterEqual,
                Token::Ident("e".into()),
                Token::Lower,
                Token::Ident("f".into()),
                Token::Greater,
                Token::Ident("g".into()),
                Token::Equal,
                Token::Ident("h".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_numbers() {
        assert_eq!(
            tokenize("42, 1.14 .5"),
            vec![
                Token::Number(42),
                Token::Comma,
                Token::FloatNumber(1.14),
                Token::FloatNumber(0.5),
                Token::Eof,
            ]
        );
        assert!(Tokenizer::new("1.2.3").tokenize().is_err());
    }

    #[test]
    fn test_tokenize_strings() {
        assert_eq!(
            tokenize("'Alice', 'O''Brien', ''"),
            vec![
                Token::String("Alice".into()),
                Token::Comma,
                Token::String("O'Brien".into()),
                Token::Comma,
                Token::String(String::new()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_tokenize_quoted_identifiers() {
        assert_eq!(
            tokenize("\"first name\", `select`, t.\"x\"\"y\""),
            vec![
                Token::QuotedIdent("first name".into()),
                Token::Comma,
                Token::QuotedIdent("select".into()),
                Token::Comma,
                Token::Ident("t".into()),
                Token::Dot,
                Token::QuotedIdent("x\"y".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_date_literal() {
        assert_eq!(
            tokenize("DATE '2024-02-29'"),
            vec![
                Token::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
                Token::Eof
            ]
        );
        // without a string DATE stays an identifier (function or column)
        assert_eq!(
            tokenize("DATE(x)")[0..2],
            [Token::Ident("DATE".into()), Token::LeftParen]
        );
        assert!(Tokenizer::new("DATE '2023-02-29'").tokenize().is_err());
    }

    #[test]
    fn test_comments_are_skipped() {
        let with_comments = tokenize(
            "SELECT name -- the name\n/* block\n comment */ FROM /* inline */ 'users.csv' -- end",
        );
        assert_eq!(with_comments, tokenize("SELECT name FROM 'users.csv'"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Tokenizer::new("SELECT 'hello").tokenize().unwrap_err();
        assert!(matches!(err, Error::Lex { position: 7, .. }));
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(Tokenizer::new("SELECT /* never closed").tokenize().is_err());
        assert!(Tokenizer::new("SELECT \"open").tokenize().is_err());
    }

    #[test]
    fn test_unsupported_character() {
        assert!(Tokenizer::new("SELECT #").tokenize().is_err());
    }
}
