use tracing::{debug, trace};

use crate::ast::*;
use crate::data_type::DataType;
use crate::error::{Result, parse_err};
use crate::table::ColumnDef;
use crate::tokenizer::{Token, Tokenizer};
use crate::value::Value;

/// Tokenizes and parses a single statement.
///
/// # Errors
/// Returns [crate::Error::Lex] or [crate::Error::Parse]; no partial tree is
/// ever returned.
///
/// # Example
/// ```
/// # use csvql::ast::Statement;
/// let stmt = csvql::parse("SELECT name FROM 'users.csv' WHERE age >= 18").unwrap();
/// assert!(matches!(stmt, Statement::Select(_)));
/// ```
pub fn parse(sql: &str) -> Result<Statement> {
    let tokens = Tokenizer::new(sql).tokenize()?;
    trace!(tokens = tokens.len(), "tokenized statement");
    let statement = Parser::new(tokens).parse()?;
    debug!(%statement, "parsed statement");
    Ok(statement)
}

/// Recursive-descent parser over a token stream terminated by [Token::Eof].
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last() != Some(&Token::Eof) {
            tokens.push(Token::Eof);
        }
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current_token() {
            Token::Create => self.parse_create_table()?,
            Token::Select => Statement::Select(Box::new(self.parse_select()?)),
            other => return Err(parse_err!("Unexpected token: {other:?}")),
        };

        // semicolon is optional in SQL so skip it
        if matches!(self.current_token(), Token::Semicolon) {
            self.advance();
        }

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(parse_err!(
                "Unexpected token after statement: {:?}",
                self.current_token()
            ));
        }

        Ok(statement)
    }

    //helpers
    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn peek_token(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + offset).min(last)]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> Result<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(parse_err!(
                "Expected {:?}, found {:?}",
                expected,
                self.current_token()
            ))
        }
    }

    /// Consumes `expected` if it is the current token.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_ident(&mut self) -> Result<String> {
        match self.current_token() {
            Token::Ident(string) | Token::QuotedIdent(string) => {
                let string = string.clone();
                self.advance();
                Ok(string)
            }
            other => Err(parse_err!("Expected identifier, found {other:?}")),
        }
    }

    fn consume_count(&mut self, clause: &str) -> Result<u64> {
        match self.current_token() {
            Token::Number(n) if *n >= 0 => {
                let n = *n as u64;
                self.advance();
                Ok(n)
            }
            other => Err(parse_err!(
                "{clause} expects a non-negative integer, found {other:?}"
            )),
        }
    }

    // --- Statements ---

    fn parse_create_table(&mut self) -> Result<Statement> {
        self.consume(Token::Create)?;
        self.consume(Token::Table)?;
        let path = self.parse_source_name()?;

        let body = if self.eat(&Token::As) {
            match (self.current_token(), self.peek_token(1)) {
                (Token::Select, _) => CreateTableBody::Query(Box::new(self.parse_select()?)),
                (Token::LeftParen, Token::Select) => {
                    self.advance();
                    let select = self.parse_select()?;
                    self.consume(Token::RightParen)?;
                    CreateTableBody::Query(Box::new(select))
                }
                (Token::LeftParen, _) => CreateTableBody::Columns(self.parse_column_defs()?),
                (other, _) => {
                    return Err(parse_err!(
                        "Expected SELECT or a column list after AS, found {other:?}"
                    ));
                }
            }
        } else {
            CreateTableBody::Columns(self.parse_column_defs()?)
        };

        Ok(Statement::CreateTable(CreateTable { path, body }))
    }

    fn parse_column_defs(&mut self) -> Result<Vec<ColumnDef>> {
        self.consume(Token::LeftParen)?;
        let mut columns = vec![];
        loop {
            columns.push(self.parse_column_def()?);
            match self.current_token() {
                Token::RightParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    continue;
                }
                _ => return Err(parse_err!("Expected ',' or ')'")),
            }
        }
        Ok(columns)
    }

    /// `name [TYPE]`; the type defaults to TEXT.
    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.consume_ident()?;
        let data_type = match self.current_token() {
            Token::Ident(type_name) => {
                let data_type = DataType::from_name(type_name)
                    .ok_or_else(|| parse_err!("unknown column type {type_name}"))?;
                self.advance();
                data_type
            }
            _ => DataType::Text,
        };
        Ok(ColumnDef { name, data_type })
    }

    /// Parses a `SELECT` followed by any `UNION`/`INTERSECT`/`EXCEPT` links.
    ///
    /// Links fold left to right; a parenthesized operand keeps its own chain.
    fn parse_select(&mut self) -> Result<Select> {
        let mut select = self.parse_select_body()?;
        while let Some(op) = self.parse_set_operator() {
            let right = if self.eat(&Token::LeftParen) {
                let right = self.parse_select()?;
                self.consume(Token::RightParen)?;
                right
            } else {
                self.parse_select_body()?
            };
            select.set_ops.push(SetOperation { op, right });
        }
        Ok(select)
    }

    fn parse_set_operator(&mut self) -> Option<SetOperator> {
        let op = match self.current_token() {
            Token::Union => {
                self.advance();
                if self.eat(&Token::All) {
                    SetOperator::UnionAll
                } else {
                    SetOperator::Union
                }
            }
            Token::Intersect => {
                self.advance();
                SetOperator::Intersect
            }
            Token::Except => {
                self.advance();
                SetOperator::Except
            }
            _ => return None,
        };
        Some(op)
    }

    fn parse_select_body(&mut self) -> Result<Select> {
        self.consume(Token::Select)?;
        let distinct = self.eat(&Token::Distinct);

        let mut projection = vec![self.parse_select_item()?];
        while self.eat(&Token::Comma) {
            projection.push(self.parse_select_item()?);
        }

        if !self.eat(&Token::From) {
            return Err(parse_err!(
                "Expected FROM, found {:?}",
                self.current_token()
            ));
        }
        let mut select = Select::new(self.parse_table_ref()?);
        select.distinct = distinct;
        select.projection = projection;

        while let Some(kind) = self.parse_join_kind()? {
            let table = self.parse_table_ref()?;
            let on = if kind == JoinKind::Cross {
                None
            } else {
                self.consume(Token::On)?;
                Some(self.parse_expr()?)
            };
            select.joins.push(Join { kind, table, on });
        }

        if self.eat(&Token::Where) {
            select.selection = Some(self.parse_expr()?);
        }
        if self.eat(&Token::Group) {
            self.consume(Token::By)?;
            select.group_by = self.parse_expr_list()?;
        }
        if self.eat(&Token::Having) {
            select.having = Some(self.parse_expr()?);
        }
        if self.eat(&Token::Order) {
            self.consume(Token::By)?;
            select.order_by = self.parse_order_by_list()?;
        }
        if self.eat(&Token::Limit) {
            select.limit = Some(self.consume_count("LIMIT")?);
        }
        if self.eat(&Token::Offset) {
            select.offset = Some(self.consume_count("OFFSET")?);
        }

        Ok(select)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self.eat(&Token::Star) {
            return Ok(SelectItem::Wildcard);
        }
        if let (Token::Ident(table) | Token::QuotedIdent(table), Token::Dot, Token::Star) =
            (self.current_token(), self.peek_token(1), self.peek_token(2))
        {
            let table = table.clone();
            self.position += 3;
            return Ok(SelectItem::QualifiedWildcard(table));
        }

        let expr = self.parse_expr()?;
        let alias = self.parse_alias(true)?;
        Ok(SelectItem::Expr { expr, alias })
    }

    /// `[AS] alias`. A string literal is accepted as the alias only after an
    /// explicit `AS` and only when `allow_string` is set.
    fn parse_alias(&mut self, allow_string: bool) -> Result<Option<String>> {
        if self.eat(&Token::As) {
            return match self.current_token() {
                Token::String(alias) if allow_string => {
                    let alias = alias.clone();
                    self.advance();
                    Ok(Some(alias))
                }
                _ => self.consume_ident().map(Some),
            };
        }
        match self.current_token() {
            Token::Ident(_) | Token::QuotedIdent(_) => self.consume_ident().map(Some),
            _ => Ok(None),
        }
    }

    /// A table name or path: a string literal, or identifiers joined by dots
    /// (`users.csv`).
    fn parse_source_name(&mut self) -> Result<String> {
        if let Token::String(path) = self.current_token() {
            let path = path.clone();
            self.advance();
            return Ok(path);
        }
        let mut name = self.consume_ident()?;
        while matches!(self.current_token(), Token::Dot) {
            self.advance();
            name.push('.');
            name.push_str(&self.consume_ident()?);
        }
        Ok(name)
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let source = if self.eat(&Token::LeftParen) {
            let select = self.parse_select()?;
            self.consume(Token::RightParen)?;
            TableSource::Subquery(Box::new(select))
        } else {
            TableSource::Named(self.parse_source_name()?)
        };
        let alias = self.parse_alias(false)?;
        Ok(TableRef { source, alias })
    }

    fn parse_join_kind(&mut self) -> Result<Option<JoinKind>> {
        let kind = match self.current_token() {
            Token::Join => {
                self.advance();
                return Ok(Some(JoinKind::Inner));
            }
            Token::Inner => JoinKind::Inner,
            Token::Left => JoinKind::Left,
            Token::Right => JoinKind::Right,
            Token::Full => JoinKind::Full,
            Token::Cross => JoinKind::Cross,
            _ => return Ok(None),
        };
        self.advance();
        if matches!(kind, JoinKind::Left | JoinKind::Right | JoinKind::Full) {
            self.eat(&Token::Outer);
        }
        self.consume(Token::Join)?;
        Ok(Some(kind))
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut list = vec![self.parse_expr()?];
        while self.eat(&Token::Comma) {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    fn parse_order_by_list(&mut self) -> Result<Vec<OrderByExpr>> {
        let mut list = Vec::new();
        loop {
            let expr = self.parse_expr()?;
            let descending = match self.current_token() {
                Token::Desc => {
                    self.advance();
                    true
                }
                Token::Asc => {
                    self.advance();
                    false
                }
                _ => false,
            };
            list.push(OrderByExpr { expr, descending });
            if !self.eat(&Token::Comma) {
                return Ok(list);
            }
        }
    }

    // --- Expressions, lowest precedence first ---

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            let expr = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    /// Comparison operators and the postfix predicates `IS`, `BETWEEN`,
    /// `LIKE` and `IN`.
    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.current_token() {
                Token::Equal => Some(BinaryOp::Eq),
                Token::NotEqual => Some(BinaryOp::NotEq),
                Token::Lower => Some(BinaryOp::Lt),
                Token::LowerEqual => Some(BinaryOp::LtEq),
                Token::Greater => Some(BinaryOp::Gt),
                Token::GreaterEqual => Some(BinaryOp::GtEq),
                _ => None,
            };
            if let Some(op) = op {
                self.advance();
                let right = self.parse_additive()?;
                left = binary(left, op, right);
                continue;
            }

            if self.eat(&Token::Is) {
                let negated = self.eat(&Token::Not);
                self.consume(Token::Null)?;
                left = Expr::IsNull {
                    expr: Box::new(left),
                    negated,
                };
                continue;
            }

            let negated = matches!(self.current_token(), Token::Not)
                && matches!(
                    self.peek_token(1),
                    Token::Between | Token::Like | Token::In
                );
            if negated {
                self.advance();
            }
            left = match self.current_token() {
                Token::Between => {
                    self.advance();
                    let low = self.parse_additive()?;
                    self.consume(Token::And)?;
                    let high = self.parse_additive()?;
                    Expr::Between {
                        expr: Box::new(left),
                        low: Box::new(low),
                        high: Box::new(high),
                        negated,
                    }
                }
                Token::Like => {
                    self.advance();
                    let pattern = self.parse_additive()?;
                    Expr::Like {
                        expr: Box::new(left),
                        pattern: Box::new(pattern),
                        negated,
                    }
                }
                Token::In => {
                    self.advance();
                    self.parse_in(left, negated)?
                }
                _ => return Ok(left),
            };
        }
    }

    fn parse_in(&mut self, expr: Expr, negated: bool) -> Result<Expr> {
        self.consume(Token::LeftParen)?;
        if matches!(self.current_token(), Token::Select) {
            let subquery = self.parse_select()?;
            self.consume(Token::RightParen)?;
            return Ok(Expr::InSubquery {
                expr: Box::new(expr),
                subquery: Box::new(subquery),
                negated,
            });
        }
        let list = self.parse_expr_list()?;
        self.consume(Token::RightParen)?;
        Ok(Expr::InList {
            expr: Box::new(expr),
            list,
            negated,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOp::Plus,
                Token::Minus => BinaryOp::Minus,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                Token::Percent => BinaryOp::Modulo,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOp::Minus,
            Token::Plus => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        self.advance();
        let expr = self.parse_unary()?;
        // a negated numeric literal is itself a literal
        Ok(match (op, expr) {
            (UnaryOp::Minus, Expr::Literal(Value::Int(i))) => Expr::Literal(Value::Int(-i)),
            (UnaryOp::Minus, Expr::Literal(Value::Float(f))) => Expr::Literal(Value::Float(-f)),
            (op, expr) => Expr::Unary {
                op,
                expr: Box::new(expr),
            },
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let literal = match self.current_token() {
            Token::Number(n) => Some(Value::Int(*n)),
            Token::FloatNumber(f) => Some(Value::Float(*f)),
            Token::String(s) => Some(Value::from(s.as_str())),
            Token::Date(d) => Some(Value::Date(*d)),
            Token::True => Some(Value::TRUE),
            Token::False => Some(Value::FALSE),
            Token::Null => Some(Value::Null),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expr::Literal(value));
        }

        match self.current_token().clone() {
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.consume(Token::RightParen)?;
                Ok(expr)
            }
            Token::Case => self.parse_case(),
            Token::Ident(name) if matches!(self.peek_token(1), Token::LeftParen) => {
                self.advance();
                self.parse_function(name.to_uppercase())
            }
            Token::Ident(name) if name.eq_ignore_ascii_case("CURRENT_DATE") => {
                self.advance();
                Ok(Expr::Function(FunctionCall {
                    name: "CURRENT_DATE".into(),
                    args: vec![],
                    distinct: false,
                }))
            }
            Token::Ident(_) | Token::QuotedIdent(_) => {
                let first = self.consume_ident()?;
                if self.eat(&Token::Dot) {
                    let name = self.consume_ident()?;
                    return Ok(Expr::Column(ColumnRef {
                        table: Some(first),
                        name,
                    }));
                }
                Ok(Expr::Column(ColumnRef {
                    table: None,
                    name: first,
                }))
            }
            other => Err(parse_err!("Expected an expression, found {other:?}")),
        }
    }

    fn parse_function(&mut self, name: String) -> Result<Expr> {
        self.consume(Token::LeftParen)?;
        let distinct = self.eat(&Token::Distinct);
        let mut args = Vec::new();
        if !matches!(self.current_token(), Token::RightParen) {
            loop {
                if self.eat(&Token::Star) {
                    args.push(Expr::Wildcard);
                } else {
                    args.push(self.parse_expr()?);
                }
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.consume(Token::RightParen)?;
        let function = FunctionCall {
            name,
            args,
            distinct,
        };

        if !self.eat(&Token::Over) {
            return Ok(Expr::Function(function));
        }
        self.consume(Token::LeftParen)?;
        let mut partition_by = Vec::new();
        if self.eat(&Token::Partition) {
            self.consume(Token::By)?;
            partition_by = self.parse_expr_list()?;
        }
        let mut order_by = Vec::new();
        if self.eat(&Token::Order) {
            self.consume(Token::By)?;
            order_by = self.parse_order_by_list()?;
        }
        self.consume(Token::RightParen)?;
        Ok(Expr::Window(Box::new(WindowFunction {
            function,
            partition_by,
            order_by,
        })))
    }

    fn parse_case(&mut self) -> Result<Expr> {
        self.consume(Token::Case)?;
        let operand = if matches!(self.current_token(), Token::When) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let mut branches = Vec::new();
        while self.eat(&Token::When) {
            let when = self.parse_expr()?;
            self.consume(Token::Then)?;
            let then = self.parse_expr()?;
            branches.push((when, then));
        }
        if branches.is_empty() {
            return Err(parse_err!("CASE requires at least one WHEN branch"));
        }

        let else_result = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.consume(Token::End)?;
        Ok(Expr::Case(CaseExpr {
            operand,
            branches,
            else_result,
        }))
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn select(sql: &str) -> Select {
        match parse(sql).unwrap() {
            Statement::Select(select) => *select,
            other => panic!("Expected Select, got {other:?}"),
        }
    }

    fn expr(sql: &str) -> Expr {
        Parser::new(Tokenizer::new(sql).tokenize().unwrap())
            .parse_expr()
            .unwrap()
    }

    fn col(name: &str) -> Expr {
        Expr::Column(ColumnRef {
            table: None,
            name: name.into(),
        })
    }

    #[test]
    fn test_parse_create_table() {
        let Statement::CreateTable(ct) = parse("CREATE TABLE 'out.csv' (id INT, name TEXT, born)")
            .unwrap()
        else {
            panic!("Expected CreateTable");
        };
        assert_eq!(ct.path, "out.csv");
        let CreateTableBody::Columns(columns) = ct.body else {
            panic!("Expected a column list");
        };
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].data_type, DataType::Int);
        assert_eq!(columns[1].data_type, DataType::Text);
        assert_eq!(columns[2].data_type, DataType::Text);
    }

    #[test]
    fn test_parse_create_table_as() {
        for sql in [
            "CREATE TABLE 'adults.csv' AS SELECT * FROM users WHERE age > 17",
            "CREATE TABLE 'adults.csv' AS (SELECT * FROM users WHERE age > 17);",
        ] {
            let Statement::CreateTable(ct) = parse(sql).unwrap() else {
                panic!("Expected CreateTable");
            };
            assert!(matches!(ct.body, CreateTableBody::Query(_)));
        }
        let Statement::CreateTable(ct) = parse("CREATE TABLE 'e.csv' AS (a, b)").unwrap() else {
            panic!("Expected CreateTable");
        };
        assert!(matches!(ct.body, CreateTableBody::Columns(ref c) if c.len() == 2));
    }

    #[test]
    fn test_parse_full_select() {
        let s = select(
            "SELECT DISTINCT u.name AS n, COUNT(*) FROM 'users.csv' u \
             LEFT OUTER JOIN orders o ON u.id = o.user_id \
             WHERE o.total > 10 GROUP BY u.name HAVING COUNT(*) > 1 \
             ORDER BY n DESC, 2 LIMIT 5 OFFSET 1",
        );
        assert!(s.distinct);
        assert_eq!(s.projection.len(), 2);
        assert_eq!(s.from.source, TableSource::Named("users.csv".into()));
        assert_eq!(s.from.alias.as_deref(), Some("u"));
        assert_eq!(s.joins.len(), 1);
        assert_eq!(s.joins[0].kind, JoinKind::Left);
        assert!(s.joins[0].on.is_some());
        assert!(s.selection.is_some());
        assert_eq!(s.group_by.len(), 1);
        assert!(s.having.is_some());
        assert_eq!(s.order_by.len(), 2);
        assert!(s.order_by[0].descending);
        assert!(!s.order_by[1].descending);
        assert_eq!(s.limit, Some(5));
        assert_eq!(s.offset, Some(1));
    }

    #[test]
    fn test_dotted_source_name() {
        let s = select("SELECT * FROM users.csv");
        assert_eq!(s.from.source, TableSource::Named("users.csv".into()));
        assert_eq!(s.projection, vec![SelectItem::Wildcard]);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            expr("1 + 2 * 3"),
            binary(
                Expr::Literal(Value::Int(1)),
                BinaryOp::Plus,
                binary(
                    Expr::Literal(Value::Int(2)),
                    BinaryOp::Multiply,
                    Expr::Literal(Value::Int(3))
                )
            )
        );
        // AND binds tighter than OR
        let Expr::Binary { op, right, .. } = expr("a = 1 OR b = 2 AND c = 3") else {
            panic!("Expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_between_does_not_swallow_and() {
        let Expr::Binary { op, left, .. } = expr("x BETWEEN 1 AND 5 AND y = 2") else {
            panic!("Expected binary");
        };
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(*left, Expr::Between { negated: false, .. }));
        assert!(matches!(
            expr("x NOT BETWEEN 1 AND 5"),
            Expr::Between { negated: true, .. }
        ));
    }

    #[test]
    fn test_postfix_predicates() {
        assert!(matches!(expr("name NOT LIKE 'A%'"), Expr::Like { negated: true, .. }));
        assert!(matches!(expr("x IS NOT NULL"), Expr::IsNull { negated: true, .. }));
        assert!(matches!(
            expr("x IN (1, 2, 3)"),
            Expr::InList { ref list, negated: false, .. } if list.len() == 3
        ));
        assert!(matches!(
            expr("id NOT IN (SELECT user_id FROM orders)"),
            Expr::InSubquery { negated: true, .. }
        ));
        assert!(matches!(
            expr("NOT x = 1"),
            Expr::Unary { op: UnaryOp::Not, .. }
        ));
    }

    #[test]
    fn test_negative_literals_fold() {
        assert_eq!(expr("-5"), Expr::Literal(Value::Int(-5)));
        assert_eq!(expr("-2.5"), Expr::Literal(Value::Float(-2.5)));
        assert!(matches!(expr("-x"), Expr::Unary { op: UnaryOp::Minus, .. }));
    }

    #[test]
    fn test_case_forms() {
        let Expr::Case(case) = expr("CASE WHEN x > 1 THEN 'big' ELSE 'small' END") else {
            panic!("Expected CASE");
        };
        assert!(case.operand.is_none());
        assert_eq!(case.branches.len(), 1);
        assert!(case.else_result.is_some());

        let Expr::Case(case) = expr("CASE x WHEN 1 THEN 'one' WHEN 2 THEN 'two' END") else {
            panic!("Expected CASE");
        };
        assert_eq!(case.operand.as_deref(), Some(&col("x")));
        assert_eq!(case.branches.len(), 2);
    }

    #[test]
    fn test_functions_and_windows() {
        let Expr::Function(f) = expr("count(DISTINCT city)") else {
            panic!("Expected function");
        };
        assert_eq!(f.name, "COUNT");
        assert!(f.distinct);

        assert!(matches!(expr("CURRENT_DATE"), Expr::Function(ref f) if f.args.is_empty()));

        let Expr::Window(w) = expr("RANK() OVER (PARTITION BY dept ORDER BY salary DESC)") else {
            panic!("Expected window");
        };
        assert_eq!(w.function.name, "RANK");
        assert_eq!(w.partition_by, vec![col("dept")]);
        assert!(w.order_by[0].descending);
    }

    #[test]
    fn test_set_operations_chain() {
        let s = select("SELECT a FROM t1 UNION ALL SELECT a FROM t2 EXCEPT SELECT a FROM t3");
        let ops: Vec<_> = s.set_ops.iter().map(|link| link.op).collect();
        assert_eq!(ops, vec![SetOperator::UnionAll, SetOperator::Except]);
        assert!(s.set_ops.iter().all(|link| link.right.set_ops.is_empty()));
    }

    #[test]
    fn test_parenthesized_set_operand_keeps_its_chain() {
        let s = select(
            "SELECT x FROM a EXCEPT (SELECT x FROM b UNION SELECT x FROM c) INTERSECT SELECT x FROM d",
        );
        assert_eq!(s.set_ops.len(), 2);
        assert_eq!(s.set_ops[0].op, SetOperator::Except);
        let grouped = &s.set_ops[0].right;
        assert_eq!(grouped.set_ops.len(), 1);
        assert_eq!(grouped.set_ops[0].op, SetOperator::Union);
        assert_eq!(s.set_ops[1].op, SetOperator::Intersect);
        assert!(s.set_ops[1].right.set_ops.is_empty());
    }

    #[test]
    fn test_subquery_source_and_qualified_wildcard() {
        let s = select("SELECT t.*, x FROM (SELECT x FROM data) AS t CROSS JOIN other");
        assert_eq!(s.projection[0], SelectItem::QualifiedWildcard("t".into()));
        assert!(matches!(s.from.source, TableSource::Subquery(_)));
        assert_eq!(s.joins[0].kind, JoinKind::Cross);
        assert!(s.joins[0].on.is_none());
    }

    #[test]
    fn test_parse_errors() {
        for sql in [
            "SELECT name",
            "SELECT name FROM users WHERE (a = 1",
            "SELECT FROM users",
            "SELECT * FROM users LIMIT -1",
            "SELECT * FROM users extra tokens",
            "DROP TABLE users",
            "SELECT * FROM a JOIN b",
        ] {
            assert!(
                matches!(parse(sql), Err(Error::Parse(_))),
                "expected a parse error for {sql}"
            );
        }
    }

    #[test]
    fn test_comments_parse_identically() {
        let plain = parse("SELECT name FROM users WHERE age > 30").unwrap();
        let commented = parse(
            "SELECT name -- who\n FROM /* the\n table */ users WHERE age > 30 -- filter",
        )
        .unwrap();
        assert_eq!(plain, commented);
    }

    #[test]
    fn test_render_round_trip() {
        for sql in [
            "SELECT DISTINCT u.name AS n, COUNT(*) FROM 'users.csv' AS u \
             LEFT JOIN 'orders.csv' AS o ON u.id = o.user_id WHERE o.total >= -1.5 \
             GROUP BY u.name HAVING COUNT(*) > 1 ORDER BY n DESC LIMIT 5 OFFSET 1",
            "SELECT CASE x WHEN 1 THEN 'a''b' ELSE NULL END, \"select\" FROM t \
             WHERE NOT (a IS NULL OR b NOT IN (1, 2)) UNION SELECT 1, 2 FROM t",
            "SELECT ROW_NUMBER() OVER (ORDER BY d), LAG(v, 2, 0) OVER (PARTITION BY g ORDER BY d) \
             FROM t WHERE d BETWEEN DATE '2024-01-01' AND CURRENT_DATE",
            "CREATE TABLE 'out.csv' AS SELECT * FROM (SELECT a FROM t) AS s",
            "CREATE TABLE 'empty.csv' (id INT, name TEXT, born DATE)",
        ] {
            let ast = parse(sql).unwrap();
            assert_eq!(parse(&ast.to_string()).unwrap(), ast, "{}", ast);
        }
    }
}
