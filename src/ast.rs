//! Abstract syntax tree for one statement.
//!
//! The tree owns its children exclusively and has no back-references, so
//! dropping the root releases everything. `Display` renders a node back to
//! SQL text that parses to the same tree.

use std::fmt;

use crate::aggregate::AggregateFunction;
use crate::date::{self, DateFormat};
use crate::table::ColumnDef;
use crate::tokenizer;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Box<Select>),
    CreateTable(CreateTable),
}

/// `CREATE TABLE '<path>' ...`
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub path: String,
    pub body: CreateTableBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateTableBody {
    /// Schema only: an empty table with these columns.
    Columns(Vec<ColumnDef>),
    /// `AS SELECT ...`: the query result is persisted.
    Query(Box<Select>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub distinct: bool,
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// `UNION`/`INTERSECT`/`EXCEPT` links applied left to right to this
    /// query's result.
    pub set_ops: Vec<SetOperation>,
}

impl Select {
    /// A `SELECT *` over `from` with every optional clause empty.
    pub fn new(from: TableRef) -> Self {
        Self {
            distinct: false,
            projection: Vec::new(),
            from,
            joins: Vec::new(),
            selection: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            set_ops: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `*`
    Wildcard,
    /// `alias.*`
    QualifiedWildcard(String),
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A registered table name or a CSV path.
    Named(String),
    Subquery(Box<Select>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    /// Always present except for `CROSS JOIN`.
    pub on: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub op: SetOperator,
    /// A right operand with links of its own was written in parentheses.
    pub right: Select,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table name or alias for `t.col`.
    pub table: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Upper-cased function name.
    pub name: String,
    pub args: Vec<Expr>,
    /// `COUNT(DISTINCT x)`
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// `CASE <operand> WHEN <value> ...` (simple form) when present.
    pub operand: Option<Box<Expr>>,
    pub branches: Vec<(Expr, Expr)>,
    pub else_result: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFunction {
    pub function: FunctionCall,
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Column(ColumnRef),
    /// `*` as a function argument, as in `COUNT(*)`.
    Wildcard,
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<Select>,
        negated: bool,
    },
    Function(FunctionCall),
    Case(CaseExpr),
    Window(Box<WindowFunction>),
}

impl Expr {
    /// Whether an aggregate call appears, not counting the function a window
    /// applies.
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if let Expr::Function(f) = e {
                found |= AggregateFunction::from_name(&f.name).is_some();
            }
        });
        found
    }

    pub fn contains_window(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| found |= matches!(e, Expr::Window(_)));
        found
    }

    /// Pre-order visit of this expression and its children, including the
    /// arguments and keys of window functions. Subqueries are visited but not
    /// descended into.
    pub fn walk(&self, visit: &mut impl FnMut(&Expr)) {
        visit(self);
        match self {
            Expr::Literal(_) | Expr::Column(_) | Expr::Wildcard => {}
            Expr::Window(w) => {
                w.function.args.iter().for_each(|e| e.walk(visit));
                w.partition_by.iter().for_each(|e| e.walk(visit));
                w.order_by.iter().for_each(|o| o.expr.walk(visit));
            }
            Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => expr.walk(visit),
            Expr::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.walk(visit);
                low.walk(visit);
                high.walk(visit);
            }
            Expr::Like { expr, pattern, .. } => {
                expr.walk(visit);
                pattern.walk(visit);
            }
            Expr::InList { expr, list, .. } => {
                expr.walk(visit);
                list.iter().for_each(|e| e.walk(visit));
            }
            Expr::InSubquery { expr, .. } => expr.walk(visit),
            Expr::Function(f) => f.args.iter().for_each(|e| e.walk(visit)),
            Expr::Case(case) => {
                if let Some(operand) = &case.operand {
                    operand.walk(visit);
                }
                for (when, then) in &case.branches {
                    when.walk(visit);
                    then.walk(visit);
                }
                if let Some(e) = &case.else_result {
                    e.walk(visit);
                }
            }
        }
    }

    /// Mutable counterpart of [Expr::walk], post-order, with the same
    /// boundaries.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Expr)) {
        match self {
            Expr::Literal(_) | Expr::Column(_) | Expr::Wildcard => {}
            Expr::Window(w) => {
                w.function.args.iter_mut().for_each(|e| e.walk_mut(visit));
                w.partition_by.iter_mut().for_each(|e| e.walk_mut(visit));
                w.order_by.iter_mut().for_each(|o| o.expr.walk_mut(visit));
            }
            Expr::Unary { expr, .. } | Expr::IsNull { expr, .. } => expr.walk_mut(visit),
            Expr::Binary { left, right, .. } => {
                left.walk_mut(visit);
                right.walk_mut(visit);
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.walk_mut(visit);
                low.walk_mut(visit);
                high.walk_mut(visit);
            }
            Expr::Like { expr, pattern, .. } => {
                expr.walk_mut(visit);
                pattern.walk_mut(visit);
            }
            Expr::InList { expr, list, .. } => {
                expr.walk_mut(visit);
                list.iter_mut().for_each(|e| e.walk_mut(visit));
            }
            Expr::InSubquery { expr, .. } => expr.walk_mut(visit),
            Expr::Function(f) => f.args.iter_mut().for_each(|e| e.walk_mut(visit)),
            Expr::Case(case) => {
                if let Some(operand) = &mut case.operand {
                    operand.walk_mut(visit);
                }
                for (when, then) in &mut case.branches {
                    when.walk_mut(visit);
                    then.walk_mut(visit);
                }
                if let Some(e) = &mut case.else_result {
                    e.walk_mut(visit);
                }
            }
        }
        visit(self);
    }

    /// Nodes that need parentheses when they appear as an operand.
    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::Binary { .. }
                | Expr::IsNull { .. }
                | Expr::Between { .. }
                | Expr::Like { .. }
                | Expr::InList { .. }
                | Expr::InSubquery { .. }
                | Expr::Unary {
                    op: UnaryOp::Not,
                    ..
                }
        )
    }
}

// ─────────────────────────────────────────────────────────────
// SQL rendering
// ─────────────────────────────────────────────────────────────

/// Writes an identifier, quoting it when it would not read back as-is.
pub(crate) fn write_ident(f: &mut fmt::Formatter<'_>, ident: &str) -> fmt::Result {
    let mut chars = ident.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !tokenizer::is_keyword(ident);
    if plain {
        f.write_str(ident)
    } else {
        write!(f, "\"{}\"", ident.replace('"', "\"\""))
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'{}'", s.replace('\'', "''"))
}

/// Writes an operand, parenthesized when it is itself compound.
fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr) -> fmt::Result {
    if expr.is_compound() {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

/// Plain decimal notation that always reads back as a float.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let text = x.to_string();
    if text.contains('.') || !x.is_finite() {
        f.write_str(&text)
    } else {
        write!(f, "{text}.0")
    }
}

fn starts_with_minus(expr: &Expr) -> bool {
    match expr {
        Expr::Unary {
            op: UnaryOp::Minus, ..
        } => true,
        Expr::Literal(Value::Int(i)) => *i < 0,
        Expr::Literal(Value::Float(x)) => x.is_sign_negative(),
        _ => false,
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        };
        f.write_str(op)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write_ident(f, table)?;
            f.write_str(".")?;
        }
        write_ident(f, &self.name)
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.args)?;
        f.write_str(")")
    }
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if self.descending {
            f.write_str(" DESC")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => match value {
                Value::Null => f.write_str("NULL"),
                Value::Int(i) => write!(f, "{i}"),
                Value::Float(x) => write_float(f, *x),
                Value::Text(s) => write_string(f, s),
                Value::Date(d) => write!(f, "DATE '{}'", date::format_date(*d, DateFormat::Iso)),
            },
            Expr::Column(col) => write!(f, "{col}"),
            Expr::Wildcard => f.write_str("*"),
            Expr::Unary { op, expr } => {
                match op {
                    UnaryOp::Not => f.write_str("NOT ")?,
                    UnaryOp::Minus => f.write_str("-")?,
                    UnaryOp::Plus => f.write_str("+")?,
                }
                // `--` would start a comment
                if *op == UnaryOp::Minus && starts_with_minus(expr) {
                    write!(f, "({expr})")
                } else {
                    write_operand(f, expr)
                }
            }
            Expr::Binary { left, op, right } => {
                write_operand(f, left)?;
                write!(f, " {op} ")?;
                write_operand(f, right)
            }
            Expr::IsNull { expr, negated } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " IS NOT NULL" } else { " IS NULL" })
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT BETWEEN " } else { " BETWEEN " })?;
                write_operand(f, low)?;
                f.write_str(" AND ")?;
                write_operand(f, high)
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT LIKE " } else { " LIKE " })?;
                write_operand(f, pattern)
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT IN (" } else { " IN (" })?;
                write_list(f, list)?;
                f.write_str(")")
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                write_operand(f, expr)?;
                f.write_str(if *negated { " NOT IN (" } else { " IN (" })?;
                write!(f, "{subquery})")
            }
            Expr::Function(call) => write!(f, "{call}"),
            Expr::Case(case) => {
                f.write_str("CASE")?;
                if let Some(operand) = &case.operand {
                    write!(f, " {operand}")?;
                }
                for (when, then) in &case.branches {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(e) = &case.else_result {
                    write!(f, " ELSE {e}")?;
                }
                f.write_str(" END")
            }
            Expr::Window(window) => {
                write!(f, "{} OVER (", window.function)?;
                if !window.partition_by.is_empty() {
                    f.write_str("PARTITION BY ")?;
                    write_list(f, &window.partition_by)?;
                    if !window.order_by.is_empty() {
                        f.write_str(" ")?;
                    }
                }
                if !window.order_by.is_empty() {
                    f.write_str("ORDER BY ")?;
                    write_list(f, &window.order_by)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectItem::Wildcard => f.write_str("*"),
            SelectItem::QualifiedWildcard(table) => {
                write_ident(f, table)?;
                f.write_str(".*")
            }
            SelectItem::Expr { expr, alias } => {
                write!(f, "{expr}")?;
                if let Some(alias) = alias {
                    f.write_str(" AS ")?;
                    write_ident(f, alias)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            TableSource::Named(name) => write_string(f, name)?,
            TableSource::Subquery(select) => write!(f, "({select})")?,
        }
        if let Some(alias) = &self.alias {
            f.write_str(" AS ")?;
            write_ident(f, alias)?;
        }
        Ok(())
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        };
        write!(f, "{kind} {}", self.table)?;
        if let Some(on) = &self.on {
            write!(f, " ON {on}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        if self.projection.is_empty() {
            f.write_str("*")?;
        } else {
            write_list(f, &self.projection)?;
        }
        write!(f, " FROM {}", self.from)?;
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {selection}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        for set_op in &self.set_ops {
            let op = match set_op.op {
                SetOperator::Union => "UNION",
                SetOperator::UnionAll => "UNION ALL",
                SetOperator::Intersect => "INTERSECT",
                SetOperator::Except => "EXCEPT",
            };
            if set_op.right.set_ops.is_empty() {
                write!(f, " {op} {}", set_op.right)?;
            } else {
                write!(f, " {op} ({})", set_op.right)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE TABLE ")?;
        write_string(f, &self.path)?;
        match &self.body {
            CreateTableBody::Columns(columns) => {
                f.write_str(" (")?;
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_ident(f, &column.name)?;
                    write!(f, " {}", column.data_type)?;
                }
                f.write_str(")")
            }
            CreateTableBody::Query(select) => write!(f, " AS {select}"),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Select(select) => write!(f, "{select}"),
            Statement::CreateTable(create) => write!(f, "{create}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn col(name: &str) -> Expr {
        Expr::Column(ColumnRef {
            table: None,
            name: name.into(),
        })
    }

    #[test]
    fn test_render_nested_binary() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Binary {
                left: Box::new(col("a")),
                op: BinaryOp::Plus,
                right: Box::new(col("b")),
            }),
            op: BinaryOp::Multiply,
            right: Box::new(Expr::Literal(Value::Int(2))),
        };
        assert_eq!(expr.to_string(), "(a + b) * 2");
    }

    #[test]
    fn test_render_identifiers_and_literals() {
        let expr = Expr::InList {
            expr: Box::new(Expr::Column(ColumnRef {
                table: Some("u".into()),
                name: "first name".into(),
            })),
            list: vec![
                Expr::Literal(Value::from("O'Brien")),
                Expr::Literal(Value::Float(1.0)),
                Expr::Literal(Value::Null),
            ],
            negated: true,
        };
        assert_eq!(
            expr.to_string(),
            "u.\"first name\" NOT IN ('O''Brien', 1.0, NULL)"
        );
        assert_eq!(col("select").to_string(), "\"select\"");
    }

    fn reparse(expr: &Expr) -> Expr {
        let sql = format!("SELECT {expr} FROM t");
        let Statement::Select(select) = parse(&sql).unwrap() else {
            panic!("Expected Select for {sql}");
        };
        match &select.projection[0] {
            SelectItem::Expr { expr, .. } => expr.clone(),
            other => panic!("Expected an expression, got {other:?}"),
        }
    }

    #[test]
    fn test_render_nested_minus() {
        let nested = Expr::Unary {
            op: UnaryOp::Minus,
            expr: Box::new(Expr::Unary {
                op: UnaryOp::Minus,
                expr: Box::new(col("a")),
            }),
        };
        assert_eq!(nested.to_string(), "-(-a)");
        assert_eq!(reparse(&nested), nested);

        let negated_literal = Expr::Unary {
            op: UnaryOp::Minus,
            expr: Box::new(Expr::Literal(Value::Int(-5))),
        };
        assert_eq!(negated_literal.to_string(), "-(-5)");
        assert_eq!(reparse(&negated_literal), Expr::Literal(Value::Int(5)));
    }

    #[test]
    fn test_render_floats_in_decimal() {
        for x in [1e20, 1.0, 0.5, 2.5e-7, -3.25] {
            let literal = Expr::Literal(Value::Float(x));
            let text = literal.to_string();
            assert!(!text.contains('e'), "{text}");
            assert_eq!(reparse(&literal), literal, "{text}");
        }
        assert_eq!(Expr::Literal(Value::Float(1e20)).to_string(), "100000000000000000000.0");
    }

    #[test]
    fn test_contains_aggregate_skips_windows() {
        let count = Expr::Function(FunctionCall {
            name: "COUNT".into(),
            args: vec![Expr::Wildcard],
            distinct: false,
        });
        assert!(count.contains_aggregate());
        assert_eq!(count.to_string(), "COUNT(*)");

        let window = Expr::Window(Box::new(WindowFunction {
            function: FunctionCall {
                name: "SUM".into(),
                args: vec![col("x")],
                distinct: false,
            },
            partition_by: vec![col("g")],
            order_by: vec![OrderByExpr {
                expr: col("x"),
                descending: true,
            }],
        }));
        assert!(!window.contains_aggregate());
        assert!(window.contains_window());

        let mut columns = Vec::new();
        window.walk(&mut |e| {
            if let Expr::Column(c) = e {
                columns.push(c.name.clone());
            }
        });
        assert_eq!(columns, vec!["x", "g", "x"]);
        assert_eq!(
            window.to_string(),
            "SUM(x) OVER (PARTITION BY g ORDER BY x DESC)"
        );
    }
}
