//! Fluent construction of `SELECT` statements.
//!
//! [QueryBuilder] assembles the same [Select] tree the parser produces, so
//! no SQL text is concatenated along the way. [QueryBuilder::to_sql] renders
//! the tree through its `Display` impl and parsing that text gives back the
//! built tree.
//!
//! ```
//! use csvql::builder::{QueryBuilder, col, lit};
//!
//! let sql = QueryBuilder::new()
//!     .select(&["name", "dept"])
//!     .from("employees")
//!     .filter(col("salary").gt(lit(1000)))
//!     .order_by("name", false)
//!     .limit(10)
//!     .to_sql()
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT name, dept FROM 'employees' WHERE salary > 1000 ORDER BY name LIMIT 10"
//! );
//! ```

use crate::ast::{
    BinaryOp, CaseExpr, ColumnRef, Expr, FunctionCall, Join, JoinKind, OrderByExpr, Select,
    SelectItem, SetOperation, SetOperator, Statement, TableRef, TableSource, UnaryOp,
    WindowFunction,
};
use crate::database::Database;
use crate::error::{Result, parse_err};
use crate::table::Table;
use crate::value::Value;

/// Column reference; `t.c` is split into a qualified reference.
pub fn col(name: &str) -> Expr {
    match name.split_once('.') {
        Some((table, column)) => qualified_col(table, column),
        None => Expr::Column(ColumnRef {
            table: None,
            name: name.to_string(),
        }),
    }
}

pub fn qualified_col(table: &str, name: &str) -> Expr {
    Expr::Column(ColumnRef {
        table: Some(table.to_string()),
        name: name.to_string(),
    })
}

pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Scalar or aggregate call; the name is upper-cased like the parser does.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function(FunctionCall {
        name: name.to_ascii_uppercase(),
        args,
        distinct: false,
    })
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    pub fn eq(self, other: Expr) -> Expr {
        binary(self, BinaryOp::Eq, other)
    }

    pub fn not_eq(self, other: Expr) -> Expr {
        binary(self, BinaryOp::NotEq, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        binary(self, BinaryOp::Gt, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        binary(self, BinaryOp::GtEq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        binary(self, BinaryOp::Lt, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        binary(self, BinaryOp::LtEq, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        binary(self, BinaryOp::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        binary(self, BinaryOp::Or, other)
    }

    pub fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            expr: Box::new(self),
        }
    }

    pub fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn like(self, pattern: &str) -> Expr {
        Expr::Like {
            expr: Box::new(self),
            pattern: Box::new(lit(pattern)),
            negated: false,
        }
    }

    pub fn between(self, low: Expr, high: Expr) -> Expr {
        Expr::Between {
            expr: Box::new(self),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    pub fn in_list(self, list: Vec<Expr>) -> Expr {
        Expr::InList {
            expr: Box::new(self),
            list,
            negated: false,
        }
    }
}

/// `OVER (PARTITION BY ... ORDER BY ...)` clause of the window helpers.
/// Order entries are `(column, descending)`.
#[derive(Debug, Clone, Default)]
pub struct Over<'a> {
    pub partition_by: &'a [&'a str],
    pub order_by: &'a [(&'a str, bool)],
}

impl Over<'_> {
    fn apply(&self, function: FunctionCall) -> Expr {
        Expr::Window(Box::new(WindowFunction {
            function,
            partition_by: self.partition_by.iter().map(|c| col(c)).collect(),
            order_by: self
                .order_by
                .iter()
                .map(|(c, descending)| OrderByExpr {
                    expr: col(c),
                    descending: *descending,
                })
                .collect(),
        }))
    }
}

/// Builds a [Select] step by step.
///
/// Every method consumes and returns the builder. A source must be given
/// with [QueryBuilder::from] before [QueryBuilder::build].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    distinct: bool,
    projection: Vec<SelectItem>,
    from: Option<TableRef>,
    joins: Vec<Join>,
    selection: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderByExpr>,
    limit: Option<u64>,
    offset: Option<u64>,
    set_ops: Vec<(SetOperator, QueryBuilder)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Projection ---

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.projection.extend(columns.iter().map(|c| SelectItem::Expr {
            expr: col(c),
            alias: None,
        }));
        self
    }

    pub fn select_all(mut self) -> Self {
        self.projection.push(SelectItem::Wildcard);
        self
    }

    pub fn select_as(self, column: &str, alias: &str) -> Self {
        self.select_expr(col(column), Some(alias))
    }

    pub fn select_expr(mut self, expr: Expr, alias: Option<&str>) -> Self {
        self.projection.push(SelectItem::Expr {
            expr,
            alias: alias.map(str::to_string),
        });
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // --- Sources ---

    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(named(table, None));
        self
    }

    pub fn from_as(mut self, table: &str, alias: &str) -> Self {
        self.from = Some(named(table, Some(alias)));
        self
    }

    pub fn inner_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.join(JoinKind::Inner, table, left_col, right_col)
    }

    pub fn left_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.join(JoinKind::Left, table, left_col, right_col)
    }

    pub fn right_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.join(JoinKind::Right, table, left_col, right_col)
    }

    pub fn full_join(self, table: &str, left_col: &str, right_col: &str) -> Self {
        self.join(JoinKind::Full, table, left_col, right_col)
    }

    fn join(mut self, kind: JoinKind, table: &str, left_col: &str, right_col: &str) -> Self {
        self.joins.push(Join {
            kind,
            table: named(table, None),
            on: Some(col(left_col).eq(col(right_col))),
        });
        self
    }

    // --- Filtering ---

    /// ANDs `predicate` onto the `WHERE` clause.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.selection = Some(match self.selection.take() {
            Some(current) => current.and(predicate),
            None => predicate,
        });
        self
    }

    /// ORs `predicate` onto the `WHERE` clause.
    pub fn or_filter(mut self, predicate: Expr) -> Self {
        self.selection = Some(match self.selection.take() {
            Some(current) => current.or(predicate),
            None => predicate,
        });
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(col(column).eq(lit(value)))
    }

    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(col(column).gt(lit(value)))
    }

    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(col(column).lt(lit(value)))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.filter(col(column).like(pattern))
    }

    pub fn where_between(
        self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.filter(col(column).between(lit(low), lit(high)))
    }

    pub fn where_in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let list = values.into_iter().map(lit).collect();
        self.filter(col(column).in_list(list))
    }

    pub fn where_in_subquery(self, column: &str, subquery: Select) -> Self {
        self.filter(Expr::InSubquery {
            expr: Box::new(col(column)),
            subquery: Box::new(subquery),
            negated: false,
        })
    }

    // --- Grouping and ordering ---

    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by.extend(columns.iter().map(|c| col(c)));
        self
    }

    pub fn having(mut self, predicate: Expr) -> Self {
        self.having = Some(match self.having.take() {
            Some(current) => current.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order_by.push(OrderByExpr {
            expr: col(column),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    // --- Aggregates; `None` counts rows ---

    pub fn count(self, column: Option<&str>, alias: Option<&str>) -> Self {
        let arg = column.map_or(Expr::Wildcard, col);
        self.select_expr(call("COUNT", vec![arg]), alias)
    }

    pub fn sum(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("SUM", vec![col(column)]), alias)
    }

    pub fn avg(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("AVG", vec![col(column)]), alias)
    }

    pub fn min(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("MIN", vec![col(column)]), alias)
    }

    pub fn max(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("MAX", vec![col(column)]), alias)
    }

    // --- Window functions ---

    pub fn window_sum(self, column: &str, over: Over<'_>, alias: Option<&str>) -> Self {
        let function = plain_call("SUM", vec![col(column)]);
        self.select_expr(over.apply(function), alias)
    }

    pub fn row_number(self, over: Over<'_>, alias: Option<&str>) -> Self {
        self.select_expr(over.apply(plain_call("ROW_NUMBER", Vec::new())), alias)
    }

    pub fn rank(self, over: Over<'_>, alias: Option<&str>) -> Self {
        self.select_expr(over.apply(plain_call("RANK", Vec::new())), alias)
    }

    pub fn dense_rank(self, over: Over<'_>, alias: Option<&str>) -> Self {
        self.select_expr(over.apply(plain_call("DENSE_RANK", Vec::new())), alias)
    }

    pub fn lag(self, column: &str, offset: i64, over: Over<'_>, alias: Option<&str>) -> Self {
        let function = plain_call("LAG", vec![col(column), lit(offset)]);
        self.select_expr(over.apply(function), alias)
    }

    pub fn lead(self, column: &str, offset: i64, over: Over<'_>, alias: Option<&str>) -> Self {
        let function = plain_call("LEAD", vec![col(column), lit(offset)]);
        self.select_expr(over.apply(function), alias)
    }

    // --- Other expressions ---

    /// Searched `CASE WHEN cond THEN result ... [ELSE default] END`.
    pub fn case_when(
        self,
        branches: Vec<(Expr, Expr)>,
        else_result: Option<Expr>,
        alias: Option<&str>,
    ) -> Self {
        let case = Expr::Case(CaseExpr {
            operand: None,
            branches,
            else_result: else_result.map(Box::new),
        });
        self.select_expr(case, alias)
    }

    pub fn year(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("YEAR", vec![col(column)]), alias)
    }

    pub fn month(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("MONTH", vec![col(column)]), alias)
    }

    pub fn day(self, column: &str, alias: Option<&str>) -> Self {
        self.select_expr(call("DAY", vec![col(column)]), alias)
    }

    pub fn current_date(self, alias: Option<&str>) -> Self {
        self.select_expr(call("CURRENT_DATE", Vec::new()), alias)
    }

    pub fn function(self, name: &str, args: Vec<Expr>, alias: Option<&str>) -> Self {
        self.select_expr(call(name, args), alias)
    }

    // --- Set operations ---

    pub fn union(self, other: QueryBuilder) -> Self {
        self.set_op(SetOperator::Union, other)
    }

    pub fn union_all(self, other: QueryBuilder) -> Self {
        self.set_op(SetOperator::UnionAll, other)
    }

    pub fn intersect(self, other: QueryBuilder) -> Self {
        self.set_op(SetOperator::Intersect, other)
    }

    pub fn except(self, other: QueryBuilder) -> Self {
        self.set_op(SetOperator::Except, other)
    }

    fn set_op(mut self, op: SetOperator, other: QueryBuilder) -> Self {
        self.set_ops.push((op, other));
        self
    }

    // --- Output ---

    /// Returns the assembled statement.
    ///
    /// # Errors
    /// Fails when this builder, or one joined by a set operation, has no
    /// source.
    pub fn build(self) -> Result<Select> {
        let from = self
            .from
            .ok_or_else(|| parse_err!("query builder has no FROM source"))?;
        let projection = if self.projection.is_empty() {
            vec![SelectItem::Wildcard]
        } else {
            self.projection
        };

        let mut select = Select {
            distinct: self.distinct,
            projection,
            from,
            joins: self.joins,
            selection: self.selection,
            group_by: self.group_by,
            having: self.having,
            order_by: self.order_by,
            limit: self.limit,
            offset: self.offset,
            set_ops: Vec::with_capacity(self.set_ops.len()),
        };

        for (op, other) in self.set_ops {
            let right = other.build()?;
            select.set_ops.push(SetOperation { op, right });
        }
        Ok(select)
    }

    /// SQL text of the built statement.
    pub fn to_sql(self) -> Result<String> {
        Ok(self.build()?.to_string())
    }

    pub fn execute(self, db: &Database) -> Result<Table> {
        let select = self.build()?;
        db.evaluate(&Statement::Select(Box::new(select)))
    }
}

/// A function call without upper-casing, for names that already are.
fn plain_call(name: &str, args: Vec<Expr>) -> FunctionCall {
    FunctionCall {
        name: name.to_string(),
        args,
        distinct: false,
    }
}

fn named(table: &str, alias: Option<&str>) -> TableRef {
    TableRef {
        source: TableSource::Named(table.to_string()),
        alias: alias.map(str::to_string),
    }
}
