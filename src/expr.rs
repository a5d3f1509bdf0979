//! Evaluation of a single expression against the row being processed.

use std::cmp::Ordering;

use crate::aggregate::AggregateFunction;
use crate::ast::{BinaryOp, CaseExpr, ColumnRef, Expr, FunctionCall, UnaryOp};
use crate::error::{Error, Result, eval_err};
use crate::functions::ScalarFunction;
use crate::table::Row;
use crate::value::Value;

/// Name and qualifier of one position of a combined row.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// The alias or table name the column came from, if any.
    pub qualifier: Option<String>,
    pub name: String,
}

/// Maps column references to positions in the rows being evaluated.
///
/// For a join the scope spans the columns of every joined source, in source
/// order. Lookups ignore case; an unqualified name resolves to its first
/// match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    bindings: Vec<Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope over the columns of a single source.
    pub fn for_source<'a>(
        qualifier: Option<&str>,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut scope = Self::new();
        scope.extend(qualifier, names);
        scope
    }

    pub fn extend<'a>(&mut self, qualifier: Option<&str>, names: impl IntoIterator<Item = &'a str>) {
        self.bindings.extend(names.into_iter().map(|name| Binding {
            qualifier: qualifier.map(str::to_string),
            name: name.to_string(),
        }));
    }

    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Positions bound to `qualifier`, for `t.*`.
    pub fn positions_of(&self, qualifier: &str) -> Vec<usize> {
        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                b.qualifier
                    .as_deref()
                    .is_some_and(|q| q.eq_ignore_ascii_case(qualifier))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Position of a column, or `None` when nothing matches.
    pub fn find(&self, column: &ColumnRef) -> Option<usize> {
        self.bindings.iter().position(|b| {
            b.name.eq_ignore_ascii_case(&column.name)
                && match &column.table {
                    Some(table) => b
                        .qualifier
                        .as_deref()
                        .is_some_and(|q| q.eq_ignore_ascii_case(table)),
                    None => true,
                }
        })
    }

    /// # Errors
    /// Returns [Error::ColumnNotFound] when nothing matches.
    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        self.find(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string()))
    }
}

/// What an expression is evaluated against.
///
/// `group` is set while computing one output row of an aggregate query:
/// aggregate calls fold over its rows, everything else reads `row`.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub scope: &'a Scope,
    pub row: &'a [Value],
    pub group: Option<&'a [Row]>,
}

impl<'a> EvalContext<'a> {
    pub fn new(scope: &'a Scope, row: &'a [Value]) -> Self {
        Self {
            scope,
            row,
            group: None,
        }
    }

    pub fn with_group(scope: &'a Scope, row: &'a [Value], group: &'a [Row]) -> Self {
        Self {
            scope,
            row,
            group: Some(group),
        }
    }
}

/// Evaluates `expr` to a value.
///
/// # Errors
/// Unknown columns and functions, aggregates outside of an aggregate
/// context, and unresolved subqueries or window calls are errors. Type
/// mismatches are not: they evaluate to `NULL`.
pub fn eval(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Column(column) => {
            let idx = ctx.scope.resolve(column)?;
            Ok(ctx.row.get(idx).cloned().unwrap_or(Value::Null))
        }
        Expr::Wildcard => Err(eval_err!("'*' is only allowed in COUNT(*)")),
        Expr::Unary { op, expr } => Ok(eval_unary(*op, eval(expr, ctx)?)),
        Expr::Binary { left, op, right } => match op {
            BinaryOp::And => eval_and(left, right, ctx),
            BinaryOp::Or => eval_or(left, right, ctx),
            _ => Ok(eval_binary(&eval(left, ctx)?, *op, &eval(right, ctx)?)),
        },
        Expr::IsNull { expr, negated } => {
            Ok(Value::from(eval(expr, ctx)?.is_null() != *negated))
        }
        Expr::Between {
            expr,
            low,
            high,
            negated,
        } => {
            let value = eval(expr, ctx)?;
            let low = eval(low, ctx)?;
            let high = eval(high, ctx)?;
            Ok(negate_if(between(&value, &low, &high), *negated))
        }
        Expr::Like {
            expr,
            pattern,
            negated,
        } => {
            let value = eval(expr, ctx)?;
            let pattern = eval(pattern, ctx)?;
            if value.is_null() || pattern.is_null() {
                return Ok(Value::Null);
            }
            let matched = like(&value.to_string(), &pattern.to_string());
            Ok(Value::from(matched != *negated))
        }
        Expr::InList {
            expr,
            list,
            negated,
        } => {
            let value = eval(expr, ctx)?;
            let candidates = list
                .iter()
                .map(|item| eval(item, ctx))
                .collect::<Result<Vec<_>>>()?;
            Ok(negate_if(in_list(&value, &candidates), *negated))
        }
        Expr::InSubquery { .. } => Err(eval_err!(
            "IN subquery must be materialized before evaluation"
        )),
        Expr::Function(call) => eval_function(call, ctx),
        Expr::Case(case) => eval_case(case, ctx),
        Expr::Window(window) => Err(eval_err!(
            "window function {} is not allowed here",
            window.function.name
        )),
    }
}

/// Evaluates a predicate: only a true value keeps the row.
pub fn eval_predicate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<bool> {
    Ok(eval(expr, ctx)?.is_true())
}

fn negate_if(value: Value, negated: bool) -> Value {
    if negated {
        eval_unary(UnaryOp::Not, value)
    } else {
        value
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Value {
    match (op, value) {
        (_, Value::Null) => Value::Null,
        (UnaryOp::Not, v) => Value::from(!v.is_true()),
        (UnaryOp::Minus, Value::Int(i)) => i.checked_neg().map_or(Value::Null, Value::Int),
        (UnaryOp::Minus, Value::Float(f)) => Value::Float(-f),
        (UnaryOp::Plus, v) if v.is_numeric() => v,
        _ => Value::Null,
    }
}

/// `false AND x` is false even when `x` is `NULL`.
fn eval_and(left: &Expr, right: &Expr, ctx: &EvalContext<'_>) -> Result<Value> {
    let left = eval(left, ctx)?;
    if !left.is_null() && !left.is_true() {
        return Ok(Value::FALSE);
    }
    let right = eval(right, ctx)?;
    Ok(match (left.is_null(), right.is_null()) {
        (_, false) if !right.is_true() => Value::FALSE,
        (false, false) => Value::TRUE,
        _ => Value::Null,
    })
}

/// `true OR x` is true even when `x` is `NULL`.
fn eval_or(left: &Expr, right: &Expr, ctx: &EvalContext<'_>) -> Result<Value> {
    let left = eval(left, ctx)?;
    if left.is_true() {
        return Ok(Value::TRUE);
    }
    let right = eval(right, ctx)?;
    Ok(if right.is_true() {
        Value::TRUE
    } else if left.is_null() || right.is_null() {
        Value::Null
    } else {
        Value::FALSE
    })
}

/// Arithmetic and comparison on two evaluated operands.
pub(crate) fn eval_binary(left: &Value, op: BinaryOp, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    let compare = |accept: fn(Ordering) -> bool| {
        left.sql_cmp(right)
            .map_or(Value::Null, |ordering| Value::from(accept(ordering)))
    };
    match op {
        BinaryOp::Eq => compare(Ordering::is_eq),
        BinaryOp::NotEq => compare(Ordering::is_ne),
        BinaryOp::Lt => compare(Ordering::is_lt),
        BinaryOp::LtEq => compare(Ordering::is_le),
        BinaryOp::Gt => compare(Ordering::is_gt),
        BinaryOp::GtEq => compare(Ordering::is_ge),
        BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => {
            arithmetic(left, op, right)
        }
        BinaryOp::And | BinaryOp::Or => {
            let (l, r) = (left.is_true(), right.is_true());
            Value::from(if op == BinaryOp::And { l && r } else { l || r })
        }
    }
}

/// Integer arithmetic stays integer unless it overflows; any float operand
/// makes the result a float. Division or modulo by zero is `NULL`.
fn arithmetic(left: &Value, op: BinaryOp, right: &Value) -> Value {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let checked = match op {
            BinaryOp::Plus => a.checked_add(b),
            BinaryOp::Minus => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            BinaryOp::Divide | BinaryOp::Modulo if b == 0 => return Value::Null,
            BinaryOp::Divide => a.checked_div(b),
            BinaryOp::Modulo => a.checked_rem(b),
            _ => None,
        };
        if let Some(result) = checked {
            return Value::Int(result);
        }
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Value::Null;
    };
    match op {
        BinaryOp::Plus => Value::Float(a + b),
        BinaryOp::Minus => Value::Float(a - b),
        BinaryOp::Multiply => Value::Float(a * b),
        BinaryOp::Divide | BinaryOp::Modulo if b == 0.0 => Value::Null,
        BinaryOp::Divide => Value::Float(a / b),
        BinaryOp::Modulo => Value::Float(a % b),
        _ => Value::Null,
    }
}

/// Inclusive on both bounds. Bounds that cannot be compared with the value
/// make the result `NULL`.
fn between(value: &Value, low: &Value, high: &Value) -> Value {
    if value.is_null() || low.is_null() || high.is_null() {
        return Value::Null;
    }
    if !value.comparable_with(low) || !value.comparable_with(high) {
        return Value::Null;
    }
    match (value.sql_cmp(low), value.sql_cmp(high)) {
        (Some(lo), Some(hi)) => Value::from(lo.is_ge() && hi.is_le()),
        _ => Value::Null,
    }
}

/// `x IN (...)`: true on a match, otherwise `NULL` if any candidate was
/// `NULL`, otherwise false.
pub(crate) fn in_list(value: &Value, candidates: &[Value]) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let mut saw_null = false;
    for candidate in candidates {
        match value.sql_cmp(candidate) {
            Some(Ordering::Equal) => return Value::TRUE,
            None => saw_null = true,
            Some(_) => {}
        }
    }
    if saw_null { Value::Null } else { Value::FALSE }
}

/// Case-sensitive `LIKE` where `%` matches any run of characters and `_`
/// exactly one.
pub fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    // position of the last '%' seen and the text position it resumed at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('_') => {
                t += 1;
                p += 1;
            }
            Some(c) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((star, resume)) => {
                    p = star + 1;
                    t = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

fn eval_function(call: &FunctionCall, ctx: &EvalContext<'_>) -> Result<Value> {
    if let Some(aggregate) = AggregateFunction::from_name(&call.name) {
        return eval_aggregate(aggregate, call, ctx);
    }
    let function = ScalarFunction::from_name(&call.name)
        .ok_or_else(|| eval_err!("unknown function {}", call.name))?;
    let args = call
        .args
        .iter()
        .map(|arg| eval(arg, ctx))
        .collect::<Result<Vec<_>>>()?;
    function.invoke(&call.name, &args)
}

fn eval_aggregate(
    aggregate: AggregateFunction,
    call: &FunctionCall,
    ctx: &EvalContext<'_>,
) -> Result<Value> {
    let Some(group) = ctx.group else {
        return Err(eval_err!(
            "aggregate {} is not allowed here",
            call.name
        ));
    };
    let [arg] = call.args.as_slice() else {
        return Err(eval_err!("{} expects exactly one argument", call.name));
    };
    if matches!(arg, Expr::Wildcard) && aggregate != AggregateFunction::Count {
        return Err(eval_err!("{}(*) is not supported", call.name));
    }

    let mut acc = aggregate.accumulator(call.distinct);
    for row in group {
        let value = match arg {
            Expr::Wildcard => Value::TRUE,
            arg => eval(arg, &EvalContext::new(ctx.scope, row))?,
        };
        acc.update(value);
    }
    Ok(acc.finish())
}

fn eval_case(case: &CaseExpr, ctx: &EvalContext<'_>) -> Result<Value> {
    let operand = match &case.operand {
        Some(operand) => Some(eval(operand, ctx)?),
        None => None,
    };
    for (when, then) in &case.branches {
        let when = eval(when, ctx)?;
        let hit = match &operand {
            Some(operand) => operand.sql_cmp(&when) == Some(Ordering::Equal),
            None => when.is_true(),
        };
        if hit {
            return eval(then, ctx);
        }
    }
    match &case.else_result {
        Some(e) => eval(e, ctx),
        None => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::tokenizer::Tokenizer;

    fn parse_expr(sql: &str) -> Expr {
        Parser::new(Tokenizer::new(sql).tokenize().unwrap())
            .parse_expr()
            .unwrap()
    }

    fn scope() -> Scope {
        Scope::for_source(Some("t"), ["a", "b", "name", "born"])
    }

    fn row() -> Vec<Value> {
        vec![
            Value::Int(7),
            Value::Null,
            Value::from("Alice"),
            Value::from("2024-05-01"),
        ]
    }

    fn eval_sql(sql: &str) -> Value {
        let scope = scope();
        let row = row();
        eval(&parse_expr(sql), &EvalContext::new(&scope, &row)).unwrap()
    }

    // ─────────────────────────────────────────────────────────────
    // Three-valued logic
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn test_null_comparisons() {
        assert_eq!(eval_sql("b = 1"), Value::Null);
        assert_eq!(eval_sql("b > 1"), Value::Null);
        assert_eq!(eval_sql("b < 1"), Value::Null);
        assert_eq!(eval_sql("b IS NULL"), Value::TRUE);
        assert_eq!(eval_sql("a IS NOT NULL"), Value::TRUE);
        assert_eq!(eval_sql("NOT (b = 1)"), Value::Null);
    }

    #[test]
    fn test_and_or_short_circuit() {
        assert_eq!(eval_sql("1 = 0 AND b = 1"), Value::FALSE);
        assert_eq!(eval_sql("b = 1 AND 1 = 0"), Value::FALSE);
        assert_eq!(eval_sql("b = 1 AND 1 = 1"), Value::Null);
        assert_eq!(eval_sql("1 = 1 OR b = 1"), Value::TRUE);
        assert_eq!(eval_sql("b = 1 OR 1 = 1"), Value::TRUE);
        assert_eq!(eval_sql("b = 1 OR 1 = 0"), Value::Null);
        assert_eq!(eval_sql("TRUE AND NOT FALSE"), Value::TRUE);
    }

    // ─────────────────────────────────────────────────────────────
    // Arithmetic
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_sql("a * 2 + 1"), Value::Int(15));
        assert_eq!(eval_sql("a / 2"), Value::Int(3));
        assert_eq!(eval_sql("a / 2.0"), Value::Float(3.5));
        assert_eq!(eval_sql("a % 4"), Value::Int(3));
        assert_eq!(eval_sql("a / 0"), Value::Null);
        assert_eq!(eval_sql("a / 0.0"), Value::Null);
        assert_eq!(eval_sql("a + b"), Value::Null);
        assert_eq!(eval_sql("-a"), Value::Int(-7));
        assert_eq!(eval_sql("name + 1"), Value::Null);
        assert_eq!(
            eval_sql("9223372036854775807 + 1"),
            Value::Float(9223372036854775808.0)
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Predicates
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn test_between_inclusive() {
        assert_eq!(eval_sql("a BETWEEN 7 AND 10"), Value::TRUE);
        assert_eq!(eval_sql("a BETWEEN 1 AND 7"), Value::TRUE);
        assert_eq!(eval_sql("a NOT BETWEEN 1 AND 6"), Value::TRUE);
        assert_eq!(eval_sql("a BETWEEN 'x' AND 'y'"), Value::Null);
        assert_eq!(
            eval_sql("born BETWEEN DATE '2024-01-01' AND DATE '2024-12-31'"),
            Value::TRUE
        );
        assert_eq!(eval_sql("name BETWEEN 'A' AND 'B'"), Value::TRUE);
    }

    #[test]
    fn test_like() {
        assert!(like("Alice", "A%"));
        assert!(like("Alice", "%ic%"));
        assert!(like("Alice", "_lice"));
        assert!(!like("Alice", "a%"));
        assert!(like("", "%"));
        assert!(!like("abc", "ab"));
        assert!(like("aXbXc", "%b%c"));
        assert!(like("mississippi", "%iss%ppi"));
        assert_eq!(eval_sql("name NOT LIKE 'B%'"), Value::TRUE);
        assert_eq!(eval_sql("b LIKE '%'"), Value::Null);
    }

    #[test]
    fn test_in_list() {
        assert_eq!(eval_sql("a IN (1, 7)"), Value::TRUE);
        assert_eq!(eval_sql("a IN (1, 2)"), Value::FALSE);
        assert_eq!(eval_sql("a IN (1, NULL)"), Value::Null);
        assert_eq!(eval_sql("a NOT IN (1, 2)"), Value::TRUE);
        assert_eq!(eval_sql("b IN (1)"), Value::Null);
    }

    #[test]
    fn test_case() {
        assert_eq!(
            eval_sql("CASE WHEN a > 5 THEN 'big' ELSE 'small' END"),
            Value::from("big")
        );
        assert_eq!(
            eval_sql("CASE a WHEN 1 THEN 'one' WHEN 7 THEN 'seven' END"),
            Value::from("seven")
        );
        assert_eq!(eval_sql("CASE WHEN b = 1 THEN 1 END"), Value::Null);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval_sql("UPPER(name)"), Value::from("ALICE"));
        assert_eq!(eval_sql("YEAR(born)"), Value::Int(2024));
        assert_eq!(eval_sql("COALESCE(b, a)"), Value::Int(7));
        let scope = scope();
        let row = row();
        let ctx = EvalContext::new(&scope, &row);
        assert!(eval(&parse_expr("NOPE(a)"), &ctx).is_err());
        assert!(eval(&parse_expr("SUM(a)"), &ctx).is_err());
    }

    // ─────────────────────────────────────────────────────────────
    // Column resolution and aggregates
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn test_column_resolution() {
        assert_eq!(eval_sql("T.NAME"), Value::from("Alice"));
        let scope = scope();
        let row = row();
        let ctx = EvalContext::new(&scope, &row);
        assert!(matches!(
            eval(&parse_expr("missing"), &ctx),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(
            eval(&parse_expr("u.a"), &ctx),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_aggregate_over_group() {
        let scope = Scope::for_source(None, ["v"]);
        let group: Vec<Row> = [10, 20, 30]
            .into_iter()
            .map(|v| vec![Value::Int(v)])
            .chain([vec![Value::Null]])
            .collect();
        let ctx = EvalContext::with_group(&scope, &group[0], &group);
        assert_eq!(eval(&parse_expr("COUNT(*)"), &ctx).unwrap(), Value::Int(4));
        assert_eq!(eval(&parse_expr("COUNT(v)"), &ctx).unwrap(), Value::Int(3));
        assert_eq!(
            eval(&parse_expr("SUM(v) / COUNT(v)"), &ctx).unwrap(),
            Value::Int(20)
        );
        assert_eq!(eval(&parse_expr("MAX(v) - v"), &ctx).unwrap(), Value::Int(20));
    }
}
