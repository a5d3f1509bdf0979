//! Evaluation of `SELECT` statements.
//!
//! One `SELECT` runs through a fixed pipeline: source scan, joins, `WHERE`,
//! grouping and aggregation (with `HAVING`) or window functions, `ORDER BY`,
//! `DISTINCT`, `OFFSET`/`LIMIT` and projection. A chain of set operators is
//! then folded left to right, each link evaluated as its own `SELECT`.
//!
//! Every stage materializes new rows; no row is shared between the source
//! tables and the result.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use bitvec::vec::BitVec;
use tracing::{debug, trace};

use crate::ast::{
    BinaryOp, ColumnRef, Expr, Join, JoinKind, OrderByExpr, Select, SelectItem, SetOperator,
    TableRef, TableSource,
};
use crate::column::{Column, unique_name};
use crate::data_type::DataType;
use crate::error::{Error, Result, eval_err};
use crate::expr::{Binding, EvalContext, Scope, eval, eval_predicate};
use crate::table::{Row, Table};
use crate::value::Value;
use crate::window;

/// Resolves the table names used in `FROM` and `JOIN` clauses.
pub trait SourceResolver {
    /// # Errors
    /// Returns [Error::TableNotFound] when `name` does not name a table.
    fn resolve_table(&self, name: &str) -> Result<Table>;
}

/// Evaluates `SELECT` trees against the tables of a [SourceResolver].
pub struct QueryEvaluator<'a> {
    sources: &'a dyn SourceResolver,
}

/// One column of the output, before evaluation.
#[derive(Debug, Clone)]
enum OutputExpr {
    /// Copy of an input position, from `*` or `t.*`.
    Position(usize),
    Expr(Expr),
}

#[derive(Debug, Clone)]
enum SortKey {
    /// Value of an output column, from an ordinal or an output alias.
    Output(usize),
    Expr(Expr),
}

struct Projection {
    columns: Vec<Column>,
    items: Vec<OutputExpr>,
    /// Explicit `AS` aliases and the expressions they name.
    aliases: Vec<(String, Expr)>,
}

/// A produced row together with its sort keys.
struct Produced {
    row: Row,
    keys: Vec<Value>,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(sources: &'a dyn SourceResolver) -> Self {
        Self { sources }
    }

    /// Evaluates `select` including its set-operator chain.
    ///
    /// # Errors
    /// Any evaluation failure aborts the whole query; there is no partial
    /// result.
    pub fn evaluate(&self, select: &Select) -> Result<Table> {
        let mut result = self.evaluate_single(select)?;
        for set_op in &select.set_ops {
            let right = self.evaluate(&set_op.right)?;
            result = apply_set_operator(set_op.op, result, right)?;
        }
        Ok(result)
    }

    /// Evaluates one `SELECT`, ignoring any set operator after it.
    fn evaluate_single(&self, select: &Select) -> Result<Table> {
        let select = self.materialize_subqueries(select)?;

        let (mut scope, mut rows) = self.scan(&select.from)?;
        trace!(rows = rows.len(), "scanned source");
        for join in &select.joins {
            (scope, rows) = self.join(scope, rows, join)?;
            trace!(rows = rows.len(), kind = ?join.kind, "joined source");
        }
        check_references(&select, &scope)?;

        if let Some(selection) = &select.selection {
            rows = filter_rows(rows, &scope, selection)?;
            trace!(rows = rows.len(), "filtered rows");
        }

        let is_aggregate = !select.group_by.is_empty()
            || select.having.is_some()
            || select.projection.iter().any(|item| match item {
                SelectItem::Expr { expr, .. } => expr.contains_aggregate(),
                _ => false,
            })
            || select.order_by.iter().any(|o| o.expr.contains_aggregate());
        let has_window = select.projection.iter().any(|item| match item {
            SelectItem::Expr { expr, .. } => expr.contains_window(),
            _ => false,
        }) || select.order_by.iter().any(|o| o.expr.contains_window());
        if is_aggregate && has_window {
            return Err(eval_err!(
                "window functions cannot be combined with GROUP BY or aggregates"
            ));
        }

        let (projection, order_by) = if has_window {
            self.apply_windows(&select, &mut scope, &mut rows)?
        } else {
            (
                build_projection(&select.projection, &scope)?,
                select.order_by.clone(),
            )
        };
        let sort_keys = order_by
            .iter()
            .map(|o| sort_key(&o.expr, &projection, &scope))
            .collect::<Result<Vec<_>>>()?;

        let produced = if is_aggregate {
            aggregate_rows(&select, &scope, &rows, &projection, &sort_keys)?
        } else {
            rows.iter()
                .map(|row| produce(&EvalContext::new(&scope, row), &projection, &sort_keys))
                .collect::<Result<Vec<_>>>()?
        };

        let rows = finish_rows(produced, &order_by, select.distinct, select.offset, select.limit);
        let mut table = Table {
            name: "result".to_string(),
            columns: projection.columns,
            rows,
        };
        table.infer_types();
        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "evaluated SELECT"
        );
        Ok(table)
    }

    // --- Sources and joins ---

    /// Loads a `FROM`/`JOIN` source and its qualifier: the alias, else the
    /// file stem of the table name.
    fn source(&self, table_ref: &TableRef) -> Result<(Option<String>, Table)> {
        match &table_ref.source {
            TableSource::Named(name) => {
                let table = self.sources.resolve_table(name)?;
                let qualifier = table_ref.alias.clone().or_else(|| {
                    Path::new(name)
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                });
                Ok((qualifier, table))
            }
            TableSource::Subquery(select) => {
                Ok((table_ref.alias.clone(), self.evaluate(select)?))
            }
        }
    }

    fn scan(&self, table_ref: &TableRef) -> Result<(Scope, Vec<Row>)> {
        let (qualifier, table) = self.source(table_ref)?;
        let scope = Scope::for_source(
            qualifier.as_deref(),
            table.columns.iter().map(|c| c.name.as_str()),
        );
        Ok((scope, table.rows))
    }

    /// Nested-loop join. Output is left-major; for RIGHT and FULL joins the
    /// unmatched right rows follow at the end.
    fn join(&self, left_scope: Scope, left_rows: Vec<Row>, join: &Join) -> Result<(Scope, Vec<Row>)> {
        let (qualifier, right) = self.source(&join.table)?;
        let left_width = left_scope.len();
        let right_width = right.column_count();

        let mut scope = left_scope;
        scope.extend(
            qualifier.as_deref(),
            right.columns.iter().map(|c| c.name.as_str()),
        );

        if let Some(on) = &join.on {
            check_columns(on, &scope, &[])?;
        }
        let equalities = join.on.as_ref().map(equality_pairs).unwrap_or_default();
        let mut matched_right: BitVec = BitVec::repeat(false, right.row_count());
        let mut output = Vec::new();

        for left_row in &left_rows {
            let mut matched_left = false;
            for (j, right_row) in right.rows.iter().enumerate() {
                let combined: Row = left_row.iter().chain(right_row).cloned().collect();
                let keep = match &join.on {
                    None => true,
                    Some(on) => {
                        let ctx = EvalContext::new(&scope, &combined);
                        check_join_types(&equalities, &ctx)?;
                        eval_predicate(on, &ctx)?
                    }
                };
                if keep {
                    matched_left = true;
                    matched_right.set(j, true);
                    output.push(combined);
                }
            }
            if !matched_left && matches!(join.kind, JoinKind::Left | JoinKind::Full) {
                let mut padded = left_row.clone();
                padded.resize(left_width + right_width, Value::Null);
                output.push(padded);
            }
        }

        if matches!(join.kind, JoinKind::Right | JoinKind::Full) {
            for (j, right_row) in right.rows.iter().enumerate() {
                if !matched_right[j] {
                    let mut padded = vec![Value::Null; left_width];
                    padded.extend(right_row.iter().cloned());
                    output.push(padded);
                }
            }
        }

        debug!(
            kind = ?join.kind,
            left = left_rows.len(),
            right = right.row_count(),
            rows = output.len(),
            "join produced rows"
        );
        Ok((scope, output))
    }

    // --- Subqueries ---

    /// Evaluates every `IN (SELECT ...)` once and replaces it with the list
    /// of values it produced.
    fn materialize_subqueries(&self, select: &Select) -> Result<Select> {
        let mut select = Select {
            set_ops: Vec::new(),
            ..select.clone()
        };
        let mut failure = None;
        let mut rewrite = |expr: &mut Expr| {
            expr.walk_mut(&mut |e| {
                if failure.is_some() || !matches!(e, Expr::InSubquery { .. }) {
                    return;
                }
                let Expr::InSubquery {
                    expr,
                    subquery,
                    negated,
                } = std::mem::replace(e, Expr::Wildcard)
                else {
                    return;
                };
                match self.subquery_values(&subquery) {
                    Ok(list) => {
                        *e = Expr::InList {
                            expr,
                            list,
                            negated,
                        }
                    }
                    Err(err) => failure = Some(err),
                }
            })
        };

        for item in &mut select.projection {
            if let SelectItem::Expr { expr, .. } = item {
                rewrite(expr);
            }
        }
        for join in &mut select.joins {
            if let Some(on) = &mut join.on {
                rewrite(on);
            }
        }
        if let Some(selection) = &mut select.selection {
            rewrite(selection);
        }
        select.group_by.iter_mut().for_each(&mut rewrite);
        if let Some(having) = &mut select.having {
            rewrite(having);
        }
        for order in &mut select.order_by {
            rewrite(&mut order.expr);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(select),
        }
    }

    fn subquery_values(&self, subquery: &Select) -> Result<Vec<Expr>> {
        let table = self.evaluate(subquery)?;
        if table.column_count() != 1 {
            return Err(eval_err!(
                "IN subquery must return exactly one column, got {}",
                table.column_count()
            ));
        }
        trace!(values = table.row_count(), "materialized IN subquery");
        Ok(table
            .rows
            .into_iter()
            .map(|mut row| Expr::Literal(row.swap_remove(0)))
            .collect())
    }

    // --- Window functions ---

    /// Computes every window function of the projection and `ORDER BY` as
    /// an extra input column, and rewrites both to read that column.
    fn apply_windows(
        &self,
        select: &Select,
        scope: &mut Scope,
        rows: &mut [Row],
    ) -> Result<(Projection, Vec<OrderByExpr>)> {
        let mut windows = Vec::new();
        let mut rewrite = |expr: &Expr| {
            let mut expr = expr.clone();
            expr.walk_mut(&mut |e| {
                if let Expr::Window(_) = e {
                    let name = format!("#window{}", windows.len());
                    let column = Expr::Column(ColumnRef { table: None, name });
                    if let Expr::Window(w) = std::mem::replace(e, column) {
                        windows.push(*w);
                    }
                }
            });
            expr
        };

        let items: Vec<SelectItem> = select
            .projection
            .iter()
            .map(|item| match item {
                SelectItem::Expr { expr, alias } => SelectItem::Expr {
                    expr: rewrite(expr),
                    // keep the name the user wrote
                    alias: Some(alias.clone().unwrap_or_else(|| output_name(expr))),
                },
                other => other.clone(),
            })
            .collect();
        let order_by: Vec<OrderByExpr> = select
            .order_by
            .iter()
            .map(|o| OrderByExpr {
                expr: rewrite(&o.expr),
                descending: o.descending,
            })
            .collect();

        // wildcards only cover the real input columns
        let mut projection = build_projection(&items, scope)?;
        projection
            .aliases
            .retain(|(alias, _)| select_has_alias(&select.projection, alias));

        for (n, window) in windows.iter().enumerate() {
            let values = window::evaluate(window, scope, rows)?;
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            scope.push(Binding {
                qualifier: None,
                name: format!("#window{n}"),
            });
        }
        trace!(windows = windows.len(), "computed window functions");
        Ok((projection, order_by))
    }
}

fn select_has_alias(items: &[SelectItem], alias: &str) -> bool {
    items.iter().any(|item| {
        matches!(item, SelectItem::Expr { alias: Some(a), .. } if a.eq_ignore_ascii_case(alias))
    })
}

/// Resolves every column the clauses of `select` name, so that unknown
/// columns fail even when no row reaches them. `GROUP BY`, `HAVING` and
/// `ORDER BY` may also name output aliases.
fn check_references(select: &Select, scope: &Scope) -> Result<()> {
    let aliases: Vec<&str> = select
        .projection
        .iter()
        .filter_map(|item| match item {
            SelectItem::Expr {
                alias: Some(alias), ..
            } => Some(alias.as_str()),
            _ => None,
        })
        .collect();

    for item in &select.projection {
        if let SelectItem::Expr { expr, .. } = item {
            check_columns(expr, scope, &[])?;
        }
    }
    if let Some(selection) = &select.selection {
        check_columns(selection, scope, &[])?;
    }
    for key in &select.group_by {
        check_columns(key, scope, &aliases)?;
    }
    if let Some(having) = &select.having {
        check_columns(having, scope, &aliases)?;
    }
    for order in &select.order_by {
        check_columns(&order.expr, scope, &aliases)?;
    }
    Ok(())
}

fn check_columns(expr: &Expr, scope: &Scope, aliases: &[&str]) -> Result<()> {
    let mut missing = None;
    expr.walk(&mut |e| {
        if let Expr::Column(column) = e
            && missing.is_none()
            && scope.find(column).is_none()
            && !(column.table.is_none()
                && aliases.iter().any(|a| a.eq_ignore_ascii_case(&column.name)))
        {
            missing = Some(column.to_string());
        }
    });
    match missing {
        Some(name) => Err(Error::ColumnNotFound(name)),
        None => Ok(()),
    }
}

fn filter_rows(rows: Vec<Row>, scope: &Scope, predicate: &Expr) -> Result<Vec<Row>> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if eval_predicate(predicate, &EvalContext::new(scope, &row))? {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// The `a = b` conjuncts of a join condition.
fn equality_pairs(on: &Expr) -> Vec<(Expr, Expr)> {
    match on {
        Expr::Binary {
            left,
            op: BinaryOp::Eq,
            right,
        } => vec![((**left).clone(), (**right).clone())],
        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => {
            let mut pairs = equality_pairs(left);
            pairs.extend(equality_pairs(right));
            pairs
        }
        _ => Vec::new(),
    }
}

/// Both sides of a join equality must hold comparable values.
fn check_join_types(equalities: &[(Expr, Expr)], ctx: &EvalContext<'_>) -> Result<()> {
    for (left, right) in equalities {
        let (l, r) = (eval(left, ctx)?, eval(right, ctx)?);
        if !l.comparable_with(&r) {
            return Err(Error::JoinTypeMismatch(format!(
                "{left} = {right} compares {} with {}",
                type_name(&l),
                type_name(&r)
            )));
        }
    }
    Ok(())
}

fn type_name(value: &Value) -> String {
    value
        .data_type()
        .map_or_else(|| "NULL".to_string(), |t| t.to_string())
}

// --- Projection ---

/// Name of an unaliased output column.
fn output_name(expr: &Expr) -> String {
    match expr {
        Expr::Column(column) => column.name.clone(),
        other => other.to_string(),
    }
}

fn build_projection(items: &[SelectItem], scope: &Scope) -> Result<Projection> {
    let mut projection = Projection {
        columns: Vec::new(),
        items: Vec::new(),
        aliases: Vec::new(),
    };
    let push = |projection: &mut Projection, name: &str, item: OutputExpr| {
        let name = unique_name(&projection.columns, name);
        projection.columns.push(Column::new(name, DataType::Text));
        projection.items.push(item);
    };

    for item in items {
        match item {
            SelectItem::Wildcard => {
                for (i, binding) in scope.bindings().iter().enumerate() {
                    if !binding.name.starts_with('#') {
                        push(&mut projection, &binding.name, OutputExpr::Position(i));
                    }
                }
            }
            SelectItem::QualifiedWildcard(table) => {
                let positions = scope.positions_of(table);
                if positions.is_empty() {
                    return Err(Error::TableNotFound(table.clone()));
                }
                for i in positions {
                    let name = scope.bindings()[i].name.clone();
                    push(&mut projection, &name, OutputExpr::Position(i));
                }
            }
            SelectItem::Expr { expr, alias } => {
                let name = alias.clone().unwrap_or_else(|| output_name(expr));
                if let Some(alias) = alias {
                    projection.aliases.push((alias.clone(), expr.clone()));
                }
                push(&mut projection, &name, OutputExpr::Expr(expr.clone()));
            }
        }
    }
    Ok(projection)
}

/// Replaces unqualified column references that do not resolve in `scope`
/// but name an output alias with the aliased expression.
fn substitute_aliases(expr: &Expr, scope: &Scope, aliases: &[(String, Expr)]) -> Expr {
    let mut expr = expr.clone();
    expr.walk_mut(&mut |e| {
        let Expr::Column(column) = e else {
            return;
        };
        if column.table.is_some() || scope.find(column).is_some() {
            return;
        }
        if let Some((_, aliased)) = aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(&column.name))
        {
            *e = aliased.clone();
        }
    });
    expr
}

/// `ORDER BY` keys prefer output aliases and accept 1-based ordinals.
fn sort_key(expr: &Expr, projection: &Projection, scope: &Scope) -> Result<SortKey> {
    match expr {
        Expr::Literal(Value::Int(n)) => {
            let position = usize::try_from(*n).ok().filter(|p| (1..=projection.items.len()).contains(p));
            match position {
                Some(p) => Ok(SortKey::Output(p - 1)),
                None => Err(eval_err!("ORDER BY position {n} is out of range")),
            }
        }
        Expr::Column(ColumnRef { table: None, name }) => {
            let alias = projection
                .aliases
                .iter()
                .position(|(alias, _)| alias.eq_ignore_ascii_case(name));
            match alias {
                Some(_) => {
                    let idx = projection
                        .columns
                        .iter()
                        .zip(&projection.items)
                        .position(|(column, _)| column.matches(name))
                        .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
                    Ok(SortKey::Output(idx))
                }
                None => Ok(SortKey::Expr(expr.clone())),
            }
        }
        other => Ok(SortKey::Expr(substitute_aliases(
            other,
            scope,
            &projection.aliases,
        ))),
    }
}

/// Evaluates the output row and the sort keys for one context.
fn produce(ctx: &EvalContext<'_>, projection: &Projection, sort_keys: &[SortKey]) -> Result<Produced> {
    let row = projection
        .items
        .iter()
        .map(|item| match item {
            OutputExpr::Position(i) => Ok(ctx.row.get(*i).cloned().unwrap_or(Value::Null)),
            OutputExpr::Expr(expr) => eval(expr, ctx),
        })
        .collect::<Result<Row>>()?;
    let keys = sort_keys
        .iter()
        .map(|key| match key {
            SortKey::Output(i) => Ok(row[*i].clone()),
            SortKey::Expr(expr) => eval(expr, ctx),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Produced { row, keys })
}

// --- Grouping ---

/// Groups `rows` by the `GROUP BY` key (one implicit group when there is
/// none), applies `HAVING` and produces one row per surviving group.
fn aggregate_rows(
    select: &Select,
    scope: &Scope,
    rows: &[Row],
    projection: &Projection,
    sort_keys: &[SortKey],
) -> Result<Vec<Produced>> {
    let groups: Vec<Vec<Row>> = if select.group_by.is_empty() {
        vec![rows.to_vec()]
    } else {
        let keys: Vec<Expr> = select
            .group_by
            .iter()
            .map(|e| substitute_aliases(e, scope, &projection.aliases))
            .collect();
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<Vec<Row>> = Vec::new();
        for row in rows {
            let ctx = EvalContext::new(scope, row);
            let key = keys
                .iter()
                .map(|e| eval(e, &ctx))
                .collect::<Result<Vec<_>>>()?;
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(row.clone());
        }
        groups
    };
    trace!(groups = groups.len(), "grouped rows");

    let having = select
        .having
        .as_ref()
        .map(|h| substitute_aliases(h, scope, &projection.aliases));
    let null_row = vec![Value::Null; scope.len()];

    let mut produced = Vec::with_capacity(groups.len());
    for group in &groups {
        let representative = group.first().unwrap_or(&null_row);
        let ctx = EvalContext::with_group(scope, representative, group);
        if let Some(having) = &having
            && !eval_predicate(having, &ctx)?
        {
            continue;
        }
        produced.push(produce(&ctx, projection, sort_keys)?);
    }
    Ok(produced)
}

// --- Ordering, DISTINCT, OFFSET/LIMIT ---

fn finish_rows(
    mut produced: Vec<Produced>,
    order_by: &[OrderByExpr],
    distinct: bool,
    offset: Option<u64>,
    limit: Option<u64>,
) -> Vec<Row> {
    if !order_by.is_empty() {
        produced.sort_by(|a, b| window::compare_keys(&a.keys, &b.keys, order_by));
    }

    let mut rows: Vec<Row> = produced.into_iter().map(|p| p.row).collect();
    if distinct {
        rows = dedup(rows);
    }

    let offset = offset.map_or(0, |o| usize::try_from(o).unwrap_or(usize::MAX));
    let limit = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
    rows.into_iter().skip(offset).take(limit).collect()
}

/// Removes repeated rows, keeping the first occurrence.
fn dedup(rows: Vec<Row>) -> Vec<Row> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

// --- Set operations ---

fn apply_set_operator(op: SetOperator, left: Table, right: Table) -> Result<Table> {
    if left.column_count() != right.column_count() {
        return Err(eval_err!(
            "set operation operands have {} and {} columns",
            left.column_count(),
            right.column_count()
        ));
    }
    let Table {
        name,
        columns,
        rows: left_rows,
    } = left;

    let rows = match op {
        SetOperator::UnionAll => left_rows.into_iter().chain(right.rows).collect(),
        SetOperator::Union => dedup(left_rows.into_iter().chain(right.rows).collect()),
        SetOperator::Intersect => {
            let right: HashSet<Row> = right.rows.into_iter().collect();
            dedup(left_rows.into_iter().filter(|r| right.contains(r)).collect())
        }
        SetOperator::Except => {
            let right: HashSet<Row> = right.rows.into_iter().collect();
            dedup(left_rows.into_iter().filter(|r| !right.contains(r)).collect())
        }
    };
    trace!(?op, rows = rows.len(), "applied set operator");

    let mut table = Table {
        name,
        columns,
        rows,
    };
    table.infer_types();
    Ok(table)
}
