//! Window functions: one computed value per input row, rows are not
//! collapsed.
//!
//! Rows are split into partitions by the `PARTITION BY` key (one partition
//! when absent), each partition is stably sorted by its `ORDER BY` keys, and
//! the function is evaluated along that order.
//!
//! Aggregates (`SUM`, `COUNT`, `AVG`, `MIN`, `MAX`, ...) with an `ORDER BY`
//! are running values from the start of the partition through the current
//! row; without one they cover the whole partition.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::aggregate::AggregateFunction;
use crate::ast::{Expr, OrderByExpr, WindowFunction};
use crate::error::{Result, eval_err};
use crate::expr::{EvalContext, Scope, eval};
use crate::table::Row;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    RowNumber,
    Rank,
    DenseRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Offset {
    Lag,
    Lead,
}

/// Evaluates `window` over `rows` and returns one value per row, in the
/// order of `rows`.
///
/// # Errors
/// Fails on an unknown window function, a bad `LAG`/`LEAD` offset, or any
/// error raised while evaluating the argument and key expressions.
pub fn evaluate(window: &WindowFunction, scope: &Scope, rows: &[Row]) -> Result<Vec<Value>> {
    let mut output = vec![Value::Null; rows.len()];

    for mut partition in partitions(&window.partition_by, scope, rows)? {
        let keys = sort_partition(&mut partition, &window.order_by, scope, rows)?;
        compute_partition(window, scope, rows, &partition, &keys, &mut output)?;
    }
    Ok(output)
}

/// Row indices grouped by partition key, partitions in order of first
/// appearance.
fn partitions(partition_by: &[Expr], scope: &Scope, rows: &[Row]) -> Result<Vec<Vec<usize>>> {
    if partition_by.is_empty() {
        return Ok(vec![(0..rows.len()).collect()]);
    }
    let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let ctx = EvalContext::new(scope, row);
        let key = partition_by
            .iter()
            .map(|e| eval(e, &ctx))
            .collect::<Result<Vec<_>>>()?;
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    Ok(groups)
}

/// Stable-sorts the partition and returns each row's order keys, aligned
/// with the sorted partition.
fn sort_partition(
    partition: &mut Vec<usize>,
    order_by: &[OrderByExpr],
    scope: &Scope,
    rows: &[Row],
) -> Result<Vec<Vec<Value>>> {
    let mut keyed = partition
        .iter()
        .map(|&i| {
            let ctx = EvalContext::new(scope, &rows[i]);
            let key = order_by
                .iter()
                .map(|o| eval(&o.expr, &ctx))
                .collect::<Result<Vec<_>>>()?;
            Ok((i, key))
        })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by(|(_, a), (_, b)| compare_keys(a, b, order_by));
    let (sorted, keys): (Vec<usize>, Vec<Vec<Value>>) = keyed.into_iter().unzip();
    *partition = sorted;
    Ok(keys)
}

pub(crate) fn compare_keys(a: &[Value], b: &[Value], order_by: &[OrderByExpr]) -> Ordering {
    for ((x, y), order) in a.iter().zip(b).zip(order_by) {
        let ordering = x.sort_cmp(y);
        let ordering = if order.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compute_partition(
    window: &WindowFunction,
    scope: &Scope,
    rows: &[Row],
    partition: &[usize],
    keys: &[Vec<Value>],
    output: &mut [Value],
) -> Result<()> {
    let function = &window.function;
    let name = function.name.as_str();

    let ranking = match name {
        "ROW_NUMBER" => Some(Ranking::RowNumber),
        "RANK" => Some(Ranking::Rank),
        "DENSE_RANK" => Some(Ranking::DenseRank),
        _ => None,
    };
    if let Some(ranking) = ranking {
        let mut rank = 0i64;
        let mut dense = 0i64;
        for (pos, &row) in partition.iter().enumerate() {
            let peer = pos > 0 && compare_keys(&keys[pos - 1], &keys[pos], &window.order_by).is_eq();
            if !peer {
                rank = pos as i64 + 1;
                dense += 1;
            }
            output[row] = Value::Int(match ranking {
                Ranking::RowNumber => pos as i64 + 1,
                Ranking::Rank => rank,
                Ranking::DenseRank => dense,
            });
        }
        return Ok(());
    }

    let offset_kind = match name {
        "LAG" => Some(Offset::Lag),
        "LEAD" => Some(Offset::Lead),
        _ => None,
    };
    if let Some(kind) = offset_kind {
        return compute_offset(kind, window, scope, rows, partition, output);
    }

    let Some(aggregate) = AggregateFunction::from_name(name) else {
        return Err(eval_err!("{name} is not a window function"));
    };
    let [arg] = function.args.as_slice() else {
        return Err(eval_err!("{name} expects exactly one argument"));
    };
    let inputs = partition
        .iter()
        .map(|&i| match arg {
            Expr::Wildcard => Ok(Value::TRUE),
            arg => eval(arg, &EvalContext::new(scope, &rows[i])),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut acc = aggregate.accumulator(function.distinct);
    if window.order_by.is_empty() {
        inputs.into_iter().for_each(|v| acc.update(v));
        let total = acc.finish();
        for &row in partition {
            output[row] = total.clone();
        }
    } else {
        for (&row, value) in partition.iter().zip(inputs) {
            acc.update(value);
            output[row] = acc.finish();
        }
    }
    Ok(())
}

/// `LAG/LEAD(expr [, offset [, default]])`; out-of-range rows get the
/// default, `NULL` unless given.
fn compute_offset(
    kind: Offset,
    window: &WindowFunction,
    scope: &Scope,
    rows: &[Row],
    partition: &[usize],
    output: &mut [Value],
) -> Result<()> {
    let function = &window.function;
    let (value_expr, offset_expr, default_expr) = match function.args.as_slice() {
        [value] => (value, None, None),
        [value, offset] => (value, Some(offset), None),
        [value, offset, default] => (value, Some(offset), Some(default)),
        _ => {
            return Err(eval_err!(
                "{} expects one to three arguments",
                function.name
            ));
        }
    };

    for (pos, &row) in partition.iter().enumerate() {
        let ctx = EvalContext::new(scope, &rows[row]);
        let offset = match offset_expr {
            Some(e) => match eval(e, &ctx)? {
                Value::Int(n) if n >= 0 => n as usize,
                other => {
                    return Err(eval_err!(
                        "{} offset must be a non-negative integer, got {other}",
                        function.name
                    ));
                }
            },
            None => 1,
        };
        let target = match kind {
            Offset::Lag => pos.checked_sub(offset),
            Offset::Lead => pos.checked_add(offset).filter(|t| *t < partition.len()),
        };
        output[row] = match target {
            Some(t) => eval(value_expr, &EvalContext::new(scope, &rows[partition[t]]))?,
            None => match default_expr {
                Some(e) => eval(e, &ctx)?,
                None => Value::Null,
            },
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SelectItem, Statement};
    use crate::parser::parse;

    /// Parses the first projection item of `SELECT <sql> FROM t`.
    fn window(sql: &str) -> WindowFunction {
        let Statement::Select(select) = parse(&format!("SELECT {sql} FROM t")).unwrap() else {
            panic!("Expected Select");
        };
        match &select.projection[0] {
            SelectItem::Expr {
                expr: Expr::Window(w),
                ..
            } => (**w).clone(),
            other => panic!("Expected a window function, got {other:?}"),
        }
    }

    fn data() -> (Scope, Vec<Row>) {
        let scope = Scope::for_source(None, ["dept", "salary"]);
        let rows = [("a", 100), ("b", 50), ("a", 300), ("a", 300), ("b", 70), ("a", 200)]
            .into_iter()
            .map(|(d, s)| vec![Value::from(d), Value::Int(s)])
            .collect();
        (scope, rows)
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Int(*v)).collect()
    }

    #[test]
    fn test_row_number_has_no_ties() {
        let (scope, rows) = data();
        let w = window("ROW_NUMBER() OVER (ORDER BY salary DESC)");
        let out = evaluate(&w, &scope, &rows).unwrap();
        // 300, 300 keep input order
        assert_eq!(out, ints(&[4, 6, 1, 2, 5, 3]));
    }

    #[test]
    fn test_rank_vs_dense_rank() {
        let (scope, rows) = data();
        let rank = evaluate(&window("RANK() OVER (ORDER BY salary DESC)"), &scope, &rows).unwrap();
        assert_eq!(rank, ints(&[4, 6, 1, 1, 5, 3]));
        let dense =
            evaluate(&window("DENSE_RANK() OVER (ORDER BY salary DESC)"), &scope, &rows).unwrap();
        assert_eq!(dense, ints(&[3, 5, 1, 1, 4, 2]));
    }

    #[test]
    fn test_partitioned_rank() {
        let (scope, rows) = data();
        let w = window("RANK() OVER (PARTITION BY dept ORDER BY salary)");
        let out = evaluate(&w, &scope, &rows).unwrap();
        assert_eq!(out, ints(&[1, 1, 3, 3, 2, 2]));
    }

    #[test]
    fn test_lag_lead_edges() {
        let (scope, rows) = data();
        let lag = evaluate(
            &window("LAG(salary) OVER (PARTITION BY dept ORDER BY salary)"),
            &scope,
            &rows,
        )
        .unwrap();
        assert_eq!(
            lag,
            vec![
                Value::Null,
                Value::Null,
                Value::Int(200),
                Value::Int(300),
                Value::Int(50),
                Value::Int(100),
            ]
        );
        let lead = evaluate(
            &window("LEAD(salary, 2, -1) OVER (PARTITION BY dept ORDER BY salary)"),
            &scope,
            &rows,
        )
        .unwrap();
        assert_eq!(lead, ints(&[300, -1, -1, -1, -1, 300]));
    }

    #[test]
    fn test_running_and_whole_partition_sum() {
        let (scope, rows) = data();
        let running = evaluate(
            &window("SUM(salary) OVER (PARTITION BY dept ORDER BY salary)"),
            &scope,
            &rows,
        )
        .unwrap();
        assert_eq!(running, ints(&[100, 50, 600, 900, 120, 300]));

        let total = evaluate(&window("SUM(salary) OVER (PARTITION BY dept)"), &scope, &rows).unwrap();
        assert_eq!(total, ints(&[900, 120, 900, 900, 120, 900]));

        let count = evaluate(&window("COUNT(*) OVER (ORDER BY salary)"), &scope, &rows).unwrap();
        assert_eq!(count, ints(&[3, 1, 5, 6, 2, 4]));
    }

    #[test]
    fn test_unknown_window_function() {
        let (scope, rows) = data();
        assert!(evaluate(&window("UPPER(dept) OVER ()"), &scope, &rows).is_err());
    }
}
