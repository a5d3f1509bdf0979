//! Aggregate functions and their accumulators.
//!
//! An [Accumulator] is fed one evaluated argument per input row and can be
//! read at any point, which is what running window aggregates need. `NULL`
//! inputs are skipped; `COUNT(*)` is fed a non-null marker for every row.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// Population standard deviation.
    Stddev,
    Median,
}

impl AggregateFunction {
    /// Looks an aggregate up by its upper-cased name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "AVG" => Some(Self::Avg),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "STDDEV" => Some(Self::Stddev),
            "MEDIAN" => Some(Self::Median),
            _ => None,
        }
    }

    pub fn accumulator(self, distinct: bool) -> Accumulator {
        Accumulator {
            function: self,
            seen: distinct.then(HashSet::new),
            count: 0,
            int_sum: Some(0),
            float_sum: 0.0,
            has_float: false,
            numeric: 0,
            numbers: Vec::new(),
            best: None,
        }
    }

    /// Aggregates a whole input at once.
    pub fn compute(self, values: impl IntoIterator<Item = Value>, distinct: bool) -> Value {
        let mut acc = self.accumulator(distinct);
        for value in values {
            acc.update(value);
        }
        acc.finish()
    }
}

/// Incremental state of one aggregate call.
#[derive(Debug, Clone)]
pub struct Accumulator {
    function: AggregateFunction,
    /// Values already fed, for `DISTINCT` aggregates.
    seen: Option<HashSet<Value>>,
    count: i64,
    /// `None` once the integer sum overflowed.
    int_sum: Option<i64>,
    float_sum: f64,
    has_float: bool,
    /// Number of numeric inputs.
    numeric: usize,
    /// Numeric inputs in ascending order, kept only for STDDEV and MEDIAN.
    numbers: Vec<f64>,
    best: Option<Value>,
}

impl Accumulator {
    pub fn update(&mut self, value: Value) {
        if value.is_null() {
            return;
        }
        if let Some(seen) = &mut self.seen
            && !seen.insert(value.clone())
        {
            return;
        }
        self.count += 1;

        match self.function {
            AggregateFunction::Count => {}
            AggregateFunction::Min | AggregateFunction::Max => {
                let wanted = if self.function == AggregateFunction::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let replace = self
                    .best
                    .as_ref()
                    .is_none_or(|best| value.sort_cmp(best) == wanted);
                if replace {
                    self.best = Some(value);
                }
            }
            AggregateFunction::Sum
            | AggregateFunction::Avg
            | AggregateFunction::Stddev
            | AggregateFunction::Median => {
                let number = match value {
                    Value::Int(i) => {
                        self.int_sum = self.int_sum.and_then(|s| s.checked_add(i));
                        i as f64
                    }
                    Value::Float(f) => {
                        self.has_float = true;
                        f
                    }
                    // non-numeric inputs do not contribute
                    _ => return,
                };
                self.float_sum += number;
                self.numeric += 1;
                if matches!(
                    self.function,
                    AggregateFunction::Stddev | AggregateFunction::Median
                ) {
                    let at = self.numbers.partition_point(|x| x.total_cmp(&number).is_le());
                    self.numbers.insert(at, number);
                }
            }
        }
    }

    /// Current result over everything fed so far.
    pub fn finish(&self) -> Value {
        let n = self.numeric;
        match self.function {
            AggregateFunction::Count => Value::Int(self.count),
            AggregateFunction::Min | AggregateFunction::Max => {
                self.best.clone().unwrap_or(Value::Null)
            }
            AggregateFunction::Sum if n == 0 => Value::Null,
            AggregateFunction::Sum => match self.int_sum {
                Some(sum) if !self.has_float => Value::Int(sum),
                _ => Value::Float(self.float_sum),
            },
            AggregateFunction::Avg if n == 0 => Value::Null,
            AggregateFunction::Avg => Value::Float(self.float_sum / n as f64),
            AggregateFunction::Stddev => {
                population_stddev(&self.numbers).map_or(Value::Null, Value::Float)
            }
            AggregateFunction::Median => median(&self.numbers).map_or(Value::Null, Value::Float),
        }
    }
}

/// Square root of the mean squared deviation from the mean.
fn population_stddev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Middle value of sorted input, or the mean of the two middle values for
/// even counts.
fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::Int(*v)).collect()
    }

    #[test]
    fn test_stddev() {
        let Value::Float(sd) =
            AggregateFunction::Stddev.compute(ints(&[10, 20, 30, 40, 50]), false)
        else {
            panic!("Expected a float");
        };
        assert!((sd - 14.142135).abs() < 0.001);
        assert_eq!(
            AggregateFunction::Stddev.compute(ints(&[42]), false),
            Value::Float(0.0)
        );
        assert_eq!(AggregateFunction::Stddev.compute(vec![], false), Value::Null);
    }

    #[test]
    fn test_median() {
        assert_eq!(
            AggregateFunction::Median.compute(ints(&[50, 10, 40, 30, 20]), false),
            Value::Float(30.0)
        );
        assert_eq!(
            AggregateFunction::Median.compute(ints(&[10, 20, 30, 40]), false),
            Value::Float(25.0)
        );
    }

    #[test]
    fn test_sum_and_avg() {
        let values = vec![Value::Int(1), Value::Null, Value::Int(2)];
        assert_eq!(AggregateFunction::Sum.compute(values.clone(), false), Value::Int(3));
        assert_eq!(AggregateFunction::Avg.compute(values, false), Value::Float(1.5));
        assert_eq!(
            AggregateFunction::Sum.compute(vec![Value::Int(1), Value::Float(0.5)], false),
            Value::Float(1.5)
        );
        assert_eq!(AggregateFunction::Sum.compute(vec![Value::Null], false), Value::Null);
        assert_eq!(
            AggregateFunction::Sum.compute(ints(&[i64::MAX, 1]), false),
            Value::Float(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn test_count_ignores_nulls_and_distinct() {
        let values = vec![
            Value::from("a"),
            Value::Null,
            Value::from("b"),
            Value::from("a"),
        ];
        assert_eq!(AggregateFunction::Count.compute(values.clone(), false), Value::Int(3));
        assert_eq!(AggregateFunction::Count.compute(values, true), Value::Int(2));
        assert_eq!(AggregateFunction::Count.compute(vec![], false), Value::Int(0));
    }

    #[test]
    fn test_min_max() {
        let values = vec![Value::from("pear"), Value::Null, Value::from("apple")];
        assert_eq!(
            AggregateFunction::Min.compute(values.clone(), false),
            Value::from("apple")
        );
        assert_eq!(AggregateFunction::Max.compute(values, false), Value::from("pear"));
        assert_eq!(AggregateFunction::Max.compute(vec![Value::Null], false), Value::Null);
    }

    #[test]
    fn test_running_accumulator() {
        let mut acc = AggregateFunction::Sum.accumulator(false);
        let mut running = Vec::new();
        for v in ints(&[1, 2, 3]) {
            acc.update(v);
            running.push(acc.finish());
        }
        assert_eq!(running, ints(&[1, 3, 6]));
        assert!(acc.numbers.is_empty());
    }

    #[test]
    fn test_running_median() {
        let mut acc = AggregateFunction::Median.accumulator(false);
        let mut running = Vec::new();
        for v in ints(&[5, 1, 3, 2]) {
            acc.update(v);
            running.push(acc.finish());
        }
        assert_eq!(running, vec![
            Value::Float(5.0),
            Value::Float(3.0),
            Value::Float(3.0),
            Value::Float(2.5),
        ]);
        assert_eq!(acc.numbers, vec![1.0, 2.0, 3.0, 5.0]);
    }
}
