//! Built-in scalar functions.
//!
//! Every function is total: an argument of the wrong type (or a value
//! outside the function's domain, like `SQRT(-1)`) yields `NULL` instead of
//! failing the query. Only calling a function with the wrong number of
//! arguments is an error.
//!
//! - String: `CONCAT`, `LOWER`, `UPPER`, `LENGTH`, `SUBSTRING`, `REPLACE`,
//!   `COALESCE`
//! - Numeric: `POWER`, `SQRT`, `CEIL`/`CEILING`, `FLOOR`, `ROUND`, `ABS`,
//!   `EXP`, `LN`/`LOG`, `MOD`
//! - Date: `DATE`, `CURRENT_DATE`, `YEAR`, `MONTH`, `DAY`, `DAYOFWEEK`,
//!   `DAYOFYEAR`, `DATE_ADD`, `DATE_SUB`, `DATE_DIFF`, `DATE_FORMAT`
//!
//! Date functions also accept text that parses as a date.

use chrono::Datelike;

use crate::date::{self, DateFormat, DateUnit};
use crate::error::{Result, eval_err};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFunction {
    Concat,
    Lower,
    Upper,
    Length,
    Substring,
    Replace,
    Coalesce,
    Power,
    Sqrt,
    Ceil,
    Floor,
    Round,
    Abs,
    Exp,
    Ln,
    Mod,
    Date,
    CurrentDate,
    Year,
    Month,
    Day,
    DayOfWeek,
    DayOfYear,
    DateAdd,
    DateSub,
    DateDiff,
    DateFormat,
}

impl ScalarFunction {
    /// Looks a function up by its upper-cased name.
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "CONCAT" => Self::Concat,
            "LOWER" => Self::Lower,
            "UPPER" => Self::Upper,
            "LENGTH" => Self::Length,
            "SUBSTRING" => Self::Substring,
            "REPLACE" => Self::Replace,
            "COALESCE" => Self::Coalesce,
            "POWER" => Self::Power,
            "SQRT" => Self::Sqrt,
            "CEIL" | "CEILING" => Self::Ceil,
            "FLOOR" => Self::Floor,
            "ROUND" => Self::Round,
            "ABS" => Self::Abs,
            "EXP" => Self::Exp,
            "LN" | "LOG" => Self::Ln,
            "MOD" => Self::Mod,
            "DATE" => Self::Date,
            "CURRENT_DATE" => Self::CurrentDate,
            "YEAR" => Self::Year,
            "MONTH" => Self::Month,
            "DAY" => Self::Day,
            "DAYOFWEEK" => Self::DayOfWeek,
            "DAYOFYEAR" => Self::DayOfYear,
            "DATE_ADD" => Self::DateAdd,
            "DATE_SUB" => Self::DateSub,
            "DATE_DIFF" => Self::DateDiff,
            "DATE_FORMAT" => Self::DateFormat,
            _ => return None,
        };
        Some(function)
    }

    /// Accepted argument counts, inclusive.
    fn arity(self) -> (usize, usize) {
        match self {
            Self::Concat | Self::Coalesce => (1, usize::MAX),
            Self::CurrentDate => (0, 0),
            Self::Substring => (2, 3),
            Self::Round => (1, 2),
            Self::Replace | Self::DateAdd | Self::DateSub | Self::DateDiff => (3, 3),
            Self::Power | Self::Mod | Self::DateFormat => (2, 2),
            _ => (1, 1),
        }
    }

    /// Applies the function to already evaluated arguments.
    ///
    /// # Errors
    /// Fails only when the number of arguments is out of range.
    pub fn invoke(self, name: &str, args: &[Value]) -> Result<Value> {
        let (min, max) = self.arity();
        if args.len() < min || args.len() > max {
            return Err(eval_err!(
                "{name} called with {} argument(s)",
                args.len()
            ));
        }
        Ok(self.apply(args).unwrap_or(Value::Null))
    }

    /// `None` stands for `NULL`.
    fn apply(self, args: &[Value]) -> Option<Value> {
        static NULL: Value = Value::Null;
        let arg = |i: usize| args.get(i).unwrap_or(&NULL);
        let value = match self {
            Self::Concat => Value::from(concat(args)),
            Self::Lower => Value::from(arg(0).as_str()?.to_lowercase()),
            Self::Upper => Value::from(arg(0).as_str()?.to_uppercase()),
            Self::Length => Value::Int(arg(0).as_str()?.chars().count() as i64),
            Self::Substring => {
                let length = match args.get(2) {
                    Some(v) => Some(v.as_int()?),
                    None => None,
                };
                Value::from(substring(arg(0).as_str()?, arg(1).as_int()?, length))
            }
            Self::Replace => {
                let (text, from, to) = (arg(0).as_str()?, arg(1).as_str()?, arg(2).as_str()?);
                if from.is_empty() {
                    Value::from(text)
                } else {
                    Value::from(text.replace(from, to))
                }
            }
            Self::Coalesce => args.iter().find(|v| !v.is_null())?.clone(),
            Self::Power => Value::Float(arg(0).as_f64()?.powf(arg(1).as_f64()?)),
            Self::Sqrt => {
                let x = arg(0).as_f64()?;
                if x < 0.0 {
                    return None;
                }
                Value::Float(x.sqrt())
            }
            Self::Ceil => match arg(0) {
                Value::Int(i) => Value::Int(*i),
                Value::Float(f) => Value::Float(f.ceil()),
                _ => return None,
            },
            Self::Floor => match arg(0) {
                Value::Int(i) => Value::Int(*i),
                Value::Float(f) => Value::Float(f.floor()),
                _ => return None,
            },
            Self::Round => {
                let decimals = match args.get(1) {
                    Some(v) => v.as_f64()? as i32,
                    None => 0,
                };
                round(arg(0).as_f64()?, decimals)
            }
            Self::Abs => match arg(0) {
                Value::Int(i) => Value::Int(i.checked_abs()?),
                Value::Float(f) => Value::Float(f.abs()),
                _ => return None,
            },
            Self::Exp => Value::Float(arg(0).as_f64()?.exp()),
            Self::Ln => {
                let x = arg(0).as_f64()?;
                if x <= 0.0 {
                    return None;
                }
                Value::Float(x.ln())
            }
            Self::Mod => match (arg(0), arg(1)) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a.checked_rem(*b)?),
                (a, b) => {
                    let divisor = b.as_f64()?;
                    if divisor == 0.0 {
                        return None;
                    }
                    Value::Float(a.as_f64()? % divisor)
                }
            },
            Self::Date => Value::Date(arg(0).to_date()?),
            Self::CurrentDate => Value::Date(date::today()),
            Self::Year => Value::Int(i64::from(arg(0).to_date()?.year())),
            Self::Month => Value::Int(i64::from(arg(0).to_date()?.month())),
            Self::Day => Value::Int(i64::from(arg(0).to_date()?.day())),
            Self::DayOfWeek => Value::Int(date::day_of_week(arg(0).to_date()?)),
            Self::DayOfYear => Value::Int(i64::from(arg(0).to_date()?.ordinal())),
            Self::DateAdd | Self::DateSub => {
                let amount = arg(1).as_int()?;
                let amount = if self == Self::DateSub {
                    amount.checked_neg()?
                } else {
                    amount
                };
                let unit = DateUnit::from_name(arg(2).as_str()?)?;
                Value::Date(date::add_interval(arg(0).to_date()?, amount, unit)?)
            }
            Self::DateDiff => {
                let unit = DateUnit::from_name(arg(2).as_str()?)?;
                Value::Int(date::diff(arg(0).to_date()?, arg(1).to_date()?, unit))
            }
            Self::DateFormat => {
                let format = DateFormat::from_name(arg(1).as_str()?).unwrap_or(DateFormat::Iso);
                Value::from(date::format_date(arg(0).to_date()?, format))
            }
        };
        Some(value)
    }
}

/// Joins the display forms of every non-null argument.
fn concat(args: &[Value]) -> String {
    args.iter()
        .filter(|v| !v.is_null())
        .map(Value::to_string)
        .collect()
}

/// 1-based, character-indexed substring. A start before the first character
/// is clamped to it; a negative length yields an empty string.
fn substring(text: &str, start: i64, length: Option<i64>) -> String {
    let skip = usize::try_from(start.saturating_sub(1)).unwrap_or(0);
    let chars = text.chars().skip(skip);
    match length {
        Some(length) => chars.take(usize::try_from(length).unwrap_or(0)).collect(),
        None => chars.collect(),
    }
}

/// Rounds half away from zero. Without decimals a whole result is an
/// integer.
fn round(x: f64, decimals: i32) -> Value {
    let multiplier = 10f64.powi(decimals);
    let rounded = (x * multiplier).round() / multiplier;
    if decimals == 0 && rounded.is_finite() && rounded.abs() < i64::MAX as f64 {
        Value::Int(rounded as i64)
    } else {
        Value::Float(rounded)
    }
}
