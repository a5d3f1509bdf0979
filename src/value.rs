use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::data_type::DataType;
use crate::date::{self, DateFormat};

/// Represents a single scalar value flowing through the engine.
///
/// Every cell of every table and every expression result is a `Value`. It
/// holds at most one payload; [Value::Null] carries none. Boolean results are
/// represented as the integers `1` and `0`.
#[derive(Debug, Clone)]
pub enum Value {
    /// represents an empty or missing value.
    Null,
    /// A 64-bit signed integer value.
    Int(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning between
    /// intermediate tables.
    Text(Arc<str>),
    /// A validated calendar date.
    Date(NaiveDate),
}

impl Value {
    pub const TRUE: Value = Value::Int(1);
    pub const FALSE: Value = Value::Int(0);

    /// Returns `true` if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the inner integer value if this is a [Value::Int].
    /// Otherwise, returns `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the inner float value if this is a [Value::Float].
    /// Otherwise, returns `None`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns a reference to the inner string slice if this is a [Value::Text].
    /// Otherwise, returns `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Numeric view of the value: integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Date view of the value: dates as-is, text when it parses as a date.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) => date::parse_date(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Whether a predicate result keeps a row. Only non-zero numbers are
    /// true; `NULL`, zero, text and dates are not.
    pub fn is_true(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            _ => false,
        }
    }

    /// Returns the logical [DataType] corresponding to this value.
    ///
    /// Returns `None` if the value is [Value::Null], because a standalone
    /// NULL is untyped until it is placed in a column.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int(_) => Some(DataType::Int),
            Self::Float(_) => Some(DataType::Float),
            Self::Text(_) => Some(DataType::Text),
            Self::Date(_) => Some(DataType::Date),
        }
    }

    /// Whether `self` and `other` can meaningfully be ordered against each
    /// other: numbers with numbers, dates with dates or date-like text, and
    /// text with text. `NULL` is comparable with everything.
    pub fn comparable_with(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (Self::Text(_), Self::Text(_)) | (Self::Date(_), Self::Date(_)) => true,
            (Self::Date(_), Self::Text(s)) | (Self::Text(s), Self::Date(_)) => {
                date::parse_date(s).is_some()
            }
            _ => false,
        }
    }

    /// SQL comparison. Returns `None` when either side is `NULL`.
    ///
    /// Numbers compare numerically, dates in calendar order, and text
    /// byte-lexicographically unless both sides parse as dates. Text against
    /// a number compares numerically when the text is a number. Anything else
    /// falls back to comparing the display forms.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, _) | (_, Self::Null) => None,
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Some(a.as_f64()?.total_cmp(&b.as_f64()?))
            }
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => {
                match (date::parse_date(a), date::parse_date(b)) {
                    (Some(da), Some(db)) => Some(da.cmp(&db)),
                    _ => Some(a.as_bytes().cmp(b.as_bytes())),
                }
            }
            (Self::Date(a), Self::Text(s)) => match date::parse_date(s) {
                Some(b) => Some(a.cmp(&b)),
                None => Some(self.to_string().as_bytes().cmp(s.as_bytes())),
            },
            (Self::Text(s), Self::Date(b)) => match date::parse_date(s) {
                Some(a) => Some(a.cmp(b)),
                None => Some(s.as_bytes().cmp(other.to_string().as_bytes())),
            },
            (Self::Text(s), n) | (n, Self::Text(s)) if n.is_numeric() => {
                let ordering = match s.trim().parse::<f64>() {
                    Ok(parsed) => n.as_f64()?.total_cmp(&parsed),
                    Err(_) => n.to_string().as_bytes().cmp(s.as_bytes()),
                };
                // `n` is on the left in the computation above.
                Some(if matches!(self, Self::Text(_)) {
                    ordering.reverse()
                } else {
                    ordering
                })
            }
            _ => Some(self.to_string().cmp(&other.to_string())),
        }
    }

    /// Total order used for sorting: `NULL` first, then numbers, dates and
    /// text. Unlike [Value::sql_cmp] this never looks inside text, so it is
    /// safe to hand to a sort.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                x.total_cmp(&y)
            }
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

/// Identity equality, used for grouping, `DISTINCT` and set operations.
///
/// `NULL` equals `NULL` here, and an integer never equals a float. This is
/// not SQL `=`; see [Value::sql_cmp] for that.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Int(i) => i.hash(state),
            Self::Float(f) => {
                // 0.0 and -0.0 compare equal, and every NaN equals every NaN
                let bits = if *f == 0.0 {
                    0
                } else if f.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    f.to_bits()
                };
                bits.hash(state)
            }
            Self::Text(s) => s.hash(state),
            Self::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => f.write_str(&date::format_date(*d, DateFormat::Iso)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b { Value::TRUE } else { Value::FALSE }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Arc::from(s))
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    // ─────────────────────────────────────────────────────────────
    // Test 1 : is_null / accessors
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(1).is_null());
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::Float(1.5).as_int(), None);
        assert_eq!(Value::Int(2).as_f64(), Some(2.0));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from("2025-01-02").to_date(), date(2025, 1, 2).as_date());
        assert_eq!(Value::Int(20250102).to_date(), None);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : data_type
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_data_type() {
        assert_eq!(Value::Null.data_type(), None);
        assert_eq!(Value::Int(1).data_type(), Some(DataType::Int));
        assert_eq!(Value::Float(1.0).data_type(), Some(DataType::Float));
        assert_eq!(Value::from("x").data_type(), Some(DataType::Text));
        assert_eq!(date(2025, 1, 1).data_type(), Some(DataType::Date));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : SQL comparison
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_sql_cmp() {
        assert_eq!(Value::Int(1).sql_cmp(&Value::Null), None);
        assert_eq!(Value::Null.sql_cmp(&Value::Null), None);
        assert_eq!(Value::Int(1).sql_cmp(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(Value::Float(2.0).sql_cmp(&Value::Int(2)), Some(Ordering::Equal));
        assert_eq!(
            Value::from("Bob").sql_cmp(&Value::from("alice")),
            Some(Ordering::Less)
        );
        // both sides look like dates: calendar order, not byte order
        assert_eq!(
            Value::from("12/31/2024").sql_cmp(&Value::from("2025-01-01")),
            Some(Ordering::Less)
        );
        assert_eq!(
            date(2025, 3, 2).sql_cmp(&Value::from("2025-03-01")),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("10").sql_cmp(&Value::Int(9)), Some(Ordering::Greater));
        assert_eq!(Value::Int(9).sql_cmp(&Value::from("10")), Some(Ordering::Less));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : sort order
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_sort_cmp_nulls_first() {
        let mut values = vec![
            Value::from("b"),
            Value::Int(3),
            Value::Null,
            Value::Float(1.5),
            date(2025, 1, 1),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Float(1.5),
                Value::Int(3),
                date(2025, 1, 1),
                Value::from("b"),
            ]
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : identity equality and hashing
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_identity_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));

        let set: HashSet<Value> = [
            Value::Null,
            Value::Null,
            Value::Float(0.0),
            Value::Float(-0.0),
            Value::from("a"),
            Value::from("a"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 6 : display
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(30.0).to_string(), "30.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(date(2025, 3, 5).to_string(), "2025-03-05");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::TRUE.is_true());
        assert!(!Value::FALSE.is_true());
        assert!(!Value::Null.is_true());
        assert!(Value::Float(0.5).is_true());
        assert!(!Value::from("true").is_true());
        assert_eq!(Value::from(true), Value::Int(1));
    }

    #[test]
    fn test_comparable_with() {
        assert!(Value::Int(1).comparable_with(&Value::Float(2.0)));
        assert!(date(2025, 1, 1).comparable_with(&Value::from("2025-02-01")));
        assert!(!date(2025, 1, 1).comparable_with(&Value::from("soon")));
        assert!(!Value::Int(1).comparable_with(&Value::from("1")));
        assert!(Value::Null.comparable_with(&Value::from("x")));
    }
}
