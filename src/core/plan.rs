//! Compiled, validated filter plans
//!
//! A [`FilterPlan`] is plain data: every field in it has already been checked
//! against an allow-list and every operator is one of [`Operator`]. Backends
//! translate it; nothing here touches storage.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A scalar operand taken from the document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value, or `None` for arrays and objects
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(
                n.as_i64()
                    .map(Scalar::Int)
                    .unwrap_or_else(|| Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            ),
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view, parsing text that holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Null | Scalar::Bool(_) => None,
        }
    }
}

/// Comparison operators accepted in `where` and `whereDate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "LIKE")]
    Like,
}

impl Operator {
    /// Parse an operator as written by a client
    ///
    /// `<>` is accepted as `!=`; `LIKE` is matched case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "=" => Some(Operator::Eq),
            "!=" | "<>" => Some(Operator::NotEq),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Lte),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Gte),
            op if op.eq_ignore_ascii_case("like") => Some(Operator::Like),
            _ => None,
        }
    }

    /// SQL spelling
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
        }
    }

    /// Whether `column <op> operand` holds for the given ordering
    ///
    /// Always false for `LIKE`, which is a pattern match, not an ordering.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Eq => ordering == Ordering::Equal,
            Operator::NotEq => ordering != Ordering::Equal,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Like => false,
        }
    }
}

/// `field <operator> value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    pub value: Scalar,
}

/// Right-hand side of a date predicate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOperand {
    /// A calendar day, compared with the column's date part
    Day(NaiveDate),
    /// A `LIKE` pattern matched against the column's `YYYY-MM-DD` text
    Pattern(String),
}

/// `date(field) <operator> value`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatePredicate {
    pub field: String,
    pub operator: Operator,
    pub value: DateOperand,
}

/// `field IS NULL` (`is_null`) or `field IS NOT NULL`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NullCheck {
    pub field: String,
    pub is_null: bool,
}

/// Inclusive `low <= field <= high`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeCheck {
    pub field: String,
    pub low: Scalar,
    pub high: Scalar,
}

/// A `whereBetween` bound that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRange {
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Read an `orderBy.order` value; missing or unrecognized means `DESC`
    pub fn from_order(order: Option<&str>) -> Self {
        match order {
            Some(o) if o.trim().eq_ignore_ascii_case("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Validated form of a [`FilterDocument`](crate::core::document::FilterDocument)
///
/// Categories combine with AND; only the entries of `ranges` combine with OR
/// among themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterPlan {
    /// `where` comparisons, in document order
    pub predicates: Vec<Predicate>,
    /// `whereDate` comparisons, in document order
    pub date_predicates: Vec<DatePredicate>,
    pub null_checks: Vec<NullCheck>,
    /// `whereBetween` ranges; a row matches if it falls in any of them
    pub ranges: Vec<RangeCheck>,
    pub sort: Vec<SortKey>,
    /// Malformed `whereBetween` bounds that were ignored
    pub skipped_ranges: Vec<MalformedRange>,
}

impl FilterPlan {
    /// Whether no row filtering beyond the base predicate applies
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
            && self.date_predicates.is_empty()
            && self.null_checks.is_empty()
            && self.ranges.is_empty()
    }
}

/// Read a date or timestamp string as a wall-clock timestamp
///
/// Accepts `YYYY-MM-DD` (midnight), `YYYY-MM-DD HH:MM[:SS[.f]]`, the same
/// with a `T` separator, and RFC 3339. Offsets are dropped, as when a string
/// is cast to a PostgreSQL `timestamp`.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        })
}

/// Read the calendar day out of a date or timestamp string
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    parse_timestamp(text).map(|dt| dt.date())
}
