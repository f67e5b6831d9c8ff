//! In-memory query backend for testing and development

use crate::core::error::StorageError;
use crate::core::executor::{QueryBackend, ResolvedQuery, Window};
use crate::core::plan::{
    DateOperand, DatePredicate, Operator, Predicate, RangeCheck, Scalar, SortDirection, SortKey,
    parse_day, parse_timestamp,
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const BACKEND: &str = "in-memory";

/// In-memory row store
///
/// Tables are vectors of JSON objects keyed by table name. Filters follow SQL
/// semantics: any comparison against a missing or null column is false.
/// `LIKE` is case-insensitive. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Value>>>>,
}

impl InMemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to `table`
    pub fn insert(&self, table: &str, row: Value) -> Result<(), StorageError> {
        self.insert_many(table, std::iter::once(row))
    }

    /// Append rows to `table`
    pub fn insert_many(
        &self,
        table: &str,
        rows: impl IntoIterator<Item = Value>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|e| unavailable(e.to_string()))?;
        tables.entry(table.to_string()).or_default().extend(rows);
        Ok(())
    }

    /// Remove every row of `table`
    pub fn clear(&self, table: &str) -> Result<(), StorageError> {
        let mut tables = self.tables.write().map_err(|e| unavailable(e.to_string()))?;
        tables.remove(table);
        Ok(())
    }

    /// Number of rows stored in `table`
    pub fn len(&self, table: &str) -> Result<usize, StorageError> {
        let tables = self.tables.read().map_err(|e| unavailable(e.to_string()))?;
        Ok(tables.get(table).map_or(0, Vec::len))
    }

    fn matching(&self, query: &ResolvedQuery<'_>) -> Result<Vec<Value>, StorageError> {
        let filter = RowFilter::new(query)?;
        let tables = self.tables.read().map_err(|e| unavailable(e.to_string()))?;

        Ok(tables
            .get(query.entity.table())
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl QueryBackend for InMemoryStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn count(&self, query: &ResolvedQuery<'_>) -> Result<u64, StorageError> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn fetch(
        &self,
        query: &ResolvedQuery<'_>,
        window: Window,
    ) -> Result<Vec<Value>, StorageError> {
        let mut rows = self.matching(query)?;
        rows.sort_by(|a, b| compare_rows(a, b, &query.sort));

        Ok(rows
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }
}

fn unavailable(message: String) -> StorageError {
    StorageError::Unavailable {
        backend: BACKEND.to_string(),
        message,
    }
}

/// A resolved query with its LIKE patterns compiled once
struct RowFilter<'q> {
    query: &'q ResolvedQuery<'q>,
    predicates: Vec<(&'q Predicate, Option<Regex>)>,
    date_predicates: Vec<(&'q DatePredicate, Option<Regex>)>,
}

impl<'q> RowFilter<'q> {
    fn new(query: &'q ResolvedQuery<'q>) -> Result<Self, StorageError> {
        let predicates = query
            .plan
            .predicates
            .iter()
            .map(|p| {
                let regex = match (&p.operator, &p.value) {
                    (Operator::Like, Scalar::Text(pattern)) => Some(like_regex(pattern)?),
                    _ => None,
                };
                Ok::<_, StorageError>((p, regex))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        let date_predicates = query
            .plan
            .date_predicates
            .iter()
            .map(|p| {
                let regex = match &p.value {
                    DateOperand::Pattern(pattern) => Some(like_regex(pattern)?),
                    DateOperand::Day(_) => None,
                };
                Ok::<_, StorageError>((p, regex))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(Self {
            query,
            predicates,
            date_predicates,
        })
    }

    fn matches(&self, row: &Value) -> bool {
        let plan = self.query.plan;

        if is_null(column(row, self.query.entity.primary_key())) {
            return false;
        }

        self.predicates
            .iter()
            .all(|(p, regex)| eval_predicate(row, p, regex.as_ref()))
            && self
                .date_predicates
                .iter()
                .all(|(p, regex)| eval_date_predicate(row, p, regex.as_ref()))
            && plan
                .null_checks
                .iter()
                .all(|check| is_null(column(row, &check.field)) == check.is_null)
            && (plan.ranges.is_empty() || plan.ranges.iter().any(|r| in_range(row, r)))
    }
}

fn column<'r>(row: &'r Value, field: &str) -> Option<&'r Value> {
    row.get(field)
}

fn is_null(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}

/// Translate a SQL LIKE pattern into an anchored, case-insensitive regex
fn like_regex(pattern: &str) -> Result<Regex, StorageError> {
    let mut source = String::from("(?is)^");
    for ch in pattern.chars() {
        match ch {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');

    Regex::new(&source).map_err(|e| StorageError::Query {
        backend: BACKEND.to_string(),
        message: format!("invalid LIKE pattern '{}': {}", pattern, e),
    })
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Order a column value against an operand, `None` when incomparable
///
/// Two strings that both read as timestamps compare as points in time, so
/// `2024-01-05T10:00:00` falls between `2024-01-05 00:00:00` and
/// `2024-01-05 23:59:59`.
fn compare_scalar(value: &Value, operand: &Scalar) -> Option<Ordering> {
    match (value, operand) {
        (Value::Null, _) | (_, Scalar::Null) => None,
        (Value::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        (Value::String(a), Scalar::Text(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.as_str().cmp(b.as_str())),
        },
        (Value::Number(a), _) => a.as_f64()?.partial_cmp(&operand.as_f64()?),
        (Value::String(a), Scalar::Int(_) | Scalar::Float(_)) => {
            a.trim().parse::<f64>().ok()?.partial_cmp(&operand.as_f64()?)
        }
        _ => None,
    }
}

fn eval_predicate(row: &Value, predicate: &Predicate, regex: Option<&Regex>) -> bool {
    let Some(value) = column(row, &predicate.field) else {
        return false;
    };

    match (predicate.operator, regex) {
        (Operator::Like, Some(regex)) => text_of(value).is_some_and(|text| regex.is_match(&text)),
        (Operator::Like, None) => false,
        (operator, _) => compare_scalar(value, &predicate.value).is_some_and(|o| operator.accepts(o)),
    }
}

fn eval_date_predicate(row: &Value, predicate: &DatePredicate, regex: Option<&Regex>) -> bool {
    let Some(day) = column(row, &predicate.field)
        .and_then(Value::as_str)
        .and_then(parse_day)
    else {
        return false;
    };

    match (&predicate.value, regex) {
        (DateOperand::Pattern(_), Some(regex)) => regex.is_match(&day.format("%Y-%m-%d").to_string()),
        (DateOperand::Day(operand), _) => predicate.operator.accepts(day.cmp(operand)),
        _ => false,
    }
}

fn in_range(row: &Value, range: &RangeCheck) -> bool {
    let Some(value) = column(row, &range.field) else {
        return false;
    };

    matches!(
        compare_scalar(value, &range.low),
        Some(Ordering::Equal | Ordering::Greater)
    ) && matches!(
        compare_scalar(value, &range.high),
        Some(Ordering::Less | Ordering::Equal)
    )
}

/// Total order over column values: booleans, numbers, strings, others, nulls
///
/// Nulls rank highest, as in PostgreSQL: last ascending, first descending.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            Some(Value::Bool(_)) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Null) | None => 4,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn compare_rows(a: &Value, b: &Value, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ordering = compare_values(column(a, &key.field), column(b, &key.field));
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
