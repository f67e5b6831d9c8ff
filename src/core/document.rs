//! Filter documents as sent by clients
//!
//! A [`FilterDocument`] is the untrusted JSON body of a search request. It is
//! only checked for *shape* here; field names, operators and values are
//! validated by the compiler against an entity's allow-list.
//!
//! ```json
//! {
//!   "where":        [["name", "LIKE", "john"], ["email", "john@doe.com"]],
//!   "whereDate":    [["created_at", ">=", "2024-01-01"]],
//!   "whereNull":    ["deleted_at"],
//!   "whereNotNull": ["email"],
//!   "whereBetween": [{"age": [18, 30]}, {"age": [60, 70]}],
//!   "orderBy":      [{"field": "created_at", "order": "DESC"}]
//! }
//! ```

use crate::core::error::CompileError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// The clause a field, operator or value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Clause {
    Where,
    WhereDate,
    WhereNull,
    WhereNotNull,
    WhereBetween,
    OrderBy,
}

impl Clause {
    /// The document key of this clause
    pub fn as_str(&self) -> &'static str {
        match self {
            Clause::Where => "where",
            Clause::WhereDate => "whereDate",
            Clause::WhereNull => "whereNull",
            Clause::WhereNotNull => "whereNotNull",
            Clause::WhereBetween => "whereBetween",
            Clause::OrderBy => "orderBy",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untrusted filter document
///
/// Every key is optional; a missing key (or an explicit `null`) means no
/// constraint of that kind. Unknown keys are ignored so pagination or other
/// host parameters can travel in the same body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterDocument {
    /// `where` comparisons
    #[serde(rename = "where", deserialize_with = "nullable")]
    pub conditions: Vec<WhereEntry>,

    /// `whereDate` comparisons against the date part of a column
    #[serde(deserialize_with = "nullable")]
    pub where_date: Vec<WhereEntry>,

    #[serde(deserialize_with = "nullable")]
    pub where_null: Vec<String>,

    #[serde(deserialize_with = "nullable")]
    pub where_not_null: Vec<String>,

    /// One map per entry: field -> `[low, high]`
    ///
    /// Bounds are kept raw so a malformed one can be skipped instead of
    /// failing the whole document.
    #[serde(deserialize_with = "nullable")]
    pub where_between: Vec<IndexMap<String, Value>>,

    #[serde(deserialize_with = "nullable")]
    pub order_by: Vec<OrderEntry>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl FilterDocument {
    /// Parse a document from an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self, CompileError> {
        match value {
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            Value::Null => Ok(Self::default()),
            other => Err(CompileError::InvalidDocument {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    /// Parse a document from raw JSON text
    ///
    /// Blank input is an empty document.
    pub fn from_json_str(text: &str) -> Result<Self, CompileError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Whether the document carries no clause at all
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.where_date.is_empty()
            && self.where_null.is_empty()
            && self.where_not_null.is_empty()
            && self.where_between.is_empty()
            && self.order_by.is_empty()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// One `where`/`whereDate` entry
///
/// On the wire this is `[field, value]` (implicit `=`) or
/// `[field, operator, value]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct WhereEntry {
    pub field: String,
    pub operator: Option<String>,
    pub value: Value,
}

impl WhereEntry {
    /// `[field, operator, value]`
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: Some(operator.into()),
            value,
        }
    }

    /// `[field, value]`
    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            operator: None,
            value,
        }
    }
}

impl TryFrom<Vec<Value>> for WhereEntry {
    type Error = String;

    fn try_from(items: Vec<Value>) -> Result<Self, Self::Error> {
        let len = items.len();
        let mut items = items.into_iter();
        match (len, items.next(), items.next(), items.next()) {
            (2, Some(Value::String(field)), Some(value), None) => Ok(Self {
                field,
                operator: None,
                value,
            }),
            (3, Some(Value::String(field)), Some(Value::String(operator)), Some(value)) => {
                Ok(Self {
                    field,
                    operator: Some(operator),
                    value,
                })
            }
            (2 | 3, Some(Value::String(_)), Some(other), _) => Err(format!(
                "operator must be a string, got {}",
                json_kind(&other)
            )),
            (2 | 3, Some(other), _, _) => Err(format!(
                "field name must be a string, got {}",
                json_kind(&other)
            )),
            _ => Err(format!(
                "expected [field, value] or [field, operator, value], got {} element(s)",
                len
            )),
        }
    }
}

/// One `orderBy` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEntry {
    pub field: String,

    /// `ASC` or `DESC`; anything else sorts descending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}
