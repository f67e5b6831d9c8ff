//! Rendering of resolved queries into parameterized PostgreSQL
//!
//! Operands are always bound as parameters (`$1`, `$2`, ...); only
//! identifiers that passed the allow-list, operators from a closed set and
//! fixed keywords ever reach the SQL text. Identifiers are double-quoted on
//! top of that.
//!
//! Rows are projected with `to_jsonb(t)` so a backend can return them as
//! JSON without knowing the table's columns.
//!
//! String operands are bound as `text`, which PostgreSQL will not compare
//! with `timestamp` or `bigint` columns. When the column's type is known
//! (see [`ColumnTypes`]) the placeholder is wrapped in `CAST($n AS <type>)`.

use crate::core::executor::{ResolvedQuery, Window};
use crate::core::plan::{DateOperand, Operator, Scalar};
use chrono::NaiveDate;
use std::collections::HashMap;

/// A bound parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// SQL text plus its parameters, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Column name to SQL type name, as printed by `format_type`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTypes {
    types: HashMap<String, String>,
}

impl ColumnTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, sql_type: impl Into<String>) {
        self.types.insert(column.into(), sql_type.into());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.types.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The type a text operand must be cast to before comparing with `column`
    ///
    /// `None` for unknown columns and for the character types, which already
    /// compare with `text`.
    fn cast_target(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|sql_type| !is_character_type(sql_type))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnTypes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut types = Self::new();
        for (column, sql_type) in iter {
            types.insert(column, sql_type);
        }
        types
    }
}

fn is_character_type(sql_type: &str) -> bool {
    ["text", "character", "citext", "name"]
        .iter()
        .any(|prefix| sql_type.starts_with(prefix))
}

/// Quote a single identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified table name (`schema.table`)
pub fn quote_table(name: &str) -> String {
    name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

/// `SELECT COUNT(*)` over the rows matching `query`
pub fn render_count(query: &ResolvedQuery<'_>, types: &ColumnTypes) -> SqlStatement {
    let mut writer = StatementWriter::new(types);
    let conditions = writer.conditions(query);

    writer.finish(format!(
        "SELECT COUNT(*) FROM {} AS t WHERE {}",
        quote_table(query.entity.table()),
        conditions
    ))
}

/// `SELECT to_jsonb(t)` for the rows of `window`, sorted
pub fn render_select(
    query: &ResolvedQuery<'_>,
    window: Window,
    types: &ColumnTypes,
) -> SqlStatement {
    let mut writer = StatementWriter::new(types);
    let conditions = writer.conditions(query);

    let order_by = query
        .sort
        .iter()
        .map(|key| format!("{} {}", column(&key.field), key.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");

    let limit = writer.bind(SqlParam::Int(clamp_i64(window.limit)));
    let offset = writer.bind(SqlParam::Int(clamp_i64(window.offset)));

    let mut sql = format!(
        "SELECT to_jsonb(t) AS row FROM {} AS t WHERE {}",
        quote_table(query.entity.table()),
        conditions
    );
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by);
    }
    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));

    writer.finish(sql)
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn column(field: &str) -> String {
    format!("t.{}", quote_ident(field))
}

struct StatementWriter<'t> {
    types: &'t ColumnTypes,
    params: Vec<SqlParam>,
}

impl<'t> StatementWriter<'t> {
    fn new(types: &'t ColumnTypes) -> Self {
        Self {
            types,
            params: Vec::new(),
        }
    }

    /// Push a parameter and return its placeholder
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn bind_scalar(&mut self, value: &Scalar) -> String {
        match value {
            Scalar::Null => "NULL".to_string(),
            Scalar::Bool(b) => self.bind(SqlParam::Bool(*b)),
            Scalar::Int(i) => self.bind(SqlParam::Int(*i)),
            Scalar::Float(f) => self.bind(SqlParam::Float(*f)),
            Scalar::Text(s) => self.bind(SqlParam::Text(s.clone())),
        }
    }

    /// Bind an operand compared with `field`, cast to the column's type
    fn bind_operand(&mut self, field: &str, value: &Scalar) -> String {
        let param = self.bind_scalar(value);
        match (value, self.types.cast_target(field)) {
            (Scalar::Text(_), Some(sql_type)) => format!("CAST({} AS {})", param, sql_type),
            _ => param,
        }
    }

    /// The WHERE body: base predicate AND each category, ranges OR'ed
    fn conditions(&mut self, query: &ResolvedQuery<'_>) -> String {
        let plan = query.plan;
        let mut parts = vec![format!("{} IS NOT NULL", column(query.entity.primary_key()))];

        for p in &plan.predicates {
            let col = column(&p.field);
            parts.push(match p.operator {
                Operator::Like => {
                    let param = self.bind_scalar(&p.value);
                    format!("{}::text ILIKE {}", col, param)
                }
                op => {
                    let param = self.bind_operand(&p.field, &p.value);
                    format!("{} {} {}", col, op.as_sql(), param)
                }
            });
        }

        for p in &plan.date_predicates {
            let day = format!("CAST({} AS DATE)", column(&p.field));
            parts.push(match &p.value {
                DateOperand::Day(d) => {
                    let param = self.bind(SqlParam::Date(*d));
                    format!("{} {} {}", day, p.operator.as_sql(), param)
                }
                DateOperand::Pattern(pattern) => {
                    let param = self.bind(SqlParam::Text(pattern.clone()));
                    format!("CAST({} AS TEXT) ILIKE {}", day, param)
                }
            });
        }

        for check in &plan.null_checks {
            let test = if check.is_null { "IS NULL" } else { "IS NOT NULL" };
            parts.push(format!("{} {}", column(&check.field), test));
        }

        if !plan.ranges.is_empty() {
            let ranges = plan
                .ranges
                .iter()
                .map(|r| {
                    let low = self.bind_operand(&r.field, &r.low);
                    let high = self.bind_operand(&r.field, &r.high);
                    format!("{} BETWEEN {} AND {}", column(&r.field), low, high)
                })
                .collect::<Vec<_>>();
            parts.push(format!("({})", ranges.join(" OR ")));
        }

        parts.join(" AND ")
    }

    fn finish(self, sql: String) -> SqlStatement {
        SqlStatement {
            sql,
            params: self.params,
        }
    }
}
