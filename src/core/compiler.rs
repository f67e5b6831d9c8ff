//! Filter document compiler
//!
//! Turns an untrusted [`FilterDocument`] into a [`FilterPlan`], rejecting any
//! field outside the caller's allow-list and any operator outside
//! [`Operator`]. The compiler holds no state beyond the borrowed allow-list, so
//! the same input always compiles to the same plan.

use crate::core::document::{Clause, FilterDocument, OrderEntry, WhereEntry, json_kind};
use crate::core::error::CompileError;
use crate::core::plan::{
    DateOperand, DatePredicate, FilterPlan, MalformedRange, NullCheck, Operator, Predicate,
    RangeCheck, Scalar, SortDirection, SortKey, parse_day,
};
use serde_json::Value;
use std::collections::BTreeSet;

/// Compile `doc` against the queryable columns in `allowed`
///
/// # Example
///
/// ```rust
/// use filterdoc::core::compiler::compile;
/// use filterdoc::core::document::FilterDocument;
/// use std::collections::BTreeSet;
///
/// let allowed: BTreeSet<String> = ["name".to_string()].into();
/// let doc = FilterDocument::from_json_str(r#"{"where": [["name", "LIKE", "john"]]}"#).unwrap();
/// let plan = compile(&doc, &allowed).unwrap();
/// assert_eq!(plan.predicates.len(), 1);
/// ```
pub fn compile(doc: &FilterDocument, allowed: &BTreeSet<String>) -> Result<FilterPlan, CompileError> {
    FilterCompiler::new(allowed).compile(doc)
}

/// Compiler bound to one entity's allow-list
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler<'a> {
    allowed: &'a BTreeSet<String>,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(allowed: &'a BTreeSet<String>) -> Self {
        Self { allowed }
    }

    pub fn compile(&self, doc: &FilterDocument) -> Result<FilterPlan, CompileError> {
        let mut plan = FilterPlan::default();

        for entry in &doc.conditions {
            self.compile_where(entry, &mut plan)?;
        }

        for field in &doc.where_null {
            plan.null_checks.push(NullCheck {
                field: self.check_field(Clause::WhereNull, field)?,
                is_null: true,
            });
        }

        for field in &doc.where_not_null {
            plan.null_checks.push(NullCheck {
                field: self.check_field(Clause::WhereNotNull, field)?,
                is_null: false,
            });
        }

        for entry in &doc.where_date {
            plan.date_predicates.push(self.compile_where_date(entry)?);
        }

        for bounds in &doc.where_between {
            for (field, bound) in bounds {
                let field = self.check_field(Clause::WhereBetween, field)?;
                match range_bounds(bound) {
                    Ok((low, high)) => plan.ranges.push(RangeCheck { field, low, high }),
                    Err(reason) => {
                        tracing::debug!(field = %field, reason = %reason, "Skipping malformed whereBetween bound");
                        plan.skipped_ranges.push(MalformedRange { field, reason });
                    }
                }
            }
        }

        for entry in &doc.order_by {
            plan.sort.push(self.compile_order(entry)?);
        }

        Ok(plan)
    }

    fn check_field(&self, clause: Clause, field: &str) -> Result<String, CompileError> {
        if self.allowed.contains(field) {
            Ok(field.to_string())
        } else {
            Err(CompileError::UnknownField {
                clause,
                field: field.to_string(),
            })
        }
    }

    fn operator(&self, clause: Clause, entry: &WhereEntry) -> Result<Operator, CompileError> {
        match &entry.operator {
            None => Ok(Operator::Eq),
            Some(raw) => Operator::parse(raw).ok_or_else(|| CompileError::UnknownOperator {
                clause,
                operator: raw.clone(),
            }),
        }
    }

    fn compile_where(&self, entry: &WhereEntry, plan: &mut FilterPlan) -> Result<(), CompileError> {
        let clause = Clause::Where;
        let field = self.check_field(clause, &entry.field)?;
        let operator = self.operator(clause, entry)?;

        // `= null` and `!= null` mean IS NULL / IS NOT NULL
        if entry.value.is_null() {
            let is_null = match operator {
                Operator::Eq => true,
                Operator::NotEq => false,
                _ => {
                    return Err(malformed(
                        clause,
                        &field,
                        "null can only be compared with = or !=",
                    ));
                }
            };
            plan.null_checks.push(NullCheck { field, is_null });
            return Ok(());
        }

        let value = if operator == Operator::Like {
            Scalar::Text(like_pattern(clause, &field, &entry.value)?)
        } else {
            Scalar::from_json(&entry.value).ok_or_else(|| {
                malformed(
                    clause,
                    &field,
                    &format!("expected a scalar value, got {}", json_kind(&entry.value)),
                )
            })?
        };

        plan.predicates.push(Predicate {
            field,
            operator,
            value,
        });
        Ok(())
    }

    fn compile_where_date(&self, entry: &WhereEntry) -> Result<DatePredicate, CompileError> {
        let clause = Clause::WhereDate;
        let field = self.check_field(clause, &entry.field)?;
        let operator = self.operator(clause, entry)?;

        let value = if operator == Operator::Like {
            DateOperand::Pattern(like_pattern(clause, &field, &entry.value)?)
        } else {
            let day = entry.value.as_str().and_then(parse_day).ok_or_else(|| {
                malformed(clause, &field, "expected a date such as 2024-01-31")
            })?;
            DateOperand::Day(day)
        };

        Ok(DatePredicate {
            field,
            operator,
            value,
        })
    }

    fn compile_order(&self, entry: &OrderEntry) -> Result<SortKey, CompileError> {
        Ok(SortKey {
            field: self.check_field(Clause::OrderBy, &entry.field)?,
            direction: SortDirection::from_order(entry.order.as_deref()),
        })
    }
}

fn malformed(clause: Clause, field: &str, message: &str) -> CompileError {
    CompileError::MalformedEntry {
        clause,
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// A LIKE operand, wrapped as `%value%` unless it already has a wildcard
fn like_pattern(clause: Clause, field: &str, value: &Value) -> Result<String, CompileError> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(malformed(
                clause,
                field,
                &format!("LIKE expects a string or number, got {}", json_kind(other)),
            ));
        }
    };

    if text.contains('%') {
        Ok(text)
    } else {
        Ok(format!("%{}%", text))
    }
}

fn range_bounds(bound: &Value) -> Result<(Scalar, Scalar), String> {
    let items = match bound {
        Value::Array(items) => items,
        other => return Err(format!("expected [low, high], got {}", json_kind(other))),
    };

    if items.len() != 2 {
        return Err(format!("expected 2 bounds, got {}", items.len()));
    }

    match (Scalar::from_json(&items[0]), Scalar::from_json(&items[1])) {
        (Some(low), Some(high)) if !low.is_null() && !high.is_null() => Ok((low, high)),
        _ => Err("bounds must be non-null scalars".to_string()),
    }
}
