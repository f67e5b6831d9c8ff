//! Searchable entity descriptors

use crate::core::compiler::compile;
use crate::core::document::FilterDocument;
use crate::core::error::CompileError;
use crate::core::plan::{FilterPlan, SortKey};
use serde_json::Value;
use std::collections::BTreeSet;

/// Describes one searchable table
///
/// Only the columns in `queryable` may appear in a filter document; `hidden`
/// columns are stripped from every row returned to the caller.
///
/// # Example
///
/// ```rust
/// use filterdoc::core::entity::EntityDescriptor;
/// use filterdoc::core::plan::SortKey;
///
/// let users = EntityDescriptor::new("user", "users")
///     .with_queryable(["id", "name", "email", "created_at"])
///     .with_hidden(["password", "remember_token"])
///     .with_default_sort(vec![SortKey::desc("created_at")]);
///
/// assert!(users.allowed_fields().contains("email"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    name: String,
    plural: String,
    table: String,
    primary_key: String,
    queryable: BTreeSet<String>,
    hidden: BTreeSet<String>,
    default_sort: Vec<SortKey>,
}

impl EntityDescriptor {
    /// Create a descriptor for `table`
    ///
    /// The plural route name defaults to the table name and the primary key
    /// to `id`. The primary key is always queryable.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            name: name.into(),
            plural: table.clone(),
            table,
            primary_key: "id".to_string(),
            queryable: BTreeSet::from(["id".to_string()]),
            hidden: BTreeSet::new(),
            default_sort: Vec::new(),
        }
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        let primary_key = primary_key.into();
        self.queryable.remove(&self.primary_key);
        self.queryable.insert(primary_key.clone());
        self.primary_key = primary_key;
        self
    }

    /// Add columns to the allow-list
    pub fn with_queryable<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queryable.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Columns never returned in row projections
    pub fn with_hidden<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Sort used when a document has no `orderBy`
    pub fn with_default_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// The queryable-column allow-list
    pub fn allowed_fields(&self) -> &BTreeSet<String> {
        &self.queryable
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn default_sort(&self) -> &[SortKey] {
        &self.default_sort
    }

    /// Compile a document against this entity's allow-list
    pub fn compile(&self, doc: &FilterDocument) -> Result<FilterPlan, CompileError> {
        compile(doc, &self.queryable)
    }

    /// Strip hidden columns from a row
    pub fn project(&self, mut row: Value) -> Value {
        if let Some(obj) = row.as_object_mut() {
            for column in &self.hidden {
                obj.remove(column);
            }
        }
        row
    }
}
