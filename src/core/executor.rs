//! Plan execution against a pluggable query backend

use crate::core::entity::EntityDescriptor;
use crate::core::error::{ExecutionError, StorageError};
use crate::core::plan::{FilterPlan, SortKey};
use crate::core::query::{Page, PageRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Slice of the sorted result set to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// A plan bound to its entity, with the final sort order resolved
///
/// Backends only translate this; every decision about defaults and
/// tie-breaking is made here.
#[derive(Debug, Clone)]
pub struct ResolvedQuery<'a> {
    pub entity: &'a EntityDescriptor,
    pub plan: &'a FilterPlan,
    pub sort: Vec<SortKey>,
}

impl<'a> ResolvedQuery<'a> {
    /// Resolve the sort: the plan's keys, else the entity default, then the
    /// primary key ascending so that pages never overlap.
    pub fn new(entity: &'a EntityDescriptor, plan: &'a FilterPlan) -> Self {
        let mut sort = if plan.sort.is_empty() {
            entity.default_sort().to_vec()
        } else {
            plan.sort.clone()
        };

        if !sort.iter().any(|key| key.field == entity.primary_key()) {
            sort.push(SortKey::asc(entity.primary_key()));
        }

        Self { entity, plan, sort }
    }
}

/// Storage capability the executor runs plans against
///
/// Implementations must apply the base predicate (primary key not null), every
/// plan category combined with AND, the ranges combined with OR among
/// themselves, and `query.sort` in order.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Short backend name used in errors and logs
    fn name(&self) -> &'static str;

    /// Count all rows matching the query
    async fn count(&self, query: &ResolvedQuery<'_>) -> Result<u64, StorageError>;

    /// Fetch the sorted rows inside `window`
    async fn fetch(
        &self,
        query: &ResolvedQuery<'_>,
        window: Window,
    ) -> Result<Vec<Value>, StorageError>;
}

#[async_trait]
impl<B: QueryBackend + ?Sized> QueryBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn count(&self, query: &ResolvedQuery<'_>) -> Result<u64, StorageError> {
        (**self).count(query).await
    }

    async fn fetch(
        &self,
        query: &ResolvedQuery<'_>,
        window: Window,
    ) -> Result<Vec<Value>, StorageError> {
        (**self).fetch(query, window).await
    }
}

/// Runs compiled plans and paginates the result
///
/// Stateless apart from the backend handle; share it freely across requests.
#[derive(Clone)]
pub struct QueryExecutor {
    backend: Arc<dyn QueryBackend>,
}

impl QueryExecutor {
    pub fn new(backend: impl QueryBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.backend
    }

    /// Execute `plan` against `entity` and return the requested page
    ///
    /// Backend failures are classified and returned as-is; nothing is retried.
    pub async fn execute(
        &self,
        plan: &FilterPlan,
        entity: &EntityDescriptor,
        request: &PageRequest,
    ) -> Result<Page, ExecutionError> {
        let query = ResolvedQuery::new(entity, plan);

        let total = self
            .backend
            .count(&query)
            .await
            .map_err(|e| self.fail(entity, e))?;

        let window = Window {
            offset: request.offset(),
            limit: request.per_page.max(1),
        };

        let rows = if window.offset >= total {
            Vec::new()
        } else {
            self.backend
                .fetch(&query, window)
                .await
                .map_err(|e| self.fail(entity, e))?
        };

        tracing::debug!(
            entity = entity.name(),
            backend = self.backend.name(),
            page = request.page,
            per_page = request.per_page,
            total,
            returned = rows.len(),
            "Executed filter plan"
        );

        let rows = rows.into_iter().map(|row| entity.project(row)).collect();
        Ok(Page::new(rows, total, request))
    }

    fn fail(&self, entity: &EntityDescriptor, err: StorageError) -> ExecutionError {
        tracing::warn!(
            entity = entity.name(),
            backend = self.backend.name(),
            error = %err,
            "Filter plan execution failed"
        );
        ExecutionError::from_storage(entity.name(), err)
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("backend", &self.backend.name())
            .finish()
    }
}
