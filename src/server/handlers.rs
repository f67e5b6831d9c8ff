//! HTTP handlers for entity search
//!
//! Handlers are entity-agnostic: the `{plural}` path segment selects the
//! descriptor, and the descriptor's allow-list governs the document.

use axum::{
    Json,
    body::Bytes,
    extract::{OriginalUri, Path, Query, State, rejection::QueryRejection},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::config::PaginationConfig;
use crate::core::document::FilterDocument;
use crate::core::entity::EntityDescriptor;
use crate::core::error::{RequestError, SearchResult};
use crate::core::executor::QueryExecutor;
use crate::core::query::{Page, PageRequest, SearchParams};
use crate::server::entity_registry::EntityRegistry;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub executor: QueryExecutor,
    pub registry: Arc<EntityRegistry>,
    pub pagination: PaginationConfig,
    /// Prefix for pagination links; request paths are used as-is when unset
    pub base_url: Option<String>,
}

impl AppState {
    fn entity(&self, plural: &str) -> Result<Arc<EntityDescriptor>, RequestError> {
        self.registry
            .get(plural)
            .ok_or_else(|| RequestError::UnknownEntity {
                entity: plural.to_string(),
            })
    }

    fn page_request(&self, params: &SearchParams, path: &str) -> PageRequest {
        let path = match &self.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        };
        PageRequest::new(
            params.page(),
            params.per_page(self.pagination.per_page, self.pagination.max_per_page),
            path,
        )
    }

    async fn run(
        &self,
        plural: &str,
        document: &FilterDocument,
        params: &SearchParams,
        path: &str,
    ) -> SearchResult<Page> {
        let entity = self.entity(plural)?;
        let plan = entity.compile(document)?;

        if !plan.skipped_ranges.is_empty() {
            tracing::debug!(
                entity = entity.name(),
                skipped = plan.skipped_ranges.len(),
                "Ignoring malformed whereBetween entries"
            );
        }

        let request = self.page_request(params, path);
        Ok(self.executor.execute(&plan, &entity, &request).await?)
    }
}

/// Response body of the search and list endpoints
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub page: Page,
}

impl SearchResponse {
    pub fn new(page: Page) -> Self {
        Self {
            message: "Successful action",
            page,
        }
    }
}

fn search_params(
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<SearchParams, RequestError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| RequestError::InvalidQuery {
            message: rejection.body_text(),
        })
}

/// Search an entity with the filter document in the request body
///
/// POST /{plural}/search?page=&perPage=
pub async fn search_entities(
    State(state): State<AppState>,
    Path(plural): Path<String>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<SearchParams>, QueryRejection>,
    body: Bytes,
) -> SearchResult<Json<SearchResponse>> {
    let params = search_params(params)?;
    let text = std::str::from_utf8(&body).map_err(|e| RequestError::InvalidBody {
        message: e.to_string(),
    })?;
    let document = FilterDocument::from_json_str(text)?;

    let page = state.run(&plural, &document, &params, uri.path()).await?;
    Ok(Json(SearchResponse::new(page)))
}

/// List an entity with its default sort
///
/// GET /{plural}?page=&perPage=
pub async fn list_entities(
    State(state): State<AppState>,
    Path(plural): Path<String>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> SearchResult<Json<SearchResponse>> {
    let params = search_params(params)?;
    let page = state
        .run(&plural, &FilterDocument::default(), &params, uri.path())
        .await?;
    Ok(Json(SearchResponse::new(page)))
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "filterdoc",
        "backend": state.executor.backend().name(),
        "entities": state.registry.plurals(),
    }))
}
