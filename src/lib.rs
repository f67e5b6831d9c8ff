//! # filterdoc
//!
//! Compile untrusted JSON filter documents into safe, paginated entity
//! queries.
//!
//! ## Features
//!
//! - **Filter documents**: `where`, `whereDate`, `whereNull`, `whereNotNull`,
//!   `whereBetween` and `orderBy` clauses in one JSON body
//! - **Allow-listed columns**: every field is checked against the entity's
//!   queryable columns before anything reaches storage
//! - **Parameterized SQL**: operands are always bound, never interpolated
//! - **Length-aware pages**: totals, page URLs and a navigation link window
//! - **Pluggable storage**: in-memory backend for tests, PostgreSQL via sqlx
//! - **Configuration-Based**: declare entities and pagination in YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use filterdoc::prelude::*;
//!
//! let users = EntityDescriptor::new("user", "users")
//!     .with_queryable(["name", "email", "created_at"])
//!     .with_hidden(["password"]);
//!
//! let document = FilterDocument::from_json_str(r#"{
//!     "where": [["name", "like", "john"]],
//!     "orderBy": [{"field": "created_at", "order": "DESC"}]
//! }"#)?;
//!
//! let plan = users.compile(&document)?;
//! let executor = QueryExecutor::new(InMemoryStore::new());
//! let page = executor
//!     .execute(&plan, &users, &PageRequest::new(1, 10, "/users/search"))
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        compiler::compile,
        document::{FilterDocument, OrderEntry, WhereEntry},
        entity::EntityDescriptor,
        error::{CompileError, ExecutionError, SearchError, SearchResult, StorageError},
        executor::{QueryBackend, QueryExecutor, ResolvedQuery, Window},
        plan::{FilterPlan, SortDirection, SortKey},
        query::{Page, PageRequest, SearchParams},
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresQueryBackend;

    // === Config ===
    pub use crate::config::{EntityConfig, PaginationConfig, SearchConfig, ServerConfig};

    // === Server ===
    pub use crate::server::{AppState, EntityRegistry, SearchResponse, ServerBuilder};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};

    // === Axum ===
    pub use axum::{
        Router,
        routing::{get, post},
    };
}
