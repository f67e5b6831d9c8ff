//! Core module: filter documents, their compilation and execution

pub mod compiler;
pub mod document;
pub mod entity;
pub mod error;
pub mod executor;
pub mod plan;
pub mod query;

pub use compiler::{FilterCompiler, compile};
pub use document::{Clause, FilterDocument, OrderEntry, WhereEntry};
pub use entity::EntityDescriptor;
pub use error::{
    CompileError, ConfigError, ExecutionError, RequestError, SearchError, SearchResult,
    StorageError,
};
pub use executor::{QueryBackend, QueryExecutor, ResolvedQuery, Window};
pub use plan::{FilterPlan, Operator, Scalar, SortDirection, SortKey};
pub use query::{Page, PageLink, PageRequest, SearchParams};
