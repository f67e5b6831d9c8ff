//! Typed error handling for filter compilation and query execution
//!
//! Every failure the crate can produce is one of a few categories, each with
//! its own enum so callers can match on the case they care about:
//!
//! - [`CompileError`]: the client's filter document was rejected (4xx)
//! - [`StorageError`]: a query backend failed (reported by [`QueryBackend`] impls)
//! - [`ExecutionError`]: a compiled plan could not be executed (5xx)
//! - [`ConfigError`]: the host configuration is unusable
//! - [`RequestError`]: the HTTP request itself is invalid
//!
//! [`SearchError`] wraps them all and knows how to render itself as an HTTP
//! response.
//!
//! [`QueryBackend`]: crate::core::executor::QueryBackend
//!
//! # Example
//!
//! ```rust,ignore
//! match entity.compile(&document) {
//!     Ok(plan) => run(plan).await,
//!     Err(CompileError::UnknownField { field, .. }) => {
//!         println!("'{}' cannot be filtered on", field);
//!     }
//!     Err(e) => eprintln!("rejected: {}", e),
//! }
//! ```

use crate::core::document::Clause;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type of the crate
///
/// Each variant carries the error of one category. HTTP status and
/// machine-readable codes are derived from the inner error.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The filter document was rejected
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The plan could not be executed against storage
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP/Request errors
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SearchError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SearchError::Compile(_) => StatusCode::BAD_REQUEST,
            SearchError::Execution(e) => e.status_code(),
            SearchError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::Request(e) => e.status_code(),
            SearchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::Compile(e) => e.error_code(),
            SearchError::Execution(e) => e.error_code(),
            SearchError::Config(_) => "CONFIG_ERROR",
            SearchError::Request(e) => e.error_code(),
            SearchError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            SearchError::Compile(CompileError::UnknownField { clause, field }) => {
                Some(serde_json::json!({ "clause": clause, "field": field }))
            }
            SearchError::Compile(CompileError::UnknownOperator { clause, operator }) => {
                Some(serde_json::json!({ "clause": clause, "operator": operator }))
            }
            SearchError::Compile(CompileError::MalformedEntry { clause, field, .. }) => {
                Some(serde_json::json!({ "clause": clause, "field": field }))
            }
            SearchError::Request(RequestError::UnknownEntity { entity }) => {
                Some(serde_json::json!({ "entity": entity }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Compile Errors
// =============================================================================

/// Reasons a filter document is rejected
///
/// All of these are client-input errors: they name the offending clause and
/// field or operator, and retrying the same document can never succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The document is not a JSON object or a clause has the wrong shape
    #[error("Invalid filter document: {message}")]
    InvalidDocument { message: String },

    /// A field is not in the entity's queryable allow-list
    #[error("Field '{field}' in {clause} is not queryable")]
    UnknownField { clause: Clause, field: String },

    /// An operator is not one of the supported comparison operators
    #[error("Unsupported operator '{operator}' in {clause}")]
    UnknownOperator { clause: Clause, operator: String },

    /// A known field was given a value the clause cannot use
    #[error("Malformed {clause} entry for field '{field}': {message}")]
    MalformedEntry {
        clause: Clause,
        field: String,
        message: String,
    },
}

impl CompileError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CompileError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            CompileError::UnknownField { .. } => "UNKNOWN_FIELD",
            CompileError::UnknownOperator { .. } => "UNKNOWN_OPERATOR",
            CompileError::MalformedEntry { .. } => "MALFORMED_ENTRY",
        }
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::InvalidDocument {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by query backends
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// The backend could not be reached
    #[error("Storage backend '{backend}' is unavailable: {message}")]
    Unavailable { backend: String, message: String },

    /// The backend was reached but rejected the query
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },
}

// =============================================================================
// Execution Errors
// =============================================================================

/// Errors raised while executing a compiled plan
///
/// The executor never retries; these go straight back to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The storage capability is unreachable
    #[error("Storage unavailable while querying '{entity}': {source}")]
    StorageUnavailable {
        entity: String,
        #[source]
        source: StorageError,
    },

    /// The storage capability failed the query
    #[error("Query on '{entity}' failed: {source}")]
    QueryFailed {
        entity: String,
        #[source]
        source: StorageError,
    },
}

impl ExecutionError {
    /// Classify a backend failure for the given entity
    pub fn from_storage(entity: &str, err: StorageError) -> Self {
        let entity = entity.to_string();
        match err {
            StorageError::Unavailable { .. } => ExecutionError::StorageUnavailable {
                entity,
                source: err,
            },
            StorageError::Query { .. } => ExecutionError::QueryFailed {
                entity,
                source: err,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ExecutionError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ExecutionError::QueryFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ExecutionError::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
            ExecutionError::QueryFailed { .. } => "QUERY_FAILED",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file
    #[error("Failed to parse config{}: {message}", in_file(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// Field-level validation failed
    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// IO error while reading configuration
    #[error("IO error: {message}")]
    IoError { message: String },
}

fn in_file(file: &Option<String>) -> String {
    file.as_ref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug, Error)]
pub enum RequestError {
    /// No entity is registered under this path segment
    #[error("Unknown entity: {entity}")]
    UnknownEntity { entity: String },

    /// Invalid request body
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },

    /// Invalid query string
    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::UnknownEntity { .. } => StatusCode::NOT_FOUND,
            RequestError::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            RequestError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::UnknownEntity { .. } => "UNKNOWN_ENTITY",
            RequestError::InvalidBody { .. } => "INVALID_BODY",
            RequestError::InvalidQuery { .. } => "INVALID_QUERY",
        }
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        SearchError::Internal(err.to_string())
    }
}

/// A specialized Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;
