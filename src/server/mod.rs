//! Server module for building HTTP servers with auto-registered search routes
//!
//! This module provides a `ServerBuilder` that registers, for every
//! configured entity:
//! - `POST /{plural}/search` taking a filter document
//! - `GET /{plural}` listing with the default sort
//!
//! plus a `GET /health` liveness route.

pub mod builder;
pub mod entity_registry;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use entity_registry::EntityRegistry;
pub use handlers::{AppState, SearchResponse};
