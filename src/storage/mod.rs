//! Query backends for different storage engines

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sql;

pub use in_memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresQueryBackend;
