//! Integration tests for the PostgreSQL query backend using the storage test harness.
//!
//! Invokes `query_backend_tests!` to validate that `PostgresQueryBackend`
//! returns exactly what the fixture says for every filter category.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a PostgreSQL container)
//! - Feature flag `postgres` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features postgres --test postgres_tests -- --test-threads=1
//! ```
//!
//! # Test isolation
//!
//! All tests share a single PostgreSQL container (via `OnceLock`). The
//! fixture table is created and seeded once; tests only read from it.

#![cfg(feature = "postgres")]

#[macro_use]
mod storage_harness;

use chrono::NaiveDateTime;
use filterdoc::storage::PostgresQueryBackend;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::OnceLock;
use storage_harness::*;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh pool per test)
// ---------------------------------------------------------------------------

/// Holds the testcontainer handle (keeps it alive) and the connection URL.
///
/// Each test creates its own `PgPool` from the URL because the container
/// outlives the tokio runtime of any single `#[tokio::test]`.
struct PgTestEnv {
    _container: testcontainers::ContainerAsync<Postgres>,
    connection_url: String,
}

static TEST_ENV: OnceLock<PgTestEnv> = OnceLock::new();

fn timestamp(value: &serde_json::Value) -> Option<NaiveDateTime> {
    value
        .as_str()
        .map(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").expect("fixture timestamp"))
}

async fn seed(pool: &PgPool) {
    sqlx::query(
        "CREATE TABLE users (
            id BIGINT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            age BIGINT NOT NULL,
            level BIGINT NOT NULL,
            score DOUBLE PRECISION NOT NULL,
            active BOOLEAN NOT NULL,
            created_at TIMESTAMP NOT NULL,
            deleted_at TIMESTAMP NULL,
            password TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create users table");

    for row in users_fixture() {
        sqlx::query(
            "INSERT INTO users (id, name, email, age, level, score, active, created_at, deleted_at, password) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(row["id"].as_i64())
        .bind(row["name"].as_str())
        .bind(row["email"].as_str())
        .bind(row["age"].as_i64())
        .bind(row["level"].as_i64())
        .bind(row["score"].as_f64())
        .bind(row["active"].as_bool())
        .bind(timestamp(&row["created_at"]))
        .bind(timestamp(&row["deleted_at"]))
        .bind(row["password"].as_str())
        .execute(pool)
        .await
        .expect("Failed to insert fixture row");
    }
}

/// Start the shared PostgreSQL container and seed it (first caller only).
async fn init_pg_env() -> &'static PgTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start PostgreSQL container (is Docker running?)");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL");
    seed(&pool).await;
    pool.close().await;

    let _ = TEST_ENV.set(PgTestEnv {
        _container: container,
        connection_url: url,
    });
    TEST_ENV.get().unwrap()
}

/// Create a fresh `PgPool` bound to the current tokio runtime.
async fn pg_pool() -> PgPool {
    let env = init_pg_env().await;
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&env.connection_url)
        .await
        .expect("Failed to connect to PostgreSQL")
}

async fn pg_backend() -> PostgresQueryBackend {
    PostgresQueryBackend::new(pg_pool().await)
}

// ---------------------------------------------------------------------------
// Test suites via macros
// ---------------------------------------------------------------------------

query_backend_tests!(pg_backend().await);

mod postgres_specific {
    use super::*;
    use filterdoc::core::error::StorageError;
    use filterdoc::core::executor::{QueryBackend, ResolvedQuery};
    use serde_json::json;

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let backend = pg_backend().await;
        backend.pool().close().await;

        let entity = users_entity();
        let plan = plan(json!({}));
        let err = backend
            .count(&ResolvedQuery::new(&entity, &plan))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_type_mismatch_is_query_failure() {
        let backend = pg_backend().await;
        let entity = users_entity();
        let plan = plan(json!({"where": [["age", "not a number"]]}));
        let err = backend
            .count(&ResolvedQuery::new(&entity, &plan))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Query { .. }));
    }

    #[tokio::test]
    async fn test_column_types_come_from_catalog() {
        let backend = pg_backend().await;

        let types = backend.column_types(USERS_TABLE).await.unwrap();
        assert_eq!(types.len(), 10);
        assert_eq!(types.get("id"), Some("bigint"));
        assert_eq!(types.get("created_at"), Some("timestamp without time zone"));
        assert_eq!(types.get("score"), Some("double precision"));

        let missing = backend.column_types("ghosts").await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_query_failure() {
        let backend = pg_backend().await;
        let entity = filterdoc::core::entity::EntityDescriptor::new("ghost", "ghosts");
        let plan = plan(json!({}));
        let err = backend
            .count(&ResolvedQuery::new(&entity, &plan))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Query { .. }));
    }
}
