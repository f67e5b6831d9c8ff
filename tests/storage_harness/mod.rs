//! Shared test harness for query backend testing
//!
//! Provides a `users` entity, a 25-row fixture covering every column type
//! the filters handle, and helpers to compute expected results straight from
//! the fixture.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod query_backend_tests;

use filterdoc::core::document::FilterDocument;
use filterdoc::core::entity::EntityDescriptor;
use filterdoc::core::plan::FilterPlan;
use filterdoc::core::query::Page;
use serde_json::{Value, json};

pub const USERS_TABLE: &str = "users";
pub const FIXTURE_ROWS: i64 = 25;

/// The `users` entity the fixture is searched through
///
/// `password` is hidden; `level` repeats every four rows so sorting on it
/// needs the primary-key tie-break.
pub fn users_entity() -> EntityDescriptor {
    EntityDescriptor::new("user", USERS_TABLE).with_queryable([
        "name",
        "email",
        "age",
        "level",
        "score",
        "active",
        "created_at",
        "deleted_at",
    ])
    .with_hidden(["password"])
}

/// One fixture row
///
/// Ages are spread over 18..=74 without repeats; every fifth user is
/// soft-deleted.
pub fn user_row(i: i64) -> Value {
    json!({
        "id": i,
        "name": format!("user{:02}", i),
        "email": format!("user{:02}@example.com", i),
        "age": 18 + (i * 13) % 57,
        "level": i % 4,
        "score": i as f64 * 2.5,
        "active": i % 2 == 0,
        "created_at": format!("2024-01-{:02}T10:00:00", i),
        "deleted_at": if i % 5 == 0 { json!("2024-02-01T00:00:00") } else { Value::Null },
        "password": "secret",
    })
}

pub fn users_fixture() -> Vec<Value> {
    (1..=FIXTURE_ROWS).map(user_row).collect()
}

/// Ids of the fixture rows matching `pred`, ascending
pub fn fixture_ids(pred: impl Fn(&Value) -> bool) -> Vec<i64> {
    users_fixture()
        .iter()
        .filter(|row| pred(row))
        .filter_map(|row| row["id"].as_i64())
        .collect()
}

pub fn age_of(row: &Value) -> i64 {
    row["age"].as_i64().unwrap_or_default()
}

/// Ids of a page's rows, in page order
pub fn ids(page: &Page) -> Vec<i64> {
    page.data()
        .iter()
        .map(|row| row["id"].as_i64().expect("row id"))
        .collect()
}

/// Compile `document` against [`users_entity`]
pub fn plan(document: Value) -> FilterPlan {
    users_entity()
        .compile(&FilterDocument::from_value(document).expect("valid document"))
        .expect("document compiles")
}
