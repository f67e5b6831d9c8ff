//! Macro-generated test suite for `QueryBackend` contract validation.
//!
//! The `query_backend_tests!` macro generates a test module that runs the
//! [`QueryExecutor`](filterdoc::core::executor::QueryExecutor) over any
//! backend seeded with `users_fixture()`, and checks every result against the
//! fixture itself.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//!
//! query_backend_tests!(seeded_store());
//! ```
//!
//! # Generated Tests
//!
//! ## Pagination
//! - `test_first_page` / `test_last_partial_page` / `test_page_past_the_end`
//!
//! ## Filters
//! - comparisons on text, integer, float and boolean columns
//! - LIKE wrapping and case-insensitivity
//! - `whereDate` on days and patterns
//! - null checks, `= null` equality
//! - `whereBetween` OR semantics and malformed bounds
//! - timestamp and numeric columns compared with string operands
//!
//! ## Sorting and projection
//! - explicit sort with primary-key tie-break, hidden columns

/// Generate a full `QueryBackend` conformance test suite.
///
/// `$factory` must evaluate to a backend implementing `QueryBackend` and
/// holding exactly the rows of `users_fixture()` in the `users` table. It is
/// re-evaluated for each test.
#[macro_export]
macro_rules! query_backend_tests {
    ($factory:expr) => {
        mod query_backend_contract_tests {
            use super::*;
            use filterdoc::core::executor::QueryExecutor;
            use filterdoc::core::plan::FilterPlan;
            use filterdoc::core::query::{Page, PageRequest};
            use serde_json::{Value, json};

            async fn search(executor: &QueryExecutor, document: Value, page: u64, per_page: u64) -> Page {
                executor
                    .execute(
                        &plan(document),
                        &users_entity(),
                        &PageRequest::new(page, per_page, "/users/search"),
                    )
                    .await
                    .expect("execution succeeds")
            }

            async fn search_all(executor: &QueryExecutor, document: Value) -> Page {
                search(executor, document, 1, 100).await
            }

            // ==================================================================
            // Pagination
            // ==================================================================

            #[tokio::test]
            async fn test_first_page() {
                let executor = QueryExecutor::new($factory);
                let page = search(&executor, json!({}), 1, 10).await;

                assert_eq!(page.total(), 25);
                assert_eq!(page.last_page(), 3);
                assert_eq!(ids(&page), (1..=10).collect::<Vec<_>>());
                assert_eq!(page.from(), Some(1));
                assert_eq!(page.to(), Some(10));
                assert_eq!(page.next_page_url(), Some("/users/search?page=2"));
            }

            #[tokio::test]
            async fn test_last_partial_page() {
                let executor = QueryExecutor::new($factory);
                let page = search(&executor, json!({}), 3, 10).await;

                assert_eq!(ids(&page), (21..=25).collect::<Vec<_>>());
                assert_eq!(page.from(), Some(21));
                assert_eq!(page.to(), Some(25));
                assert_eq!(page.next_page_url(), None);
            }

            #[tokio::test]
            async fn test_page_past_the_end() {
                let executor = QueryExecutor::new($factory);
                let page = search(&executor, json!({}), 9, 10).await;

                assert!(page.data().is_empty());
                assert_eq!(page.total(), 25);
                assert_eq!(page.from(), None);
                assert_eq!(page.to(), None);
            }

            #[tokio::test]
            async fn test_pages_do_not_overlap() {
                let executor = QueryExecutor::new($factory);
                let document = json!({"orderBy": [{"field": "level", "order": "ASC"}]});

                let mut seen = Vec::new();
                for page_no in 1..=4 {
                    seen.extend(ids(&search(&executor, document.clone(), page_no, 7).await));
                }
                seen.sort();
                assert_eq!(seen, (1..=25).collect::<Vec<_>>());
            }

            // ==================================================================
            // where
            // ==================================================================

            #[tokio::test]
            async fn test_text_equality() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"where": [["name", "user07"]]})).await;
                assert_eq!(ids(&page), vec![7]);
            }

            #[tokio::test]
            async fn test_not_equal() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"where": [["name", "!=", "user07"]]})).await;
                assert_eq!(page.total(), 24);
                assert!(!ids(&page).contains(&7));
            }

            #[tokio::test]
            async fn test_integer_comparisons_combine_with_and() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"where": [["age", ">=", 30], ["age", "<", 50]]}),
                )
                .await;
                assert_eq!(ids(&page), fixture_ids(|r| (30..50).contains(&age_of(r))));
            }

            #[tokio::test]
            async fn test_float_and_boolean_columns() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"where": [["score", ">", 30.5], ["active", true]]}),
                )
                .await;
                assert_eq!(
                    ids(&page),
                    fixture_ids(|r| r["score"].as_f64().unwrap() > 30.5 && r["active"] == true)
                );
            }

            #[tokio::test]
            async fn test_like_wraps_value() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"where": [["name", "like", "user1"]]})).await;
                assert_eq!(ids(&page), (10..=19).collect::<Vec<_>>());
            }

            #[tokio::test]
            async fn test_like_is_case_insensitive() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"where": [["email", "LIKE", "USER2"]]})).await;
                assert_eq!(ids(&page), (20..=25).collect::<Vec<_>>());
            }

            #[tokio::test]
            async fn test_null_equality_is_null_check() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"where": [["deleted_at", null]]})).await;
                assert_eq!(ids(&page), fixture_ids(|r| r["deleted_at"].is_null()));
            }

            #[tokio::test]
            async fn test_numeric_string_equality() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"where": [["id", "7"]]})).await;
                assert_eq!(ids(&page), vec![7]);

                let page = search_all(&executor, json!({"where": [["level", "2"]]})).await;
                assert_eq!(ids(&page), fixture_ids(|r| r["level"] == 2));
            }

            #[tokio::test]
            async fn test_timestamp_comparison_with_string_operand() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"where": [["created_at", ">=", "2024-01-20 00:00:00"]]}),
                )
                .await;
                assert_eq!(ids(&page), (20..=25).collect::<Vec<_>>());

                let page = search_all(
                    &executor,
                    json!({"where": [["created_at", "<=", "2024-01-03 10:00:00"]]}),
                )
                .await;
                assert_eq!(ids(&page), vec![1, 2, 3]);
            }

            // ==================================================================
            // whereDate
            // ==================================================================

            #[tokio::test]
            async fn test_where_date_matches_whole_day() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"whereDate": [["created_at", "2024-01-05"]]})).await;
                assert_eq!(ids(&page), vec![5]);
            }

            #[tokio::test]
            async fn test_where_date_range_operator() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"whereDate": [["created_at", ">=", "2024-01-20 23:59:59"]]}),
                )
                .await;
                assert_eq!(ids(&page), (20..=25).collect::<Vec<_>>());
            }

            #[tokio::test]
            async fn test_where_date_pattern() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"whereDate": [["created_at", "like", "2024-01-0"]]}),
                )
                .await;
                assert_eq!(ids(&page), (1..=9).collect::<Vec<_>>());
            }

            // ==================================================================
            // whereNull / whereNotNull
            // ==================================================================

            #[tokio::test]
            async fn test_where_null() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"whereNull": ["deleted_at"]})).await;
                assert_eq!(page.total(), 20);
                assert_eq!(ids(&page), fixture_ids(|r| r["deleted_at"].is_null()));
            }

            #[tokio::test]
            async fn test_where_not_null() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({"whereNotNull": ["deleted_at"]})).await;
                assert_eq!(ids(&page), vec![5, 10, 15, 20, 25]);
            }

            // ==================================================================
            // whereBetween
            // ==================================================================

            #[tokio::test]
            async fn test_between_entries_combine_with_or() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"whereBetween": [{"age": [18, 30]}, {"age": [60, 70]}]}),
                )
                .await;

                let expected = fixture_ids(|r| {
                    let age = age_of(r);
                    (18..=30).contains(&age) || (60..=70).contains(&age)
                });
                assert!(!expected.is_empty());
                assert_eq!(ids(&page), expected);
            }

            #[tokio::test]
            async fn test_between_and_other_filters() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({
                        "whereNull": ["deleted_at"],
                        "whereBetween": [{"age": [18, 30]}, {"age": [60, 70]}]
                    }),
                )
                .await;

                let expected = fixture_ids(|r| {
                    let age = age_of(r);
                    r["deleted_at"].is_null()
                        && ((18..=30).contains(&age) || (60..=70).contains(&age))
                });
                assert_eq!(ids(&page), expected);
            }

            #[tokio::test]
            async fn test_same_day_between_on_timestamps() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"whereBetween": [
                        {"created_at": ["2024-01-05 00:00:00", "2024-01-05 23:59:59"]}
                    ]}),
                )
                .await;
                assert_eq!(ids(&page), vec![5]);
            }

            #[tokio::test]
            async fn test_malformed_between_is_ignored() {
                let executor = QueryExecutor::new($factory);
                let document = json!({"whereBetween": [{"age": [18]}]});
                assert_eq!(plan(document.clone()).skipped_ranges.len(), 1);

                let page = search_all(&executor, document).await;
                assert_eq!(page.total(), 25);
            }

            // ==================================================================
            // orderBy / projection
            // ==================================================================

            #[tokio::test]
            async fn test_order_by_with_primary_key_tie_break() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(
                    &executor,
                    json!({"orderBy": [{"field": "level", "order": "DESC"}]}),
                )
                .await;

                let mut expected = users_fixture();
                expected.sort_by_key(|r| (-r["level"].as_i64().unwrap(), r["id"].as_i64().unwrap()));
                let expected: Vec<i64> = expected.iter().map(|r| r["id"].as_i64().unwrap()).collect();
                assert_eq!(ids(&page), expected);
            }

            #[tokio::test]
            async fn test_order_defaults_to_descending() {
                let executor = QueryExecutor::new($factory);
                let page = search(&executor, json!({"orderBy": [{"field": "age"}]}), 1, 3).await;

                let mut ages: Vec<i64> = users_fixture().iter().map(age_of).collect();
                ages.sort_by(|a, b| b.cmp(a));
                let got: Vec<i64> = page.data().iter().map(age_of).collect();
                assert_eq!(got, ages[..3].to_vec());
            }

            #[tokio::test]
            async fn test_hidden_columns_are_stripped() {
                let executor = QueryExecutor::new($factory);
                let page = search_all(&executor, json!({})).await;
                assert!(page.data().iter().all(|row| row.get("password").is_none()));
                assert!(page.data().iter().all(|row| row.get("email").is_some()));
            }

            #[tokio::test]
            async fn test_unfiltered_plan_counts_everything() {
                let executor = QueryExecutor::new($factory);
                let page = executor
                    .execute(
                        &FilterPlan::default(),
                        &users_entity(),
                        &PageRequest::new(1, 5, "/users"),
                    )
                    .await
                    .expect("execution succeeds");
                assert_eq!(page.total(), 25);
                assert_eq!(page.data().len(), 5);
            }
        }
    };
}
