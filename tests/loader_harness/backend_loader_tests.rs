//! Macro-generated test suite for `BackendLoader` contract validation.
//!
//! The `backend_loader_tests!` macro generates a test module that runs compiled
//! brewery queries against any `BackendLoader` holding the harness documents.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod loader_harness;
//!
//! use loader_harness::*;
//!
//! backend_loader_tests!(seeded_in_memory_backend().expect("seed"));
//! ```
//!
//! # Generated Tests
//!
//! - keys: single row by identifier, by a nested key override, missing key
//! - collections: sorting, paging, filters with defaults, `not` and dates
//! - relations: embedded objects, nested collections with their own criteria
//! - aggregates: every function family, `distinct`, aggregate filters
//! - batching: order-preserving `batch_load_single` / `batch_load_many`

/// Generate a `BackendLoader` conformance test suite.
///
/// `$factory` must evaluate to a loader seeded with `brewery_documents()`. It is
/// re-evaluated for each test to ensure isolation.
#[macro_export]
macro_rules! backend_loader_tests {
    ($factory:expr) => {
        mod backend_loader_contract_tests {
            use super::*;

            async fn load_one(query: &str) -> Row {
                let loader = $factory;
                let request = compile_object(query);
                loader
                    .load_single(&request)
                    .await
                    .expect("load should succeed")
                    .expect("row should exist")
            }

            async fn load_all(query: &str) -> Vec<Row> {
                let loader = $factory;
                let request = compile_collection(query);
                loader.load_many(&request).await.expect("load should succeed")
            }

            // ==================================================================
            // Keys
            // ==================================================================

            #[tokio::test]
            async fn test_load_single_by_identifier() {
                let row = load_one(r#"{ brewery(identifier: "b2") { name founded } }"#).await;

                assert_eq!(row["name"], json!("Heineken"));
                assert_eq!(row["founded"], json!("1864-02-15"));
                assert_eq!(row["identifier"], json!("b2"), "identity column is injected");
            }

            #[tokio::test]
            async fn test_load_single_by_nested_key_override() {
                let row = load_one(r#"{ breweryByCity(city: "Bodegraven") { name } }"#).await;

                assert_eq!(row["name"], json!("De Molen"));
                assert_eq!(row["postalAddress"]["city"], json!("Bodegraven"));
            }

            #[tokio::test]
            async fn test_load_single_missing_key() {
                let loader = $factory;
                let request = compile_object(r#"{ brewery(identifier: "b404") { name } }"#);
                let row = loader.load_single(&request).await.expect("load should succeed");
                assert!(row.is_none());
            }

            // ==================================================================
            // Collections
            // ==================================================================

            #[tokio::test]
            async fn test_load_many_sorted_by_preset() {
                let rows = load_all(r#"{ breweryCollection(sort: "NAME") { identifier } }"#).await;
                assert_eq!(names(&rows), vec!["Brouwerij 't IJ", "De Molen", "Heineken"]);
            }

            #[tokio::test]
            async fn test_load_many_sorted_descending_across_nested_object() {
                let rows =
                    load_all(r#"{ breweryCollection(sort: "CITY_DESC") { name } }"#).await;
                assert_eq!(names(&rows)[0], "De Molen");
            }

            #[tokio::test]
            async fn test_load_many_sorted_across_object_relation() {
                let rows = load_all(r#"{ breweryCollection(sort: "OWNER") { name } }"#).await;
                assert_eq!(names(&rows), vec!["Heineken", "De Molen", "Brouwerij 't IJ"]);
            }

            #[tokio::test]
            async fn test_load_many_paged() {
                let rows = load_all(
                    r#"{ breweryCollection(sort: "NAME", first: 2, offset: 1) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["De Molen", "Heineken"]);

                let rows = load_all(
                    r#"{ breweryCollection(sort: "NAME", page: 2, pageSize: 2) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["Heineken"]);
            }

            #[tokio::test]
            async fn test_load_many_filter_default_body() {
                let rows = load_all(
                    r#"{ breweryCollection(sort: "NAME", filter: {status: {}}) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["Brouwerij 't IJ", "Heineken"]);
            }

            #[tokio::test]
            async fn test_load_many_filter_not() {
                let rows = load_all(
                    r#"{ breweryCollection(sort: "NAME", filter: {name: {not: {eq: "Heineken"}}}) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["Brouwerij 't IJ", "De Molen"]);
            }

            #[tokio::test]
            async fn test_load_many_filter_nested_object() {
                let rows = load_all(
                    r#"{ breweryCollection(sort: "NAME", filter: {postalAddress: {city: {eq: "Amsterdam"}}}) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["Brouwerij 't IJ", "Heineken"]);

                let rows = load_all(
                    r#"{ breweryCollection(filter: {city: {in: ["Bodegraven"]}}) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["De Molen"]);
            }

            #[tokio::test]
            async fn test_load_many_filter_on_dates() {
                let rows = load_all(
                    r#"{ breweryCollection(sort: "NAME", filter: {founded: {lt: "1990-01-01"}}) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["Brouwerij 't IJ", "Heineken"]);

                let rows = load_all(
                    r#"{ breweryCollection(filter: {founded: {lte: "NOW", gt: "2000-01-01"}}) { name } }"#,
                )
                .await;
                assert_eq!(names(&rows), vec!["De Molen"]);
            }

            // ==================================================================
            // Relations
            // ==================================================================

            #[tokio::test]
            async fn test_embedded_relations_are_projected() {
                let row = load_one(
                    r#"{ brewery(identifier: "b1") { name owner { lastName } postalAddress { city } } }"#,
                )
                .await;

                assert_eq!(row["owner"]["lastName"], json!("Peterson"));
                assert!(row["owner"].get("firstName").is_none(), "not selected");
                assert_eq!(row["postalAddress"]["city"], json!("Amsterdam"));
            }

            #[tokio::test]
            async fn test_nested_collection_with_own_criteria() {
                let row = load_one(
                    r#"{ brewery(identifier: "b1") { beers(sort: "ABV_DESC", filter: {retired: {eq: false}}) { name abv } } }"#,
                )
                .await;

                let beers: Vec<Row> = row["beers"]
                    .as_array()
                    .expect("beers is a list")
                    .iter()
                    .filter_map(|beer| beer.as_object().cloned())
                    .collect();
                assert_eq!(names(&beers), vec!["Columbus", "IJwit"]);
            }

            // ==================================================================
            // Aggregates
            // ==================================================================

            #[tokio::test]
            async fn test_aggregate_functions() {
                let row = load_one(
                    r#"{ brewery(identifier: "b1") { beerAgg {
                        count
                        intSum(field: "soldPerYear")
                        intAvg(field: "soldPerYear")
                        floatAvg(field: "abv")
                        strongest: floatMax(field: "abv")
                        intMin(field: "soldPerYear")
                        stringJoin(field: "name", separator: "|")
                    } } }"#,
                )
                .await;
                let aggregates = &row["beerAgg"];

                assert_eq!(aggregates["count"], json!(3));
                assert_eq!(aggregates["intSum"], json!(4500));
                assert_eq!(aggregates["intAvg"], json!(1500));
                let average = aggregates["floatAvg"].as_f64().expect("float average");
                assert!((average - 22.0 / 3.0).abs() < 1e-9);
                assert_eq!(aggregates["strongest"], json!(9.0));
                assert_eq!(aggregates["intMin"], json!(500));
                assert_eq!(aggregates["stringJoin"], json!("Columbus|IJwit|Natte"));
            }

            #[tokio::test]
            async fn test_aggregate_distinct_and_filter() {
                let row = load_one(
                    r#"{ brewery(identifier: "b1") { beerAgg(filter: {retired: {eq: false}}) {
                        count
                        abvs: count(field: "abv", distinct: true)
                    } } }"#,
                )
                .await;

                assert_eq!(row["beerAgg"]["count"], json!(2));
                assert_eq!(row["beerAgg"]["abvs"], json!(2));

                let row = load_one(
                    r#"{ brewery(identifier: "b1") { beerAgg { count(field: "abv", distinct: true) } } }"#,
                )
                .await;
                assert_eq!(row["beerAgg"]["count"], json!(2));
            }

            #[tokio::test]
            async fn test_aggregate_over_no_rows() {
                let row = load_one(
                    r#"{ brewery(identifier: "b2") { beerAgg(filter: {retired: {eq: true}}) {
                        count
                        floatSum(field: "abv")
                        floatMax(field: "abv")
                    } } }"#,
                )
                .await;

                assert_eq!(row["beerAgg"]["count"], json!(0));
                assert_eq!(row["beerAgg"]["floatSum"], json!(0.0));
                assert_eq!(row["beerAgg"]["floatMax"], Value::Null);
            }

            // ==================================================================
            // Batching
            // ==================================================================

            #[tokio::test]
            async fn test_batch_load_single_keeps_key_order() {
                let loader = $factory;
                let request = compile_object(r#"{ brewery { name } }"#);
                let identifier = path("Brewery", "identifier");
                let keys: Vec<KeyCondition> = ["b3", "b404", "b1"]
                    .into_iter()
                    .map(|id| {
                        vec![KeyCriteria {
                            field_path: identifier.clone(),
                            value: FieldValue::String(id.to_string()),
                        }]
                    })
                    .collect();

                let results = loader
                    .batch_load_single(&keys, &request)
                    .await
                    .expect("batch should succeed");

                assert_eq!(results.len(), 3);
                assert_eq!(results[0].0, keys[0]);
                let found: Vec<Option<&str>> = results
                    .iter()
                    .map(|(_, row)| row.as_ref().and_then(|r| r["name"].as_str()))
                    .collect();
                assert_eq!(found, vec![Some("De Molen"), None, Some("Brouwerij 't IJ")]);
            }

            #[tokio::test]
            async fn test_batch_load_many_groups_rows() {
                let loader = $factory;
                let request =
                    compile_collection(r#"{ breweryCollection(sort: "NAME") { name } }"#);
                let status = path("Brewery", "status");
                let keys: Vec<KeyCondition> = ["active", "closed"]
                    .into_iter()
                    .map(|value| {
                        vec![KeyCriteria {
                            field_path: status.clone(),
                            value: FieldValue::String(value.to_string()),
                        }]
                    })
                    .collect();

                let results = loader
                    .batch_load_many(&keys, &request)
                    .await
                    .expect("batch should succeed");

                assert_eq!(names(&results[0].1), vec!["Brouwerij 't IJ", "Heineken"]);
                assert_eq!(names(&results[1].1), vec!["De Molen"]);
            }
        }
    };
}
