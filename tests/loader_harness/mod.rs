//! Shared test harness for compiler and backend loader testing
//!
//! Provides the brewery type graph, a compiler with a frozen clock, helpers
//! turning GraphQL text into query steps, and seed documents for backends.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod loader_harness;
//! use loader_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod backend_loader_tests;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use graphstack::prelude::*;

pub const BREWERY_GRAPH: &str = r#"
settings:
  paging:
    maxPageSize: 50

contexts:
  history:
    fields:
      validOn:
        type: Date
        default: NOW
      availableOn:
        type: DateTime
        default: NOW

queries:
  brewery:
    type: Brewery
  breweryCollection:
    type: Brewery
    list: true
  breweryByCity:
    type: Brewery
    keys:
      - field: postalAddress.city
        argument: city
  beerCollection:
    type: Beer
    list: true

types:
  Brewery:
    uriTemplate: /breweries/{identifier}
    context: history
    fields:
      identifier:
        type: ID
      name:
        type: String
      founded:
        type: Date
      status:
        type: String
      postalAddress:
        type: Address
        kind: nestedObjectRef
      owner:
        type: Person
        kind: objectRef
      beers:
        type: Beer
        kind: collectionRef
      beerAgg:
        type: Beer
        kind: aggregate
    filters:
      name: {}
      status:
        default:
          eq: active
      founded: {}
      city:
        field: postalAddress.city
      postalAddress: {}
      owner: {}
    sortableBy:
      NAME:
        - field: name
      CITY_DESC:
        - field: postalAddress.city
          direction: DESC
      OWNER:
        - field: owner.lastName
        - field: name

  Address:
    fields:
      street:
        type: String
      city:
        type: String
    filters:
      city: {}

  Person:
    fields:
      identifier:
        type: ID
      firstName:
        type: String
      lastName:
        type: String
    filters:
      lastName: {}

  Beer:
    uriTemplate: /beers/{identifier}
    context: history
    fields:
      identifier:
        type: ID
      name:
        type: String
      abv:
        type: Float
      soldPerYear:
        type: Int
      retired:
        type: Boolean
      availableSince:
        type: DateTime
      brewery:
        type: Brewery
        kind: objectRef
    filters:
      name: {}
      abv: {}
      soldPerYear: {}
      retired: {}
      availableSince: {}
    sortableBy:
      NAME:
        - field: name
      ABV_DESC:
        - field: abv
          direction: DESC
"#;

/// Install a test writer subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn graph() -> Arc<TypeGraph> {
    Arc::new(TypeGraph::from_yaml_str(BREWERY_GRAPH).expect("brewery graph should load"))
}

/// The instant every compiler built by the harness uses for `NOW`
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub fn compiler() -> RequestCompiler {
    init_tracing();
    RequestCompiler::new(graph()).with_clock(Arc::new(FixedClock(fixed_now())))
}

/// The first query step of a GraphQL document
pub fn step(query: &str) -> QueryStep {
    step_with(query, Map::new())
}

pub fn step_with(query: &str, variables: Map<String, Value>) -> QueryStep {
    let paging = PagingSettings {
        max_page_size: 50,
        ..PagingSettings::default()
    };
    query_steps(query, &variables, &paging)
        .expect("query should parse")
        .into_iter()
        .next()
        .expect("query should have a root field")
}

pub fn compile(query: &str) -> Result<CompiledQuery, CompileError> {
    compiler().compile_query(&step(query))
}

pub fn compile_object(query: &str) -> ObjectRequest {
    match compile(query).expect("query should compile") {
        CompiledQuery::Object(request) => request,
        CompiledQuery::Collection(_) => panic!("expected an object request"),
    }
}

pub fn compile_collection(query: &str) -> CollectionRequest {
    match compile(query).expect("query should compile") {
        CompiledQuery::Collection(request) => request,
        CompiledQuery::Object(_) => panic!("expected a collection request"),
    }
}

pub fn path(type_name: &str, dotted: &str) -> FieldPath {
    graph()
        .resolve_path(type_name, dotted)
        .expect("path should resolve")
}

pub fn brewery_documents() -> Vec<Value> {
    vec![
        json!({
            "identifier": "b1",
            "name": "Brouwerij 't IJ",
            "founded": "1985-10-01",
            "status": "active",
            "postalAddress": {"street": "Funenkade 7", "city": "Amsterdam"},
            "owner": {"identifier": "p1", "firstName": "Kaspar", "lastName": "Peterson"},
            "beers": [
                {"identifier": "beer1", "name": "Columbus", "abv": 9.0, "soldPerYear": 1000, "retired": false},
                {"identifier": "beer2", "name": "IJwit", "abv": 6.5, "soldPerYear": 3000, "retired": false},
                {"identifier": "beer3", "name": "Natte", "abv": 6.5, "soldPerYear": 500, "retired": true}
            ]
        }),
        json!({
            "identifier": "b2",
            "name": "Heineken",
            "founded": "1864-02-15",
            "status": "active",
            "postalAddress": {"street": "Stadhouderskade 78", "city": "Amsterdam"},
            "owner": {"identifier": "p2", "firstName": "Gerard", "lastName": "Heineken"},
            "beers": [
                {"identifier": "beer4", "name": "Heineken", "abv": 5.0, "soldPerYear": 100000, "retired": false}
            ]
        }),
        json!({
            "identifier": "b3",
            "name": "De Molen",
            "founded": "2004-09-04",
            "status": "closed",
            "postalAddress": {"street": "Overtoom 81", "city": "Bodegraven"},
            "owner": {"identifier": "p3", "firstName": "Menno", "lastName": "Olivier"},
            "beers": [
                {"identifier": "beer5", "name": "Hel & Verdoemenis", "abv": 10.0, "soldPerYear": 800, "retired": false},
                {"identifier": "beer6", "name": "Vuur & Vlam", "abv": 6.2, "soldPerYear": 1500, "retired": false}
            ]
        }),
    ]
}

/// An in-memory backend holding the brewery documents
pub fn seeded_in_memory_backend() -> Result<InMemoryBackend> {
    let backend = InMemoryBackend::new().with_aggregate_source("beerAgg", "beers");
    for document in brewery_documents() {
        backend.insert("Brewery", document)?;
    }
    Ok(backend)
}

/// Names of the rows in order
pub fn names(rows: &[Row]) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| row.get("name").and_then(Value::as_str))
        .collect()
}
