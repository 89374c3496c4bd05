//! # graphstack
//!
//! Compiles GraphQL selections over a declaratively configured type graph into
//! backend-agnostic request trees.
//!
//! ## Features
//!
//! - **Configuration-Based**: Define types, filters, sort and context presets in YAML
//! - **Request Compiler**: Selection → `ObjectRequest` / `CollectionRequest`, with
//!   key, context, sort, paging and filter criteria
//! - **Filter Criteria Engine**: Structured filter arguments → boolean predicate trees,
//!   parsed by a registry of scalar-type parsers
//! - **Aggregates**: `count`, `intSum`, `floatAvg`, `stringJoin`, ... over related types
//! - **Pluggable Backends**: Compiled trees run on any `BackendLoader`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graphstack::prelude::*;
//!
//! let graph = Arc::new(TypeGraph::from_yaml_file("types.yaml")?);
//! let compiler = RequestCompiler::new(graph.clone());
//! let backend = InMemoryBackend::new();
//!
//! let steps = query_steps(
//!     r#"{ breweryCollection(sort: "NAME", first: 10) { name postalAddress { city } } }"#,
//!     &Map::new(),
//!     &graph.settings.paging,
//! )?;
//!
//! for step in &steps {
//!     if let CompiledQuery::Collection(request) = compiler.compile_query(step)? {
//!         let rows = backend.load_many(&request).await?;
//!     }
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod core;
pub mod filter;
pub mod selection;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        clock::{Clock, FixedClock, SystemClock},
        criteria::{FilterCriteria, FilterOperator},
        error::{CompileError, ErrorResponse},
        field::{FieldValue, ScalarType},
        loader::{BackendLoader, KeyCondition, Row},
        paging::{PagingCriteria, PagingSettings, PagingWindow},
        request::{
            AggregateFieldConfiguration, AggregateFunction, AggregateObjectFieldConfiguration,
            AggregateScalarType, CollectionRequest, CompiledQuery, ContextCriteria, FieldPath,
            KeyCriteria, ObjectRequest, SortCriteria, SortDirection,
        },
        type_config::{
            ContextConfiguration, ContextFieldConfiguration, FieldConfiguration, FieldKind,
            FilterConfiguration, KeyConfiguration, QueryConfiguration, SortableByConfiguration,
            TypeConfiguration,
        },
    };

    // === Config ===
    pub use crate::config::{CompilerSettings, TypeGraph};

    // === Compiler ===
    pub use crate::compiler::{RequestCompiler, inject_field_paths};
    pub use crate::filter::{FilterCriteriaEngine, FilterCriteriaParser, ParseContext};

    // === Selection ===
    #[cfg(feature = "graphql")]
    pub use crate::selection::graphql::query_steps;
    pub use crate::selection::{
        DirectiveMetadata, QueryStep, SelectedField, SelectionEnvironment, merge_selection,
    };

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryBackend;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Map, Value, json};
    pub use std::sync::Arc;
}
