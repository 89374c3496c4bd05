//! Core module containing the request tree, criteria and type graph entries

pub mod clock;
pub mod criteria;
pub mod error;
pub mod field;
pub mod loader;
pub mod paging;
pub mod request;
pub mod type_config;

pub use clock::{Clock, FixedClock, SystemClock};
pub use criteria::{FilterCriteria, FilterOperator};
pub use error::{CompileError, ErrorResponse};
pub use field::{FieldValue, ScalarType};
pub use loader::{BackendLoader, KeyCondition, Row};
pub use paging::{PagingCriteria, PagingSettings, PagingWindow};
pub use request::{
    AggregateFieldConfiguration, AggregateFunction, AggregateObjectFieldConfiguration,
    AggregateScalarType, CollectionRequest, CompiledQuery, ContextCriteria, FieldPath,
    KeyCriteria, ObjectRequest, SortCriteria, SortDirection,
};
pub use type_config::{
    ContextConfiguration, ContextFieldConfiguration, FieldConfiguration, FieldKind,
    FilterConfiguration, KeyConfiguration, QueryConfiguration, SortableByConfiguration,
    TypeConfiguration,
};
