//! Compiled, backend-agnostic request trees
//!
//! An [`ObjectRequest`] describes a single-object fetch, a [`CollectionRequest`]
//! a multi-object fetch. Both are produced by the request compiler, never mutated
//! afterwards, and handed to a backend loader.

use crate::core::criteria::FilterCriteria;
use crate::core::error::CompileError;
use crate::core::field::FieldValue;
use crate::core::paging::PagingCriteria;
use crate::core::type_config::{FieldConfiguration, FieldKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered chain of field configurations, crossing relations from a root type
///
/// A path always holds at least one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    segments: Vec<FieldConfiguration>,
}

impl FieldPath {
    pub fn single(field: FieldConfiguration) -> Self {
        Self {
            segments: vec![field],
        }
    }

    /// Extend the path with a field of the current leaf's target type
    pub fn join(mut self, field: FieldConfiguration) -> Self {
        self.segments.push(field);
        self
    }

    /// Concatenate `other` after this path
    pub fn concat(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[FieldConfiguration] {
        &self.segments
    }

    /// The last segment, the field the path points at
    pub fn leaf(&self) -> &FieldConfiguration {
        // Constructors never produce an empty path
        &self.segments[self.segments.len() - 1]
    }

    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Check the path can be materialised as a scalar column of the root request
    ///
    /// Only to-one hops (`objectRef`, `nestedObjectRef`) may precede the leaf,
    /// and the leaf must be a scalar.
    pub fn ensure_injectable(&self) -> Result<(), CompileError> {
        let hops = &self.segments[..self.segments.len() - 1];
        if let Some(hop) = hops
            .iter()
            .find(|f| matches!(f.kind, FieldKind::CollectionRef | FieldKind::Aggregate))
        {
            return Err(CompileError::configuration(format!(
                "Field path '{}' crosses to-many field '{}'",
                self, hop.name
            )));
        }
        if !self.leaf().is_scalar() {
            return Err(CompileError::configuration(format!(
                "Field path '{}' does not end on a scalar field",
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("."))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortCriteria {
    pub field_path: FieldPath,
    pub direction: SortDirection,
}

/// One identity constraint; a request's key criteria combine as AND
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCriteria {
    pub field_path: FieldPath,
    pub value: FieldValue,
}

/// Point-in-time/versioning values of a named context preset
#[derive(Debug, Clone, PartialEq)]
pub struct ContextCriteria {
    pub name: String,
    pub values: Vec<(String, FieldValue)>,
}

impl ContextCriteria {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

/// Result type of an aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateScalarType {
    Int,
    Float,
    String,
}

/// What a function demands of the aggregated field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFieldProperty {
    None,
    Numeric,
    Text,
}

/// Operation performed by an aggregate function, independent of its result type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOperation {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    IntSum,
    IntAvg,
    IntMin,
    IntMax,
    FloatSum,
    FloatAvg,
    FloatMin,
    FloatMax,
    StringJoin,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 10] = [
        AggregateFunction::Count,
        AggregateFunction::IntSum,
        AggregateFunction::IntAvg,
        AggregateFunction::IntMin,
        AggregateFunction::IntMax,
        AggregateFunction::FloatSum,
        AggregateFunction::FloatAvg,
        AggregateFunction::FloatMin,
        AggregateFunction::FloatMax,
        AggregateFunction::StringJoin,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::IntSum => "intSum",
            AggregateFunction::IntAvg => "intAvg",
            AggregateFunction::IntMin => "intMin",
            AggregateFunction::IntMax => "intMax",
            AggregateFunction::FloatSum => "floatSum",
            AggregateFunction::FloatAvg => "floatAvg",
            AggregateFunction::FloatMin => "floatMin",
            AggregateFunction::FloatMax => "floatMax",
            AggregateFunction::StringJoin => "stringJoin",
        }
    }

    pub fn result_type(&self) -> AggregateScalarType {
        match self {
            AggregateFunction::Count
            | AggregateFunction::IntSum
            | AggregateFunction::IntAvg
            | AggregateFunction::IntMin
            | AggregateFunction::IntMax => AggregateScalarType::Int,
            AggregateFunction::FloatSum
            | AggregateFunction::FloatAvg
            | AggregateFunction::FloatMin
            | AggregateFunction::FloatMax => AggregateScalarType::Float,
            AggregateFunction::StringJoin => AggregateScalarType::String,
        }
    }

    pub fn required_property(&self) -> AggregateFieldProperty {
        match self {
            AggregateFunction::Count => AggregateFieldProperty::None,
            AggregateFunction::StringJoin => AggregateFieldProperty::Text,
            _ => AggregateFieldProperty::Numeric,
        }
    }

    pub fn operation(&self) -> AggregateOperation {
        match self {
            AggregateFunction::Count => AggregateOperation::Count,
            AggregateFunction::IntSum | AggregateFunction::FloatSum => AggregateOperation::Sum,
            AggregateFunction::IntAvg | AggregateFunction::FloatAvg => AggregateOperation::Avg,
            AggregateFunction::IntMin | AggregateFunction::FloatMin => AggregateOperation::Min,
            AggregateFunction::IntMax | AggregateFunction::FloatMax => AggregateOperation::Max,
            AggregateFunction::StringJoin => AggregateOperation::Join,
        }
    }
}

/// One selected aggregate function
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateFieldConfiguration {
    /// Response key of the selection
    pub alias: String,
    pub function: AggregateFunction,
    pub scalar_type: AggregateScalarType,
    /// Aggregated field; `None` only for a row count
    pub target_field: Option<FieldConfiguration>,
    pub distinct: bool,
    /// Separator of `stringJoin`
    pub separator: Option<String>,
}

/// An aggregate relation field with its selected functions
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateObjectFieldConfiguration {
    pub field: FieldConfiguration,
    pub aggregate_fields: Vec<AggregateFieldConfiguration>,
    /// Restricts the aggregated rows
    pub filter_criteria: Option<FilterCriteria>,
}

/// Compiled single-object fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRequest {
    pub type_name: String,
    pub scalar_fields: Vec<FieldConfiguration>,
    pub object_fields: IndexMap<String, ObjectRequest>,
    pub nested_object_fields: IndexMap<String, ObjectRequest>,
    pub collection_object_fields: IndexMap<String, CollectionRequest>,
    pub aggregate_object_fields: Vec<AggregateObjectFieldConfiguration>,
    pub key_criteria: Vec<KeyCriteria>,
    pub context_criteria: Option<ContextCriteria>,
    pub filter_criteria: Option<FilterCriteria>,
}

impl ObjectRequest {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn has_scalar_field(&self, name: &str) -> bool {
        self.scalar_fields.iter().any(|f| f.name == name)
    }

    pub fn scalar_field_names(&self) -> Vec<&str> {
        self.scalar_fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Append a scalar field unless one with the same name is already present
    pub fn with_scalar_field(mut self, field: FieldConfiguration) -> Self {
        if !self.has_scalar_field(&field.name) {
            self.scalar_fields.push(field);
        }
        self
    }

    /// Whether the relation field already has an entry in any relation container
    pub fn has_relation_field(&self, name: &str) -> bool {
        self.object_fields.contains_key(name)
            || self.nested_object_fields.contains_key(name)
            || self.collection_object_fields.contains_key(name)
            || self.aggregate_object_fields.iter().any(|a| a.field.name == name)
    }
}

/// Compiled multi-object fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionRequest {
    pub object_request: ObjectRequest,
    pub sort_criterias: Vec<SortCriteria>,
    pub paging_criteria: Option<PagingCriteria>,
}

/// Result of compiling a root query field
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledQuery {
    Object(ObjectRequest),
    Collection(CollectionRequest),
}

impl CompiledQuery {
    pub fn as_object(&self) -> Option<&ObjectRequest> {
        match self {
            CompiledQuery::Object(request) => Some(request),
            CompiledQuery::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionRequest> {
        match self {
            CompiledQuery::Collection(request) => Some(request),
            CompiledQuery::Object(_) => None,
        }
    }

    /// The object request at the root, for either shape
    pub fn object_request(&self) -> &ObjectRequest {
        match self {
            CompiledQuery::Object(request) => request,
            CompiledQuery::Collection(request) => &request.object_request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_field() -> FieldConfiguration {
        FieldConfiguration::scalar("name", "String")
    }

    #[test]
    fn test_with_scalar_field_deduplicates_by_name() {
        let request = ObjectRequest::new("Brewery")
            .with_scalar_field(name_field())
            .with_scalar_field(FieldConfiguration::scalar("identifier", "ID"))
            .with_scalar_field(name_field().with_text());

        assert_eq!(request.scalar_field_names(), vec!["name", "identifier"]);
        assert!(!request.scalar_fields[0].text, "first occurrence wins");
    }

    #[test]
    fn test_field_path_display_and_leaf() {
        let path = FieldPath::single(FieldConfiguration::nested_object_ref(
            "postalAddress",
            "Address",
        ))
        .join(FieldConfiguration::scalar("city", "String"));

        assert_eq!(path.to_string(), "postalAddress.city");
        assert_eq!(path.leaf().name, "city");
        assert!(path.is_nested());
        assert!(!FieldPath::single(name_field()).is_nested());
    }

    #[test]
    fn test_ensure_injectable() {
        let city = FieldPath::single(FieldConfiguration::nested_object_ref(
            "postalAddress",
            "Address",
        ))
        .join(FieldConfiguration::scalar("city", "String"));
        assert!(city.ensure_injectable().is_ok());

        let across = FieldPath::single(FieldConfiguration::collection_ref("beers", "Beer"))
            .join(name_field());
        let err = across.ensure_injectable().expect_err("to-many hop");
        assert!(err.is_configuration_error());

        let relation = FieldPath::single(FieldConfiguration::object_ref("owner", "Person"));
        assert!(relation.ensure_injectable().is_err());
    }

    #[test]
    fn test_field_path_concat() {
        let prefix = FieldPath::single(FieldConfiguration::object_ref("owner", "Person"));
        let suffix = FieldPath::single(FieldConfiguration::scalar("lastName", "String"));
        assert_eq!(prefix.concat(&suffix).names(), vec!["owner", "lastName"]);
    }

    #[test]
    fn test_aggregate_function_table() {
        use AggregateFieldProperty as P;
        use AggregateScalarType as T;

        let expected = [
            ("count", T::Int, P::None),
            ("intSum", T::Int, P::Numeric),
            ("intAvg", T::Int, P::Numeric),
            ("intMin", T::Int, P::Numeric),
            ("intMax", T::Int, P::Numeric),
            ("floatSum", T::Float, P::Numeric),
            ("floatAvg", T::Float, P::Numeric),
            ("floatMin", T::Float, P::Numeric),
            ("floatMax", T::Float, P::Numeric),
            ("stringJoin", T::String, P::Text),
        ];

        for (name, result_type, property) in expected {
            let function = AggregateFunction::from_name(name).expect("known function");
            assert_eq!(function.name(), name);
            assert_eq!(function.result_type(), result_type, "{}", name);
            assert_eq!(function.required_property(), property, "{}", name);
        }
        assert_eq!(AggregateFunction::from_name("intRange"), None);
    }

    #[test]
    fn test_context_criteria_lookup() {
        let context = ContextCriteria {
            name: "history".to_string(),
            values: vec![("validOn".to_string(), FieldValue::Integer(1))],
        };
        assert_eq!(context.get("validOn"), Some(&FieldValue::Integer(1)));
        assert_eq!(context.get("availableOn"), None);
    }

    #[test]
    fn test_compiled_query_accessors() {
        let collection = CompiledQuery::Collection(CollectionRequest {
            object_request: ObjectRequest::new("Beer"),
            ..CollectionRequest::default()
        });
        assert!(collection.as_object().is_none());
        assert_eq!(collection.object_request().type_name, "Beer");
    }
}
