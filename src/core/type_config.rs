//! Declarative type graph entries: types, fields, filter/sort/context presets

use crate::core::field::ScalarType;
use crate::core::request::{FieldPath, SortCriteria, SortDirection};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Classification tag of a field
///
/// Exactly one tag per field. The compiler matches on it exhaustively to decide
/// which container of an `ObjectRequest` the field lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// A leaf value stored on the type itself
    #[default]
    Scalar,
    /// A to-one relation to a type with its own identity
    ObjectRef,
    /// An embedded object without identity of its own
    NestedObjectRef,
    /// Aggregation functions computed over a related type
    Aggregate,
    /// A to-many relation
    CollectionRef,
}

/// Configuration of one field of a type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfiguration {
    /// Field name, taken from the key of the `fields` map
    #[serde(skip)]
    pub name: String,

    /// Scalar type name (`String`, `Int`, ...) or target type name for relations
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub kind: FieldKind,

    /// Explicitly marks the field as numeric for aggregates
    #[serde(default)]
    pub numeric: bool,

    /// Explicitly marks the field as text for aggregates
    #[serde(default)]
    pub text: bool,

    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Argument-to-field overrides for key arguments supplied on this relation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeyConfiguration>,
}

impl FieldConfiguration {
    fn with_kind(name: impl Into<String>, type_name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            kind,
            numeric: false,
            text: false,
            default_value: None,
            keys: Vec::new(),
        }
    }

    pub fn scalar(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_kind(name, type_name, FieldKind::Scalar)
    }

    pub fn object_ref(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_kind(name, type_name, FieldKind::ObjectRef)
    }

    pub fn nested_object_ref(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_kind(name, type_name, FieldKind::NestedObjectRef)
    }

    pub fn collection_ref(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_kind(name, type_name, FieldKind::CollectionRef)
    }

    pub fn aggregate(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::with_kind(name, type_name, FieldKind::Aggregate)
    }

    pub fn with_numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn with_text(mut self) -> Self {
        self.text = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_key(mut self, key: KeyConfiguration) -> Self {
        self.keys.push(key);
        self
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == FieldKind::Scalar
    }

    /// The built-in scalar type of a scalar field, `None` for relations and custom scalars
    pub fn scalar_type(&self) -> Option<ScalarType> {
        if self.is_scalar() {
            ScalarType::from_type_name(&self.type_name)
        } else {
            None
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.is_scalar() && (self.numeric || self.scalar_type().is_some_and(|t| t.is_numeric()))
    }

    pub fn is_text(&self) -> bool {
        self.is_scalar() && (self.text || self.scalar_type() == Some(ScalarType::String))
    }
}

/// Maps a key argument onto a (possibly dotted) field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfiguration {
    /// Target field path, e.g. `identifier` or `postalAddress.city`
    pub field: String,

    /// Argument name, defaults to the field path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

impl KeyConfiguration {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            argument: None,
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn argument_name(&self) -> &str {
        self.argument.as_deref().unwrap_or(&self.field)
    }
}

/// A named filter exposed on a type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfiguration {
    /// Target field path override, defaults to the filter name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Default operator body (`{eq: ...}`) or bare value used for empty/null operators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FilterConfiguration {
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// One entry of a configured sort preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortableByConfiguration {
    /// Field path, dotted across to-one relations
    pub field: String,

    #[serde(default)]
    pub direction: SortDirection,
}

impl SortableByConfiguration {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Fields of a point-in-time/versioning context preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextConfiguration {
    #[serde(default)]
    pub fields: IndexMap<String, ContextFieldConfiguration>,
}

impl ContextConfiguration {
    pub fn with_field(mut self, name: impl Into<String>, field: ContextFieldConfiguration) -> Self {
        self.fields.insert(name.into(), field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFieldConfiguration {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ContextFieldConfiguration {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A root query field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfiguration {
    #[serde(rename = "type")]
    pub type_name: String,

    /// Whether the query returns a collection
    #[serde(default)]
    pub list: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeyConfiguration>,
}

impl QueryConfiguration {
    pub fn single(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            list: false,
            keys: Vec::new(),
        }
    }

    pub fn collection(type_name: impl Into<String>) -> Self {
        Self {
            list: true,
            ..Self::single(type_name)
        }
    }

    pub fn with_key(mut self, key: KeyConfiguration) -> Self {
        self.keys.push(key);
        self
    }
}

/// Configuration of one exposed object type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConfiguration {
    /// Type name, taken from the key of the `types` map
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub fields: IndexMap<String, FieldConfiguration>,

    #[serde(default)]
    pub filters: IndexMap<String, FilterConfiguration>,

    #[serde(default)]
    pub sortable_by: IndexMap<String, Vec<SortableByConfiguration>>,

    /// Identity template such as `/breweries/{identifier}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_template: Option<String>,

    /// Name of the context preset applying to this type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(skip)]
    pub(crate) sort_presets: IndexMap<String, Vec<SortCriteria>>,

    #[serde(skip)]
    pub(crate) identity_paths: Vec<FieldPath>,
}

impl TypeConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: FieldConfiguration) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, filter: FilterConfiguration) -> Self {
        self.filters.insert(name.into(), filter);
        self
    }

    pub fn with_sort(
        mut self,
        name: impl Into<String>,
        entries: Vec<SortableByConfiguration>,
    ) -> Self {
        self.sortable_by.insert(name.into(), entries);
        self
    }

    pub fn with_uri_template(mut self, template: impl Into<String>) -> Self {
        self.uri_template = Some(template.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldConfiguration> {
        self.fields.get(name)
    }

    /// Precomputed sort criteria of a named preset
    ///
    /// Empty until the owning `TypeGraph` has been prepared.
    pub fn sort_preset(&self, name: &str) -> Option<&[SortCriteria]> {
        self.sort_presets.get(name).map(Vec::as_slice)
    }

    /// Field paths referenced by the identity template, resolved at preparation
    pub fn identity_paths(&self) -> &[FieldPath] {
        &self.identity_paths
    }

    /// Placeholder names of the identity template, in order of appearance
    pub fn identity_placeholders(&self) -> Vec<&str> {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let regex = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("placeholder pattern is valid")
        });

        let Some(template) = self.uri_template.as_deref() else {
            return Vec::new();
        };

        let mut names: Vec<&str> = Vec::new();
        for capture in regex.captures_iter(template) {
            if let Some(name) = capture.get(1).map(|m| m.as_str())
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }
}
