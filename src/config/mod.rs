//! Type graph loading and preparation
//!
//! The type graph is read from YAML once, prepared (names filled in, presets
//! resolved into field paths, references checked) and is read-only afterwards.

use crate::core::error::CompileError;
use crate::core::paging::PagingSettings;
use crate::core::request::{FieldPath, SortCriteria};
use crate::core::type_config::{
    ContextConfiguration, FieldKind, QueryConfiguration, TypeConfiguration,
};
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reserved argument names and sentinels used by the compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    #[serde(default = "default_sort_argument")]
    pub sort_argument: String,

    #[serde(default = "default_filter_argument")]
    pub filter_argument: String,

    #[serde(default = "default_context_argument")]
    pub context_argument: String,

    /// Literal resolved to the current instant for Date/DateTime values
    #[serde(default = "default_now_sentinel")]
    pub now_sentinel: String,

    #[serde(default)]
    pub paging: PagingSettings,
}

fn default_sort_argument() -> String {
    "sort".to_string()
}

fn default_filter_argument() -> String {
    "filter".to_string()
}

fn default_context_argument() -> String {
    "context".to_string()
}

fn default_now_sentinel() -> String {
    "NOW".to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            sort_argument: default_sort_argument(),
            filter_argument: default_filter_argument(),
            context_argument: default_context_argument(),
            now_sentinel: default_now_sentinel(),
            paging: PagingSettings::default(),
        }
    }
}

impl CompilerSettings {
    /// Arguments that never become key criteria
    pub fn is_reserved_argument(&self, name: &str) -> bool {
        name == self.sort_argument
            || name == self.filter_argument
            || name == self.context_argument
            || self.paging.is_paging_argument(name)
    }
}

/// Complete declarative type graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeGraph {
    #[serde(default)]
    pub settings: CompilerSettings,

    /// Named context presets
    #[serde(default)]
    pub contexts: IndexMap<String, ContextConfiguration>,

    /// Root query fields
    #[serde(default)]
    pub queries: IndexMap<String, QueryConfiguration>,

    #[serde(default)]
    pub types: IndexMap<String, TypeConfiguration>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and prepare a type graph from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load and prepare a type graph from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut graph: Self = serde_yaml::from_str(yaml)?;
        graph.prepare()?;
        tracing::debug!(
            types = graph.types.len(),
            queries = graph.queries.len(),
            "Loaded type graph"
        );
        Ok(graph)
    }

    pub fn with_type(mut self, type_config: TypeConfiguration) -> Self {
        self.types.insert(type_config.name.clone(), type_config);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, query: QueryConfiguration) -> Self {
        self.queries.insert(name.into(), query);
        self
    }

    pub fn with_context(mut self, name: impl Into<String>, context: ContextConfiguration) -> Self {
        self.contexts.insert(name.into(), context);
        self
    }

    pub fn with_settings(mut self, settings: CompilerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Prepare a graph assembled with the builder methods
    pub fn build(mut self) -> Result<Self, CompileError> {
        self.prepare()?;
        Ok(self)
    }

    /// Fill in names, check references and precompute sort presets and identity paths
    ///
    /// Preparing twice is harmless.
    pub fn prepare(&mut self) -> Result<(), CompileError> {
        for (type_name, type_config) in self.types.iter_mut() {
            type_config.name = type_name.clone();
            for (field_name, field) in type_config.fields.iter_mut() {
                field.name = field_name.clone();
            }
        }

        self.check_references()?;

        let mut resolved = Vec::with_capacity(self.types.len());
        for (type_name, type_config) in &self.types {
            let mut sort_presets = IndexMap::new();
            for (preset, entries) in &type_config.sortable_by {
                let criteria = entries
                    .iter()
                    .map(|entry| {
                        Ok(SortCriteria {
                            field_path: self.resolve_injectable_path(type_name, &entry.field)?,
                            direction: entry.direction,
                        })
                    })
                    .collect::<Result<Vec<_>, CompileError>>()?;
                sort_presets.insert(preset.clone(), criteria);
            }

            let identity_paths = type_config
                .identity_placeholders()
                .into_iter()
                .map(|placeholder| self.resolve_injectable_path(type_name, placeholder))
                .collect::<Result<Vec<_>, CompileError>>()?;

            resolved.push((type_name.clone(), sort_presets, identity_paths));
        }

        for (type_name, sort_presets, identity_paths) in resolved {
            if let Some(type_config) = self.types.get_mut(&type_name) {
                type_config.sort_presets = sort_presets;
                type_config.identity_paths = identity_paths;
            }
        }

        Ok(())
    }

    fn check_references(&self) -> Result<(), CompileError> {
        for (type_name, type_config) in &self.types {
            for field in type_config.fields.values() {
                if field.kind != FieldKind::Scalar && !self.types.contains_key(&field.type_name) {
                    return Err(CompileError::configuration(format!(
                        "Field {}.{} references unknown type {}",
                        type_name, field.name, field.type_name
                    )));
                }
                for key in &field.keys {
                    self.resolve_injectable_path(&field.type_name, &key.field)?;
                }
            }

            for (filter_name, filter) in &type_config.filters {
                let target = filter.field.as_deref().unwrap_or(filter_name);
                self.resolve_path(type_name, target)?;
            }

            if let Some(context) = &type_config.context
                && !self.contexts.contains_key(context)
            {
                return Err(CompileError::configuration(format!(
                    "Type {} uses unknown context preset '{}'",
                    type_name, context
                )));
            }
        }

        for (query_name, query) in &self.queries {
            if !self.types.contains_key(&query.type_name) {
                return Err(CompileError::configuration(format!(
                    "Query {} returns unknown type {}",
                    query_name, query.type_name
                )));
            }
            for key in &query.keys {
                self.resolve_injectable_path(&query.type_name, &key.field)?;
            }
        }

        Ok(())
    }

    /// Look up a type, failing with a configuration error when it is missing
    pub fn type_configuration(&self, name: &str) -> Result<&TypeConfiguration, CompileError> {
        self.types
            .get(name)
            .ok_or_else(|| CompileError::configuration(format!("Unknown type: {}", name)))
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeConfiguration> {
        self.types.get(name)
    }

    pub fn query(&self, name: &str) -> Option<&QueryConfiguration> {
        self.queries.get(name)
    }

    pub fn context(&self, name: &str) -> Option<&ContextConfiguration> {
        self.contexts.get(name)
    }

    /// Resolve a dotted field path (`postalAddress.city`) starting at `type_name`
    pub fn resolve_path(&self, type_name: &str, dotted: &str) -> Result<FieldPath, CompileError> {
        let mut current = self.type_configuration(type_name)?;
        let mut path: Option<FieldPath> = None;
        let mut segments = dotted.split('.').peekable();

        while let Some(segment) = segments.next() {
            let field = current.field(segment).ok_or_else(|| {
                CompileError::configuration(format!(
                    "Field '{}' does not exist on type {}",
                    segment, current.name
                ))
            })?;

            path = Some(match path {
                None => FieldPath::single(field.clone()),
                Some(prefix) => prefix.join(field.clone()),
            });

            if segments.peek().is_some() {
                if field.is_scalar() {
                    return Err(CompileError::configuration(format!(
                        "Field path '{}' continues past scalar field {}.{}",
                        dotted, current.name, field.name
                    )));
                }
                current = self.type_configuration(&field.type_name)?;
            }
        }

        path.ok_or_else(|| CompileError::configuration("Empty field path"))
    }

    fn resolve_injectable_path(
        &self,
        type_name: &str,
        dotted: &str,
    ) -> Result<FieldPath, CompileError> {
        let path = self.resolve_path(type_name, dotted)?;
        path.ensure_injectable()?;
        Ok(path)
    }
}
