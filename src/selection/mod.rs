//! Selection environment consumed by the request compiler
//!
//! The execution engine hands the compiler one query step at a time: the
//! current field with its resolved arguments, directive metadata and the tree
//! of selected sub-fields. Traversal is explicit, from a parent to its named
//! children, keyed by response key (alias or field name).

#[cfg(feature = "graphql")]
pub mod graphql;

use crate::core::paging::PagingWindow;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

/// Name of the introspection field the compiler ignores
pub const TYPENAME_FIELD: &str = "__typename";

/// A directive applied to a selected field, with resolved argument values
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveMetadata {
    pub name: String,
    pub arguments: IndexMap<String, Value>,
}

impl DirectiveMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: IndexMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    fn condition(&self) -> bool {
        self.arguments
            .get("if")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Evaluate `@skip(if:)` and `@include(if:)` over a directive list
pub fn is_included(directives: &[DirectiveMetadata]) -> bool {
    directives.iter().all(|directive| match directive.name.as_str() {
        "skip" => !directive.condition(),
        "include" => directive.condition(),
        _ => true,
    })
}

/// One selected field and its sub-selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedField {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: IndexMap<String, Value>,
    pub directives: Vec<DirectiveMetadata>,
    pub children: Vec<SelectedField>,
}

impl SelectedField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    pub fn with_directive(mut self, directive: DirectiveMetadata) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn with_child(mut self, child: SelectedField) -> Self {
        self.children.push(child);
        self
    }

    /// Add plain scalar selections by name
    pub fn with_fields<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.children
            .extend(names.into_iter().map(SelectedField::new));
        self
    }

    /// Alias if present, else the field name
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveMetadata> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn is_included(&self) -> bool {
        is_included(&self.directives)
    }

    /// Immediate children, skipping those excluded by directives
    pub fn included_children(&self) -> impl Iterator<Item = &SelectedField> {
        self.children.iter().filter(|child| child.is_included())
    }

    pub fn child(&self, response_key: &str) -> Option<&SelectedField> {
        self.children
            .iter()
            .find(|child| child.response_key() == response_key)
    }

    /// Descend by response keys; the empty path is the field itself
    pub fn field_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&SelectedField> {
        path.iter()
            .try_fold(self, |field, key| field.child(key.as_ref()))
    }

    /// Immediate children of the field found at `prefix`, empty when the prefix does not exist
    pub fn children_at<S: AsRef<str>>(&self, prefix: &[S]) -> &[SelectedField] {
        self.field_at(prefix)
            .map(|field| field.children.as_slice())
            .unwrap_or(&[])
    }

    /// Fold another selection of the same response key into this one
    ///
    /// An excluded selection contributes nothing; an included one replaces an
    /// excluded `self`, otherwise its children are merged per response key.
    /// Arguments and directives of the first included selection are kept.
    pub fn merge(&mut self, other: SelectedField) {
        match (self.is_included(), other.is_included()) {
            (_, false) => {}
            (false, true) => *self = other,
            (true, true) => {
                for child in other.children {
                    merge_selection(&mut self.children, child);
                }
            }
        }
    }
}

/// Add `field` to `fields`, merging it into an earlier selection with the same response key
pub fn merge_selection(fields: &mut Vec<SelectedField>, field: SelectedField) {
    match fields
        .iter_mut()
        .find(|existing| existing.response_key() == field.response_key())
    {
        Some(existing) => existing.merge(field),
        None => fields.push(field),
    }
}

/// Everything the compiler reads about one query step
pub trait SelectionEnvironment: Send + Sync {
    /// The field being compiled, with arguments, directives and sub-selections
    fn current_field(&self) -> &SelectedField;

    /// First/offset window computed by the engine's paging context for the
    /// collection at `path` (response keys below the current field)
    fn paging_window(&self, _path: &[String]) -> Option<PagingWindow> {
        None
    }
}

/// Owned selection environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStep {
    field: SelectedField,
    paging: HashMap<Vec<String>, PagingWindow>,
}

impl QueryStep {
    pub fn new(field: SelectedField) -> Self {
        Self {
            field,
            paging: HashMap::new(),
        }
    }

    /// Attach a paging window to the collection at `path`
    pub fn with_paging_window<S: Into<String>>(
        mut self,
        path: impl IntoIterator<Item = S>,
        window: PagingWindow,
    ) -> Self {
        self.paging
            .insert(path.into_iter().map(Into::into).collect(), window);
        self
    }
}

impl SelectionEnvironment for QueryStep {
    fn current_field(&self) -> &SelectedField {
        &self.field
    }

    fn paging_window(&self, path: &[String]) -> Option<PagingWindow> {
        self.paging.get(path).copied()
    }
}
