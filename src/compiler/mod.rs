//! Selection-to-request compiler
//!
//! Walks one query step against the type graph and produces an immutable
//! [`ObjectRequest`] or [`CollectionRequest`]. Compilation is synchronous and
//! performs no I/O; a `RequestCompiler` can be shared across threads behind an
//! `Arc` and used for any number of concurrent steps.
//!
//! ```rust,ignore
//! let graph = Arc::new(TypeGraph::from_yaml_file("types.yaml")?);
//! let compiler = RequestCompiler::new(graph);
//!
//! for step in query_steps(query, &variables, &compiler.graph().settings.paging)? {
//!     match compiler.compile_query(&step)? {
//!         CompiledQuery::Object(request) => loader.load_single(&request).await?,
//!         CompiledQuery::Collection(request) => loader.load_many(&request).await?,
//!     };
//! }
//! ```

mod aggregate;
mod arguments;
pub mod injection;
mod sorting;

pub use injection::inject_field_paths;

use crate::config::TypeGraph;
use crate::core::clock::{Clock, SystemClock};
use crate::core::criteria::FilterCriteria;
use crate::core::error::CompileError;
use crate::core::request::{
    CollectionRequest, CompiledQuery, ContextCriteria, FieldPath, ObjectRequest,
};
use crate::core::type_config::{FieldKind, KeyConfiguration, TypeConfiguration};
use crate::filter::{FilterCriteriaEngine, ParseContext};
use crate::selection::{SelectedField, SelectionEnvironment, TYPENAME_FIELD};
use std::borrow::Cow;
use std::sync::Arc;

/// Compiles selection environments into request trees
#[derive(Clone)]
pub struct RequestCompiler {
    graph: Arc<TypeGraph>,
    filters: FilterCriteriaEngine,
    clock: Arc<dyn Clock>,
}

/// Position of the node being compiled within the current query step
struct Scope<'a> {
    env: &'a dyn SelectionEnvironment,
    /// Response keys from the step's root field down to this node
    path: Vec<String>,
    /// Argument-to-field overrides for this node's key arguments
    keys: &'a [KeyConfiguration],
    /// Context criteria of the closest ancestor that has one
    context: Option<&'a ContextCriteria>,
}

impl<'a> Scope<'a> {
    fn root(env: &'a dyn SelectionEnvironment, keys: &'a [KeyConfiguration]) -> Self {
        Self {
            env,
            path: Vec::new(),
            keys,
            context: None,
        }
    }

    fn child<'b>(
        &'b self,
        response_key: &str,
        keys: &'b [KeyConfiguration],
        context: Option<&'b ContextCriteria>,
    ) -> Scope<'b> {
        let mut path = self.path.clone();
        path.push(response_key.to_string());
        Scope {
            env: self.env,
            path,
            keys,
            context,
        }
    }
}

impl RequestCompiler {
    pub fn new(graph: Arc<TypeGraph>) -> Self {
        Self {
            graph,
            filters: FilterCriteriaEngine::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to resolve the `NOW` sentinel
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the filter parser registry
    pub fn with_filter_engine(mut self, filters: FilterCriteriaEngine) -> Self {
        self.filters = filters;
        self
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    pub fn filters(&self) -> &FilterCriteriaEngine {
        &self.filters
    }

    /// Compile a root query field, resolving its type through the `queries` section
    pub fn compile_query(
        &self,
        env: &dyn SelectionEnvironment,
    ) -> Result<CompiledQuery, CompileError> {
        let field = env.current_field();
        let Some(query) = self.graph.query(&field.name) else {
            tracing::error!(field = %field.name, "Query field has no type graph counterpart");
            return Err(CompileError::illegal_state(format!(
                "Query field '{}' is not configured",
                field.name
            )));
        };

        let type_config = self.graph.type_configuration(&query.type_name)?;
        let scope = Scope::root(env, &query.keys);

        if query.list {
            self.build_collection(type_config, field, &scope)
                .map(CompiledQuery::Collection)
        } else {
            self.build_object(type_config, field, &scope)
                .map(CompiledQuery::Object)
        }
    }

    /// Compile the current field of `env` as a single object of `type_config`
    pub fn compile_object(
        &self,
        type_config: &TypeConfiguration,
        env: &dyn SelectionEnvironment,
    ) -> Result<ObjectRequest, CompileError> {
        tracing::debug!(
            type_name = %type_config.name,
            field = %env.current_field().name,
            "Compiling object request"
        );
        self.build_object(type_config, env.current_field(), &Scope::root(env, &[]))
    }

    /// Compile the current field of `env` as a collection of `type_config`
    pub fn compile_collection(
        &self,
        type_config: &TypeConfiguration,
        env: &dyn SelectionEnvironment,
    ) -> Result<CollectionRequest, CompileError> {
        tracing::debug!(
            type_name = %type_config.name,
            field = %env.current_field().name,
            "Compiling collection request"
        );
        self.build_collection(type_config, env.current_field(), &Scope::root(env, &[]))
    }

    fn parse_context(&self) -> ParseContext<'_> {
        ParseContext::new(&self.graph, self.clock.as_ref())
    }

    fn build_collection(
        &self,
        type_config: &TypeConfiguration,
        node: &SelectedField,
        scope: &Scope<'_>,
    ) -> Result<CollectionRequest, CompileError> {
        let sort_criterias = self.sort_criteria(type_config, node)?;
        let paging_criteria = self.paging_criteria(node, scope)?;

        let sort_paths: Vec<FieldPath> = sort_criterias
            .iter()
            .map(|sort| sort.field_path.clone())
            .collect();
        let object_request =
            inject_field_paths(self.build_object(type_config, node, scope)?, &sort_paths)?;

        Ok(CollectionRequest {
            object_request,
            sort_criterias,
            paging_criteria,
        })
    }

    fn build_object(
        &self,
        type_config: &TypeConfiguration,
        node: &SelectedField,
        scope: &Scope<'_>,
    ) -> Result<ObjectRequest, CompileError> {
        let mut request = ObjectRequest::new(&type_config.name);

        request.key_criteria = self.key_criteria(type_config, node, scope.keys)?;
        request.context_criteria = self.context_criteria(type_config, node, scope.context)?;
        request.filter_criteria = self.filter_criteria(type_config, node)?;

        let own_context = request.context_criteria.clone();
        let inherited = own_context.as_ref().or(scope.context);

        for child in merged_children(node) {
            let child: &SelectedField = &child;
            if child.name == TYPENAME_FIELD {
                continue;
            }

            let Some(field) = type_config.field(&child.name) else {
                tracing::error!(
                    type_name = %type_config.name,
                    field = %child.name,
                    "Selected field has no type graph counterpart"
                );
                return Err(CompileError::illegal_state(format!(
                    "Field '{}' does not exist on type {}",
                    child.name, type_config.name
                )));
            };

            match field.kind {
                FieldKind::Scalar => {
                    if !request.has_scalar_field(&field.name) {
                        request.scalar_fields.push(field.clone());
                    }
                }
                FieldKind::ObjectRef | FieldKind::NestedObjectRef => {
                    let target = self.graph.type_configuration(&field.type_name)?;
                    let child_scope = scope.child(child.response_key(), &field.keys, inherited);
                    let sub_request = self.build_object(target, child, &child_scope)?;
                    let container = if field.kind == FieldKind::ObjectRef {
                        &mut request.object_fields
                    } else {
                        &mut request.nested_object_fields
                    };
                    container.insert(field.name.clone(), sub_request);
                }
                FieldKind::CollectionRef => {
                    let target = self.graph.type_configuration(&field.type_name)?;
                    let child_scope = scope.child(child.response_key(), &field.keys, inherited);
                    let sub_request = self.build_collection(target, child, &child_scope)?;
                    request
                        .collection_object_fields
                        .insert(field.name.clone(), sub_request);
                }
                FieldKind::Aggregate => {
                    let aggregate = self.build_aggregate(field, child)?;
                    request.aggregate_object_fields.push(aggregate);
                }
            }
        }

        let mut required: Vec<FieldPath> = type_config.identity_paths().to_vec();
        required.extend(
            request
                .key_criteria
                .iter()
                .map(|key| key.field_path.clone()),
        );

        tracing::trace!(
            type_name = %type_config.name,
            scalars = request.scalar_fields.len(),
            injected = required.len(),
            "Built object request"
        );
        inject_field_paths(request, &required)
    }

    /// Root filter criteria from the node's filter argument
    fn filter_criteria(
        &self,
        type_config: &TypeConfiguration,
        node: &SelectedField,
    ) -> Result<Option<FilterCriteria>, CompileError> {
        let Some(argument) = node.argument(&self.graph.settings.filter_argument) else {
            return Ok(None);
        };
        let criteria = self
            .filters
            .parse_argument(&self.parse_context(), type_config, argument)?;
        Ok(FilterCriteria::all_of(criteria))
    }
}

/// Included children with repeated selections of one field folded together
///
/// Relation containers are keyed by field name, so aliased and fragment-spread
/// selections of the same relation share one sub-request. The first selection
/// supplies arguments and the response key.
fn merged_children(node: &SelectedField) -> Vec<Cow<'_, SelectedField>> {
    let mut merged: Vec<Cow<'_, SelectedField>> = Vec::new();
    for child in node.included_children() {
        match merged.iter_mut().find(|existing| existing.name == child.name) {
            Some(existing) => {
                tracing::trace!(field = %child.name, "Merging repeated selection");
                existing.to_mut().merge(child.clone());
            }
            None => merged.push(Cow::Borrowed(child)),
        }
    }
    merged
}

impl std::fmt::Debug for RequestCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCompiler")
            .field("types", &self.graph.types.len())
            .field("filters", &self.filters)
            .finish()
    }
}
