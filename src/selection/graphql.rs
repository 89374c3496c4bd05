//! GraphQL adapter producing query steps from a query document
//!
//! Each top-level field of the first query operation becomes one [`QueryStep`].
//! Variables are resolved, fragments are flattened into their parent selection
//! (selections sharing a response key are merged) and `first`/`offset`
//! arguments become the paging windows of the step.

use super::{DirectiveMetadata, QueryStep, SelectedField, is_included, merge_selection};
use crate::core::paging::{PagingSettings, PagingWindow};
use anyhow::{Result, anyhow, bail};
use graphql_parser::query::{
    Definition, Directive, Field, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, Value as GqlValue, VariableDefinition, parse_query,
};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Fragment spreads nested deeper than this are treated as a cycle
const MAX_FRAGMENT_DEPTH: usize = 32;

/// Parse a query document into one query step per top-level field
pub fn query_steps(
    query: &str,
    variables: &Map<String, Value>,
    paging: &PagingSettings,
) -> Result<Vec<QueryStep>> {
    let doc = parse_query::<String>(query)
        .map_err(|e| anyhow!("Failed to parse query: {:?}", e))?;

    let fragments: HashMap<&str, &FragmentDefinition<'_, String>> = doc
        .definitions
        .iter()
        .filter_map(|def| match def {
            Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
            Definition::Operation(_) => None,
        })
        .collect();

    let operation = doc
        .definitions
        .iter()
        .find_map(|def| match def {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
        .ok_or_else(|| anyhow!("No operation found in query"))?;

    let (selection_set, mut resolved) = match operation {
        OperationDefinition::SelectionSet(set) => (set, Map::new()),
        OperationDefinition::Query(query) => (
            &query.selection_set,
            variable_defaults(&query.variable_definitions),
        ),
        _ => bail!("Only query operations can be compiled"),
    };
    for (name, value) in variables {
        resolved.insert(name.clone(), value.clone());
    }

    let converter = Converter {
        fragments,
        variables: resolved,
    };

    let steps = converter
        .collect_fields(selection_set, 0)?
        .into_iter()
        .map(|field| {
            let mut windows = Vec::new();
            collect_paging_windows(&field, &mut Vec::new(), paging, &mut windows);
            windows
                .into_iter()
                .fold(QueryStep::new(field), |step, (path, window)| {
                    step.with_paging_window(path, window)
                })
        })
        .collect();

    Ok(steps)
}

struct Converter<'a> {
    fragments: HashMap<&'a str, &'a FragmentDefinition<'a, String>>,
    variables: Map<String, Value>,
}

impl<'a> Converter<'a> {
    fn collect_fields(
        &self,
        set: &SelectionSet<'a, String>,
        depth: usize,
    ) -> Result<Vec<SelectedField>> {
        let mut fields = Vec::new();

        for selection in &set.items {
            match selection {
                Selection::Field(field) => {
                    merge_selection(&mut fields, self.convert_field(field, depth)?);
                }
                Selection::FragmentSpread(spread) => {
                    if !is_included(&self.directives(&spread.directives)) {
                        continue;
                    }
                    if depth >= MAX_FRAGMENT_DEPTH {
                        bail!("Fragment nesting exceeds {} levels", MAX_FRAGMENT_DEPTH);
                    }
                    let fragment = self
                        .fragments
                        .get(spread.fragment_name.as_str())
                        .ok_or_else(|| anyhow!("Unknown fragment: {}", spread.fragment_name))?;
                    for field in self.collect_fields(&fragment.selection_set, depth + 1)? {
                        merge_selection(&mut fields, field);
                    }
                }
                Selection::InlineFragment(inline) => {
                    if !is_included(&self.directives(&inline.directives)) {
                        continue;
                    }
                    if depth >= MAX_FRAGMENT_DEPTH {
                        bail!("Fragment nesting exceeds {} levels", MAX_FRAGMENT_DEPTH);
                    }
                    for field in self.collect_fields(&inline.selection_set, depth + 1)? {
                        merge_selection(&mut fields, field);
                    }
                }
            }
        }

        Ok(fields)
    }

    fn convert_field(&self, field: &Field<'a, String>, depth: usize) -> Result<SelectedField> {
        Ok(SelectedField {
            name: field.name.clone(),
            alias: field.alias.clone(),
            arguments: field
                .arguments
                .iter()
                .map(|(name, value)| (name.clone(), gql_value_to_json(value, &self.variables)))
                .collect(),
            directives: self.directives(&field.directives),
            children: self.collect_fields(&field.selection_set, depth)?,
        })
    }

    fn directives(&self, directives: &[Directive<'a, String>]) -> Vec<DirectiveMetadata> {
        directives
            .iter()
            .map(|directive| DirectiveMetadata {
                name: directive.name.clone(),
                arguments: directive
                    .arguments
                    .iter()
                    .map(|(name, value)| {
                        (name.clone(), gql_value_to_json(value, &self.variables))
                    })
                    .collect(),
            })
            .collect()
    }
}

fn variable_defaults(definitions: &[VariableDefinition<'_, String>]) -> Map<String, Value> {
    let empty = Map::new();
    definitions
        .iter()
        .filter_map(|def| {
            def.default_value
                .as_ref()
                .map(|value| (def.name.clone(), gql_value_to_json(value, &empty)))
        })
        .collect()
}

/// Convert a GraphQL value to JSON, resolving variables
pub fn gql_value_to_json(value: &GqlValue<'_, String>, variables: &Map<String, Value>) -> Value {
    match value {
        GqlValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        GqlValue::Null => Value::Null,
        GqlValue::Int(i) => json!(i.as_i64().unwrap_or(0)),
        GqlValue::Float(f) => json!(f),
        GqlValue::String(s) => json!(s),
        GqlValue::Boolean(b) => json!(b),
        GqlValue::Enum(e) => json!(e),
        GqlValue::List(list) => Value::Array(
            list.iter()
                .map(|item| gql_value_to_json(item, variables))
                .collect(),
        ),
        GqlValue::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.clone(), gql_value_to_json(v, variables));
            }
            Value::Object(map)
        }
    }
}

fn collect_paging_windows(
    field: &SelectedField,
    path: &mut Vec<String>,
    paging: &PagingSettings,
    windows: &mut Vec<(Vec<String>, PagingWindow)>,
) {
    if let Some(first) = field
        .argument(&paging.first_argument)
        .and_then(Value::as_u64)
    {
        let offset = field
            .argument(&paging.offset_argument)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        windows.push((path.clone(), PagingWindow::new(first, offset)));
    }

    for child in &field.children {
        path.push(child.response_key().to_string());
        collect_paging_windows(child, path, paging, windows);
        path.pop();
    }
}
