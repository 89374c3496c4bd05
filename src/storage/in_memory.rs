//! In-memory backend loader for testing and development
//!
//! Rows are JSON documents grouped by type name. Related objects are embedded:
//! to-one relations as objects, to-many relations as arrays. Context criteria
//! are ignored since the store keeps a single version of each document.

use crate::core::criteria::FilterCriteria;
use crate::core::field::FieldValue;
use crate::core::loader::{BackendLoader, KeyCondition, Row};
use crate::core::request::{
    AggregateFieldConfiguration, AggregateObjectFieldConfiguration, AggregateOperation,
    AggregateScalarType, CollectionRequest, FieldPath, ObjectRequest, SortCriteria, SortDirection,
};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory backend loader
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    rows: Arc<RwLock<HashMap<String, Vec<Row>>>>,
    aggregate_sources: HashMap<String, String>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the aggregate field `aggregate` over the rows embedded under `source`
    ///
    /// Without a mapping an aggregate reads the array stored under its own name.
    pub fn with_aggregate_source(
        mut self,
        aggregate: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.aggregate_sources.insert(aggregate.into(), source.into());
        self
    }

    /// Store one document of `type_name`
    pub fn insert(&self, type_name: &str, document: Value) -> Result<()> {
        let Value::Object(row) = document else {
            bail!("Document for type {} must be a JSON object", type_name);
        };

        let mut rows = self
            .rows
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        rows.entry(type_name.to_string()).or_default().push(row);
        Ok(())
    }

    /// Number of stored documents of `type_name`
    pub fn count(&self, type_name: &str) -> Result<usize> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.get(type_name).map_or(0, Vec::len))
    }

    fn snapshot(&self, type_name: &str) -> Result<Vec<Row>> {
        let rows = self
            .rows
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(rows.get(type_name).cloned().unwrap_or_default())
    }

    fn project(&self, row: &Row, request: &ObjectRequest) -> Row {
        let mut projected = Row::new();

        for field in &request.scalar_fields {
            let value = row.get(&field.name).cloned().unwrap_or(Value::Null);
            projected.insert(field.name.clone(), value);
        }

        for (name, sub_request) in request
            .object_fields
            .iter()
            .chain(request.nested_object_fields.iter())
        {
            let value = match row.get(name) {
                Some(Value::Object(embedded)) if matches(embedded, sub_request) => {
                    Value::Object(self.project(embedded, sub_request))
                }
                _ => Value::Null,
            };
            projected.insert(name.clone(), value);
        }

        for (name, sub_request) in &request.collection_object_fields {
            let embedded = embedded_rows(row, name);
            let selected = self.select(embedded, sub_request);
            projected.insert(
                name.clone(),
                Value::Array(selected.into_iter().map(Value::Object).collect()),
            );
        }

        for aggregate in &request.aggregate_object_fields {
            let source = self
                .aggregate_sources
                .get(&aggregate.field.name)
                .unwrap_or(&aggregate.field.name);
            projected.insert(
                aggregate.field.name.clone(),
                Value::Object(compute_aggregates(embedded_rows(row, source), aggregate)),
            );
        }

        projected
    }

    fn select(&self, rows: Vec<Row>, request: &CollectionRequest) -> Vec<Row> {
        let mut matching: Vec<Row> = rows
            .into_iter()
            .filter(|row| matches(row, &request.object_request))
            .collect();

        sort_rows(&mut matching, &request.sort_criterias);

        let (offset, limit) = match request.paging_criteria {
            Some(paging) => (paging.offset as usize, paging.limit as usize),
            None => (0, usize::MAX),
        };

        matching
            .iter()
            .skip(offset)
            .take(limit)
            .map(|row| self.project(row, &request.object_request))
            .collect()
    }
}

#[async_trait]
impl BackendLoader for InMemoryBackend {
    async fn load_single(&self, request: &ObjectRequest) -> Result<Option<Row>> {
        if request.context_criteria.is_some() {
            tracing::trace!(type_name = %request.type_name, "Ignoring context criteria");
        }

        let rows = self.snapshot(&request.type_name)?;
        Ok(rows
            .iter()
            .find(|row| matches(row, request))
            .map(|row| self.project(row, request)))
    }

    async fn load_many(&self, request: &CollectionRequest) -> Result<Vec<Row>> {
        let rows = self.snapshot(&request.object_request.type_name)?;
        Ok(self.select(rows, request))
    }

    async fn batch_load_single(
        &self,
        keys: &[KeyCondition],
        request: &ObjectRequest,
    ) -> Result<Vec<(KeyCondition, Option<Row>)>> {
        try_join_all(keys.iter().map(|key| async move {
            let mut keyed = request.clone();
            keyed.key_criteria.extend(key.iter().cloned());
            let row = self.load_single(&keyed).await?;
            Ok::<_, anyhow::Error>((key.clone(), row))
        }))
        .await
    }

    async fn batch_load_many(
        &self,
        keys: &[KeyCondition],
        request: &CollectionRequest,
    ) -> Result<Vec<(KeyCondition, Vec<Row>)>> {
        try_join_all(keys.iter().map(|key| async move {
            let mut keyed = request.clone();
            keyed
                .object_request
                .key_criteria
                .extend(key.iter().cloned());
            let rows = self.load_many(&keyed).await?;
            Ok::<_, anyhow::Error>((key.clone(), rows))
        }))
        .await
    }
}

fn embedded_rows(row: &Row, name: &str) -> Vec<Row> {
    match row.get(name) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    }
}

fn value_at(row: &Row, path: &FieldPath) -> FieldValue {
    let mut current = row;
    let segments = path.segments();

    for hop in &segments[..segments.len() - 1] {
        match current.get(&hop.name) {
            Some(Value::Object(embedded)) => current = embedded,
            _ => return FieldValue::Null,
        }
    }

    current
        .get(&path.leaf().name)
        .and_then(FieldValue::from_json)
        .unwrap_or(FieldValue::Null)
}

fn matches(row: &Row, request: &ObjectRequest) -> bool {
    let keys_match = request.key_criteria.iter().all(|key| {
        value_at(row, &key.field_path).compare(&key.value) == Some(Ordering::Equal)
    });

    keys_match
        && request
            .filter_criteria
            .as_ref()
            .is_none_or(|criteria| evaluate(row, criteria))
}

fn evaluate(row: &Row, criteria: &FilterCriteria) -> bool {
    let compare = |path: &FieldPath, value: &FieldValue| value_at(row, path).compare(value);

    match criteria {
        FilterCriteria::Equals { field_path, value } => {
            compare(field_path, value) == Some(Ordering::Equal)
        }
        FilterCriteria::In { field_path, values } => values
            .iter()
            .any(|value| compare(field_path, value) == Some(Ordering::Equal)),
        FilterCriteria::LowerThen { field_path, value } => {
            compare(field_path, value) == Some(Ordering::Less)
        }
        FilterCriteria::LowerThenEquals { field_path, value } => matches!(
            compare(field_path, value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterCriteria::GreaterThen { field_path, value } => {
            compare(field_path, value) == Some(Ordering::Greater)
        }
        FilterCriteria::GreaterThenEquals { field_path, value } => matches!(
            compare(field_path, value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterCriteria::And(children) => children.iter().all(|child| evaluate(row, child)),
        FilterCriteria::Not(inner) => !evaluate(row, inner),
    }
}

fn sort_rows(rows: &mut [Row], sort_criterias: &[SortCriteria]) {
    if sort_criterias.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        sort_criterias
            .iter()
            .map(|sort| {
                let ordering = value_at(a, &sort.field_path)
                    .compare(&value_at(b, &sort.field_path))
                    .unwrap_or(Ordering::Equal);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn compute_aggregates(rows: Vec<Row>, aggregate: &AggregateObjectFieldConfiguration) -> Row {
    let rows: Vec<Row> = rows
        .into_iter()
        .filter(|row| {
            aggregate
                .filter_criteria
                .as_ref()
                .is_none_or(|criteria| evaluate(row, criteria))
        })
        .collect();

    aggregate
        .aggregate_fields
        .iter()
        .map(|function| (function.alias.clone(), compute(&rows, function)))
        .collect()
}

fn compute(rows: &[Row], function: &AggregateFieldConfiguration) -> Value {
    let Some(field) = &function.target_field else {
        return json!(rows.len());
    };

    let mut values: Vec<FieldValue> = rows
        .iter()
        .filter_map(|row| row.get(&field.name).and_then(FieldValue::from_json))
        .filter(|value| !value.is_null())
        .collect();

    if function.distinct {
        let mut unique: Vec<FieldValue> = Vec::with_capacity(values.len());
        for value in values {
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        values = unique;
    }

    let numbers = || values.iter().filter_map(FieldValue::as_float);

    let result = match function.function.operation() {
        AggregateOperation::Count => return json!(values.len()),
        AggregateOperation::Join => {
            let separator = function.separator.as_deref().unwrap_or(",");
            let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
            return json!(parts.join(separator));
        }
        AggregateOperation::Sum => Some(numbers().sum::<f64>()),
        AggregateOperation::Avg => {
            let count = numbers().count();
            (count > 0).then(|| numbers().sum::<f64>() / count as f64)
        }
        AggregateOperation::Min => numbers().reduce(f64::min),
        AggregateOperation::Max => numbers().reduce(f64::max),
    };

    match (result, function.scalar_type) {
        (None, _) => Value::Null,
        (Some(number), AggregateScalarType::Int) => json!(number.trunc() as i64),
        (Some(number), _) => json!(number),
    }
}
