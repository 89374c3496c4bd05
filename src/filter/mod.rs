//! Filter criteria engine
//!
//! Turns structured filter arguments such as
//! `{name: {not: {eq: "Heineken"}}, postalAddress: {city: {in: ["Utrecht"]}}}`
//! into [`FilterCriteria`] trees. Each leaf literal is converted by the parser
//! registered for the scalar type of the target field, with one fallback parser
//! for types nobody registered.

pub mod parser;
pub mod parsers;

pub use parser::{FilterCriteriaParser, ParseContext};

use crate::core::criteria::{FilterCriteria, FilterOperator};
use crate::core::error::CompileError;
use crate::core::field::{FieldValue, ScalarType};
use crate::core::request::FieldPath;
use crate::core::type_config::{
    FieldConfiguration, FieldKind, FilterConfiguration, TypeConfiguration,
};
use parsers::{
    BooleanFilterParser, DateFilterParser, DateTimeFilterParser, FallbackFilterParser,
    FloatFilterParser, IdFilterParser, IntFilterParser, StringFilterParser,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of filter parsers keyed by scalar type
#[derive(Clone)]
pub struct FilterCriteriaEngine {
    parsers: HashMap<ScalarType, Arc<dyn FilterCriteriaParser>>,
    fallback: Arc<dyn FilterCriteriaParser>,
}

impl Default for FilterCriteriaEngine {
    fn default() -> Self {
        Self::empty()
            .with_parser(ScalarType::Id, Arc::new(IdFilterParser))
            .with_parser(ScalarType::String, Arc::new(StringFilterParser))
            .with_parser(ScalarType::Int, Arc::new(IntFilterParser))
            .with_parser(ScalarType::Float, Arc::new(FloatFilterParser))
            .with_parser(ScalarType::Boolean, Arc::new(BooleanFilterParser))
            .with_parser(ScalarType::Date, Arc::new(DateFilterParser))
            .with_parser(ScalarType::DateTime, Arc::new(DateTimeFilterParser))
    }
}

impl fmt::Debug for FilterCriteriaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut registered: Vec<(&str, &str)> = self
            .parsers
            .iter()
            .map(|(scalar, parser)| (scalar.type_name(), parser.name()))
            .collect();
        registered.sort_unstable();

        f.debug_struct("FilterCriteriaEngine")
            .field("parsers", &registered)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl FilterCriteriaEngine {
    /// An engine where every scalar type goes to the fallback parser
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
            fallback: Arc::new(FallbackFilterParser),
        }
    }

    /// Register a parser, returning the one it replaces
    pub fn register(
        &mut self,
        scalar_type: ScalarType,
        parser: Arc<dyn FilterCriteriaParser>,
    ) -> Option<Arc<dyn FilterCriteriaParser>> {
        self.parsers.insert(scalar_type, parser)
    }

    pub fn with_parser(
        mut self,
        scalar_type: ScalarType,
        parser: Arc<dyn FilterCriteriaParser>,
    ) -> Self {
        self.register(scalar_type, parser);
        self
    }

    pub fn with_fallback(mut self, parser: Arc<dyn FilterCriteriaParser>) -> Self {
        self.fallback = parser;
        self
    }

    /// Parser for a scalar type name; unknown and custom scalars get the fallback
    pub fn parser_for_type(&self, type_name: &str) -> &dyn FilterCriteriaParser {
        ScalarType::from_type_name(type_name)
            .and_then(|scalar| self.parsers.get(&scalar))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    pub fn parser_for(&self, field: &FieldConfiguration) -> &dyn FilterCriteriaParser {
        self.parser_for_type(&field.type_name)
    }

    /// Convert a key or context literal with the parser of its scalar type
    pub fn coerce(
        &self,
        ctx: &ParseContext<'_>,
        field_name: &str,
        type_name: &str,
        value: &Value,
    ) -> Result<FieldValue, CompileError> {
        self.parser_for_type(type_name)
            .parse_literal(field_name, value, ctx)
    }

    /// Parse the data supplied for one named filter of `type_config`
    ///
    /// Absent or null data yields no criteria.
    pub fn parse(
        &self,
        ctx: &ParseContext<'_>,
        type_config: &TypeConfiguration,
        filter_name: &str,
        data: Option<&Value>,
    ) -> Result<Vec<FilterCriteria>, CompileError> {
        self.parse_filter(ctx, None, type_config, filter_name, data)
    }

    /// Parse a whole filter argument object, one entry per named filter
    pub fn parse_argument(
        &self,
        ctx: &ParseContext<'_>,
        type_config: &TypeConfiguration,
        argument: &Value,
    ) -> Result<Vec<FilterCriteria>, CompileError> {
        match argument {
            Value::Null => Ok(Vec::new()),
            Value::Object(body) => self.parse_object(ctx, None, type_config, body),
            other => Err(CompileError::illegal_argument(format!(
                "Filter argument on type {} must be an object, got {}",
                type_config.name, other
            ))),
        }
    }

    fn parse_object(
        &self,
        ctx: &ParseContext<'_>,
        prefix: Option<&FieldPath>,
        type_config: &TypeConfiguration,
        body: &Map<String, Value>,
    ) -> Result<Vec<FilterCriteria>, CompileError> {
        let mut criteria = Vec::new();
        for (filter_name, data) in body {
            criteria.extend(self.parse_filter(ctx, prefix, type_config, filter_name, Some(data))?);
        }
        Ok(criteria)
    }

    fn parse_filter(
        &self,
        ctx: &ParseContext<'_>,
        prefix: Option<&FieldPath>,
        type_config: &TypeConfiguration,
        filter_name: &str,
        data: Option<&Value>,
    ) -> Result<Vec<FilterCriteria>, CompileError> {
        let filter = type_config.filters.get(filter_name).ok_or_else(|| {
            CompileError::illegal_argument(format!(
                "Unknown filter '{}' on type {}",
                filter_name, type_config.name
            ))
        })?;

        let Some(data) = data.filter(|value| !value.is_null()) else {
            return Ok(Vec::new());
        };

        let target = filter.field.as_deref().unwrap_or(filter_name);
        let resolved = ctx.graph.resolve_path(&type_config.name, target)?;
        let path = match prefix {
            Some(prefix) => prefix.concat(&resolved),
            None => resolved,
        };

        let leaf = path.leaf();
        match leaf.kind {
            FieldKind::Scalar => self.parse_leaf(ctx, filter, &path, data),
            FieldKind::ObjectRef | FieldKind::NestedObjectRef => {
                let sub_type = ctx.graph.type_configuration(&leaf.type_name)?;
                match data {
                    Value::Object(body) if body.is_empty() => match &filter.default {
                        Some(Value::Object(default)) => {
                            self.parse_object(ctx, Some(&path), sub_type, default)
                        }
                        _ => Ok(Vec::new()),
                    },
                    Value::Object(body) => self.parse_object(ctx, Some(&path), sub_type, body),
                    other => Err(CompileError::illegal_argument(format!(
                        "Filter '{}' on type {} expects an object, got {}",
                        filter_name, type_config.name, other
                    ))),
                }
            }
            FieldKind::CollectionRef | FieldKind::Aggregate => {
                Err(CompileError::unsupported(format!(
                    "Filter '{}' on type {} targets to-many field '{}'",
                    filter_name, type_config.name, leaf.name
                )))
            }
        }
    }

    fn parse_leaf(
        &self,
        ctx: &ParseContext<'_>,
        filter: &FilterConfiguration,
        path: &FieldPath,
        data: &Value,
    ) -> Result<Vec<FilterCriteria>, CompileError> {
        let body = match data {
            Value::Object(body) if body.is_empty() => match &filter.default {
                Some(Value::Object(default)) => default.clone(),
                Some(default) if !default.is_null() => operator_body(FilterOperator::Eq, default),
                _ => return Ok(Vec::new()),
            },
            Value::Object(body) => body.clone(),
            Value::Array(_) => operator_body(FilterOperator::In, data),
            scalar => operator_body(FilterOperator::Eq, scalar),
        };

        self.parse_operators(ctx, filter, path, &body)
    }

    fn parse_operators(
        &self,
        ctx: &ParseContext<'_>,
        filter: &FilterConfiguration,
        path: &FieldPath,
        body: &Map<String, Value>,
    ) -> Result<Vec<FilterCriteria>, CompileError> {
        let field = path.leaf();
        let parser = self.parser_for(field);
        let mut criteria = Vec::new();

        for (key, value) in body {
            let operator = FilterOperator::from_key(key).ok_or_else(|| {
                CompileError::unsupported(format!(
                    "Filter operator '{}' is not supported for field {}",
                    key, path
                ))
            })?;

            if operator == FilterOperator::Not {
                match value {
                    Value::Null => continue,
                    Value::Object(inner) => {
                        let children = self.parse_operators(ctx, filter, path, inner)?;
                        criteria.extend(FilterCriteria::negate(children));
                        continue;
                    }
                    other => {
                        return Err(CompileError::illegal_argument(format!(
                            "Operator 'not' on field {} expects an object, got {}",
                            path, other
                        )));
                    }
                }
            }

            let operand = if value.is_null() {
                match default_operand(filter, operator, field) {
                    Some(default) => default,
                    None => {
                        tracing::trace!(
                            field = %path,
                            operator = %operator,
                            "Skipping null filter operand"
                        );
                        continue;
                    }
                }
            } else {
                value.clone()
            };

            if operator == FilterOperator::In {
                let Value::Array(items) = &operand else {
                    return Err(CompileError::illegal_argument(format!(
                        "Operator 'in' on field {} requires a list, got {}",
                        path, operand
                    )));
                };
                ensure_supported(parser, operator, field)?;
                let values = items
                    .iter()
                    .map(|item| parser.parse_literal(&field.name, item, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                criteria.push(FilterCriteria::In {
                    field_path: path.clone(),
                    values,
                });
            } else {
                ensure_supported(parser, operator, field)?;
                let literal = parser.parse_literal(&field.name, &operand, ctx)?;
                criteria.extend(FilterCriteria::comparison(operator, path.clone(), literal));
            }
        }

        Ok(criteria)
    }
}

fn operator_body(operator: FilterOperator, value: &Value) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert(operator.key().to_string(), value.clone());
    body
}

fn ensure_supported(
    parser: &dyn FilterCriteriaParser,
    operator: FilterOperator,
    field: &FieldConfiguration,
) -> Result<(), CompileError> {
    if parser.supports_operator(operator) {
        Ok(())
    } else {
        Err(CompileError::unsupported(format!(
            "Filter operator '{}' is not supported for type {}",
            operator, field.type_name
        )))
    }
}

/// Operand used when an operator is given with a null value
fn default_operand(
    filter: &FilterConfiguration,
    operator: FilterOperator,
    field: &FieldConfiguration,
) -> Option<Value> {
    let from_filter = match &filter.default {
        Some(Value::Object(defaults)) => defaults.get(operator.key()).cloned(),
        Some(default) => Some(default.clone()),
        None => None,
    };

    from_filter
        .or_else(|| field.default_value.clone())
        .filter(|value| !value.is_null())
}
