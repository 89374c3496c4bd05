//! Aggregate field compilation

use super::RequestCompiler;
use crate::core::error::CompileError;
use crate::core::request::{
    AggregateFieldConfiguration, AggregateFieldProperty, AggregateFunction,
    AggregateObjectFieldConfiguration,
};
use crate::core::type_config::{FieldConfiguration, TypeConfiguration};
use crate::selection::{SelectedField, TYPENAME_FIELD};
use serde_json::Value;

const FIELD_ARGUMENT: &str = "field";
const DISTINCT_ARGUMENT: &str = "distinct";
const SEPARATOR_ARGUMENT: &str = "separator";
const DEFAULT_SEPARATOR: &str = ",";

impl RequestCompiler {
    pub(super) fn build_aggregate(
        &self,
        field: &FieldConfiguration,
        node: &SelectedField,
    ) -> Result<AggregateObjectFieldConfiguration, CompileError> {
        let target = self.graph.type_configuration(&field.type_name)?;
        let filter_criteria = self.filter_criteria(target, node)?;

        let aggregate_fields = node
            .included_children()
            .filter(|child| child.name != TYPENAME_FIELD)
            .map(|child| aggregate_function(target, child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AggregateObjectFieldConfiguration {
            field: field.clone(),
            aggregate_fields,
            filter_criteria,
        })
    }
}

fn aggregate_function(
    target: &TypeConfiguration,
    node: &SelectedField,
) -> Result<AggregateFieldConfiguration, CompileError> {
    let unsupported =
        || CompileError::unsupported(format!("Aggregate function {} is not supported", node.name));

    let function = AggregateFunction::from_name(&node.name).ok_or_else(unsupported)?;

    let target_field = match node.argument(FIELD_ARGUMENT) {
        None | Some(Value::Null) if function == AggregateFunction::Count => None,
        None | Some(Value::Null) => {
            return Err(CompileError::illegal_argument(format!(
                "Aggregate function {} requires a '{}' argument",
                function.name(),
                FIELD_ARGUMENT
            )));
        }
        Some(Value::String(name)) => {
            let field = target.field(name).filter(|f| f.is_scalar()).ok_or_else(|| {
                CompileError::illegal_argument(format!(
                    "Aggregate field '{}' is not a scalar field of type {}",
                    name, target.name
                ))
            })?;
            Some(field.clone())
        }
        Some(other) => {
            return Err(CompileError::illegal_argument(format!(
                "Aggregate argument '{}' must be a field name, got {}",
                FIELD_ARGUMENT, other
            )));
        }
    };

    let supported = match (function.required_property(), &target_field) {
        (AggregateFieldProperty::None, _) => true,
        (AggregateFieldProperty::Numeric, Some(field)) => field.is_numeric(),
        (AggregateFieldProperty::Text, Some(field)) => field.is_text(),
        (_, None) => false,
    };
    if !supported {
        return Err(unsupported());
    }

    let distinct = match node.argument(DISTINCT_ARGUMENT) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(distinct)) => *distinct,
        Some(other) => {
            return Err(CompileError::illegal_argument(format!(
                "Aggregate argument '{}' must be a boolean, got {}",
                DISTINCT_ARGUMENT, other
            )));
        }
    };

    let separator = if function == AggregateFunction::StringJoin {
        match node.argument(SEPARATOR_ARGUMENT) {
            None | Some(Value::Null) => Some(DEFAULT_SEPARATOR.to_string()),
            Some(Value::String(separator)) => Some(separator.clone()),
            Some(other) => {
                return Err(CompileError::illegal_argument(format!(
                    "Aggregate argument '{}' must be a string, got {}",
                    SEPARATOR_ARGUMENT, other
                )));
            }
        }
    } else {
        None
    };

    Ok(AggregateFieldConfiguration {
        alias: node.response_key().to_string(),
        function,
        scalar_type: function.result_type(),
        target_field,
        distinct,
        separator,
    })
}
