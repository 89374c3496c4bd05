//! Key and context criteria from field arguments

use super::RequestCompiler;
use crate::core::error::CompileError;
use crate::core::request::{ContextCriteria, KeyCriteria};
use crate::core::type_config::{KeyConfiguration, TypeConfiguration};
use crate::selection::SelectedField;
use serde_json::Value;

impl RequestCompiler {
    /// One key criterion per non-reserved, non-null argument, combined as AND
    pub(super) fn key_criteria(
        &self,
        type_config: &TypeConfiguration,
        node: &SelectedField,
        overrides: &[KeyConfiguration],
    ) -> Result<Vec<KeyCriteria>, CompileError> {
        let settings = &self.graph.settings;
        let ctx = self.parse_context();
        let mut criteria = Vec::new();

        for (name, value) in &node.arguments {
            if settings.is_reserved_argument(name) || value.is_null() {
                continue;
            }

            let target = overrides
                .iter()
                .find(|key| key.argument_name() == name)
                .map(|key| key.field.as_str())
                .unwrap_or(name.as_str());

            let field_path = self.graph.resolve_path(&type_config.name, target)?;
            field_path.ensure_injectable()?;

            let leaf = field_path.leaf();
            let value = self
                .filters
                .coerce(&ctx, &leaf.name, &leaf.type_name, value)?;
            criteria.push(KeyCriteria { field_path, value });
        }

        Ok(criteria)
    }

    /// Context criteria of the node, or the inherited ones when the preset matches
    pub(super) fn context_criteria(
        &self,
        type_config: &TypeConfiguration,
        node: &SelectedField,
        inherited: Option<&ContextCriteria>,
    ) -> Result<Option<ContextCriteria>, CompileError> {
        let argument = node
            .argument(&self.graph.settings.context_argument)
            .filter(|value| !value.is_null());

        let Some(preset_name) = type_config.context.as_deref() else {
            if argument.is_some() {
                return Err(CompileError::illegal_argument(format!(
                    "Type {} does not accept a context argument",
                    type_config.name
                )));
            }
            return Ok(None);
        };

        let Some(argument) = argument else {
            return Ok(inherited.filter(|context| context.name == preset_name).cloned());
        };

        let Value::Object(supplied) = argument else {
            return Err(CompileError::illegal_argument(format!(
                "Context argument on {} must be an object, got {}",
                node.name, argument
            )));
        };

        let preset = self.graph.context(preset_name).ok_or_else(|| {
            CompileError::configuration(format!("Unknown context preset '{}'", preset_name))
        })?;

        if let Some(unknown) = supplied.keys().find(|key| !preset.fields.contains_key(*key)) {
            return Err(CompileError::illegal_argument(format!(
                "Unknown context field '{}' for context {}",
                unknown, preset_name
            )));
        }

        let ctx = self.parse_context();
        let mut values = Vec::with_capacity(preset.fields.len());
        for (field_name, field) in &preset.fields {
            let value = supplied
                .get(field_name)
                .filter(|value| !value.is_null())
                .or(field.default.as_ref());
            let Some(value) = value else {
                continue;
            };
            let literal = self
                .filters
                .coerce(&ctx, field_name, &field.type_name, value)?;
            values.push((field_name.clone(), literal));
        }

        Ok(Some(ContextCriteria {
            name: preset_name.to_string(),
            values,
        }))
    }
}
