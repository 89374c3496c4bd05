//! Sort and paging criteria of collection requests

use super::{RequestCompiler, Scope};
use crate::core::error::CompileError;
use crate::core::paging::PagingCriteria;
use crate::core::request::SortCriteria;
use crate::core::type_config::TypeConfiguration;
use crate::selection::SelectedField;
use serde_json::Value;

impl RequestCompiler {
    /// Sort criteria of the preset named by the sort argument, empty without one
    pub(super) fn sort_criteria(
        &self,
        type_config: &TypeConfiguration,
        node: &SelectedField,
    ) -> Result<Vec<SortCriteria>, CompileError> {
        let Some(argument) = node
            .argument(&self.graph.settings.sort_argument)
            .filter(|value| !value.is_null())
        else {
            return Ok(Vec::new());
        };

        let preset = argument.as_str().ok_or_else(|| {
            CompileError::illegal_argument(format!(
                "Sort argument on {} must name a sort preset, got {}",
                node.name, argument
            ))
        })?;

        type_config
            .sort_preset(preset)
            .map(<[SortCriteria]>::to_vec)
            .ok_or_else(|| {
                CompileError::illegal_argument(format!(
                    "Unknown sort preset '{}' for type {}",
                    preset, type_config.name
                ))
            })
    }

    /// Paging from the engine's window, else the legacy page/pageSize arguments
    pub(super) fn paging_criteria(
        &self,
        node: &SelectedField,
        scope: &Scope<'_>,
    ) -> Result<Option<PagingCriteria>, CompileError> {
        let settings = &self.graph.settings.paging;

        if let Some(window) = scope.env.paging_window(&scope.path) {
            return Ok(Some(PagingCriteria::from_window(window, settings)));
        }

        let page = page_number(node, &settings.page_argument)?;
        let page_size = page_number(node, &settings.page_size_argument)?;
        if page.is_none() && page_size.is_none() {
            return Ok(None);
        }

        Ok(Some(PagingCriteria::from_page(
            page.unwrap_or(1),
            page_size.unwrap_or(settings.default_page_size),
            settings,
        )))
    }
}

fn page_number(node: &SelectedField, argument: &str) -> Result<Option<u64>, CompileError> {
    match node.argument(argument) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            CompileError::illegal_argument(format!(
                "Argument '{}' on {} must be a non-negative integer, got {}",
                argument, node.name, value
            ))
        }),
    }
}
