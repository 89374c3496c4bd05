//! Scalar-type-specific filter literal parsers

use crate::config::TypeGraph;
use crate::core::clock::Clock;
use crate::core::criteria::FilterOperator;
use crate::core::error::CompileError;
use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Read-only collaborators available while parsing one argument
pub struct ParseContext<'a> {
    pub graph: &'a TypeGraph,
    pub clock: &'a dyn Clock,
    pub now_sentinel: &'a str,
}

impl<'a> ParseContext<'a> {
    pub fn new(graph: &'a TypeGraph, clock: &'a dyn Clock) -> Self {
        Self {
            graph,
            clock,
            now_sentinel: &graph.settings.now_sentinel,
        }
    }

    /// Resolve the `NOW` sentinel, `None` for any other value
    pub fn now_for(&self, value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) if s == self.now_sentinel => Some(self.clock.now()),
            _ => None,
        }
    }
}

/// Turns raw argument literals into typed values for one family of scalar types
pub trait FilterCriteriaParser: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Whether the leaf operator may be applied to fields handled by this parser
    ///
    /// `not` is structural and never asked for.
    fn supports_operator(&self, operator: FilterOperator) -> bool;

    /// Convert one literal, failing with `IllegalArgument` on a type mismatch
    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError>;
}

pub(crate) fn mismatch(field_name: &str, expected: &str, value: &Value) -> CompileError {
    CompileError::illegal_argument(format!(
        "Value {} for field {} is not a valid {}",
        value, field_name, expected
    ))
}
