//! Built-in filter parsers, one per scalar family plus the fallback

use super::parser::{FilterCriteriaParser, ParseContext, mismatch};
use crate::core::criteria::FilterOperator;
use crate::core::error::CompileError;
use crate::core::field::{FieldValue, parse_date, parse_date_time};
use serde_json::Value;

fn equality_only(operator: FilterOperator) -> bool {
    matches!(operator, FilterOperator::Eq | FilterOperator::In)
}

/// `String`: eq and in
#[derive(Debug, Default)]
pub struct StringFilterParser;

impl FilterCriteriaParser for StringFilterParser {
    fn name(&self) -> &'static str {
        "String"
    }

    fn supports_operator(&self, operator: FilterOperator) -> bool {
        equality_only(operator)
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        _ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        match value {
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            other => Err(mismatch(field_name, "String", other)),
        }
    }
}

/// `ID`: eq and in, identifiers may be given as strings or integers
#[derive(Debug, Default)]
pub struct IdFilterParser;

impl FilterCriteriaParser for IdFilterParser {
    fn name(&self) -> &'static str {
        "ID"
    }

    fn supports_operator(&self, operator: FilterOperator) -> bool {
        equality_only(operator)
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        _ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        match value {
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Integer)
                .ok_or_else(|| mismatch(field_name, "ID", value)),
            other => Err(mismatch(field_name, "ID", other)),
        }
    }
}

/// `Int`: all comparisons
#[derive(Debug, Default)]
pub struct IntFilterParser;

impl FilterCriteriaParser for IntFilterParser {
    fn name(&self) -> &'static str {
        "Int"
    }

    fn supports_operator(&self, _operator: FilterOperator) -> bool {
        true
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        _ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        value
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or_else(|| mismatch(field_name, "Int", value))
    }
}

/// `Float`: all comparisons, integers widen
#[derive(Debug, Default)]
pub struct FloatFilterParser;

impl FilterCriteriaParser for FloatFilterParser {
    fn name(&self) -> &'static str {
        "Float"
    }

    fn supports_operator(&self, _operator: FilterOperator) -> bool {
        true
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        _ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        value
            .as_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| mismatch(field_name, "Float", value))
    }
}

/// `Boolean`: eq only
#[derive(Debug, Default)]
pub struct BooleanFilterParser;

impl FilterCriteriaParser for BooleanFilterParser {
    fn name(&self) -> &'static str {
        "Boolean"
    }

    fn supports_operator(&self, operator: FilterOperator) -> bool {
        operator == FilterOperator::Eq
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        _ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        value
            .as_bool()
            .map(FieldValue::Boolean)
            .ok_or_else(|| mismatch(field_name, "Boolean", value))
    }
}

/// `Date`: all comparisons over `YYYY-MM-DD` literals or the `NOW` sentinel
#[derive(Debug, Default)]
pub struct DateFilterParser;

impl FilterCriteriaParser for DateFilterParser {
    fn name(&self) -> &'static str {
        "Date"
    }

    fn supports_operator(&self, _operator: FilterOperator) -> bool {
        true
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        if let Some(now) = ctx.now_for(value) {
            return Ok(FieldValue::Date(now.date_naive()));
        }
        value
            .as_str()
            .and_then(parse_date)
            .map(FieldValue::Date)
            .ok_or_else(|| mismatch(field_name, "Date", value))
    }
}

/// `DateTime`: all comparisons over RFC 3339 literals or the `NOW` sentinel
#[derive(Debug, Default)]
pub struct DateTimeFilterParser;

impl FilterCriteriaParser for DateTimeFilterParser {
    fn name(&self) -> &'static str {
        "DateTime"
    }

    fn supports_operator(&self, _operator: FilterOperator) -> bool {
        true
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        if let Some(now) = ctx.now_for(value) {
            return Ok(FieldValue::DateTime(now));
        }
        value
            .as_str()
            .and_then(parse_date_time)
            .map(FieldValue::DateTime)
            .ok_or_else(|| mismatch(field_name, "DateTime", value))
    }
}

/// Used for every scalar type without a registered parser
///
/// Supports eq and in, and passes any literal through untyped.
#[derive(Debug, Default)]
pub struct FallbackFilterParser;

impl FilterCriteriaParser for FallbackFilterParser {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn supports_operator(&self, operator: FilterOperator) -> bool {
        equality_only(operator)
    }

    fn parse_literal(
        &self,
        field_name: &str,
        value: &Value,
        _ctx: &ParseContext<'_>,
    ) -> Result<FieldValue, CompileError> {
        match FieldValue::from_json(value) {
            Some(FieldValue::Null) | None => Err(mismatch(field_name, "literal", value)),
            Some(literal) => Ok(literal),
        }
    }
}
