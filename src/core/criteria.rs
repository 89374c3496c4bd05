//! Boolean filter predicate trees
//!
//! A [`FilterCriteria`] tree is produced by the filter criteria engine and
//! evaluated by backend loaders, never by the compiler itself.

use crate::core::field::FieldValue;
use crate::core::request::FieldPath;
use std::fmt;

/// Operators accepted in a filter body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Not,
}

impl FilterOperator {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "eq" => Some(FilterOperator::Eq),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "in" => Some(FilterOperator::In),
            "not" => Some(FilterOperator::Not),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::In => "in",
            FilterOperator::Not => "not",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCriteria {
    Equals {
        field_path: FieldPath,
        value: FieldValue,
    },
    In {
        field_path: FieldPath,
        values: Vec<FieldValue>,
    },
    LowerThen {
        field_path: FieldPath,
        value: FieldValue,
    },
    LowerThenEquals {
        field_path: FieldPath,
        value: FieldValue,
    },
    GreaterThen {
        field_path: FieldPath,
        value: FieldValue,
    },
    GreaterThenEquals {
        field_path: FieldPath,
        value: FieldValue,
    },
    And(Vec<FilterCriteria>),
    Not(Box<FilterCriteria>),
}

impl FilterCriteria {
    /// Build the single-value comparison matching `operator`
    ///
    /// Returns `None` for `in` and `not`, which are not single-value comparisons.
    pub fn comparison(
        operator: FilterOperator,
        field_path: FieldPath,
        value: FieldValue,
    ) -> Option<Self> {
        match operator {
            FilterOperator::Eq => Some(FilterCriteria::Equals { field_path, value }),
            FilterOperator::Lt => Some(FilterCriteria::LowerThen { field_path, value }),
            FilterOperator::Lte => Some(FilterCriteria::LowerThenEquals { field_path, value }),
            FilterOperator::Gt => Some(FilterCriteria::GreaterThen { field_path, value }),
            FilterOperator::Gte => Some(FilterCriteria::GreaterThenEquals { field_path, value }),
            FilterOperator::In | FilterOperator::Not => None,
        }
    }

    /// Combine siblings: none yields `None`, one is returned as is, more become `And`
    pub fn all_of(mut children: Vec<FilterCriteria>) -> Option<Self> {
        match children.len() {
            0 => None,
            1 => children.pop(),
            _ => Some(FilterCriteria::And(children)),
        }
    }

    /// Negate siblings: `Not(child)` for one, `Not(And(children))` for more
    pub fn negate(children: Vec<FilterCriteria>) -> Option<Self> {
        Self::all_of(children).map(|inner| FilterCriteria::Not(Box::new(inner)))
    }

    /// Field path of a leaf criterion
    pub fn field_path(&self) -> Option<&FieldPath> {
        match self {
            FilterCriteria::Equals { field_path, .. }
            | FilterCriteria::In { field_path, .. }
            | FilterCriteria::LowerThen { field_path, .. }
            | FilterCriteria::LowerThenEquals { field_path, .. }
            | FilterCriteria::GreaterThen { field_path, .. }
            | FilterCriteria::GreaterThenEquals { field_path, .. } => Some(field_path),
            FilterCriteria::And(_) | FilterCriteria::Not(_) => None,
        }
    }

    /// All leaf field paths of the tree, depth first
    pub fn field_paths(&self) -> Vec<&FieldPath> {
        match self {
            FilterCriteria::And(children) => {
                children.iter().flat_map(FilterCriteria::field_paths).collect()
            }
            FilterCriteria::Not(inner) => inner.field_paths(),
            leaf => leaf.field_path().into_iter().collect(),
        }
    }
}
