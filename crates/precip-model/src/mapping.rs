//! Declarative field mapping applied by the field coercer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnNames;
use crate::error::ConfigurationError;

/// Target type a kept column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Int64,
    Float64,
    Text,
}

/// One entry of a [`FieldMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    #[serde(default = "default_keep")]
    pub keep: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<FieldType>,
}

fn default_keep() -> bool {
    true
}

impl FieldRule {
    /// Keep the column, coercing it to `target`.
    pub fn coerce(name: impl Into<String>, target: FieldType) -> Self {
        Self {
            name: name.into(),
            keep: true,
            target: Some(target),
        }
    }

    /// Keep the column with its current type.
    pub fn keep(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keep: true,
            target: None,
        }
    }

    /// Exclude the column from the output.
    pub fn drop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keep: false,
            target: None,
        }
    }
}

/// Ordered column rules. Kept columns appear in declared order; columns the
/// mapping does not name follow in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    pub rules: Vec<FieldRule>,
}

impl FieldMapping {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Mapping for the final table: identifiers as integers, the value and
    /// baseline columns as doubles, the group count and identity column dropped.
    pub fn for_columns(columns: &ColumnNames) -> Self {
        Self::new(vec![
            FieldRule::coerce(columns.fips.as_str(), FieldType::Int64),
            FieldRule::coerce(columns.year.as_str(), FieldType::Int64),
            FieldRule::coerce(columns.value.as_str(), FieldType::Float64),
            FieldRule::coerce(columns.baseline(), FieldType::Float64),
            FieldRule::drop(columns.frequency.as_str()),
            FieldRule::drop("OBJECTID"),
        ])
    }

    pub fn kept(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().filter(|rule| rule.keep)
    }

    pub fn names(&self) -> BTreeSet<&str> {
        self.rules.iter().map(|rule| rule.name.as_str()).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = BTreeSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigurationError::MalformedMapping {
                    reason: "rule with an empty column name".to_string(),
                });
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigurationError::MalformedMapping {
                    reason: format!("column '{}' is mapped more than once", rule.name),
                });
            }
            if !rule.keep && rule.target.is_some() {
                return Err(ConfigurationError::MalformedMapping {
                    reason: format!("dropped column '{}' cannot have a target type", rule.name),
                });
            }
        }
        Ok(())
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::for_columns(&ColumnNames::default())
    }
}
