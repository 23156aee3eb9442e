//! Structured row predicates.
//!
//! Row selections are built as values rather than query strings so they can be
//! checked against a table's schema, displayed in logs and compared in tests.

use std::fmt;

use polars::prelude::{DataFrame, Expr, IntoLazy, col, lit};
use precip_model::ConfigurationError;

use crate::error::Result;

/// Comparison applied by a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    IsNull,
    IsNotNull,
}

impl CompareOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Int(i64),
    Float(f64),
    Text(String),
    /// Used with the null checks, which take no operand.
    None,
}

impl PredicateValue {
    fn to_expr(&self) -> Expr {
        match self {
            Self::Int(value) => lit(*value),
            Self::Float(value) => lit(*value),
            Self::Text(value) => lit(value.clone()),
            Self::None => lit(polars::prelude::NULL),
        }
    }
}

impl From<i64> for PredicateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for PredicateValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for PredicateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PredicateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for PredicateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Self::None => f.write_str("NULL"),
        }
    }
}

/// A single `field op value` condition on a table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: CompareOp,
    pub value: PredicateValue,
}

impl Predicate {
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<PredicateValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<PredicateValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<PredicateValue>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<PredicateValue>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: CompareOp::IsNull,
            value: PredicateValue::None,
        }
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: CompareOp::IsNotNull,
            value: PredicateValue::None,
        }
    }

    /// Polars expression selecting the rows that satisfy this predicate.
    ///
    /// Comparisons against null are never true, so rows with a null field
    /// are dropped by every operator except [`CompareOp::IsNull`].
    pub fn to_expr(&self) -> Expr {
        let field = col(self.field.as_str());
        let value = self.value.to_expr();
        match self.op {
            CompareOp::Eq => field.eq(value),
            CompareOp::Ne => field.neq(value),
            CompareOp::Lt => field.lt(value),
            CompareOp::Le => field.lt_eq(value),
            CompareOp::Gt => field.gt(value),
            CompareOp::Ge => field.gt_eq(value),
            CompareOp::IsNull => field.is_null(),
            CompareOp::IsNotNull => field.is_not_null(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            CompareOp::IsNull | CompareOp::IsNotNull => {
                write!(f, "{} {}", self.field, self.op.symbol())
            }
            op => write!(f, "{} {} {}", self.field, op.symbol(), self.value),
        }
    }
}

/// Conjunction of predicates; `None` when the list is empty.
pub fn all_of(predicates: &[Predicate]) -> Option<Expr> {
    predicates
        .iter()
        .map(Predicate::to_expr)
        .reduce(|acc, expr| acc.and(expr))
}

/// Render a conjunction for logs, e.g. `Month >= 4 AND Month <= 9`.
pub fn describe(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Fail with `MissingColumn` when a predicate names a column `df` lacks.
pub fn check_fields(
    df: &DataFrame,
    predicates: &[Predicate],
    stage: &'static str,
) -> std::result::Result<(), ConfigurationError> {
    for predicate in predicates {
        if df.column(&predicate.field).is_err() {
            return Err(ConfigurationError::MissingColumn {
                stage,
                column: predicate.field.clone(),
            });
        }
    }
    Ok(())
}

/// Rows of `df` satisfying every predicate, in their original order.
pub fn select_rows(df: &DataFrame, predicates: &[Predicate], stage: &'static str) -> Result<DataFrame> {
    check_fields(df, predicates, stage)?;
    match all_of(predicates) {
        Some(expr) => Ok(df.clone().lazy().filter(expr).collect()?),
        None => Ok(df.clone()),
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{NamedFrom, Series};

    use super::*;

    fn months() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Month".into(), vec![Some(3i64), Some(4), None, Some(9), Some(10)]).into(),
            Series::new("Date".into(), vec![Some("a"), None, Some("c"), Some("d"), Some("e")])
                .into(),
        ])
        .unwrap()
    }

    #[test]
    fn displays_like_a_where_clause() {
        assert_eq!(Predicate::ge("Month", 4i64).to_string(), "Month >= 4");
        assert_eq!(Predicate::is_not_null("Date").to_string(), "Date IS NOT NULL");
        assert_eq!(Predicate::eq("Name", "O'Brien").to_string(), "Name == 'O''Brien'");
        let window = [Predicate::ge("Month", 4u32), Predicate::le("Month", 9u32)];
        assert_eq!(describe(&window), "Month >= 4 AND Month <= 9");
    }

    #[test]
    fn selects_inclusive_window_and_drops_nulls() {
        let window = [Predicate::ge("Month", 4i64), Predicate::le("Month", 9i64)];
        let out = select_rows(&months(), &window, "season").unwrap();
        let kept: Vec<Option<i64>> = out.column("Month").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(kept, vec![Some(4), Some(9)]);
    }

    #[test]
    fn null_checks_filter_on_presence() {
        let out = select_rows(&months(), &[Predicate::is_not_null("Date")], "filter").unwrap();
        assert_eq!(out.height(), 4);
        let out = select_rows(&months(), &[Predicate::is_null("Date")], "filter").unwrap();
        assert_eq!(out.height(), 1);
    }

    #[test]
    fn empty_conjunction_keeps_everything() {
        assert!(all_of(&[]).is_none());
        assert_eq!(select_rows(&months(), &[], "filter").unwrap().height(), 5);
    }

    #[test]
    fn unknown_field_is_a_configuration_error() {
        let err = check_fields(&months(), &[Predicate::eq("Year", 2015i64)], "baseline").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingColumn {
                stage: "baseline",
                column: "Year".to_string(),
            }
        );
    }
}
