//! Options controlling seasonal aggregation and the baseline join.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// How null monthly values take part in a seasonal sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullPolicy {
    /// Skip nulls. A region whose values are all null in a year gets a null total.
    #[default]
    Exclude,
    /// Count nulls as 0.0. Totals are never null.
    TreatAsZero,
}

/// Resolution for a region that appears more than once in the reference year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Later rows overwrite earlier ones.
    #[default]
    LastWins,
    /// The first row seen is kept.
    FirstWins,
    /// Duplicates are a configuration error.
    Reject,
}

/// Inclusive month range defining the growing season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonWindow {
    pub start_month: u32,
    pub end_month: u32,
}

impl Default for SeasonWindow {
    fn default() -> Self {
        Self {
            start_month: 4,
            end_month: 9,
        }
    }
}

impl SeasonWindow {
    /// Build a window, rejecting months outside 1..=12 and reversed ranges.
    pub fn new(start_month: u32, end_month: u32) -> Result<Self, ConfigurationError> {
        let window = Self {
            start_month,
            end_month,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let valid = (1..=12).contains(&self.start_month)
            && (1..=12).contains(&self.end_month)
            && self.start_month <= self.end_month;
        if valid {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidSeasonWindow {
                start: self.start_month,
                end: self.end_month,
            })
        }
    }

    pub fn contains(&self, month: u32) -> bool {
        (self.start_month..=self.end_month).contains(&month)
    }

    /// Number of months covered by the window.
    pub fn month_count(&self) -> u32 {
        self.end_month - self.start_month + 1
    }
}

/// Season settings: the window and how nulls are summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonOptions {
    #[serde(flatten)]
    pub window: SeasonWindow,
    pub null_policy: NullPolicy,
}

/// Baseline settings: the reference year and duplicate resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineOptions {
    pub reference_year: i64,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for BaselineOptions {
    fn default() -> Self {
        Self {
            reference_year: 2015,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}
