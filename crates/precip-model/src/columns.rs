//! Column naming conventions for raw, aggregated and final tables.

use serde::{Deserialize, Serialize};

/// Names of the columns each stage reads and writes.
///
/// Region columns are recognized by prefix: raw monthly tables carry
/// `region_prefix` + code (`F1001`), seasonal totals carry
/// `sum_prefix` + raw name (`Sum_F1001`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub year: String,
    pub month: String,
    pub region_prefix: String,
    pub sum_prefix: String,
    pub frequency: String,
    pub fips: String,
    pub value: String,
    pub baseline_suffix: String,
    pub change: String,
    /// Display label for the baseline column.
    pub baseline_label: String,
    /// Display label for the change column.
    pub change_label: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            year: "Year".to_string(),
            month: "Month".to_string(),
            region_prefix: "F".to_string(),
            sum_prefix: "Sum_".to_string(),
            frequency: "Frequency".to_string(),
            fips: "FIPS".to_string(),
            value: "SummerPrecip".to_string(),
            baseline_suffix: "_1".to_string(),
            change: "ChangeSummerPrecip".to_string(),
            baseline_label: "Summer Precip Base".to_string(),
            change_label: "Change in Summer Precip".to_string(),
        }
    }
}

impl ColumnNames {
    /// Name of the joined baseline value column (`SummerPrecip_1`).
    pub fn baseline(&self) -> String {
        format!("{}{}", self.value, self.baseline_suffix)
    }

    /// Aggregated name for a raw region column (`F1001` -> `Sum_F1001`).
    pub fn summed(&self, raw_region: &str) -> String {
        format!("{}{}", self.sum_prefix, raw_region)
    }

    /// Prefix shared by every aggregated region column (`Sum_F`).
    pub fn summed_region_prefix(&self) -> String {
        format!("{}{}", self.sum_prefix, self.region_prefix)
    }

    /// Characters to strip from an aggregated region column to recover its code.
    pub fn summed_prefix_len(&self) -> usize {
        self.sum_prefix.len() + self.region_prefix.len()
    }

    /// Returns true when `name` follows the raw region convention: the region
    /// prefix followed by one or more ASCII digits.
    pub fn is_raw_region(&self, name: &str) -> bool {
        name.strip_prefix(self.region_prefix.as_str())
            .is_some_and(|code| !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Returns true when `name` follows the aggregated region convention.
    pub fn is_summed_region(&self, name: &str) -> bool {
        name.strip_prefix(self.sum_prefix.as_str())
            .is_some_and(|raw| self.is_raw_region(raw))
    }

    /// Raw region columns of a table, in table order.
    pub fn raw_regions<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| self.is_raw_region(name))
            .map(str::to_string)
            .collect()
    }

    /// Aggregated region columns of a table, in table order.
    pub fn summed_regions<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| self.is_summed_region(name))
            .map(str::to_string)
            .collect()
    }
}
