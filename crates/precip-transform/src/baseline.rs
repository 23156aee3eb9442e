//! Reference-year baseline join.
//!
//! The rows of the reference year form the baseline slice. Every row of the
//! long table then receives the slice's value for its region, or null when the
//! region has no reference-year value. A reference-year row whose value is
//! null does not count as a baseline.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use precip_model::{BaselineOptions, ConfigurationError, DuplicatePolicy};
use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::require_columns;
use crate::predicate::{Predicate, select_rows};

const STAGE: &str = "baseline";

/// How well the baseline slice covered the long table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinCoverage {
    /// Distinct regions in the baseline slice.
    pub baseline_regions: usize,
    /// Rows that found no baseline value.
    pub unmatched_rows: usize,
    /// Regions with no non-null reference-year value.
    pub unmatched_regions: BTreeSet<i64>,
    /// Regions with more than one reference-year value.
    pub duplicate_regions: BTreeSet<i64>,
}

/// Result of [`BaselineJoiner::apply`].
#[derive(Debug, Clone)]
pub struct BaselineJoin {
    /// Input rows with the baseline column appended.
    pub joined: DataFrame,
    /// Reference-year rows of the input.
    pub slice: DataFrame,
    pub coverage: JoinCoverage,
}

/// Joins every row to its region's reference-year value.
#[derive(Debug, Clone)]
pub struct BaselineJoiner {
    options: BaselineOptions,
    code_column: String,
    year_column: String,
    value_column: String,
    baseline_column: String,
}

impl BaselineJoiner {
    pub fn new(
        options: BaselineOptions,
        code_column: impl Into<String>,
        year_column: impl Into<String>,
        value_column: impl Into<String>,
        baseline_column: impl Into<String>,
    ) -> Self {
        Self {
            options,
            code_column: code_column.into(),
            year_column: year_column.into(),
            value_column: value_column.into(),
            baseline_column: baseline_column.into(),
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::eq(self.year_column.as_str(), self.options.reference_year)
    }

    pub fn apply(&self, df: &DataFrame) -> Result<BaselineJoin> {
        require_columns(
            df,
            STAGE,
            [
                self.code_column.as_str(),
                self.year_column.as_str(),
                self.value_column.as_str(),
            ],
        )?;
        let year = self.options.reference_year;
        let slice = select_rows(df, &[self.predicate()], STAGE)?;
        if slice.height() == 0 {
            return Err(ConfigurationError::ReferenceYearAbsent { year }.into());
        }

        let (baseline, duplicate_regions) = self.baseline_values(&slice)?;
        if !duplicate_regions.is_empty() {
            warn!(
                reference_year = year,
                policy = ?self.options.duplicate_policy,
                regions = duplicate_regions.len(),
                first = ?duplicate_regions.first(),
                "duplicate regions in reference year"
            );
        }

        let codes = df.column(&self.code_column)?.cast(&DataType::Int64)?;
        let codes = codes.i64()?;
        let mut values: Vec<Option<f64>> = Vec::with_capacity(df.height());
        let mut coverage = JoinCoverage {
            baseline_regions: baseline.len(),
            duplicate_regions,
            ..JoinCoverage::default()
        };
        for code in codes.into_iter() {
            match code.and_then(|code| baseline.get(&code)) {
                Some(value) => values.push(Some(*value)),
                None => {
                    coverage.unmatched_rows += 1;
                    if let Some(code) = code {
                        coverage.unmatched_regions.insert(code);
                    }
                    values.push(None);
                }
            }
        }

        let mut joined = df.clone();
        joined.with_column(Series::new(self.baseline_column.as_str().into(), values))?;

        if coverage.unmatched_rows > 0 {
            warn!(
                reference_year = year,
                unmatched_rows = coverage.unmatched_rows,
                unmatched_regions = coverage.unmatched_regions.len(),
                first = ?coverage.unmatched_regions.first(),
                "regions missing from baseline; change will be null"
            );
        }
        debug!(
            reference_year = year,
            slice_rows = slice.height(),
            baseline_regions = coverage.baseline_regions,
            "joined baseline"
        );
        Ok(BaselineJoin {
            joined,
            slice,
            coverage,
        })
    }

    /// Region code to reference-year value, resolving repeats by policy.
    fn baseline_values(
        &self,
        slice: &DataFrame,
    ) -> Result<(BTreeMap<i64, f64>, BTreeSet<i64>)> {
        let codes = slice.column(&self.code_column)?.cast(&DataType::Int64)?;
        let values = slice.column(&self.value_column)?.cast(&DataType::Float64)?;
        let mut baseline = BTreeMap::new();
        let mut duplicates = BTreeSet::new();
        for (code, value) in codes.i64()?.into_iter().zip(values.f64()?.into_iter()) {
            let (Some(code), Some(value)) = (code, value) else {
                continue;
            };
            if baseline.contains_key(&code) {
                duplicates.insert(code);
                match self.options.duplicate_policy {
                    DuplicatePolicy::LastWins => {}
                    DuplicatePolicy::FirstWins => continue,
                    DuplicatePolicy::Reject => {
                        return Err(ConfigurationError::DuplicateBaseline {
                            fips: code,
                            year: self.options.reference_year,
                        }
                        .into());
                    }
                }
            }
            baseline.insert(code, value);
        }
        Ok((baseline, duplicates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;

    fn long(rows: &[(i64, i64, Option<f64>)]) -> DataFrame {
        DataFrame::new(vec![
            Series::new("FIPS".into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()).into(),
            Series::new("Year".into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()).into(),
            Series::new("SummerPrecip".into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()).into(),
        ])
        .unwrap()
    }

    fn joiner(policy: DuplicatePolicy) -> BaselineJoiner {
        BaselineJoiner::new(
            BaselineOptions {
                reference_year: 2015,
                duplicate_policy: policy,
            },
            "FIPS",
            "Year",
            "SummerPrecip",
            "SummerPrecip_1",
        )
    }

    fn baseline_values(df: &DataFrame) -> Vec<Option<f64>> {
        df.column("SummerPrecip_1").unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn every_row_gets_its_region_reference_value() {
        let df = long(&[
            (1001, 2015, Some(60.0)),
            (1003, 2015, Some(30.0)),
            (1001, 2020, Some(61.0)),
            (1003, 2020, Some(29.0)),
        ]);
        let join = joiner(DuplicatePolicy::LastWins).apply(&df).unwrap();
        assert_eq!(join.slice.height(), 2);
        assert_eq!(
            baseline_values(&join.joined),
            vec![Some(60.0), Some(30.0), Some(60.0), Some(30.0)]
        );
        assert_eq!(join.coverage.unmatched_rows, 0);
        assert_eq!(join.coverage.baseline_regions, 2);
    }

    #[test]
    fn region_missing_from_slice_gets_null() {
        let df = long(&[
            (1001, 2015, Some(60.0)),
            (1001, 2020, Some(61.0)),
            (1005, 2020, Some(12.0)),
        ]);
        let join = joiner(DuplicatePolicy::LastWins).apply(&df).unwrap();
        assert_eq!(baseline_values(&join.joined), vec![Some(60.0), Some(60.0), None]);
        assert_eq!(join.coverage.unmatched_rows, 1);
        assert_eq!(join.coverage.unmatched_regions, BTreeSet::from([1005]));
    }

    #[test]
    fn absent_reference_year_is_fatal() {
        let df = long(&[(1001, 2020, Some(61.0))]);
        let err = joiner(DuplicatePolicy::LastWins).apply(&df).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            TransformError::Config(ConfigurationError::ReferenceYearAbsent { year: 2015 })
        ));
    }

    #[test]
    fn duplicate_policy_decides_which_value_wins() {
        let df = long(&[
            (1001, 2015, Some(1.0)),
            (1001, 2015, Some(2.0)),
            (1001, 2020, Some(5.0)),
        ]);

        let last = joiner(DuplicatePolicy::LastWins).apply(&df).unwrap();
        assert_eq!(baseline_values(&last.joined)[2], Some(2.0));
        assert_eq!(last.coverage.duplicate_regions, BTreeSet::from([1001]));

        let first = joiner(DuplicatePolicy::FirstWins).apply(&df).unwrap();
        assert_eq!(baseline_values(&first.joined)[2], Some(1.0));

        let err = joiner(DuplicatePolicy::Reject).apply(&df).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Config(ConfigurationError::DuplicateBaseline { fips: 1001, year: 2015 })
        ));
    }

    #[test]
    fn null_reference_value_counts_as_unmatched() {
        let df = long(&[
            (1001, 2015, None),
            (1003, 2015, Some(4.0)),
            (1001, 2020, Some(5.0)),
        ]);
        let join = joiner(DuplicatePolicy::LastWins).apply(&df).unwrap();
        assert_eq!(baseline_values(&join.joined), vec![None, Some(4.0), None]);
        assert_eq!(join.coverage.unmatched_rows, 2);
        assert_eq!(join.coverage.unmatched_regions, BTreeSet::from([1001]));
        assert_eq!(join.coverage.baseline_regions, 1);
    }

    #[test]
    fn reference_year_of_only_nulls_is_still_present() {
        let df = long(&[(1001, 2015, None), (1001, 2020, Some(5.0))]);
        let join = joiner(DuplicatePolicy::Reject).apply(&df).unwrap();
        assert_eq!(join.slice.height(), 1);
        assert_eq!(join.coverage.unmatched_rows, 2);
    }
}
