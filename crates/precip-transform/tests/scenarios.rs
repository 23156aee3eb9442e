//! End-to-end runs of the scenario pipeline on small monthly tables.

use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use precip_ingest::write_csv;
use precip_model::{ConfigurationError, NullPolicy, PipelineConfig};
use precip_transform::{DataError, ScenarioPipeline, TransformError, column_names};

/// Monthly rows for `years` x January..December. `value` gives each region's
/// reading for a (year, month), or None for a missing reading.
fn monthly<F>(years: &[i64], regions: &[&str], value: F) -> DataFrame
where
    F: Fn(&str, i64, i64) -> Option<f64>,
{
    let mut dates = Vec::new();
    let mut year_col = Vec::new();
    let mut month_col = Vec::new();
    for &year in years {
        for month in 1..=12i64 {
            dates.push(Some(format!("{year}-{month:02}-01")));
            year_col.push(year);
            month_col.push(month);
        }
    }
    let mut columns: Vec<Column> = vec![
        Series::new("Date".into(), dates).into(),
        Series::new("Year".into(), year_col.clone()).into(),
        Series::new("Month".into(), month_col.clone()).into(),
    ];
    for region in regions {
        let values: Vec<Option<f64>> = year_col
            .iter()
            .zip(&month_col)
            .map(|(year, month)| value(region, *year, *month))
            .collect();
        columns.push(Series::new((*region).into(), values).into());
    }
    DataFrame::new(columns).unwrap()
}

fn f64s(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().f64().unwrap().into_iter().collect()
}

fn i64s(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
    df.column(name).unwrap().i64().unwrap().into_iter().collect()
}

#[test]
fn flat_rainfall_gives_zero_change() {
    let df = monthly(&[2015, 2020], &["F1001", "F1003"], |_, _, _| Some(10.0));
    let output = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_flat", &df)
        .unwrap();

    assert_eq!(f64s(&output.seasonal, "Sum_F1001"), vec![Some(60.0), Some(60.0)]);
    assert_eq!(f64s(&output.seasonal, "Sum_F1003"), vec![Some(60.0), Some(60.0)]);
    assert_eq!(i64s(&output.seasonal, "Frequency"), vec![Some(6), Some(6)]);
    assert_eq!(output.transposed.height(), 4);

    let table = &output.table;
    assert_eq!(
        column_names(table),
        vec!["FIPS", "Year", "SummerPrecip", "SummerPrecip_1", "ChangeSummerPrecip"]
    );
    assert_eq!(i64s(table, "FIPS"), vec![Some(1001), Some(1003), Some(1001), Some(1003)]);
    assert_eq!(f64s(table, "SummerPrecip_1"), vec![Some(60.0); 4]);
    assert_eq!(f64s(table, "ChangeSummerPrecip"), vec![Some(0.0); 4]);

    assert_eq!(output.stats.years, 2);
    assert_eq!(output.stats.regions, 2);
    assert_eq!(output.stats.output_rows, 4);
    assert_eq!(output.stats.coverage.unmatched_rows, 0);
}

#[test]
fn region_without_baseline_gets_null_change_and_is_counted() {
    let df = monthly(&[2015, 2020], &["F1001", "F1005"], |region, year, _| {
        (region == "F1001" || year == 2020).then_some(10.0)
    });
    let output = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_gap", &df)
        .unwrap();

    let table = &output.table;
    let fips = i64s(table, "FIPS");
    let years = i64s(table, "Year");
    let change = f64s(table, "ChangeSummerPrecip");
    let baseline = f64s(table, "SummerPrecip_1");
    let row = fips
        .iter()
        .zip(&years)
        .position(|(f, y)| *f == Some(1005) && *y == Some(2020))
        .unwrap();
    assert_eq!(baseline[row], None);
    assert_eq!(change[row], None);
    assert_eq!(f64s(table, "SummerPrecip")[row], Some(60.0));

    assert!(output.stats.coverage.unmatched_regions.contains(&1005));
    assert!(!output.stats.coverage.unmatched_regions.contains(&1001));
    assert_eq!(change.iter().filter(|value| value.is_some()).count(), 2);
}

#[test]
fn missing_reference_year_aborts_before_output() {
    let df = monthly(&[2016, 2020], &["F1001"], |_, _, _| Some(10.0));
    let err = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_late", &df)
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        TransformError::Config(ConfigurationError::ReferenceYearAbsent { year: 2015 })
    ));
}

#[test]
fn garbled_reading_fails_the_scenario_instead_of_shrinking_the_total() {
    let mut df = monthly(&[2015, 2020], &["F1001"], |_, _, _| Some(10.0));
    // A CSV column with one non-numeric cell arrives as text.
    let readings: Vec<Option<&str>> = (0..24)
        .map(|row| Some(if row == 16 { "1O.0" } else { "10.0" }))
        .collect();
    df.with_column(Series::new("F1001".into(), readings)).unwrap();

    let err = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_garbled", &df)
        .unwrap_err();

    assert!(!err.is_fatal());
    assert!(matches!(
        err,
        TransformError::Data(DataError::Coercion { ref column, row: 16, ref value, .. })
            if column == "F1001" && value == "1O.0"
    ));
}

#[test]
fn undated_rows_and_out_of_season_months_do_not_count() {
    let mut df = monthly(&[2015], &["F1001"], |_, _, month| Some(month as f64));
    // Blank out the April date: that row must not contribute.
    let dates: Vec<Option<String>> = (1..=12)
        .map(|month| (month != 4).then(|| format!("2015-{month:02}-01")))
        .collect();
    df.with_column(Series::new("Date".into(), dates)).unwrap();

    let output = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_undated", &df)
        .unwrap();
    assert_eq!(output.stats.filtered_rows, 11);
    // May..September
    assert_eq!(f64s(&output.seasonal, "Sum_F1001"), vec![Some(35.0)]);
    assert_eq!(i64s(&output.seasonal, "Frequency"), vec![Some(5)]);
}

#[test]
fn null_policy_changes_all_missing_totals() {
    let df = monthly(&[2015, 2020], &["F1001", "F1003"], |region, year, _| {
        (region == "F1001" || year == 2015).then_some(1.0)
    });

    let excluded = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_nulls", &df)
        .unwrap();
    assert_eq!(f64s(&excluded.seasonal, "Sum_F1003"), vec![Some(6.0), None]);

    let mut config = PipelineConfig::default();
    config.season.null_policy = NullPolicy::TreatAsZero;
    let zeroed = ScenarioPipeline::new(&config).run("pr_nulls", &df).unwrap();
    assert_eq!(f64s(&zeroed.seasonal, "Sum_F1003"), vec![Some(6.0), Some(0.0)]);
    let change = f64s(&zeroed.table, "ChangeSummerPrecip");
    assert_eq!(change, vec![Some(0.0), Some(0.0), Some(0.0), Some(-6.0)]);
}

#[test]
fn intermediates_use_conventional_names() {
    let df = monthly(&[2015, 2020], &["F1001"], |_, _, _| Some(1.0));
    let output = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_a", &df)
        .unwrap();
    let names: Vec<String> = output
        .intermediates("pr_a", 2015)
        .into_iter()
        .map(|frame| frame.name)
        .collect();
    assert_eq!(names, vec!["pr_a_S", "pr_a_S_Tx", "pr_a_S_Tx_Base2015"]);
    assert_eq!(output.baseline_slice.height(), 1);
}

#[test]
fn final_table_renders_as_csv() {
    let df = monthly(&[2015, 2020], &["F1001", "F1005"], |region, year, month| {
        match (region, year) {
            ("F1001", 2015) => Some(10.0),
            ("F1001", _) => Some(10.0 + month as f64 / 4.0),
            (_, 2020) => Some(2.0),
            _ => None,
        }
    });
    let output = ScenarioPipeline::new(&PipelineConfig::default())
        .run("pr_render", &df)
        .unwrap();
    let mut buffer = Vec::new();
    write_csv(&output.table, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    insta::assert_snapshot!(text, @r"
    FIPS,Year,SummerPrecip,SummerPrecip_1,ChangeSummerPrecip
    1001,2015,60,60,0
    1005,2015,,,
    1001,2020,69.75,60,9.75
    1005,2020,12,,
    ");
}
