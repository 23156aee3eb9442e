//! Tests for the CSV-directory and in-memory table stores.

use std::fs;
use std::path::Path;

use polars::prelude::{DataFrame, NamedFrom, Series};
use precip_ingest::{CsvTableStore, MemoryTableStore, StoreError, TableStore};

fn touch(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write file");
}

#[test]
fn lists_matching_csv_tables_sorted() {
    let dir = tempfile::tempdir().expect("temp dir");
    touch(dir.path(), "pr_MIROC5rcp85_month.csv", "Date,Year,Month\n");
    touch(dir.path(), "pr_CNRM_CM5rcp45_month.csv", "Date,Year,Month\n");
    touch(dir.path(), "pr_notes.txt", "not a table");
    touch(dir.path(), "README.csv", "x\n");
    fs::create_dir(dir.path().join("pr_dir.csv")).expect("create dir");

    let store = CsvTableStore::new(dir.path());
    let names = store.list("pr_*").expect("list tables");
    assert_eq!(names, vec!["pr_CNRM_CM5rcp45_month", "pr_MIROC5rcp85_month"]);

    let all = store.list("*.csv").expect("list tables");
    assert_eq!(all.len(), 3);
}

#[test]
fn listing_a_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CsvTableStore::new(dir.path().join("missing"));
    assert!(matches!(
        store.list("*.csv"),
        Err(StoreError::DirectoryNotFound { .. })
    ));
}

#[test]
fn reads_monthly_table_with_typed_columns() {
    let dir = tempfile::tempdir().expect("temp dir");
    touch(
        dir.path(),
        "scenario.csv",
        "\u{feff}Date,Year,Month,F1001,F1003\n\
         2015-04-01,2015,4,10.5,3\n\
         ,,,,\n\
         2015-05-01,2015.0,5,,4\n",
    );
    let store = CsvTableStore::new(dir.path());
    let df = store.read("scenario").expect("read table");

    assert_eq!(df.height(), 3);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["Date", "Year", "Month", "F1001", "F1003"]);
    assert_eq!(df.column("Date").unwrap().null_count(), 1);
    let years = df.column("Year").unwrap().i64().unwrap();
    assert_eq!(years.get(2), Some(2015));
    let f1001 = df.column("F1001").unwrap().f64().unwrap();
    assert_eq!(f1001.get(0), Some(10.5));
    assert_eq!(f1001.get(2), None);
}

#[test]
fn reading_a_missing_table_is_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CsvTableStore::new(dir.path());
    assert!(matches!(
        store.read("absent"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn write_then_read_preserves_values_and_nulls() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CsvTableStore::new(dir.path().join("out"));
    let df = DataFrame::new(vec![
        Series::new("FIPS".into(), vec![1001i64, 1005]).into(),
        Series::new("Year".into(), vec![2020i64, 2020]).into(),
        Series::new("SummerPrecip".into(), vec![60.25f64, 12.0]).into(),
        Series::new("SummerPrecip_1".into(), vec![Some(60.0f64), None]).into(),
    ])
    .unwrap();

    store.write(&df, "scenario_spFinal").expect("write table");
    let text = fs::read_to_string(dir.path().join("out/scenario_spFinal.csv")).unwrap();
    assert_eq!(
        text,
        "FIPS,Year,SummerPrecip,SummerPrecip_1\n1001,2020,60.25,60\n1005,2020,12,\n"
    );

    let back = store.read("scenario_spFinal").expect("read back");
    assert_eq!(back.height(), 2);
    let baseline = back.column("SummerPrecip_1").unwrap().f64().unwrap();
    assert_eq!(baseline.get(0), Some(60.0));
    assert_eq!(baseline.get(1), None);

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_none_or(|ext| ext != "csv"))
        .collect();
    assert!(leftovers.is_empty(), "staging files must not remain");
}

#[test]
fn remove_deletes_the_table_and_tolerates_absence() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CsvTableStore::new(dir.path());
    let df = DataFrame::new(vec![Series::new("Year".into(), vec![2015i64]).into()]).unwrap();

    store.write(&df, "pr_a_S").expect("write table");
    assert!(store.path_for("pr_a_S").is_file());
    store.remove("pr_a_S").expect("remove table");
    assert!(!store.path_for("pr_a_S").exists());
    store.remove("pr_a_S").expect("removing twice is fine");
}

#[test]
fn memory_store_round_trips_and_filters() {
    let df = DataFrame::new(vec![Series::new("Year".into(), vec![2015i64]).into()]).unwrap();
    let store = MemoryTableStore::with_tables([("pr_a", df.clone()), ("other", df.clone())]);

    assert_eq!(store.list("pr_*").unwrap(), vec!["pr_a"]);
    assert_eq!(store.list("*").unwrap(), vec!["other", "pr_a"]);

    store.write(&df, "pr_a_spFinal").unwrap();
    assert!(store.contains("pr_a_spFinal"));
    store.remove("pr_a_spFinal").unwrap();
    assert!(!store.contains("pr_a_spFinal"));
    store.remove("never_written").unwrap();
    assert_eq!(store.read("pr_a").unwrap().height(), 1);
    assert!(matches!(
        store.read("missing"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn invalid_pattern_is_reported() {
    let store = MemoryTableStore::new();
    assert!(matches!(
        store.list("[unclosed"),
        Err(StoreError::Pattern { .. })
    ));
}
