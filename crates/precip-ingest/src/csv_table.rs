//! CSV reading and writing for scenario tables.
//!
//! Reading goes through an untyped [`CsvTable`] first so each column's type
//! can be decided from its name and contents before the DataFrame is built.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use csv::ReaderBuilder;
use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom, Series};

use crate::error::{Result, StoreError};
use crate::polars_utils::{any_to_string, parse_f64, parse_i64};

/// Raw CSV contents: trimmed headers and cells, rows padded to header width.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column typing applied when a [`CsvTable`] becomes a DataFrame.
///
/// Named integer columns become `Int64`, named text columns stay `String`,
/// and every other column is `Float64` when all its non-empty cells parse as
/// numbers, `String` otherwise. Empty cells are null in every case.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub integer_columns: BTreeSet<String>,
    pub text_columns: BTreeSet<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            integer_columns: ["Year", "Month"].into_iter().map(String::from).collect(),
            text_columns: ["Date"].into_iter().map(String::from).collect(),
        }
    }
}

impl ReadOptions {
    pub fn new<I, T, S>(integer_columns: I, text_columns: T) -> Self
    where
        I: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            integer_columns: integer_columns.into_iter().map(Into::into).collect(),
            text_columns: text_columns.into_iter().map(Into::into).collect(),
        }
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a CSV file whose first record is the header row.
pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|source| StoreError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .iter()
            .map(normalize_header)
            .collect(),
        None => Vec::new(),
    };
    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let row: Vec<String> = (0..headers.len())
            .map(|idx| record.get(idx).map(normalize_cell).unwrap_or_default())
            .collect();
        rows.push(row);
    }
    Ok(CsvTable { headers, rows })
}

fn is_numeric_column(table: &CsvTable, col_idx: usize) -> bool {
    table.rows.iter().all(|row| {
        let value = row[col_idx].as_str();
        value.is_empty() || parse_f64(value).is_some()
    })
}

/// Build a typed DataFrame from a raw table.
///
/// `name` identifies the table in cell errors.
pub fn build_frame(name: &str, table: &CsvTable, options: &ReadOptions) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.headers.len());
    for (col_idx, header) in table.headers.iter().enumerate() {
        let cells = table.rows.iter().map(|row| row[col_idx].as_str());
        let column: Column = if options.text_columns.contains(header) {
            let values: Vec<Option<String>> = cells
                .map(|value| (!value.is_empty()).then(|| value.to_string()))
                .collect();
            Series::new(header.as_str().into(), values).into()
        } else if options.integer_columns.contains(header) {
            let mut values: Vec<Option<i64>> = Vec::with_capacity(table.rows.len());
            for (row, value) in cells.enumerate() {
                if value.is_empty() {
                    values.push(None);
                    continue;
                }
                let parsed = parse_i64(value).ok_or_else(|| StoreError::Cell {
                    name: name.to_string(),
                    column: header.clone(),
                    row,
                    value: value.to_string(),
                    expected: "an integer",
                })?;
                values.push(Some(parsed));
            }
            Series::new(header.as_str().into(), values).into()
        } else if is_numeric_column(table, col_idx) {
            let values: Vec<Option<f64>> = cells.map(parse_f64).collect();
            Series::new(header.as_str().into(), values).into()
        } else {
            let values: Vec<Option<String>> = cells
                .map(|value| (!value.is_empty()).then(|| value.to_string()))
                .collect();
            Series::new(header.as_str().into(), values).into()
        };
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}

/// Serialize a DataFrame as CSV with a header row. Nulls become empty cells.
pub fn write_csv<W: Write>(df: &DataFrame, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let names: Vec<&str> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .collect();
    writer.write_record(&names)?;
    let columns = df.get_columns();
    for idx in 0..df.height() {
        let record: Vec<String> = columns
            .iter()
            .map(|column| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
