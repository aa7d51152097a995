use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate, NaiveDateTime};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Table, MONTH};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Dataset kinds
// ---------------------------------------------------------------------------

/// Which of the two reporting periods a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// Current fiscal year to date.
    Current,
    /// Last fiscal year; must carry a `Month` column.
    Prior,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Current => write!(f, "current"),
            DatasetKind::Prior => write!(f, "prior"),
        }
    }
}

/// Load and normalise one dataset: existence check, format dispatch,
/// whitespace trimming and, for the prior period, `Month` date parsing.
pub fn load_dataset(path: &Path, kind: DatasetKind) -> Result<Table> {
    if !path.exists() {
        return Err(DashboardError::MissingFile {
            paths: vec![path.to_path_buf()],
        }
        .into());
    }

    let mut table = load_file(path, &kind.to_string())?;
    table.trim_text();

    if kind == DatasetKind::Prior {
        parse_month_column(&mut table)?;
    }

    info!(
        "Loaded {kind} dataset from {}: {} rows, columns {:?}",
        path.display(),
        table.len(),
        table.columns()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

/// Read a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, header in row 1
/// * `.parquet` / `.pq` – flat columns (strings, numbers, dates)
/// * `.json` – records-oriented: `[{ "col": value, ... }, ...]`
/// * anything else – comma-delimited text with a header row
pub fn load_file(path: &Path, name: &str) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_spreadsheet(path, name),
        "parquet" | "pq" => load_parquet(path, name),
        "json" => load_json(path, name),
        _ => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_delimited(file, name)
        }
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_spreadsheet(path: &Path, name: &str) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let header = rows.next().context("worksheet is empty")?;
    let columns: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();

    let mut table = Table::new(name, columns);
    for row in rows {
        table.push_row(row.iter().map(sheet_cell).collect());
    }
    Ok(table)
}

fn sheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::number(*f),
        Data::Int(i) => CellValue::number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::timestamp)
            .unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(CellValue::timestamp)
            .or_else(|| parse_lenient_date(s).map(CellValue::Date))
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Delimited-text loader
// ---------------------------------------------------------------------------

/// Field values read as missing data, on top of the empty field.
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "#N/A", "<NA>", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None",
];

/// Comma-delimited text with a header row.  Empty fields and the usual NA
/// markers (`NA`, `NaN`, `null`, …) become nulls; columns whose every
/// remaining field parses as a number become numeric.
pub fn read_delimited<R: Read>(source: R, name: &str) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(source);
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(name, columns);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.push_row(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() || NA_TOKENS.contains(&field.trim()) {
                        CellValue::Null
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    infer_numeric_columns(&mut table);
    Ok(table)
}

/// Promote text columns to numbers when every non-null cell parses.
/// `inf` parses but is not a usable number, so it ends up null.
fn infer_numeric_columns(table: &mut Table) {
    for idx in 0..table.columns().len() {
        let mut any = false;
        let numeric = table.column_values(idx).all(|cell| match cell {
            CellValue::Null => true,
            CellValue::Text(s) => {
                any = true;
                s.trim().parse::<f64>().is_ok()
            }
            _ => false,
        });
        if numeric && any {
            table.map_column(idx, |cell| match cell {
                CellValue::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(CellValue::number)
                    .unwrap_or(CellValue::Null),
                other => other.clone(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "State Name": "MH", "Sales Qty": 10, "Sales Amt": 1250.5 },
///   ...
/// ]
/// ```
fn load_json(path: &Path, name: &str) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut parsed: Vec<BTreeMap<String, CellValue>> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val));
        }
        parsed.push(row);
    }

    let mut table = Table::new(name, columns.clone());
    for mut row in parsed {
        table.push_row(
            columns
                .iter()
                .map(|c| row.remove(c).unwrap_or(CellValue::Null))
                .collect(),
        );
    }
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => n
            .as_f64()
            .map(CellValue::number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        JsonValue::Bool(b) => CellValue::Text(b.to_string()),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Strings, integers, floats and booleans map to text/number cells; `Date32`
/// and `Date64` columns map to dates and timestamps keep their time of day.  Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, name: &str) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(name, columns);

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            table.push_row(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => CellValue::number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => {
            CellValue::number(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => CellValue::number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Text(col.as_boolean().value(row).to_string()),
        DataType::Date32 => date_cell(col.as_primitive::<Date32Type>().value_as_date(row)),
        DataType::Date64 => date_cell(col.as_primitive::<Date64Type>().value_as_date(row)),
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => col
                    .as_primitive::<TimestampSecondType>()
                    .value_as_datetime(row),
                TimeUnit::Millisecond => col
                    .as_primitive::<TimestampMillisecondType>()
                    .value_as_datetime(row),
                TimeUnit::Microsecond => col
                    .as_primitive::<TimestampMicrosecondType>()
                    .value_as_datetime(row),
                TimeUnit::Nanosecond => col
                    .as_primitive::<TimestampNanosecondType>()
                    .value_as_datetime(row),
            };
            datetime
                .map(CellValue::timestamp)
                .unwrap_or(CellValue::Null)
        }
        _ => arrow::util::display::array_value_to_string(col.as_ref(), row)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null),
    }
}

fn date_cell(date: Option<NaiveDate>) -> CellValue {
    date.map(CellValue::Date).unwrap_or(CellValue::Null)
}

// ---------------------------------------------------------------------------
// Month parsing (prior-period table)
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d-%b-%Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Month-and-year only; parsed as the first of the month.
const MONTH_FORMATS: &[&str] = &["%B-%Y", "%b-%Y", "%B %Y", "%b %Y", "%b-%y"];

/// Spreadsheet serial day 0.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Parse a date the way a forgiving spreadsheet user would expect.
/// Returns `None` instead of failing.
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
        .or_else(|| {
            let padded = format!("01-{s}");
            MONTH_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(&padded, &format!("%d-{fmt}")).ok()
            })
        })
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.trunc() as u64))
}

fn month_cell(cell: &CellValue) -> CellValue {
    let parsed = match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_lenient_date(s),
        CellValue::Number(v) => serial_to_date(*v),
        CellValue::Null => None,
    };
    date_cell(parsed)
}

/// Convert the `Month` column to dates.  Unparseable values become null and
/// stay in the table; a missing column is an error.
pub fn parse_month_column(table: &mut Table) -> Result<(), DashboardError> {
    let idx = table.column_index(MONTH)?;

    let before = table.column_values(idx).filter(|c| !c.is_null()).count();
    table.map_column(idx, month_cell);
    let after = table.column_values(idx).filter(|c| !c.is_null()).count();

    if after < before {
        warn!(
            "{} '{MONTH}' value(s) in {} could not be parsed as dates",
            before - after,
            table.name
        );
    }
    Ok(())
}
