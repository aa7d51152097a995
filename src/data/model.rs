use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::DashboardError;

/// Metric column: units sold.
pub const SALES_QTY: &str = "Sales Qty";
/// Metric column: sales value.
pub const SALES_AMT: &str = "Sales Amt";
/// Date column of the prior-period table.
pub const MONTH: &str = "Month";

/// Columns that never get a filter widget.
pub const RESERVED_COLUMNS: [&str; 3] = [SALES_QTY, SALES_AMT, MONTH];

/// Metrics in selector order.
pub const METRICS: [&str; 2] = [SALES_QTY, SALES_AMT];

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, resolved at load time.
/// Used as a `BTreeSet` / `HashMap` key downstream, so it must be `Ord + Hash`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// A timestamp with a non-midnight time of day.
    DateTime(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord/Hash: floats compare by `total_cmp` so keys stay consistent --

/// `-0.0` and `0.0` are one key.
fn canonical(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Date(_) => 2,
                DateTime(_) => 3,
                Text(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Number(a), Number(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Number(v) => canonical(*v).to_bits().hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{v:.0}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Numeric cell as loaders build it: non-finite values are missing data
    /// and become `Null`, and `-0.0` is stored as `0.0`.
    pub fn number(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Number(canonical(v))
        } else {
            CellValue::Null
        }
    }

    /// Timestamp cell; midnight collapses to a plain date.
    pub fn timestamp(dt: NaiveDateTime) -> Self {
        if dt.time() == chrono::NaiveTime::MIN {
            CellValue::Date(dt.date())
        } else {
            CellValue::DateTime(dt)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Finite numbers only.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Name of the variant, used in `TypeMismatch` messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Text(_) => "text",
            CellValue::Number(_) => "number",
            CellValue::Date(_) => "date",
            CellValue::DateTime(_) => "datetime",
            CellValue::Null => "null",
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::number(v)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

// ---------------------------------------------------------------------------
// Table – rows sharing one column set
// ---------------------------------------------------------------------------

/// An ordered sequence of rows with a fixed, load-time column set.
///
/// Rows are stored positionally; every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Label used in error messages ("current", "prior", …).
    pub name: String,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Table {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with nulls or truncating so it matches the header.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn column_index(&self, column: &str) -> Result<usize, DashboardError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DashboardError::missing_column(column, &self.name))
    }

    /// Cells of one column, top to bottom.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// True when the column holds at least one number and nothing but numbers or nulls.
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        let mut any = false;
        for cell in self.column_values(idx) {
            match cell {
                CellValue::Number(_) => any = true,
                CellValue::Null => {}
                _ => return false,
            }
        }
        any
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        self.rows.iter().map(move |cells| RowRef { table: self, cells })
    }

    /// Copy of the rows accepted by `keep`, original order preserved.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// Like [`Table::filter_rows`], with by-name typed access to each row.
    /// The first error aborts the scan.
    pub fn try_filter_rows<F>(&self, mut keep: F) -> Result<Table, DashboardError>
    where
        F: FnMut(RowRef<'_>) -> Result<bool, DashboardError>,
    {
        let mut rows = Vec::new();
        for row in self.iter_rows() {
            if keep(row)? {
                rows.push(row.cells.to_vec());
            }
        }
        Ok(Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Rewrite every cell of one column in place.
    pub fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// Strip leading/trailing whitespace from every text cell.
    pub fn trim_text(&mut self) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if let CellValue::Text(s) = cell {
                    let trimmed = s.trim();
                    if trimmed.len() != s.len() {
                        *s = trimmed.to_string();
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RowRef – typed, by-name access to one row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    cells: &'a [CellValue],
}

/// Typed accessors return `Ok(None)` for a null cell, `MissingColumn` for an
/// unknown column and `TypeMismatch` for any other variant.  Nothing is coerced.
impl<'a> RowRef<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        let idx = self.table.columns.iter().position(|c| c == column)?;
        self.cells.get(idx)
    }

    fn require(&self, column: &str) -> Result<&'a CellValue, DashboardError> {
        self.get(column)
            .ok_or_else(|| DashboardError::missing_column(column, &self.table.name))
    }

    pub fn number(&self, column: &str) -> Result<Option<f64>, DashboardError> {
        let cell = self.require(column)?;
        match cell {
            CellValue::Null => Ok(None),
            CellValue::Number(_) => Ok(cell.as_number()),
            other => Err(mismatch(column, "number", other)),
        }
    }

    pub fn date(&self, column: &str) -> Result<Option<NaiveDate>, DashboardError> {
        let cell = self.require(column)?;
        match cell {
            CellValue::Null => Ok(None),
            CellValue::Date(_) => Ok(cell.as_date()),
            other => Err(mismatch(column, "date", other)),
        }
    }
}

fn mismatch(column: &str, expected: &'static str, found: &CellValue) -> DashboardError {
    DashboardError::TypeMismatch {
        column: column.to_string(),
        expected,
        found: found.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new("current", vec!["State Name".into(), SALES_QTY.into()]);
        t.push_row(vec!["  MH ".into(), 10.0.into()]);
        t.push_row(vec!["GA".into()]);
        t
    }

    #[test]
    fn push_row_pads_short_rows() {
        let t = sample();
        assert_eq!(t.rows()[1], vec![CellValue::from("GA"), CellValue::Null]);
    }

    #[test]
    fn trim_text_strips_whitespace() {
        let mut t = sample();
        t.trim_text();
        assert_eq!(t.rows()[0][0], CellValue::from("MH"));
    }

    #[test]
    fn typed_accessors_report_mismatch() {
        let t = sample();
        let row = t.iter_rows().next().unwrap();
        assert_eq!(row.number(SALES_QTY), Ok(Some(10.0)));
        assert_eq!(
            row.number("State Name"),
            Err(DashboardError::TypeMismatch {
                column: "State Name".into(),
                expected: "number",
                found: "text",
            })
        );
        assert!(matches!(
            row.date(MONTH),
            Err(DashboardError::MissingColumn { .. })
        ));

        let second = t.iter_rows().nth(1).unwrap();
        assert_eq!(second.number(SALES_QTY), Ok(None));
    }

    #[test]
    fn try_filter_rows_propagates_mismatch() {
        let t = sample();
        let kept = t
            .try_filter_rows(|row| Ok(row.number(SALES_QTY)?.is_some()))
            .unwrap();
        assert_eq!(kept.len(), 1);

        let err = t.try_filter_rows(|row| Ok(row.date("State Name")?.is_some()));
        assert_eq!(
            err,
            Err(DashboardError::TypeMismatch {
                column: "State Name".into(),
                expected: "date",
                found: "text",
            })
        );
    }

    #[test]
    fn non_finite_numbers_are_missing() {
        assert_eq!(CellValue::number(f64::NAN), CellValue::Null);
        assert_eq!(CellValue::number(f64::INFINITY), CellValue::Null);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn negative_zero_is_the_same_key_as_zero() {
        use std::collections::HashSet;

        assert_eq!(CellValue::Number(-0.0), CellValue::Number(0.0));
        let keys: HashSet<CellValue> = [CellValue::Number(-0.0), CellValue::Number(0.0)].into();
        assert_eq!(keys.len(), 1);
        assert_eq!(CellValue::from(-0.0).to_string(), "0");
    }

    #[test]
    fn midnight_timestamps_become_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let noon = day.and_hms_opt(12, 30, 0).unwrap();
        assert_eq!(
            CellValue::timestamp(day.and_hms_opt(0, 0, 0).unwrap()),
            CellValue::Date(day)
        );
        assert_eq!(CellValue::timestamp(noon), CellValue::DateTime(noon));
        assert_eq!(CellValue::DateTime(noon).to_string(), "2024-09-01 12:30:00");
    }

    #[test]
    fn numeric_column_detection() {
        let t = sample();
        assert!(!t.is_numeric_column(0));
        assert!(t.is_numeric_column(1));
    }

    #[test]
    fn ordering_groups_variants() {
        let mut v = vec![
            CellValue::from("b"),
            CellValue::Null,
            CellValue::from(2.0),
            CellValue::from("a"),
            CellValue::from(-1.0),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                CellValue::Null,
                CellValue::from(-1.0),
                CellValue::from(2.0),
                CellValue::from("a"),
                CellValue::from("b"),
            ]
        );
    }

    #[test]
    fn display_drops_trailing_zero_fraction() {
        assert_eq!(CellValue::from(15.0).to_string(), "15");
        assert_eq!(CellValue::from(12.35).to_string(), "12.35");
        assert_eq!(CellValue::Null.to_string(), "");
    }
}
