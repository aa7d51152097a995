use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::model::{CellValue, Table, RESERVED_COLUMNS};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Filter options: candidate values per column
// ---------------------------------------------------------------------------

/// Distinct non-null values of one filterable column, sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOptions {
    pub column: String,
    pub values: BTreeSet<CellValue>,
}

/// Candidate values for every column except `excluded` and the reserved
/// metric / month columns.  Columns keep the table's order.
pub fn build_filter_options(table: &Table, excluded: &[&str]) -> Vec<ColumnOptions> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, col)| {
            !excluded.contains(&col.as_str()) && !RESERVED_COLUMNS.contains(&col.as_str())
        })
        .map(|(idx, col)| ColumnOptions {
            column: col.clone(),
            values: table
                .column_values(idx)
                .filter(|v| !v.is_null())
                .cloned()
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Selections (what the multi-select widgets hold) → ColumnFilter
// ---------------------------------------------------------------------------

/// Label of the sentinel entry at the top of every multi-select.
pub const ALL_LABEL: &str = "ALL";

/// One entry of a column's multi-select.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterChoice {
    /// The sentinel: no restriction on this column.
    All,
    Value(CellValue),
}

impl fmt::Display for FilterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterChoice::All => write!(f, "{ALL_LABEL}"),
            FilterChoice::Value(v) => write!(f, "{v}"),
        }
    }
}

/// Per-column widget state: column_name → chosen entries.
/// A column absent from the map is at its default, `{All}`.
pub type FilterSelections = BTreeMap<String, BTreeSet<FilterChoice>>;

/// Permitted values per column.  A column absent from the map is unrestricted.
pub type ColumnFilter = BTreeMap<String, BTreeSet<CellValue>>;

/// Translate widget selections into a [`ColumnFilter`].
///
/// * `All` anywhere in a selection → column omitted (unrestricted), even when
///   explicit values are chosen alongside it
/// * otherwise the chosen values form the permitted set; an empty selection
///   therefore matches no rows
pub fn column_filter(selections: &FilterSelections) -> ColumnFilter {
    selections
        .iter()
        .filter(|(_, chosen)| !chosen.contains(&FilterChoice::All))
        .map(|(col, chosen)| {
            let values = chosen
                .iter()
                .filter_map(|c| match c {
                    FilterChoice::Value(v) => Some(v.clone()),
                    FilterChoice::All => None,
                })
                .collect();
            (col.clone(), values)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Filter application
// ---------------------------------------------------------------------------

/// Return the rows whose value in every filtered column is permitted.
///
/// Row order is preserved.  No matching rows is an empty table, not an error;
/// a filtered column missing from `table` is a [`DashboardError::MissingColumn`].
pub fn apply_filter(table: &Table, filter: &ColumnFilter) -> Result<Table, DashboardError> {
    // Resolve column positions once so the row scan stays linear.
    let predicates: Vec<(usize, &BTreeSet<CellValue>)> = filter
        .iter()
        .map(|(col, allowed)| table.column_index(col).map(|idx| (idx, allowed)))
        .collect::<Result<_, _>>()?;

    Ok(table.filter_rows(|row| {
        predicates
            .iter()
            .all(|(idx, allowed)| allowed.contains(&row[*idx]))
    }))
}
