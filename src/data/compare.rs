use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

use super::aggregate::column_total;
use super::filter::{apply_filter, ColumnFilter};
use super::model::{Table, MONTH, SALES_AMT, SALES_QTY};
use crate::error::DashboardError;
use crate::format::format_grouped;

/// `strftime` pattern for month selector labels, e.g. `September-2024`.
pub const MONTH_LABEL_FORMAT: &str = "%B-%Y";

pub fn month_label(date: NaiveDate) -> String {
    date.format(MONTH_LABEL_FORMAT).to_string()
}

/// Distinct month labels of the unfiltered prior table, sorted as strings.
/// Rows with a null `Month` contribute nothing; any other non-date value is a
/// [`DashboardError::TypeMismatch`].
pub fn month_options(prior: &Table) -> Result<Vec<String>, DashboardError> {
    prior.column_index(MONTH)?;
    let mut labels = BTreeSet::new();
    for row in prior.iter_rows() {
        if let Some(date) = row.date(MONTH)? {
            labels.insert(month_label(date));
        }
    }
    Ok(labels.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Comparison results
// ---------------------------------------------------------------------------

/// One metric, both periods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricComparison {
    pub current: f64,
    pub prior: f64,
    /// `current - prior`, unrounded.
    pub difference: f64,
}

impl MetricComparison {
    pub fn new(current: f64, prior: f64) -> Self {
        MetricComparison {
            current,
            prior,
            difference: current - prior,
        }
    }

    pub fn indicator(&self) -> DiffIndicator {
        DiffIndicator::from_difference(self.difference)
    }
}

/// Year-over-year totals for the selected month plus the rows behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct YoyComparison {
    pub month: String,
    pub quantity: MetricComparison,
    pub amount: MetricComparison,
    /// Current table after filtering.
    pub current_rows: Table,
    /// Prior table after filtering and month restriction.
    pub prior_rows: Table,
}

/// Filter both tables identically, restrict the prior one to
/// `selected_month`, then total quantity and amount on each side.
pub fn compare(
    current: &Table,
    prior: &Table,
    filter: &ColumnFilter,
    selected_month: &str,
) -> Result<YoyComparison, DashboardError> {
    let current_rows = apply_filter(current, filter)?;

    prior.column_index(MONTH)?;
    let prior_rows = apply_filter(prior, filter)?.try_filter_rows(|row| {
        Ok(row
            .date(MONTH)?
            .is_some_and(|d| month_label(d) == selected_month))
    })?;

    let quantity = MetricComparison::new(
        column_total(&current_rows, SALES_QTY)?,
        column_total(&prior_rows, SALES_QTY)?,
    );
    let amount = MetricComparison::new(
        column_total(&current_rows, SALES_AMT)?,
        column_total(&prior_rows, SALES_AMT)?,
    );

    Ok(YoyComparison {
        month: selected_month.to_string(),
        quantity,
        amount,
        current_rows,
        prior_rows,
    })
}

// ---------------------------------------------------------------------------
// Difference indicator
// ---------------------------------------------------------------------------

/// Three-way rendering of a signed difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiffIndicator {
    /// Positive; holds the magnitude.
    Up(f64),
    /// Negative; holds the absolute magnitude.
    Down(f64),
    /// Exactly zero.
    Neutral,
}

impl DiffIndicator {
    pub fn from_difference(value: f64) -> Self {
        if value > 0.0 {
            DiffIndicator::Up(value)
        } else if value < 0.0 {
            DiffIndicator::Down(value.abs())
        } else {
            DiffIndicator::Neutral
        }
    }
}

impl fmt::Display for DiffIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffIndicator::Up(v) => write!(f, "▲ {}", format_grouped(*v, 0)),
            DiffIndicator::Down(v) => write!(f, "▼ {}", format_grouped(*v, 0)),
            DiffIndicator::Neutral => write!(f, "0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::ColumnFilter;
    use crate::data::model::CellValue;

    fn ymd(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn current() -> Table {
        let mut t = Table::new(
            "current",
            vec!["State Name".into(), SALES_QTY.into(), SALES_AMT.into()],
        );
        t.push_row(vec!["MH".into(), 20.0.into(), 300.0.into()]);
        t.push_row(vec!["GA".into(), 5.0.into(), 200.0.into()]);
        t
    }

    fn prior() -> Table {
        let mut t = Table::new(
            "prior",
            vec![
                "State Name".into(),
                MONTH.into(),
                SALES_QTY.into(),
                SALES_AMT.into(),
            ],
        );
        t.push_row(vec!["MH".into(), ymd(2024, 9, 2), 4.0.into(), 100.0.into()]);
        t.push_row(vec!["MH".into(), ymd(2024, 9, 20), 6.0.into(), 200.0.into()]);
        t.push_row(vec!["GA".into(), ymd(2024, 9, 28), 1.0.into(), 50.0.into()]);
        t.push_row(vec!["GA".into(), ymd(2024, 8, 1), 9.0.into(), 999.0.into()]);
        t.push_row(vec!["GA".into(), CellValue::Null, 3.0.into(), 70.0.into()]);
        t
    }

    #[test]
    fn month_options_are_distinct_sorted_labels() {
        assert_eq!(
            month_options(&prior()).unwrap(),
            vec!["August-2024".to_string(), "September-2024".to_string()]
        );
    }

    #[test]
    fn compares_selected_month() {
        let res = compare(&current(), &prior(), &ColumnFilter::new(), "September-2024").unwrap();

        assert_eq!(res.amount, MetricComparison::new(500.0, 350.0));
        assert_eq!(res.amount.difference, 150.0);
        assert_eq!(res.amount.indicator().to_string(), "▲ 150");

        assert_eq!(res.quantity.current, 25.0);
        assert_eq!(res.quantity.prior, 11.0);
        assert_eq!(res.prior_rows.len(), 3);
    }

    #[test]
    fn same_filter_applies_to_both_sides() {
        let mut filter = ColumnFilter::new();
        filter.insert("State Name".into(), [CellValue::from("GA")].into());

        let res = compare(&current(), &prior(), &filter, "September-2024").unwrap();
        assert_eq!(res.amount.current, 200.0);
        assert_eq!(res.amount.prior, 50.0);
        assert_eq!(res.quantity.difference, 4.0);
    }

    #[test]
    fn empty_side_totals_zero() {
        let res = compare(&current(), &prior(), &ColumnFilter::new(), "January-2030").unwrap();
        assert!(res.prior_rows.is_empty());
        assert_eq!(res.amount.prior, 0.0);
        assert_eq!(res.amount.difference, res.amount.current);
    }

    #[test]
    fn missing_metric_is_reported() {
        let mut no_amt = Table::new("current", vec!["State Name".into(), SALES_QTY.into()]);
        no_amt.push_row(vec!["MH".into(), 1.0.into()]);
        assert_eq!(
            compare(&no_amt, &prior(), &ColumnFilter::new(), "September-2024"),
            Err(DashboardError::missing_column(SALES_AMT, "current"))
        );
    }

    #[test]
    fn unparsed_month_column_is_a_type_mismatch() {
        let mut raw = Table::new("prior", vec![MONTH.into(), SALES_QTY.into(), SALES_AMT.into()]);
        raw.push_row(vec!["2024-09-01".into(), 1.0.into(), 1.0.into()]);

        let mismatch = DashboardError::TypeMismatch {
            column: MONTH.into(),
            expected: "date",
            found: "text",
        };
        assert_eq!(month_options(&raw), Err(mismatch.clone()));
        assert_eq!(
            compare(&current(), &raw, &ColumnFilter::new(), "September-2024"),
            Err(mismatch)
        );
    }

    #[test]
    fn nan_totals_do_not_hide_the_difference() {
        let mut cur = current();
        cur.push_row(vec!["KA".into(), 1.0.into(), CellValue::Number(f64::NAN)]);
        let res = compare(&cur, &prior(), &ColumnFilter::new(), "September-2024").unwrap();
        assert_eq!(res.amount.indicator().to_string(), "▲ 150");
    }

    #[test]
    fn indicator_has_three_branches() {
        assert_eq!(DiffIndicator::from_difference(1500.0).to_string(), "▲ 1,500");
        assert_eq!(DiffIndicator::from_difference(-20.0).to_string(), "▼ 20");
        assert_eq!(DiffIndicator::from_difference(0.0), DiffIndicator::Neutral);
        assert_eq!(DiffIndicator::from_difference(0.0).to_string(), "0");
        assert_eq!(DiffIndicator::from_difference(-0.0).to_string(), "0");
    }
}
