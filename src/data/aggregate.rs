use std::collections::HashMap;

use super::model::{CellValue, RowRef, Table};
use crate::error::DashboardError;

/// Number of groups shown in a top-N chart.
pub const DEFAULT_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Group-by / sum / rank
// ---------------------------------------------------------------------------

/// Groups ranked by summed metric, largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    pub group_column: String,
    pub metric_column: String,
    pub entries: Vec<(CellValue, f64)>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Metric value of one row.  Null, non-finite and non-numeric cells count as 0.
fn metric_value(row: &RowRef<'_>, metric: &str) -> f64 {
    row.number(metric).ok().flatten().unwrap_or(0.0)
}

/// Sum `metric` per distinct value of `group`, keep the `n` largest groups.
///
/// Non-numeric and null metric cells count as 0.  Rows with a null group key
/// are left out.  Equal totals keep first-encountered order.
pub fn top_n(
    table: &Table,
    group: &str,
    metric: &str,
    n: usize,
) -> Result<AggregationResult, DashboardError> {
    table.column_index(group)?;
    table.column_index(metric)?;

    let mut slots: HashMap<&CellValue, usize> = HashMap::new();
    let mut sums: Vec<(CellValue, f64)> = Vec::new();

    for row in table.iter_rows() {
        let Some(key) = row.get(group).filter(|key| !key.is_null()) else {
            continue;
        };
        let slot = *slots.entry(key).or_insert_with(|| {
            sums.push((key.clone(), 0.0));
            sums.len() - 1
        });
        sums[slot].1 += metric_value(&row, metric);
    }

    // `sort_by` is stable, so ties stay in first-seen order.
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));
    sums.truncate(n);

    Ok(AggregationResult {
        group_column: group.to_string(),
        metric_column: metric.to_string(),
        entries: sums,
    })
}

/// Sum of one metric column; non-numeric cells count as 0.
pub fn column_total(table: &Table, metric: &str) -> Result<f64, DashboardError> {
    table.column_index(metric)?;
    Ok(table.iter_rows().map(|row| metric_value(&row, metric)).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_delimited;

    fn states(rows: &[(&str, f64)]) -> Table {
        let mut t = Table::new("current", vec!["State".into(), "Qty".into()]);
        for (state, qty) in rows {
            t.push_row(vec![(*state).into(), (*qty).into()]);
        }
        t
    }

    #[test]
    fn sums_and_ranks_groups() {
        let t = states(&[("MH", 10.0), ("MH", 5.0), ("GA", 8.0)]);
        let res = top_n(&t, "State", "Qty", 10).unwrap();
        assert_eq!(
            res.entries,
            vec![(CellValue::from("MH"), 15.0), (CellValue::from("GA"), 8.0)]
        );
    }

    #[test]
    fn truncates_and_stays_non_increasing() {
        let rows: Vec<(String, f64)> = (0..15).map(|i| (format!("S{i}"), (i % 7) as f64)).collect();
        let borrowed: Vec<(&str, f64)> = rows.iter().map(|(s, v)| (s.as_str(), *v)).collect();
        let t = states(&borrowed);

        let res = top_n(&t, "State", "Qty", DEFAULT_TOP_N).unwrap();
        assert_eq!(res.len(), DEFAULT_TOP_N);
        assert!(res.entries.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn ties_keep_first_encountered_order() {
        let t = states(&[("KA", 5.0), ("GA", 5.0), ("MH", 9.0), ("AP", 5.0)]);
        let res = top_n(&t, "State", "Qty", 10).unwrap();
        let order: Vec<String> = res.entries.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(order, ["MH", "KA", "GA", "AP"]);
    }

    #[test]
    fn unfiltered_group_totals_match_column_total() {
        let t = states(&[("MH", 10.5), ("GA", 8.25), ("MH", 1.0), ("TN", 0.0)]);
        let res = top_n(&t, "State", "Qty", 10).unwrap();
        let group_sum: f64 = res.entries.iter().map(|(_, v)| v).sum();
        assert_eq!(group_sum, column_total(&t, "Qty").unwrap());
    }

    #[test]
    fn nan_metric_values_do_not_poison_totals() {
        let data = "State Name,Sales Amt\nMH,100\nGA,NaN\nMH,50\nKA,20\n";
        let t = read_delimited(data.as_bytes(), "current").unwrap();

        assert_eq!(column_total(&t, "Sales Amt").unwrap(), 170.0);
        let res = top_n(&t, "State Name", "Sales Amt", 10).unwrap();
        assert_eq!(
            res.entries,
            vec![
                (CellValue::from("MH"), 150.0),
                (CellValue::from("KA"), 20.0),
                (CellValue::from("GA"), 0.0),
            ]
        );
    }

    #[test]
    fn raw_nan_cells_count_as_zero() {
        let mut t = states(&[("MH", 10.0)]);
        t.push_row(vec!["GA".into(), CellValue::Number(f64::NAN)]);
        assert_eq!(column_total(&t, "Qty").unwrap(), 10.0);
        let res = top_n(&t, "State", "Qty", 10).unwrap();
        assert_eq!(res.entries[0], (CellValue::from("MH"), 10.0));
    }

    #[test]
    fn negative_zero_groups_with_zero() {
        let mut t = Table::new("current", vec!["Code".into(), "Qty".into()]);
        t.push_row(vec![CellValue::Number(0.0), 2.0.into()]);
        t.push_row(vec![CellValue::Number(-0.0), 3.0.into()]);
        let res = top_n(&t, "Code", "Qty", 10).unwrap();
        assert_eq!(res.entries, vec![(CellValue::Number(0.0), 5.0)]);
    }

    #[test]
    fn non_numeric_metric_counts_as_zero() {
        let mut t = states(&[("MH", 10.0)]);
        t.push_row(vec!["MH".into(), "n/a".into()]);
        t.push_row(vec!["GA".into(), CellValue::Null]);
        let res = top_n(&t, "State", "Qty", 10).unwrap();
        assert_eq!(
            res.entries,
            vec![(CellValue::from("MH"), 10.0), (CellValue::from("GA"), 0.0)]
        );
    }

    #[test]
    fn missing_columns_are_errors() {
        let t = states(&[("MH", 1.0)]);
        assert_eq!(
            top_n(&t, "Division Name", "Qty", 10),
            Err(DashboardError::missing_column("Division Name", "current"))
        );
        assert!(column_total(&t, "Sales Amt").is_err());
    }

    #[test]
    fn empty_table_gives_empty_result() {
        let t = states(&[]);
        assert!(top_n(&t, "State", "Qty", 10).unwrap().is_empty());
        assert_eq!(column_total(&t, "Qty").unwrap(), 0.0);
    }
}
