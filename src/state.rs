use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use log::{error, info, warn};

use crate::cache::{DatasetCache, Datasets};
use crate::config::DashboardConfig;
use crate::data::aggregate::{column_total, top_n, AggregationResult};
use crate::data::compare::{compare, YoyComparison};
use crate::data::export::{export_to_file, round_numeric};
use crate::data::filter::{
    apply_filter, build_filter_options, column_filter, ColumnFilter, ColumnOptions,
    FilterChoice, FilterSelections,
};
use crate::data::model::{Table, METRICS};
use crate::error::DashboardError;

/// Group column of the top-N bar chart.
pub const STATE_COLUMN: &str = "State Name";
/// Group column of the top-N donut chart.
pub const DIVISION_COLUMN: &str = "Division Name";

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    CurrentMonth,
    YoyComparison,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::CurrentMonth, Page::YoyComparison];

    pub fn label(&self) -> &'static str {
        match self {
            Page::CurrentMonth => "📊 Current Month Dashboard",
            Page::YoyComparison => "📈 YoY Sales Comparison",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Page::CurrentMonth => "Current Month to Till Date Dashboard",
            Page::YoyComparison => "YoY Sales Comparison Dashboard",
        }
    }
}

// ---------------------------------------------------------------------------
// Current-month page view model
// ---------------------------------------------------------------------------

/// Everything the current-month page renders, recomputed per interaction.
#[derive(Debug, Clone)]
pub struct CurrentMonthView {
    pub metric: Option<String>,
    /// KPI total; an error becomes an inline warning.
    pub total: Result<f64, DashboardError>,
    pub top_states: Result<AggregationResult, DashboardError>,
    pub top_divisions: Result<AggregationResult, DashboardError>,
    /// Filtered rows, numeric columns rounded for display and export.
    pub rows: Table,
}

/// Build the current-month view.  Missing metric or group columns only
/// affect their own section.
pub fn current_month_view(
    current: &Table,
    filter: &ColumnFilter,
    metric: Option<&str>,
    n: usize,
) -> Result<CurrentMonthView, DashboardError> {
    let filtered = apply_filter(current, filter)?;

    let (total, top_states, top_divisions) = match metric {
        Some(metric) => (
            column_total(&filtered, metric),
            top_n(&filtered, STATE_COLUMN, metric, n),
            top_n(&filtered, DIVISION_COLUMN, metric, n),
        ),
        None => {
            let missing = DashboardError::missing_column(&METRICS.join(" / "), &current.name);
            (Err(missing.clone()), Err(missing.clone()), Err(missing))
        }
    };

    for section in [&top_states, &top_divisions] {
        if let Err(e) = section {
            warn!("Skipping chart: {e}");
        }
    }

    Ok(CurrentMonthView {
        metric: metric.map(str::to_string),
        total,
        top_states,
        top_divisions,
        rows: round_numeric(&filtered),
    })
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    cache: DatasetCache,

    /// Loaded tables (None when startup loading failed).
    pub datasets: Option<Datasets>,

    /// Set when the data could not be loaded; the UI shows only this.
    pub fatal_error: Option<String>,

    pub page: Page,

    /// Multi-select options per filterable column of the current table.
    pub filter_options: Vec<ColumnOptions>,

    /// Per-column multi-select state, shared by both pages.
    pub selections: FilterSelections,

    /// {"Sales Qty", "Sales Amt"} ∩ current columns.
    pub metric_options: Vec<String>,
    pub metric: Option<String>,

    pub selected_month: Option<String>,

    /// Cached result of the last recompute for each page.
    pub current_view: Option<Result<CurrentMonthView, DashboardError>>,
    pub yoy_view: Option<Result<YoyComparison, DashboardError>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Header logo, if the configured file could be read.
    pub logo: Option<Arc<[u8]>>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let logo = std::fs::read(&config.logo_file).ok().map(Arc::from);
        let mut state = Self {
            config,
            cache: DatasetCache::new(),
            datasets: None,
            fatal_error: None,
            page: Page::CurrentMonth,
            filter_options: Vec::new(),
            selections: FilterSelections::new(),
            metric_options: Vec::new(),
            metric: None,
            selected_month: None,
            current_view: None,
            yoy_view: None,
            status_message: None,
            logo,
        };
        state.load_datasets();
        state
    }

    /// Load (or fetch from cache) both datasets and rebuild the views.
    pub fn load_datasets(&mut self) {
        match Datasets::load(&self.config, &mut self.cache) {
            Ok(datasets) => {
                self.fatal_error = None;
                self.set_datasets(datasets);
            }
            Err(e) => {
                error!("Failed to load datasets: {e:#}");
                self.datasets = None;
                self.current_view = None;
                self.yoy_view = None;
                self.fatal_error = Some(fatal_message(&e));
            }
        }
    }

    /// Drop cached tables and read the files again.
    pub fn reload(&mut self) {
        info!("Reloading datasets");
        self.cache.invalidate();
        self.load_datasets();
    }

    /// Ingest freshly loaded datasets, keeping still-valid selections.
    pub fn set_datasets(&mut self, datasets: Datasets) {
        self.filter_options = build_filter_options(&datasets.current, &[]);

        let known: BTreeSet<&str> = self
            .filter_options
            .iter()
            .map(|o| o.column.as_str())
            .collect();
        self.selections.retain(|col, _| known.contains(col.as_str()));

        self.metric_options = METRICS
            .iter()
            .filter(|m| datasets.current.has_column(m))
            .map(|m| m.to_string())
            .collect();
        if !self
            .metric
            .as_ref()
            .is_some_and(|m| self.metric_options.contains(m))
        {
            self.metric = self.metric_options.first().cloned();
        }

        if !self
            .selected_month
            .as_ref()
            .is_some_and(|m| datasets.month_options.contains(m))
        {
            self.selected_month = datasets.month_options.first().cloned();
        }

        self.datasets = Some(datasets);
        self.status_message = None;
        self.refresh();
    }

    /// Entries currently chosen for a column; `{ALL}` until touched.
    pub fn selection(&self, column: &str) -> BTreeSet<FilterChoice> {
        self.selections
            .get(column)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([FilterChoice::All]))
    }

    /// Toggle a single entry (value or the ALL sentinel) in a column's selection.
    pub fn toggle_choice(&mut self, column: &str, choice: FilterChoice) {
        let mut selected = self.selection(column);
        if !selected.remove(&choice) {
            selected.insert(choice);
        }
        self.selections.insert(column.to_string(), selected);
        self.refresh();
    }

    /// Put a column back to `{ALL}`.
    pub fn reset_column(&mut self, column: &str) {
        self.selections.remove(column);
        self.refresh();
    }

    pub fn set_page(&mut self, page: Page) {
        if self.page != page {
            self.page = page;
            self.refresh();
        }
    }

    pub fn set_metric(&mut self, metric: String) {
        self.metric = Some(metric);
        self.refresh();
    }

    pub fn set_month(&mut self, month: String) {
        self.selected_month = Some(month);
        self.refresh();
    }

    /// Recompute the active page from the cached tables.
    pub fn refresh(&mut self) {
        let Some(datasets) = &self.datasets else {
            return;
        };
        let filter = column_filter(&self.selections);

        match self.page {
            Page::CurrentMonth => {
                self.current_view = Some(current_month_view(
                    &datasets.current,
                    &filter,
                    self.metric.as_deref(),
                    self.config.top_n,
                ));
            }
            Page::YoyComparison => {
                self.yoy_view = self.selected_month.as_deref().map(|month| {
                    compare(&datasets.current, &datasets.prior, &filter, month)
                });
            }
        }

        if let Some(Err(e)) = &self.current_view {
            warn!("Current month view failed: {e}");
        }
        if let Some(Err(e)) = &self.yoy_view {
            warn!("YoY comparison failed: {e}");
        }
    }

    /// Write the filtered current-period rows to `path`.
    pub fn export_current_view(&mut self, path: &Path) -> Result<()> {
        let Some(Ok(view)) = &self.current_view else {
            anyhow::bail!("nothing to export");
        };
        export_to_file(&view.rows, path)?;
        self.status_message = Some(format!(
            "Exported {} rows to {}",
            view.rows.len(),
            path.display()
        ));
        Ok(())
    }
}

/// User-facing text for a startup failure.
fn fatal_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DashboardError>() {
        Some(DashboardError::MissingFile { paths }) => {
            let list: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            format!(
                "❌ Required data files not found.\nPlease place these files in the app folder:\n{}",
                list.join("\n")
            )
        }
        Some(DashboardError::MissingColumn { column, table }) => {
            format!("❌ '{column}' column not found in the {table} file.")
        }
        _ => format!("❌ {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, SALES_AMT, SALES_QTY};
    use tempfile::{tempdir, TempDir};

    fn current() -> Table {
        let mut t = Table::new(
            "current",
            vec![STATE_COLUMN.into(), DIVISION_COLUMN.into(), SALES_QTY.into()],
        );
        t.push_row(vec!["MH".into(), "Ortho".into(), 10.0.into()]);
        t.push_row(vec!["MH".into(), "Derma".into(), 5.0.into()]);
        t.push_row(vec!["GA".into(), "Derma".into(), 8.0.into()]);
        t
    }

    fn fixture() -> (TempDir, DashboardConfig) {
        let dir = tempdir().unwrap();
        let current = dir.path().join("current.csv");
        let prior = dir.path().join("prior.csv");
        std::fs::write(
            &current,
            "State Name,Division Name,Sales Qty,Sales Amt\nMH,Ortho,10,500\nGA,Derma,8,100\n",
        )
        .unwrap();
        std::fs::write(
            &prior,
            "State Name,Division Name,Month,Sales Qty,Sales Amt\n\
             MH,Ortho,2024-09-01,4,100\nMH,Ortho,2024-09-15,2,200\nGA,Derma,2024-09-20,1,50\n",
        )
        .unwrap();
        let config = DashboardConfig {
            current_file: current,
            prior_file: prior,
            logo_file: dir.path().join("missing-logo.png"),
            ..DashboardConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn missing_metric_skips_only_dependent_sections() {
        let view = current_month_view(&current(), &ColumnFilter::new(), Some(SALES_AMT), 10).unwrap();
        assert!(view.total.is_err());
        assert!(view.top_states.is_err());
        assert!(view.top_divisions.is_err());
        assert_eq!(view.rows.len(), 3);
    }

    #[test]
    fn missing_group_column_skips_its_chart() {
        let mut t = Table::new("current", vec![STATE_COLUMN.into(), SALES_QTY.into()]);
        t.push_row(vec!["MH".into(), 1.0.into()]);
        let view = current_month_view(&t, &ColumnFilter::new(), Some(SALES_QTY), 10).unwrap();
        assert_eq!(view.total, Ok(1.0));
        assert!(view.top_states.is_ok());
        assert!(view.top_divisions.is_err());
    }

    #[test]
    fn view_totals_and_ranks() {
        let view = current_month_view(&current(), &ColumnFilter::new(), Some(SALES_QTY), 10).unwrap();
        assert_eq!(view.total, Ok(23.0));
        let states = view.top_states.unwrap();
        assert_eq!(
            states.entries,
            vec![(CellValue::from("MH"), 15.0), (CellValue::from("GA"), 8.0)]
        );
    }

    #[test]
    fn startup_with_missing_files_is_fatal() {
        let dir = tempdir().unwrap();
        let config = DashboardConfig {
            current_file: dir.path().join("nope.xlsx"),
            prior_file: dir.path().join("nope2.xlsx"),
            ..DashboardConfig::default()
        };
        let state = AppState::new(config);
        assert!(state.datasets.is_none());
        let msg = state.fatal_error.unwrap();
        assert!(msg.contains("nope.xlsx"));
        assert!(msg.contains("nope2.xlsx"));
    }

    #[test]
    fn toggling_filters_recomputes_views() {
        let (_dir, config) = fixture();
        let mut state = AppState::new(config);
        assert!(state.fatal_error.is_none());
        assert_eq!(state.metric.as_deref(), Some(SALES_QTY));
        assert_eq!(state.selected_month.as_deref(), Some("September-2024"));

        // ALL plus an explicit value still means "everything"
        state.toggle_choice(STATE_COLUMN, FilterChoice::Value("GA".into()));
        let view = state.current_view.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(view.total, Ok(18.0));

        // dropping ALL narrows to GA
        state.toggle_choice(STATE_COLUMN, FilterChoice::All);
        let view = state.current_view.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(view.total, Ok(8.0));

        state.set_metric(SALES_AMT.to_string());
        state.set_page(Page::YoyComparison);
        let yoy = state.yoy_view.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(yoy.amount.current, 100.0);
        assert_eq!(yoy.amount.prior, 50.0);
        assert_eq!(yoy.amount.indicator().to_string(), "▲ 50");

        state.reset_column(STATE_COLUMN);
        let yoy = state.yoy_view.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(yoy.amount.prior, 350.0);
    }

    #[test]
    fn export_writes_filtered_rows() {
        let (dir, config) = fixture();
        let mut state = AppState::new(config);
        state.toggle_choice(STATE_COLUMN, FilterChoice::All);
        state.toggle_choice(STATE_COLUMN, FilterChoice::Value("MH".into()));

        let out = dir.path().join("filtered.csv");
        state.export_current_view(&out).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "State Name,Division Name,Sales Qty,Sales Amt\nMH,Ortho,10,500\n"
        );
        assert!(state.status_message.is_some());
    }
}
