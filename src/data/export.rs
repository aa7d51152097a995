use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use super::model::{CellValue, Table};
use crate::format::round_to;

/// Decimal places kept in numeric columns for display and export.
pub const EXPORT_DECIMALS: i32 = 2;

/// Copy of `table` with every numeric column rounded to [`EXPORT_DECIMALS`].
pub fn round_numeric(table: &Table) -> Table {
    let mut rounded = table.clone();
    for idx in 0..table.columns().len() {
        if table.is_numeric_column(idx) {
            rounded.map_column(idx, |cell| match cell {
                CellValue::Number(v) => CellValue::number(round_to(*v, EXPORT_DECIMALS)),
                other => other.clone(),
            });
        }
    }
    rounded
}

/// Write `table` as comma-delimited UTF-8 text: header row of column names,
/// numeric columns rounded, nulls as empty fields.
pub fn write_csv<W: Write>(table: &Table, sink: W) -> Result<()> {
    let rounded = round_numeric(table);
    let mut writer = csv::Writer::from_writer(sink);

    writer
        .write_record(rounded.columns())
        .context("writing CSV header")?;
    for (row_no, row) in rounded.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV writer")?;
    Ok(())
}

pub fn export_to_file(table: &Table, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, std::io::BufWriter::new(file))?;
    info!("Exported {} rows to {}", table.len(), path.display());
    Ok(())
}
