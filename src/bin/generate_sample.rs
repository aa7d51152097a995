use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;

const STATES: [&str; 12] = [
    "Maharashtra",
    "Gujarat",
    "Karnataka",
    "Tamil Nadu",
    "Uttar Pradesh",
    "West Bengal",
    "Rajasthan",
    "Madhya Pradesh",
    "Kerala",
    "Punjab",
    "Goa",
    "Bihar",
];

const DIVISIONS: [&str; 6] = ["Ortho", "Derma", "Ophtha", "ENT", "Gynae", "General"];

const PRODUCTS: [(&str, f64); 5] = [
    ("Eye Drops 10ml", 85.0),
    ("Ear Drops 5ml", 62.5),
    ("Cream 20g", 140.0),
    ("Tablet 10s", 48.0),
    ("Syrup 100ml", 115.0),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}

/// Column buffers for one sales extract.
#[derive(Default)]
struct SalesRows {
    state: Vec<String>,
    division: Vec<String>,
    product: Vec<String>,
    qty: Vec<i64>,
    amt: Vec<f64>,
    month: Vec<i32>,
}

impl SalesRows {
    fn push(&mut self, rng: &mut SimpleRng, day: NaiveDate) {
        let (product, price) = PRODUCTS[rng.below(PRODUCTS.len())];
        let qty = 1 + rng.below(250) as i64;
        self.state.push(STATES[rng.below(STATES.len())].to_string());
        self.division
            .push(DIVISIONS[rng.below(DIVISIONS.len())].to_string());
        self.product.push(product.to_string());
        self.qty.push(qty);
        self.amt.push(qty as f64 * price);
        self.month.push(days_since_epoch(day));
    }

    fn to_batch(&self, with_month: bool) -> Result<RecordBatch> {
        let mut fields = vec![
            Field::new("State Name", DataType::Utf8, false),
            Field::new("Division Name", DataType::Utf8, false),
            Field::new("Product Name", DataType::Utf8, false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(self.state.clone())),
            Arc::new(StringArray::from(self.division.clone())),
            Arc::new(StringArray::from(self.product.clone())),
        ];
        if with_month {
            fields.push(Field::new("Month", DataType::Date32, false));
            columns.push(Arc::new(Date32Array::from(self.month.clone())));
        }
        fields.push(Field::new("Sales Qty", DataType::Int64, false));
        fields.push(Field::new("Sales Amt", DataType::Float64, false));
        columns.push(Arc::new(Int64Array::from(self.qty.clone())));
        columns.push(Arc::new(Float64Array::from(self.amt.clone())));

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
            .context("building record batch")
    }
}

fn days_since_epoch(day: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (day - epoch).num_days() as i32
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    println!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // Current FY to date: 1st–24th September 2025.
    let mut current = SalesRows::default();
    for day in 1..=24 {
        let date = NaiveDate::from_ymd_opt(2025, 9, day).context("invalid date")?;
        for _ in 0..40 {
            current.push(&mut rng, date);
        }
    }

    // Last FY: April 2024 – March 2025, one entry per invoice day.
    let mut prior = SalesRows::default();
    let mut date = NaiveDate::from_ymd_opt(2024, 4, 1).context("invalid date")?;
    let end = NaiveDate::from_ymd_opt(2025, 3, 31).context("invalid date")?;
    while date <= end {
        if date.day() <= 24 {
            for _ in 0..30 {
                prior.push(&mut rng, date);
            }
        }
        date = date.succ_opt().context("date overflow")?;
    }

    write_parquet(Path::new("sample_current.parquet"), &current.to_batch(false)?)?;
    write_parquet(Path::new("sample_prior.parquet"), &prior.to_batch(true)?)?;

    println!(
        "Point the dashboard at them with \
         SALES_DASHBOARD_CURRENT=sample_current.parquet SALES_DASHBOARD_PRIOR=sample_prior.parquet"
    );
    Ok(())
}
