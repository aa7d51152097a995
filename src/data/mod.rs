/// Data layer: core types, loading, filtering, aggregation and comparison.
///
/// Architecture:
/// ```text
///  .xlsx / .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (trimmed, Month → dates)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selections → ColumnFilter → filtered Table
///   └──────────┘
///        │
///        ├──────────────┬──────────────┐
///        ▼              ▼              ▼
///   ┌──────────┐  ┌──────────┐  ┌──────────┐
///   │ aggregate │  │ compare  │  │  export  │
///   └──────────┘  └──────────┘  └──────────┘
///    top-N groups   YoY totals    CSV download
/// ```

pub mod aggregate;
pub mod compare;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
