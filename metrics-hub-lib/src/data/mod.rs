//! Tables, data sources, and the data treatment pipeline
//!
//! Metrics that need input data pull it through this module rather than talking to
//! files or databases directly.
//!
//! # Implementation Model
//!
//! A [`Table`] is a plain in-memory grid of [`Cell`]s with named columns. Every
//! backend implements the [`DataSource`] trait, whose single `fetch` operation takes a
//! [`FetchRequest`] carrying an optional column projection, an optional [`RowFilter`],
//! and call-time overrides for backend options and query parameters.
//!
//! Three backends are provided:
//!
//! - [`CsvSource`] reads delimited text with the `csv` crate
//! - [`ParquetSource`] reads columnar files when the `parquet` feature is enabled
//! - [`SqlSource`] runs parameterized queries through `sqlx` when the `sql` feature is enabled
//!
//! A [`DataTreatment`] names a set of sources and attaches an ordered chain of
//! transformers to each. Single loads, fail-fast batches, and partial batches that
//! report per-source errors are all available.

mod cell;
mod csv_source;
mod parquet_source;
mod request;
mod source;
mod sql_source;
mod table;
mod treatment;

pub use cell::Cell;
pub use csv_source::{CsvOptions, CsvSource};
pub use parquet_source::ParquetSource;
pub use request::{Condition, FetchRequest, RowFilter, merge_over};
pub use source::{DataSource, StaticSource};
pub use sql_source::{SqlSource, number_placeholders};
pub use table::Table;
pub use treatment::{DataTreatment, FetchPlan, LoadPolicy, PartialLoad, Transformer};
