//! Metric modules shipped with metrics-hub.
//!
//! Their configurations live in the top-level `metrics/` directory.

use crate::metrics::MetricModule;

mod calculator;
mod sum_demo;
mod table_summary;

pub use calculator::calculate_simple_calculator;
pub use sum_demo::sum_demo;
pub use table_summary::summarize_table;

pub const MODULES: &[MetricModule] = &[calculator::MODULE, sum_demo::MODULE, table_summary::MODULE];
