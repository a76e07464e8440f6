//! Metric values, configurations, implementations, and the registry
//!
//! # Implementation Model
//!
//! A metric has two halves. Its *configuration* is a YAML document describing the
//! metric's identity and its declared inputs, outputs, and data sources; it is parsed
//! into a [`MetricConfig`]. Its *implementation* is a plain function with the
//! [`MetricFn`] signature, tagged with the metric identifier through
//! [`register_metric!`](crate::register_metric) and grouped into a [`MetricModule`].
//!
//! [`Registry::discover`] walks a configuration directory and asks each module for its
//! implementations. Problems with individual documents or modules are logged and
//! recorded as diagnostics rather than aborting discovery. [`Registry::call_metric`]
//! fills in declared defaults and invokes the implementation.
//!
//! Metric results are [`MetricValue`]s, which can carry scalars, nested collections,
//! [`Table`](crate::data::Table)s, and [`Chart`]s.
//!
//! [`shared`] keeps one registry per configuration directory for the life of the
//! process; [`reset`] discards it.

mod binding;
mod chart;
mod metric_config;
mod metric_value;
mod params;
mod registry;
mod shared;

pub use binding::{MetricFn, MetricImpl, MetricModule};
pub use chart::{Chart, PLOTLY_CDN, Trace, TraceKind};
pub use metric_config::{DataSourceSpec, MetricConfig, OutputSpec, ParameterSpec, SourceKind, TemplateKind, ValueType};
pub use metric_value::MetricValue;
pub use params::{Params, convert_params, convert_value};
pub use registry::{DiscoveryRoot, Registry};
pub use shared::{reset, shared};
