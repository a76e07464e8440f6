#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for metrics-hub
//!
//! This library holds everything needed to develop and run metrics: a registry that
//! discovers metric configurations and implementations, a data pipeline that pulls
//! tables out of pluggable sources, a classifier that normalizes metric results for
//! transport, and a generator that scaffolds new metrics.
//!
//! # Module Organization
//!
//! - [`data`]: Tables, data sources, and the treatment pipeline
//! - [`metrics`]: Metric values, configurations, bindings, and the registry
//! - [`reports`]: Result classification and rendering
//! - [`scaffold`]: Generation of configuration, implementation, test, and deploy files
//! - [`builtin`]: Metric modules shipped with the tool
//! - `commands`: The command-line interface driving all of the above
//! - [`error`]: The error taxonomy shared by all of the above

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod builtin;
pub mod data;
pub mod error;
pub mod metrics;
pub mod reports;
pub mod scaffold;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
pub use crate::error::{ErrorKind, HubError};
