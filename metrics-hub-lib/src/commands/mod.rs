//! Command-line interface for metrics-hub
//!
//! This module exposes the registry, the classifier, and the scaffolding generator
//! as subcommands. It handles argument parsing, configuration management, and the
//! wiring between those parts.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **list** / **info**: Run discovery and show the catalog or one configuration
//! - **call**: Convert textual parameters, invoke a metric through the registry, and
//!   print the classified response, raw CSV, or a standalone HTML page
//! - **create** / **generate** / **remove**: Drive the scaffolding generator
//! - **validate**: Run discovery and report every skipped configuration or module
//! - **init**: Write the default `hub.toml`
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap, initializes logging,
//! and routes to the command handler. Handlers resolve a [`Context`](common::Context)
//! from `hub.toml` and the global flags, do their work, and write results to the
//! [`Host`]. A failing handler writes the error to the host's error stream, asks the
//! host to exit with status 1, and returns the error.

mod call;
mod common;
mod config;
mod create;
mod generate;
mod host;
mod info;
mod init;
mod list;
mod remove;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use call::{CallArgs, call_metric};
pub use common::GlobalArgs;
pub use create::{CreateArgs, create_metric};
pub use generate::{GenerateArgs, generate_metric};
pub use host::Host;
#[cfg(test)]
pub use host::TestHost;
pub use info::{InfoArgs, show_metric};
pub use init::{InitArgs, init_config};
pub use list::{ListArgs, list_metrics};
pub use remove::{RemoveArgs, remove_metric};
pub use run::run;
pub use validate::{ValidateArgs, validate_metrics};
