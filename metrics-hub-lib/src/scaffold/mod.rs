//! Generation of new metrics
//!
//! # Implementation Model
//!
//! A [`MetricBlueprint`] captures everything about a metric the generator needs. It
//! is built either from a template preset ([`MetricBlueprint::create`]) or from a
//! configuration already on disk ([`MetricBlueprint::from_config`]).
//!
//! [`write_config`] persists the blueprint as a YAML document in the metrics
//! directory. [`materialize`] then produces three files under a [`Layout`]:
//!
//! - an implementation stub that declares the metric's `MODULE` with `register_metric!`
//! - a test stub that includes the implementation by path
//! - a deployment script
//!
//! The implementation body sits between `// --- HUB USER CODE START ---` and
//! `// --- HUB USER CODE END ---`. On regeneration the region is lifted out of the
//! existing file and reinserted unchanged, so editing the YAML and regenerating never
//! loses hand-written code.

mod blueprint;
mod generator;
mod templates;
mod user_code;

pub use blueprint::{MetricBlueprint, function_name, metric_id, preset};
pub use generator::{GenerateOptions, Layout, MaterializeStatus, materialize, remove, write_config};
pub use user_code::{USER_CODE_END, USER_CODE_START};
