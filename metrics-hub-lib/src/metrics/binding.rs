use super::{MetricValue, Params};
use crate::error::HubError;
use core::fmt::{Debug, Formatter};

/// Signature every metric implementation has.
pub type MetricFn = fn(&Params) -> Result<MetricValue, HubError>;

/// An implementation tagged with the metric identifier it serves.
#[derive(Clone, Copy)]
pub struct MetricImpl {
    pub id: &'static str,
    pub function_name: &'static str,
    pub function: MetricFn,
}

impl MetricImpl {
    #[must_use]
    pub const fn new(id: &'static str, function_name: &'static str, function: MetricFn) -> Self {
        Self {
            id,
            function_name,
            function,
        }
    }
}

impl Debug for MetricImpl {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetricImpl")
            .field("id", &self.id)
            .field("function_name", &self.function_name)
            .finish_non_exhaustive()
    }
}

/// Tags a function with a metric identifier.
///
/// The function keeps its calling convention; the tag is only read by discovery.
///
/// ```
/// use metrics_hub_lib::error::HubError;
/// use metrics_hub_lib::metrics::{MetricImpl, MetricValue, Params};
/// use metrics_hub_lib::register_metric;
///
/// fn calculate_total(params: &Params) -> Result<MetricValue, HubError> {
///     Ok(MetricValue::Float(params.numbers("numbers")?.iter().sum()))
/// }
///
/// const TOTAL: MetricImpl = register_metric!("total", calculate_total);
/// assert_eq!(TOTAL.function_name, "calculate_total");
/// ```
#[macro_export]
macro_rules! register_metric {
    ($id:expr, $function:path) => {
        $crate::metrics::MetricImpl::new($id, stringify!($function), $function)
    };
}

/// A named group of metric implementations.
///
/// Modules are the unit of discovery: the registry asks each module for its
/// implementations and skips modules whose loader fails, as well as modules whose
/// name starts with an underscore.
#[derive(Clone, Copy)]
pub struct MetricModule {
    name: &'static str,
    loader: fn() -> Result<Vec<MetricImpl>, HubError>,
}

impl MetricModule {
    #[must_use]
    pub const fn new(name: &'static str, loader: fn() -> Result<Vec<MetricImpl>, HubError>) -> Self {
        Self { name, loader }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    pub fn load(&self) -> Result<Vec<MetricImpl>, HubError> {
        (self.loader)()
    }
}

impl Debug for MetricModule {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetricModule").field("name", &self.name).finish_non_exhaustive()
    }
}
