//! Error taxonomy for metric discovery, invocation, and data loading.

use camino::Utf8PathBuf;
use core::fmt::Display;
use strum::Display as StrumDisplay;
use thiserror::Error;

const LOG_TARGET: &str = "   metrics";

/// Errors raised by the registry, the data pipeline, and metric bodies.
#[derive(Error, Debug)]
pub enum HubError {
    /// A configuration document is malformed or misses a required key
    #[error("invalid metric configuration '{path}': {message}")]
    Configuration { path: Utf8PathBuf, message: String },

    /// A metric module failed to produce its bindings
    #[error("unable to load metric module '{module}': {message}")]
    Import { module: String, message: String },

    /// No implementation is bound to the requested metric identifier
    #[error("metric function not found: {0}")]
    UnknownMetric(String),

    /// An optional backend was compiled out of this build
    #[error("{package} is required for this operation; rebuild with the `{feature}` feature enabled")]
    DependencyMissing { package: &'static str, feature: &'static str },

    /// A metric rejected its inputs
    #[error("{0}")]
    Validation(String),

    /// A metric failed internally
    #[error("metric '{metric}' failed: {message}")]
    Execution { metric: String, message: String },

    /// A data source name is not registered with the pipeline
    #[error("unknown data source: {0}")]
    UnknownSource(String),

    /// A data source descriptor cannot be turned into a data source
    #[error("data source '{name}' has unsupported type '{kind}'")]
    UnsupportedSource { name: String, kind: String },

    /// A data backend reported a failure
    #[error("{0}")]
    Data(String),

    /// File system access failed
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Stable tag identifying the kind of a [`HubError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Import,
    UnknownMetric,
    DependencyMissing,
    Validation,
    Execution,
    UnknownSource,
    UnsupportedSource,
    Data,
    Io,
}

impl HubError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Import { .. } => ErrorKind::Import,
            Self::UnknownMetric(_) => ErrorKind::UnknownMetric,
            Self::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::UnknownSource(_) => ErrorKind::UnknownSource,
            Self::UnsupportedSource { .. } => ErrorKind::UnsupportedSource,
            Self::Data(_) => ErrorKind::Data,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data(message.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Logs an internal failure raised while a metric body runs and wraps it.
    pub fn execution(metric: &str, error: impl Display) -> Self {
        log::error!(target: LOG_TARGET, "Metric '{metric}' failed: {error}");
        Self::Execution {
            metric: metric.to_string(),
            message: error.to_string(),
        }
    }

    /// Converts an error leaving a metric body into [`HubError::Execution`].
    ///
    /// Validation and execution errors are returned unchanged.
    #[must_use]
    pub fn into_execution(self, metric: &str) -> Self {
        match self {
            Self::Validation(_) | Self::Execution { .. } => self,
            other => Self::execution(metric, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(HubError::UnknownMetric("x".into()).kind(), ErrorKind::UnknownMetric);
        assert_eq!(HubError::UnknownSource("x".into()).kind(), ErrorKind::UnknownSource);
        assert_eq!(ErrorKind::DependencyMissing.to_string(), "dependency_missing");
    }

    #[test]
    fn test_unknown_metric_message() {
        let err = HubError::UnknownMetric("nope".into());
        assert_eq!(err.to_string(), "metric function not found: nope");
    }

    #[test]
    fn test_dependency_missing_names_package() {
        let err = HubError::DependencyMissing {
            package: "sqlx",
            feature: "sql",
        };
        let msg = err.to_string();
        assert!(msg.contains("sqlx"));
        assert!(msg.contains("`sql`"));
    }

    #[test]
    fn test_execution_wraps_any_display() {
        let parse = "x".parse::<i32>().unwrap_err();
        let err = HubError::execution("sum_demo", parse);
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.to_string(), "metric 'sum_demo' failed: invalid digit found in string");
    }

    #[test]
    fn test_into_execution_keeps_validation() {
        let err = HubError::validation("numbers cannot be empty").into_execution("calc");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = HubError::data("boom").into_execution("calc");
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(err.to_string(), "metric 'calc' failed: boom");
    }
}
