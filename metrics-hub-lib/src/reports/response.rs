use super::{OutputFormat, ResultShape, classify_result};
use crate::error::HubError;
use crate::metrics::MetricValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Transport envelope for one metric call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResponse {
    pub metric_id: String,
    pub result: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ResultShape>,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    pub output_format: OutputFormat,
}

impl MetricResponse {
    /// Classifies `result` and wraps it.
    #[must_use]
    pub fn success(metric_id: impl Into<String>, result: &MetricValue, format: OutputFormat) -> Self {
        let (shape, result) = classify_result(result, format);
        Self {
            metric_id: metric_id.into(),
            result,
            result_type: Some(shape),
            success: true,
            error: None,
            error_kind: None,
            output_format: format,
        }
    }

    #[must_use]
    pub fn failure(metric_id: impl Into<String>, error: &HubError, format: OutputFormat) -> Self {
        Self {
            metric_id: metric_id.into(),
            result: Value::Null,
            result_type: None,
            success: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
            output_format: format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response = MetricResponse::success("sum_demo", &MetricValue::Float(6.0), OutputFormat::Json);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({
                "metric_id": "sum_demo",
                "result": 6.0,
                "result_type": "simple",
                "success": true,
                "output_format": "json",
            })
        );
    }

    #[test]
    fn test_failure_envelope() {
        let response = MetricResponse::failure("nope", &HubError::UnknownMetric("nope".into()), OutputFormat::Html);
        assert!(!response.success);
        assert_eq!(response.result, Value::Null);
        assert_eq!(response.error.as_deref(), Some("metric function not found: nope"));
        assert_eq!(response.error_kind.as_deref(), Some("unknown_metric"));
    }
}
