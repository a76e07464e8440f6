//! Sequence statistics with a table, a chart, and a summary.

use crate::data::{Cell, Table};
use crate::error::HubError;
use crate::metrics::{Chart, MetricImpl, MetricModule, MetricValue, Params, Trace};
use crate::register_metric;
use std::collections::BTreeMap;

const LOG_TARGET: &str = "calculator";
const METRIC_ID: &str = "demo_simple_calculator";

pub const MODULE: MetricModule = MetricModule::new("demo_simple_calculator", bindings);

fn bindings() -> Result<Vec<MetricImpl>, HubError> {
    Ok(vec![register_metric!(METRIC_ID, calculate_simple_calculator)])
}

/// Summary statistics of a numeric sequence.
///
/// `input_data` is the sequence; `operation` selects one statistic or `all`.
/// Returns `calculations_table`, `visualization`, and `summary_stats`.
pub fn calculate_simple_calculator(params: &Params) -> Result<MetricValue, HubError> {
    let values = params.numbers("input_data")?;
    let operation = match params.optional("operation") {
        Some(value) => value
            .as_str()
            .ok_or_else(|| HubError::validation(format!("parameter 'operation' must be a string, got {}", value.type_name())))?,
        None => "all",
    };

    log::info!(target: LOG_TARGET, "Calculating {} value(s), operation '{operation}'", values.len());

    if values.is_empty() {
        return Err(HubError::validation("Input sequence cannot be empty"));
    }

    let stats = statistics(&values);
    let summary = if operation == "all" {
        stats.clone()
    } else if let Some(value) = stats.get(operation) {
        BTreeMap::from([(operation.to_string(), value.clone())])
    } else {
        let allowed: Vec<&str> = stats.keys().map(String::as_str).chain(["all"]).collect();
        return Err(HubError::validation(format!(
            "Unsupported operation '{operation}'. Choose from {}",
            allowed.join(", ")
        )));
    };

    let table = calculations_table(&values).map_err(|e| e.into_execution(METRIC_ID))?;
    let mean = stats.get("mean").and_then(MetricValue::as_f64).unwrap_or_default();

    let indices: Vec<usize> = (0..values.len()).collect();
    let chart = Chart::new()
        .with_trace(
            Trace::scatter(indices, values)
                .named("Original Values")
                .mode("lines+markers")
                .color("blue")
                .line_width(3.0),
        )
        .with_hline(mean, "red", Some(format!("Mean: {mean:.2}")))
        .with_title("Number Sequence Analysis")
        .with_axis_titles("Index", "Value")
        .with_template("plotly_white")
        .with_size(None, Some(400));

    log::info!(target: LOG_TARGET, "Calculation completed");

    Ok(MetricValue::Map(BTreeMap::from([
        ("calculations_table".to_string(), MetricValue::Table(table)),
        ("visualization".to_string(), MetricValue::Chart(chart)),
        ("summary_stats".to_string(), MetricValue::Map(summary)),
    ])))
}

#[expect(clippy::cast_precision_loss, reason = "sequence lengths are far below 2^52")]
fn statistics(values: &[f64]) -> BTreeMap<String, MetricValue> {
    let count = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted.get(middle.wrapping_sub(1)).copied().unwrap_or_default() + sorted.get(middle).copied().unwrap_or_default()) / 2.0
    } else {
        sorted.get(middle).copied().unwrap_or_default()
    };

    BTreeMap::from([
        ("sum".to_string(), MetricValue::Float(sum)),
        ("mean".to_string(), MetricValue::Float(mean)),
        ("median".to_string(), MetricValue::Float(median)),
        ("std".to_string(), MetricValue::Float(variance.sqrt())),
        ("min".to_string(), MetricValue::Float(sorted.first().copied().unwrap_or_default())),
        ("max".to_string(), MetricValue::Float(sorted.last().copied().unwrap_or_default())),
        ("count".to_string(), MetricValue::Int(i64::try_from(values.len()).unwrap_or(i64::MAX))),
    ])
}

fn calculations_table(values: &[f64]) -> Result<Table, HubError> {
    let mut table = Table::new(["Index", "Value", "Squared", "Cumulative_Sum"]);
    let mut running = 0.0;

    for (index, value) in values.iter().enumerate() {
        running += value;
        let index = i64::try_from(index).map_err(|e| HubError::data(format!("row index out of range: {e}")))?;
        table.push_row(vec![Cell::Int(index), Cell::Float(*value), Cell::Float(value * value), Cell::Float(running)])?;
    }

    Ok(table)
}
