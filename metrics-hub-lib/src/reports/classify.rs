use crate::data::Table;
use crate::metrics::{Chart, MetricValue};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display;

const LOG_TARGET: &str = "   reports";

/// Classes given to HTML tables produced by the classifier.
const TABLE_CLASSES: &str = "table table-striped";

/// Structural category of a metric result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResultShape {
    Table,
    Chart,
    Simple,
    Dict,
    Complex,
}

/// Requested rendering of a metric result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Html,
    Csv,
}

/// Decides the shape of a result.
///
/// A mapping is `complex` as soon as one of its entries is a table or a chart.
#[must_use]
pub fn classify(result: &MetricValue) -> ResultShape {
    match result {
        MetricValue::Table(_) => ResultShape::Table,
        MetricValue::Chart(_) => ResultShape::Chart,
        MetricValue::Map(map) if map.values().any(MetricValue::is_table_or_chart) => ResultShape::Complex,
        MetricValue::Map(_) => ResultShape::Dict,
        _ => ResultShape::Simple,
    }
}

/// Classifies a result and converts it for the requested format.
///
/// CSV only changes the rendering of tables; every other shape falls back to its
/// JSON rendering. Callers that must reject CSV for non-tabular results check the
/// returned shape.
#[must_use]
pub fn classify_result(result: &MetricValue, format: OutputFormat) -> (ResultShape, Value) {
    let shape = classify(result);

    let value = match (result, format) {
        (MetricValue::Table(table), OutputFormat::Html) => Value::String(table.to_html(TABLE_CLASSES)),
        (MetricValue::Table(table), OutputFormat::Csv) => table_csv(table),
        (MetricValue::Table(table), OutputFormat::Json) => table.to_json(),

        (MetricValue::Chart(chart), OutputFormat::Html) => Value::String(chart.to_html(None, true, true)),
        (MetricValue::Chart(chart), _) => chart.to_json(),

        (MetricValue::Map(map), OutputFormat::Html) => {
            let entries = map.iter().map(|(key, value)| (key.clone(), html_entry(key, value))).collect::<Map<_, _>>();
            Value::Object(entries)
        }

        (other, OutputFormat::Html) => Value::String(other.to_string()),
        (other, _) => other.to_json(),
    };

    log::debug!(target: LOG_TARGET, "Classified result as {shape} for {format} output");
    (shape, value)
}

fn table_csv(table: &Table) -> Value {
    match table.to_csv() {
        Ok(text) => Value::String(text),
        Err(e) => {
            log::warn!(target: LOG_TARGET, "Unable to render table as CSV, using records instead: {e}");
            table.to_json()
        }
    }
}

fn html_entry(key: &str, value: &MetricValue) -> Value {
    match value {
        MetricValue::Table(table) => Value::String(table.to_html(TABLE_CLASSES)),
        MetricValue::Chart(chart) => Value::String(chart_fragment(key, chart)),
        other => Value::String(other.to_string()),
    }
}

fn chart_fragment(key: &str, chart: &Chart) -> String {
    chart.to_html(Some(&format!("plot-{key}")), true, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use crate::metrics::Trace;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn two_row_table() -> Table {
        Table::from_rows(["a", "b"], vec![vec![Cell::Int(1), Cell::from("x")], vec![Cell::Int(2), Cell::from("y")]]).unwrap()
    }

    fn chart() -> Chart {
        Chart::new().with_trace(Trace::scatter([1, 2], [3, 4])).with_title("Demo")
    }

    #[test]
    fn test_table_as_json_records() {
        let (shape, value) = classify_result(&MetricValue::Table(two_row_table()), OutputFormat::Json);
        assert_eq!(shape, ResultShape::Table);
        assert_eq!(value, json!([{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]));
    }

    #[test]
    fn test_table_as_html_and_csv() {
        let table = MetricValue::Table(two_row_table());

        let (_, html) = classify_result(&table, OutputFormat::Html);
        assert!(html.as_str().unwrap().contains("table table-striped"));

        let (_, csv) = classify_result(&table, OutputFormat::Csv);
        assert_eq!(csv.as_str().unwrap(), "a,b\n1,x\n2,y\n");
    }

    #[test]
    fn test_chart() {
        let value = MetricValue::Chart(chart());

        let (shape, json) = classify_result(&value, OutputFormat::Json);
        assert_eq!(shape, ResultShape::Chart);
        assert!(json.get("data").is_some());

        let (_, html) = classify_result(&value, OutputFormat::Html);
        let html = html.as_str().unwrap();
        assert!(html.starts_with("<html>"));
        assert!(html.contains("cdn.plot.ly"));
    }

    #[test]
    fn test_simple_values() {
        assert_eq!(classify_result(&MetricValue::Int(7), OutputFormat::Json), (ResultShape::Simple, json!(7)));
        assert_eq!(classify_result(&MetricValue::Null, OutputFormat::Json), (ResultShape::Simple, Value::Null));
        assert_eq!(classify_result(&MetricValue::Float(1.5), OutputFormat::Html), (ResultShape::Simple, json!("1.5")));
        assert_eq!(
            classify_result(&MetricValue::List(vec![1.into(), 2.into()]), OutputFormat::Json),
            (ResultShape::Simple, json!([1, 2]))
        );
    }

    #[test]
    fn test_dict_without_rich_entries() {
        let map = MetricValue::Map(BTreeMap::from([("n".to_string(), MetricValue::Int(3))]));
        assert_eq!(classify_result(&map, OutputFormat::Json), (ResultShape::Dict, json!({"n": 3})));
        assert_eq!(classify_result(&map, OutputFormat::Html), (ResultShape::Dict, json!({"n": "3"})));
    }

    #[test]
    fn test_complex_mapping() {
        let map = MetricValue::Map(BTreeMap::from([
            ("table".to_string(), MetricValue::Table(two_row_table())),
            ("chart".to_string(), MetricValue::Chart(chart())),
            ("n".to_string(), MetricValue::Int(3)),
        ]));

        let (shape, json) = classify_result(&map, OutputFormat::Json);
        assert_eq!(shape, ResultShape::Complex);
        assert_eq!(json["table"].as_array().unwrap().len(), 2);
        assert!(json["chart"].get("layout").is_some());
        assert_eq!(json["n"], json!(3));

        let (_, html) = classify_result(&map, OutputFormat::Html);
        assert!(html["table"].as_str().unwrap().contains("<table"));
        assert!(html["chart"].as_str().unwrap().contains("id=\"plot-chart\""));
        assert_eq!(html["n"], json!("3"));
    }

    #[test]
    fn test_csv_falls_back_to_json_for_non_tables() {
        let map = MetricValue::Map(BTreeMap::from([("n".to_string(), MetricValue::Int(3))]));
        assert_eq!(classify_result(&map, OutputFormat::Csv), (ResultShape::Dict, json!({"n": 3})));
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(ResultShape::Complex.to_string(), "complex");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
