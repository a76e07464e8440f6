//! Per-column statistics of a delimited file, loaded through the data pipeline.

use crate::data::{Cell, CsvSource, DataTreatment, FetchRequest, Table};
use crate::error::HubError;
use crate::metrics::{Chart, MetricImpl, MetricModule, MetricValue, Params, Trace};
use crate::register_metric;
use std::collections::BTreeMap;

const LOG_TARGET: &str = "   summary";
const METRIC_ID: &str = "table_summary";
const SOURCE: &str = "input";

pub const MODULE: MetricModule = MetricModule::new("table_summary", bindings);

fn bindings() -> Result<Vec<MetricImpl>, HubError> {
    Ok(vec![register_metric!(METRIC_ID, summarize_table)])
}

/// Describes every numeric column of the file at `path`.
///
/// `delimiter` and `columns` are optional. Returns `summary` (one row per numeric
/// column), `means` (a bar chart of column means), and `row_count`.
pub fn summarize_table(params: &Params) -> Result<MetricValue, HubError> {
    let path = params.str("path")?;

    let mut source = CsvSource::new(path);
    if let Some(delimiter) = params.optional("delimiter").and_then(MetricValue::as_str) {
        source = source.with_option("delimiter", delimiter);
    }

    let mut request = FetchRequest::default();
    if let Some(columns) = params.optional("columns") {
        let names: Vec<String> = columns
            .as_list()
            .ok_or_else(|| HubError::validation("parameter 'columns' must be an array"))?
            .iter()
            .map(|c| c.as_str().map(ToString::to_string).unwrap_or_else(|| c.to_string()))
            .collect();
        request = request.with_columns(names);
    }

    let mut treatment = DataTreatment::new();
    let _ = treatment.register_source(SOURCE, source);
    let table = treatment.load(SOURCE, &request, true).map_err(|e| e.into_execution(METRIC_ID))?;

    log::info!(target: LOG_TARGET, "Summarizing {} row(s) from '{path}'", table.num_rows());

    let summary = describe(&table)?;
    let means = summary.numeric_column("mean")?;
    let names: Vec<String> = summary.column("column")?.map(ToString::to_string).collect();
    let chart = Chart::new()
        .with_trace(Trace::bar(names, means).named("mean"))
        .with_title("Column Means")
        .with_axis_titles("Column", "Mean");

    Ok(MetricValue::Map(BTreeMap::from([
        ("summary".to_string(), MetricValue::Table(summary)),
        ("means".to_string(), MetricValue::Chart(chart)),
        ("row_count".to_string(), MetricValue::Int(i64::try_from(table.num_rows()).unwrap_or(i64::MAX))),
    ])))
}

#[expect(clippy::cast_precision_loss, reason = "row counts are far below 2^52")]
fn describe(table: &Table) -> Result<Table, HubError> {
    let mut summary = Table::new(["column", "count", "mean", "min", "max"]);

    for name in table.columns() {
        let values: Vec<f64> = table.column(name)?.filter_map(Cell::as_f64).collect();
        let numeric = table.column(name)?.all(|c| c.is_null() || c.as_f64().is_some());
        if values.is_empty() || !numeric {
            continue;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        summary.push_row(vec![
            Cell::from(name.as_str()),
            Cell::Int(i64::try_from(count).unwrap_or(i64::MAX)),
            Cell::Float(mean),
            Cell::Float(min),
            Cell::Float(max),
        ])?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use camino::Utf8PathBuf;
    use std::fs;

    fn write_csv(text: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("data.csv")).unwrap();
        fs::write(&path, text).unwrap();
        (dir, path)
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_numeric_columns_are_described() {
        let (_dir, path) = write_csv("name,a,b\nx,1,10\ny,3,\n");
        let result = summarize_table(&Params::new().with("path", path.as_str())).unwrap();
        let outputs = result.as_map().unwrap();

        assert_eq!(outputs["row_count"], MetricValue::Int(2));
        let summary = outputs["summary"].as_table().unwrap();
        assert_eq!(summary.column("column").unwrap().map(ToString::to_string).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(summary.numeric_column("mean").unwrap(), vec![2.0, 10.0]);
        assert_eq!(summary.numeric_column("count").unwrap(), vec![2.0, 1.0]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_column_selection() {
        let (_dir, path) = write_csv("a;b\n1;2\n");
        let params = Params::new()
            .with("path", path.as_str())
            .with("delimiter", ";")
            .with("columns", MetricValue::List(vec!["b".into()]));

        let result = summarize_table(&params).unwrap();
        let summary = result.as_map().unwrap()["summary"].as_table().unwrap().clone();
        assert_eq!(summary.num_rows(), 1);
        assert_eq!(summary.numeric_column("max").unwrap(), vec![2.0]);
    }

    #[test]
    fn test_missing_file_is_execution_error() {
        let err = summarize_table(&Params::new().with("path", "/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }
}
