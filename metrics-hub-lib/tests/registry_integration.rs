//! End-to-end discovery and invocation over configuration documents on disk.

use camino::Utf8PathBuf;
use metrics_hub_lib::ErrorKind;
use metrics_hub_lib::data::{Cell, CsvSource, DataTreatment, FetchPlan, FetchRequest, RowFilter};
use metrics_hub_lib::error::HubError;
use metrics_hub_lib::metrics::{DiscoveryRoot, MetricImpl, MetricModule, MetricValue, Params, Registry, reset, shared};
use metrics_hub_lib::register_metric;
use metrics_hub_lib::reports::{OutputFormat, ResultShape, classify_result};
use std::fs;
use std::sync::Arc;

fn threshold(params: &Params) -> Result<MetricValue, HubError> {
    let value = params.float("value")?;
    let limit = params.float("limit")?;
    Ok(MetricValue::Bool(value > limit))
}

fn echo_missing(params: &Params) -> Result<MetricValue, HubError> {
    Ok(params.get("note").cloned().unwrap_or(MetricValue::String("absent".to_string())))
}

fn bindings() -> Result<Vec<MetricImpl>, HubError> {
    Ok(vec![register_metric!("threshold", threshold), register_metric!("echo_missing", echo_missing)])
}

const CHECKS: MetricModule = MetricModule::new("checks", bindings);

fn metrics_dir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

    fs::write(
        root.join("threshold.yaml"),
        "id: threshold\nname: Threshold\ninputs:\n  - name: value\n    type: float\n  - name: limit\n    type: float\n    required: false\n    default: 5\n",
    )
    .unwrap();
    fs::write(
        root.join("echo_missing.yml"),
        "id: echo_missing\ninputs:\n  - name: note\n    type: string\n    required: false\n    default: null\n",
    )
    .unwrap();
    fs::write(root.join("README.txt"), "not a configuration").unwrap();

    (dir, root)
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_discovery_and_defaults() {
    let (_dir, root) = metrics_dir();
    let registry = Registry::discover(&DiscoveryRoot::new(&root).with_module(CHECKS));

    let ids: Vec<&str> = registry.list_all().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"threshold") && ids.contains(&"echo_missing"));
    assert!(registry.diagnostics().is_empty());

    let low = registry.call_metric("threshold", Params::new().with("value", 4.0)).unwrap();
    assert_eq!(low, MetricValue::Bool(false));

    let caller_limit = registry.call_metric("threshold", Params::new().with("value", 6.0).with("limit", 9.0)).unwrap();
    assert_eq!(caller_limit, MetricValue::Bool(false));

    let null_default = registry.call_metric("echo_missing", Params::new()).unwrap();
    assert_eq!(null_default, MetricValue::Null);
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_unknown_metric_kind() {
    let (_dir, root) = metrics_dir();
    let registry = Registry::discover(&DiscoveryRoot::new(&root));

    let err = registry.call_metric("threshold", Params::new().with("value", 1.0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownMetric);
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_shared_registry_until_reset() {
    let (_dir, root) = metrics_dir();
    let discovery = DiscoveryRoot::new(&root).with_module(CHECKS);

    let first = shared(&discovery);
    let second = shared(&discovery);
    assert!(Arc::ptr_eq(&first, &second));

    assert!(reset(&root));
    let third = shared(&discovery);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(third.list_all().len(), 2);
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_builtin_metrics_against_shipped_configurations() {
    let shipped = Utf8PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../metrics"));
    let registry = Registry::discover(&DiscoveryRoot::new(shipped).with_builtin());

    let total = registry
        .call_metric("sum_demo", Params::new().with("numbers", MetricValue::List(vec![1.into(), 2.into(), 3.into()])))
        .unwrap();
    assert_eq!(total.as_f64(), Some(6.0));

    let analysis = registry.call_metric("demo_simple_calculator", Params::new()).unwrap();
    let (shape, json) = classify_result(&analysis, OutputFormat::Json);
    assert_eq!(shape, ResultShape::Complex);
    assert_eq!(json["calculations_table"].as_array().unwrap().len(), 5);
    assert_eq!(json["summary_stats"]["sum"], serde_json::json!(15.0));
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_pipeline_over_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::try_from(dir.path().join("scores.csv")).unwrap();
    fs::write(&path, "name,score\na,1\nb,2\nc,3\n").unwrap();

    let mut treatment = DataTreatment::new();
    let _ = treatment
        .register_source("scores", CsvSource::new(path))
        .add_transformer("scores", |table| table.filter(&RowFilter::new().one_of("name", vec![Cell::from("a"), Cell::from("c")])))
        .add_transformer("scores", |table| table.rename_column("score", "points"));

    let raw = treatment.load_many(None, &FetchPlan::new(), false).unwrap();
    assert_eq!(raw["scores"].rows().len(), 3);
    assert_eq!(raw["scores"].columns(), ["name", "score"]);

    let treated = treatment.load("scores", &FetchRequest::new(), true).unwrap();
    assert_eq!(treated.columns(), ["name", "points"]);
    assert_eq!(treated.rows(), [vec![Cell::from("a"), Cell::Int(1)], vec![Cell::from("c"), Cell::Int(3)]]);

    let err = treatment.load("missing", &FetchRequest::new(), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownSource);
}
