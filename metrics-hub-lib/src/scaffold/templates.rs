use super::MetricBlueprint;
use super::user_code::{PLACEHOLDER, default_block};
use crate::Result;
use crate::metrics::{ParameterSpec, TemplateKind, ValueType};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use core::fmt::Write;

const BODY_INDENT: &str = "    ";

/// Renders the implementation file.
///
/// Returns the template, which holds a placeholder where the user region goes, and the
/// default user region for a file that has never been edited.
pub fn implementation(blueprint: &MetricBlueprint) -> Result<(String, String)> {
    let id = &blueprint.id;
    let function = &blueprint.function_name;
    let summary = if blueprint.description.is_empty() { &blueprint.name } else { &blueprint.description };

    let mut out = String::new();
    write_comment(&mut out, "//!", summary)?;
    writeln!(out, "//!")?;
    writeln!(out, "//! Generated by metrics-hub. Only the user code region survives `metrics-hub generate {id}`.")?;
    writeln!(out)?;
    writeln!(out, "#![allow(unused_imports, unused_variables, reason = \"generated scaffolding\")]")?;
    writeln!(out)?;
    writeln!(out, "use metrics_hub_lib::data::{{DataTreatment, SqlSource, Table}};")?;
    writeln!(out, "use metrics_hub_lib::error::HubError;")?;
    writeln!(out, "use metrics_hub_lib::metrics::{{Chart, MetricImpl, MetricModule, MetricValue, Params, Trace}};")?;
    writeln!(out, "use metrics_hub_lib::register_metric;")?;
    writeln!(out, "use std::collections::BTreeMap;")?;
    writeln!(out)?;
    writeln!(out, "const LOG_TARGET: &str = \"{id}\";")?;
    writeln!(out)?;
    writeln!(out, "pub const MODULE: MetricModule = MetricModule::new(\"{id}\", bindings);")?;
    writeln!(out)?;
    writeln!(out, "fn bindings() -> Result<Vec<MetricImpl>, HubError> {{")?;
    writeln!(out, "    Ok(vec![register_metric!(\"{id}\", {function})])")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    write_comment(&mut out, "///", summary)?;
    write_parameter_docs(&mut out, blueprint)?;
    writeln!(out, "pub fn {function}(params: &Params) -> Result<MetricValue, HubError> {{")?;
    writeln!(out, "    log::info!(target: LOG_TARGET, \"Calculating {id} with {{}} parameter(s)\", params.len());")?;
    writeln!(out)?;
    out.push_str(PLACEHOLDER);
    writeln!(out)?;
    writeln!(out, "    log::info!(target: LOG_TARGET, \"Calculated {id}\");")?;
    writeln!(out, "    Ok(result)")?;
    writeln!(out, "}}")?;

    Ok((out, default_block(&body(blueprint), BODY_INDENT)))
}

fn write_parameter_docs(out: &mut String, blueprint: &MetricBlueprint) -> Result<()> {
    if !blueprint.inputs.is_empty() {
        writeln!(out, "///")?;
        writeln!(out, "/// Inputs:")?;
        for input in &blueprint.inputs {
            let required = if input.required && !input.has_default() { "" } else { ", optional" };
            let item = format!("- `{}` ({}{required}): {}", input.name, input.value_type, describe(&input.description));
            write_comment(out, "///", &item)?;
        }
    }

    if !blueprint.outputs.is_empty() {
        writeln!(out, "///")?;
        writeln!(out, "/// Outputs:")?;
        for output in &blueprint.outputs {
            let item = format!("- `{}` ({}): {}", output.name, output.value_type, describe(&output.description));
            write_comment(out, "///", &item)?;
        }
    }

    Ok(())
}

/// Writes `text` one line at a time, each behind `prefix`.
fn write_comment(out: &mut String, prefix: &str, text: &str) -> Result<()> {
    let mut lines = text.trim_end().lines().peekable();
    if lines.peek().is_none() {
        writeln!(out, "{prefix}")?;
    }

    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            writeln!(out, "{prefix}")?;
        } else {
            writeln!(out, "{prefix} {line}")?;
        }
    }

    Ok(())
}

fn describe(text: &str) -> &str {
    if text.is_empty() { "No description" } else { text }
}

fn body(blueprint: &MetricBlueprint) -> String {
    match blueprint.template {
        TemplateKind::Simple if blueprint.complex && blueprint.inputs.iter().any(|i| i.name == "input_data") => SEQUENCE_BODY.to_string(),
        TemplateKind::Simple => simple_body(blueprint),
        TemplateKind::Dataframe => DATAFRAME_BODY.to_string(),
        TemplateKind::Plotly => PLOTLY_BODY.to_string(),
        TemplateKind::MultiSource => outputs_body(blueprint),
    }
}

fn simple_body(blueprint: &MetricBlueprint) -> String {
    let primary = blueprint.inputs.first().map_or("value", |i| i.name.as_str());

    if blueprint.outputs.len() <= 1 {
        return format!("    let base = params.float(\"{primary}\")?;\n    let result = MetricValue::Float(base * 2.0);");
    }

    let mut body = format!("    let base = params.float(\"{primary}\")?;\n    let result = MetricValue::Map(BTreeMap::from([\n");
    for output in &blueprint.outputs {
        let _ = writeln!(body, "        (\"{}\".to_string(), MetricValue::Float(base)),", output.name);
    }
    body.push_str("    ]));");
    body
}

fn outputs_body(blueprint: &MetricBlueprint) -> String {
    let mut body = String::from("    let mut outputs = BTreeMap::new();\n");
    for output in &blueprint.outputs {
        let _ = writeln!(body, "    let _ = outputs.insert(\"{}\".to_string(), MetricValue::Null);", output.name);
    }
    body.push_str("    let result = MetricValue::Map(outputs);");
    body
}

const SEQUENCE_BODY: &str = r#"    let input = params.table("input_data")?;
    let operation = params.optional("operation").and_then(MetricValue::as_str).unwrap_or("all");

    let values = input.numeric_column("value")?;
    if values.is_empty() {
        return Err(HubError::validation("input_data must contain at least one row"));
    }

    let count = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / count;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count).sqrt();

    let mut summary = BTreeMap::from([
        ("sum".to_string(), MetricValue::Float(sum)),
        ("mean".to_string(), MetricValue::Float(mean)),
        ("std".to_string(), MetricValue::Float(std)),
        ("count".to_string(), MetricValue::Int(values.len() as i64)),
    ]);
    if operation != "all" {
        summary.retain(|key, _| key == operation);
    }

    let chart = Chart::new()
        .with_trace(Trace::scatter(0..values.len() as i64, values.clone()).mode("lines"))
        .with_title("Number Sequence");

    let result = MetricValue::Map(BTreeMap::from([
        ("calculations_table".to_string(), MetricValue::Table(input)),
        ("visualization".to_string(), MetricValue::Chart(chart)),
        ("summary_stats".to_string(), MetricValue::Map(summary)),
    ]));"#;

const DATAFRAME_BODY: &str = r#"    let mut treatment = DataTreatment::new();
    treatment.register_source("primary_db", SqlSource::new(params.str("data_source")?, params.str("query")?));

    let table = treatment
        .load_many(None, &Default::default(), true)?
        .remove("primary_db")
        .unwrap_or_default();

    let summary = BTreeMap::from([
        ("rows".to_string(), MetricValue::Int(table.num_rows() as i64)),
        ("columns".to_string(), MetricValue::Int(table.num_columns() as i64)),
    ]);

    let result = MetricValue::Map(BTreeMap::from([
        ("result_table".to_string(), MetricValue::Table(table)),
        ("summary_stats".to_string(), MetricValue::Map(summary)),
    ]));"#;

const PLOTLY_BODY: &str = r#"    let data: Table = params.table("data")?;
    let chart_type = params.optional("chart_type").and_then(MetricValue::as_str).unwrap_or("line");
    let title = params.optional("title").and_then(MetricValue::as_str).unwrap_or("Chart");

    let x: Vec<String> = data.column(&data.columns()[0])?.map(ToString::to_string).collect();
    let y = data.numeric_column(&data.columns()[data.num_columns() - 1])?;
    let trace = if chart_type == "bar" { Trace::bar(x, y) } else { Trace::scatter(x, y).mode("lines") };

    let result = MetricValue::Map(BTreeMap::from([
        ("chart".to_string(), MetricValue::Chart(Chart::new().with_trace(trace).with_title(title))),
        ("data_table".to_string(), MetricValue::Table(data)),
    ]));"#;

/// Renders the test file. `impl_path` is the implementation file as seen from the
/// tests directory.
pub fn tests(blueprint: &MetricBlueprint, impl_path: &Utf8Path) -> Result<String> {
    let id = &blueprint.id;
    let function = &blueprint.function_name;

    let mut out = String::new();
    writeln!(out, "//! Tests for the {id} metric.")?;
    writeln!(out)?;
    writeln!(out, "#[path = \"{impl_path}\"]")?;
    writeln!(out, "mod metric;")?;
    writeln!(out)?;
    writeln!(out, "use metric::{{MODULE, {function}}};")?;
    writeln!(out, "use metrics_hub_lib::data::Table;")?;
    writeln!(out, "use metrics_hub_lib::metrics::{{MetricValue, Params}};")?;
    writeln!(out, "use std::collections::BTreeMap;")?;
    writeln!(out)?;
    writeln!(out, "fn sample_params() -> Params {{")?;
    writeln!(out, "    Params::new()")?;
    for input in &blueprint.inputs {
        writeln!(out, "        .with(\"{}\", {})", input.name, sample_value(input))?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "#[test]")?;
    writeln!(out, "fn test_basic_calculation() {{")?;
    writeln!(out, "    let result = {function}(&sample_params()).unwrap();")?;
    writeln!(out, "    assert_ne!(result, MetricValue::Null);")?;
    writeln!(out, "}}")?;

    if blueprint.inputs.iter().any(|i| i.required && !i.has_default()) {
        writeln!(out)?;
        writeln!(out, "#[test]")?;
        writeln!(out, "fn test_missing_parameters_are_rejected() {{")?;
        writeln!(out, "    assert!({function}(&Params::new()).is_err());")?;
        writeln!(out, "}}")?;
    }

    if blueprint.outputs.len() > 1 {
        writeln!(out)?;
        writeln!(out, "#[test]")?;
        writeln!(out, "fn test_result_structure() {{")?;
        writeln!(out, "    let result = {function}(&sample_params()).unwrap();")?;
        writeln!(out, "    let outputs = result.as_map().unwrap();")?;
        for output in &blueprint.outputs {
            writeln!(out, "    assert!(outputs.contains_key(\"{}\"));", output.name)?;
        }
        writeln!(out, "}}")?;
    }

    writeln!(out)?;
    writeln!(out, "#[test]")?;
    writeln!(out, "fn test_metric_registration() {{")?;
    writeln!(out, "    let bindings = MODULE.load().unwrap();")?;
    writeln!(out, "    assert_eq!(bindings.len(), 1);")?;
    writeln!(out, "    assert_eq!(bindings[0].id, \"{id}\");")?;
    writeln!(out, "}}")?;

    Ok(out)
}

fn sample_value(input: &ParameterSpec) -> &'static str {
    match input.value_type {
        ValueType::String => "\"test_value\"",
        ValueType::Integer => "42_i64",
        ValueType::Float => "2.5",
        ValueType::Boolean => "true",
        ValueType::Array => "MetricValue::List(vec![1.into(), 2.into(), 3.into()])",
        ValueType::Object => "MetricValue::Map(BTreeMap::from([(\"key\".to_string(), MetricValue::from(\"value\"))]))",
        ValueType::Table => "Table::from_csv_str(\"value\\n1\\n2\\n3\\n\").unwrap()",
        ValueType::Chart => "MetricValue::Null",
    }
}

/// Renders the deployment script.
pub fn deploy(blueprint: &MetricBlueprint, metrics_dir: &Utf8Path) -> Result<String> {
    let id = &blueprint.id;

    let mut out = String::new();
    writeln!(out, "#!/bin/sh")?;
    writeln!(out, "# Deployment script for the {id} metric.")?;
    writeln!(out, "set -eu")?;
    writeln!(out)?;
    writeln!(out, "cargo build --release")?;
    writeln!(out, "cargo test --release --test {id}_test")?;
    writeln!(out)?;
    writeln!(out, "metrics-hub --metrics-dir \"{metrics_dir}\" validate")?;
    writeln!(out, "metrics-hub --metrics-dir \"{metrics_dir}\" info {id}")?;
    writeln!(out)?;
    writeln!(out, "echo \"{id} is ready to deploy\"")?;

    Ok(out)
}

/// `target` as seen from `from_dir`, for relative paths sharing a root.
pub fn relative_path(from_dir: &Utf8Path, target: &Utf8Path) -> Utf8PathBuf {
    if from_dir.is_absolute() || target.is_absolute() {
        return target.to_path_buf();
    }

    let mut path = Utf8PathBuf::new();
    for component in from_dir.components() {
        if matches!(component, Utf8Component::Normal(_)) {
            path.push("..");
        }
    }

    path.join(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::user_code;

    fn blueprint(template: TemplateKind, complex: bool) -> MetricBlueprint {
        MetricBlueprint::create("calc", "demo", "Demo calculator", template, complex)
    }

    #[test]
    fn test_implementation_layout() {
        let (template, block) = implementation(&blueprint(TemplateKind::Simple, false)).unwrap();
        assert!(template.contains("pub const MODULE: MetricModule = MetricModule::new(\"demo_calc\", bindings);"));
        assert!(template.contains("register_metric!(\"demo_calc\", calculate_calc)"));
        assert!(template.contains("pub fn calculate_calc(params: &Params)"));
        assert!(template.contains("/// - `value` (float): Input value for calculation"));
        assert!(template.contains(PLACEHOLDER));

        assert!(block.starts_with("    // --- HUB USER CODE START ---\n"));
        assert!(block.ends_with("    // --- HUB USER CODE END ---"));
        assert!(block.contains("params.float(\"value\")"));
    }

    #[test]
    fn test_every_template_renders_a_region() {
        for (template, complex) in [
            (TemplateKind::Simple, true),
            (TemplateKind::Dataframe, false),
            (TemplateKind::Plotly, true),
            (TemplateKind::MultiSource, true),
        ] {
            let (code, block) = implementation(&blueprint(template, complex)).unwrap();
            let rendered = user_code::inject(&code, None, &block);
            assert_eq!(user_code::extract(&rendered), Some(block.as_str()), "{template}");
            assert!(rendered.contains("let result"), "{template}");
        }
    }

    #[test]
    fn test_multi_line_descriptions_stay_in_comments() {
        let mut blueprint = MetricBlueprint::create("Revenue", "sales", "first line\nsecond line\n", TemplateKind::Simple, false);
        blueprint.inputs[0].description = "amount\nin euros".to_string();
        blueprint.outputs[0].description = "doubled\r\namount".to_string();

        let (code, _) = implementation(&blueprint).unwrap();

        let header: Vec<&str> = code.lines().take_while(|line| !line.starts_with("use ")).collect();
        assert!(header.iter().all(|line| line.is_empty() || line.starts_with("//") || line.starts_with("#![")), "{code}");
        assert!(code.contains("//! first line\n//! second line\n//!\n"));

        let docs: Vec<&str> = code
            .lines()
            .skip_while(|line| !line.starts_with("/// first line"))
            .take_while(|line| !line.starts_with("pub fn"))
            .collect();
        assert!(docs.iter().all(|line| line.starts_with("///")), "{code}");
        assert!(docs.contains(&"/// - `value` (float): amount"));
        assert!(docs.contains(&"/// in euros"));
        assert!(docs.contains(&"/// doubled"));
        assert!(docs.contains(&"/// amount"));
    }

    #[test]
    fn test_test_stub() {
        let code = tests(&blueprint(TemplateKind::Plotly, false), Utf8Path::new("../src/metrics/demo_calc.rs")).unwrap();
        assert!(code.contains("#[path = \"../src/metrics/demo_calc.rs\"]"));
        assert!(code.contains(".with(\"data\", Table::from_csv_str("));
        assert!(code.contains("assert!(outputs.contains_key(\"data_table\"));"));
        assert!(code.contains("assert_eq!(bindings[0].id, \"demo_calc\");"));
    }

    #[test]
    fn test_deploy_stub() {
        let script = deploy(&blueprint(TemplateKind::Simple, false), Utf8Path::new("metrics")).unwrap();
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("cargo test --release --test demo_calc_test"));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Utf8Path::new("tests"), Utf8Path::new("src/metrics/a.rs")), "../src/metrics/a.rs");
        assert_eq!(relative_path(Utf8Path::new("a/b"), Utf8Path::new("c.rs")), "../../c.rs");
        assert_eq!(relative_path(Utf8Path::new("/abs"), Utf8Path::new("c.rs")), "c.rs");
    }
}
