use super::Host;
use super::common::{Context, GlobalArgs, emit, fail};
use crate::Result;
use crate::metrics::{MetricConfig, MetricValue, Params, convert_params};
use crate::reports::{MetricResponse, OutputFormat, ResultShape, classify_result, generate_page};
use camino::Utf8PathBuf;
use chrono::Local;
use clap::Parser;
use ohno::{IntoAppError, app_err};
use serde_json::Value;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Metric identifier
    #[arg(value_name = "ID")]
    pub id: String,

    /// Parameter passed to the metric; may be repeated
    #[arg(long = "param", short = 'p', value_name = "NAME=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Output format (default comes from the configuration file)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the result to a file instead of the terminal
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Render a standalone HTML page instead of a response envelope
    #[arg(long)]
    pub page: bool,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}

pub fn call_metric<H: Host>(host: &mut H, global: &GlobalArgs, args: &CallArgs) -> Result<()> {
    let context = match Context::load(global) {
        Ok(context) => context,
        Err(e) => return fail(host, "Unable to load configuration", e),
    };

    let registry = context.registry();
    let format = args.format.unwrap_or(context.config.default_output_format);
    let config = registry.get_config(&args.id);

    let outcome = convert_params(config, args.params.iter().map(|(name, value)| (name, value)))
        .and_then(|params| registry.call_metric(&args.id, params.clone()).map(|result| (params, result)));

    let (params, result) = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            let response = MetricResponse::failure(&args.id, &e, format);
            if let Ok(json) = serde_json::to_string_pretty(&response) {
                let _ = writeln!(host.output(), "{json}");
            }
            return fail(host, "Metric call failed", e.into());
        }
    };

    match render(&args.id, config, &params, &result, format, args.page) {
        Ok(text) => emit(host, args.output.as_ref(), &text),
        Err(e) => fail(host, "Unable to render metric result", e),
    }
}

fn render(
    id: &str,
    config: Option<&MetricConfig>,
    params: &Params,
    result: &MetricValue,
    format: OutputFormat,
    page: bool,
) -> Result<String> {
    if page {
        let mut html = String::new();
        generate_page(id, config, params, result, Local::now(), &mut html)?;
        return Ok(html);
    }

    if format == OutputFormat::Csv {
        return match classify_result(result, format) {
            (ResultShape::Table, Value::String(csv)) => Ok(csv),
            (ResultShape::Table, _) => Err(app_err!("unable to render the table returned by '{id}' as CSV")),
            (shape, _) => Err(app_err!("CSV output requires a table result, but '{id}' returned a {shape} result")),
        };
    }

    let response = MetricResponse::success(id, result, format);
    serde_json::to_string_pretty(&response).into_app_err("serializing metric response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::test_support::{SHIPPED_METRICS, workspace};
    use crate::commands::{TestHost, run};
    use serde_json::json;

    fn call(host: &mut TestHost, config: &Utf8PathBuf, args: &[&str]) -> Result<()> {
        let mut argv = vec!["metrics-hub", "--config", config.as_str(), "--metrics-dir", SHIPPED_METRICS, "call"];
        argv.extend_from_slice(args);
        run(host, argv)
    }

    fn response(host: &TestHost) -> Value {
        serde_json::from_slice(&host.output_buf).unwrap()
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_call_prints_response() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        call(&mut host, &config, &["sum_demo", "-p", "numbers=1,2,3"]).unwrap();

        let json = response(&host);
        assert_eq!(json["metric_id"], json!("sum_demo"));
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["result_type"], json!("simple"));
        assert_eq!(json["result"], json!(6.0));
        assert_eq!(host.exit_code, None);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_call_applies_declared_defaults() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        call(&mut host, &config, &["demo_simple_calculator", "--format", "html"]).unwrap();

        let json = response(&host);
        assert_eq!(json["result_type"], json!("complex"));
        assert_eq!(json["output_format"], json!("html"));
        assert!(json["result"]["calculations_table"].as_str().unwrap().contains("table table-striped"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_unknown_metric_fails() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        let result = call(&mut host, &config, &["does_not_exist"]);

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
        let json = response(&host);
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["error_kind"], json!("unknown_metric"));
        assert!(host.error_text().contains("metric function not found: does_not_exist"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_validation_error_is_reported() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        let result = call(&mut host, &config, &["demo_simple_calculator", "-p", "input_data=[]"]);

        assert!(result.is_err());
        let json = response(&host);
        assert_eq!(json["error_kind"], json!("validation"));
        assert_eq!(json["error"], json!("Input sequence cannot be empty"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_csv_requires_a_table() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        let result = call(&mut host, &config, &["sum_demo", "-p", "numbers=1", "--format", "csv"]);

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
        assert!(host.error_text().contains("CSV output requires a table result"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_page_written_to_file() {
        let (_dir, root, config) = workspace();
        let page = root.join("out/sum.html");
        let mut host = TestHost::new();

        call(&mut host, &config, &["sum_demo", "-p", "numbers=4,5", "--page", "--output", page.as_str()]).unwrap();

        let html = std::fs::read_to_string(&page).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("numbers"));
        assert_eq!(host.output_text(), format!("Wrote {page}\n"));
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("a=1").unwrap(), ("a".to_string(), "1".to_string()));
        assert_eq!(parse_param(" values = 1,2,3").unwrap(), ("values".to_string(), " 1,2,3".to_string()));
        assert_eq!(parse_param("expr=x=y").unwrap(), ("expr".to_string(), "x=y".to_string()));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }
}
