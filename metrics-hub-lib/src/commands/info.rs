use super::Host;
use super::common::{Context, GlobalArgs, fail};
use crate::Result;
use clap::Parser;
use ohno::{IntoAppError, bail};
use serde_json::Value;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Metric identifier
    #[arg(value_name = "ID")]
    pub id: String,
}

fn describe(global: &GlobalArgs, id: &str) -> Result<String> {
    let registry = Context::load(global)?.registry();

    let Some(config) = registry.get_config(id) else {
        bail!("metric configuration not found: {id}");
    };

    let mut value = serde_json::to_value(config).into_app_err("serializing metric configuration")?;
    if let Value::Object(map) = &mut value {
        let implementation = registry
            .get_binding(id)
            .map_or(Value::Null, |binding| Value::String(binding.function_name.to_string()));
        let _ = map.insert("implementation".to_string(), implementation);
    }

    serde_json::to_string_pretty(&value).into_app_err("serializing metric configuration")
}

pub fn show_metric<H: Host>(host: &mut H, global: &GlobalArgs, args: &InfoArgs) -> Result<()> {
    match describe(global, &args.id) {
        Ok(json) => {
            let _ = writeln!(host.output(), "{json}");
            Ok(())
        }
        Err(e) => fail(host, "Unable to describe metric", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::common::test_support::{SHIPPED_METRICS, workspace};
    use crate::commands::{TestHost, run};
    use serde_json::{Value, json};

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_info_includes_implementation() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        run(&mut host, ["metrics-hub", "-c", config.as_str(), "--metrics-dir", SHIPPED_METRICS, "info", "sum_demo"]).unwrap();

        let json: Value = serde_json::from_slice(&host.output_buf).unwrap();
        assert_eq!(json["id"], json!("sum_demo"));
        assert_eq!(json["implementation"], json!("sum_demo"));
        assert_eq!(json["inputs"][0]["type"], json!("array"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_info_unknown_metric() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        let result = run(&mut host, ["metrics-hub", "-c", config.as_str(), "info", "nothing"]);

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
        assert!(host.error_text().contains("metric configuration not found: nothing"));
    }
}
