use super::Host;
use super::common::{Context, GlobalArgs, fail};
use crate::Result;
use crate::metrics::MetricConfig;
use crate::reports::generate_listing;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only show metrics of this category
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Print the configurations as JSON
    #[arg(long)]
    pub json: bool,
}

fn render(global: &GlobalArgs, args: &ListArgs) -> Result<String> {
    let context = Context::load(global)?;
    let registry = context.registry();

    let configs: Vec<MetricConfig> = registry
        .list_all()
        .iter()
        .filter(|c| args.category.as_ref().is_none_or(|category| c.category == *category))
        .cloned()
        .collect();

    if args.json {
        let mut json = serde_json::to_string_pretty(&configs).into_app_err("serializing metric configurations")?;
        json.push('\n');
        return Ok(json);
    }

    let mut text = String::new();
    generate_listing(&configs, |id| registry.get_binding(id).is_some(), global.color.use_colors(), &mut text)?;
    Ok(text)
}

pub fn list_metrics<H: Host>(host: &mut H, global: &GlobalArgs, args: &ListArgs) -> Result<()> {
    match render(global, args) {
        Ok(text) => {
            let _ = write!(host.output(), "{text}");
            Ok(())
        }
        Err(e) => fail(host, "Unable to list metrics", e),
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::common::test_support::{SHIPPED_METRICS, workspace};
    use crate::commands::{TestHost, run};
    use serde_json::Value;

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_list_shipped_metrics() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        run(&mut host, ["metrics-hub", "-c", config.as_str(), "--metrics-dir", SHIPPED_METRICS, "list", "--color", "never"]).unwrap();

        let text = host.output_text();
        assert!(text.contains("sum_demo Sum [demo]"));
        assert!(text.contains("demo_simple_calculator Simple Calculator [demo]"));
        assert!(!text.contains("no implementation bound"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_list_by_category_as_json() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        run(
            &mut host,
            ["metrics-hub", "-c", config.as_str(), "--metrics-dir", SHIPPED_METRICS, "list", "--category", "data", "--json"],
        )
        .unwrap();

        let json: Value = serde_json::from_slice(&host.output_buf).unwrap();
        let ids: Vec<&str> = json.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["table_summary"]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_empty_directory() {
        let (_dir, _root, config) = workspace();
        let mut host = TestHost::new();

        run(&mut host, ["metrics-hub", "-c", config.as_str(), "list"]).unwrap();
        assert_eq!(host.output_text(), "No metrics found\n");
    }
}
