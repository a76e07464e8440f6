use super::Host;
use super::common::{Context, GlobalArgs, fail};
use crate::Result;
use crate::metrics::TemplateKind;
use crate::scaffold::{GenerateOptions, MaterializeStatus, MetricBlueprint, materialize, write_config};
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Human-readable metric name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Category the metric belongs to; also prefixes its identifier
    #[arg(long, default_value = "general", value_name = "CATEGORY")]
    pub category: String,

    /// One-line description of what the metric computes
    #[arg(long, default_value = "", value_name = "TEXT")]
    pub description: String,

    /// Template the implementation starts from
    #[arg(long, value_enum, default_value_t = TemplateKind::Simple, value_name = "TEMPLATE")]
    pub template: TemplateKind,

    /// Generate the richer variant of the template
    #[arg(long)]
    pub complex: bool,

    /// Replace an existing configuration with the same identifier
    #[arg(long)]
    pub overwrite: bool,
}

fn create(global: &GlobalArgs, args: &CreateArgs) -> Result<(MetricBlueprint, Vec<(Utf8PathBuf, MaterializeStatus)>)> {
    let layout = Context::load(global)?.layout();
    let blueprint = MetricBlueprint::create(&args.name, &args.category, &args.description, args.template, args.complex);

    let config_path = write_config(&layout, &blueprint, args.overwrite)?;
    let mut files = vec![(config_path, MaterializeStatus::Created)];
    files.extend(materialize(&layout, &blueprint, GenerateOptions::default())?);

    Ok((blueprint, files))
}

pub fn create_metric<H: Host>(host: &mut H, global: &GlobalArgs, args: &CreateArgs) -> Result<()> {
    match create(global, args) {
        Ok((blueprint, files)) => {
            let _ = writeln!(host.output(), "Created metric '{}' ({} template)", blueprint.id, blueprint.template);
            for (path, status) in files {
                let _ = writeln!(host.output(), "  {status:<8} {path}");
            }
            Ok(())
        }
        Err(e) => fail(host, "Unable to create metric", e),
    }
}
