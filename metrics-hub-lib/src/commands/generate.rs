use super::Host;
use super::common::{Context, GlobalArgs, fail};
use crate::Result;
use crate::metrics::MetricConfig;
use crate::scaffold::{GenerateOptions, MaterializeStatus, MetricBlueprint, materialize};
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Identifier of a metric whose configuration exists
    #[arg(value_name = "ID")]
    pub id: String,

    /// Reset the user code region of the implementation to the template default
    #[arg(long)]
    pub no_preserve_user_code: bool,

    /// Replace an existing test file
    #[arg(long)]
    pub overwrite_tests: bool,

    /// Replace an existing deployment script
    #[arg(long)]
    pub overwrite_deploy: bool,
}

fn generate(global: &GlobalArgs, args: &GenerateArgs) -> Result<Vec<(Utf8PathBuf, MaterializeStatus)>> {
    let layout = Context::load(global)?.layout();
    let config = MetricConfig::load(&layout.config_path(&args.id))?;
    let blueprint = MetricBlueprint::from_config(&config);

    let options = GenerateOptions {
        preserve_user_code: !args.no_preserve_user_code,
        overwrite_tests: args.overwrite_tests,
        overwrite_deploy: args.overwrite_deploy,
    };

    materialize(&layout, &blueprint, options)
}

pub fn generate_metric<H: Host>(host: &mut H, global: &GlobalArgs, args: &GenerateArgs) -> Result<()> {
    match generate(global, args) {
        Ok(files) => {
            let _ = writeln!(host.output(), "Generated files for metric '{}'", args.id);
            for (path, status) in files {
                let _ = writeln!(host.output(), "  {status:<8} {path}");
            }
            Ok(())
        }
        Err(e) => fail(host, "Unable to generate metric files", e),
    }
}
