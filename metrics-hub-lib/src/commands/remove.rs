use super::Host;
use super::common::{Context, GlobalArgs, fail};
use crate::Result;
use crate::scaffold::remove;
use clap::Parser;
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Identifier of the metric to remove
    #[arg(value_name = "ID")]
    pub id: String,

    /// Delete the files; without this flag the files are only listed
    #[arg(long, short = 'f')]
    pub force: bool,
}

pub fn remove_metric<H: Host>(host: &mut H, global: &GlobalArgs, args: &RemoveArgs) -> Result<()> {
    let layout = match Context::load(global) {
        Ok(context) => context.layout(),
        Err(e) => return fail(host, "Unable to load configuration", e),
    };

    let existing: Vec<_> = layout.artifacts(&args.id).into_iter().filter(|p| p.exists()).collect();
    if existing.is_empty() {
        return fail(host, "Unable to remove metric", app_err!("no files found for metric '{}'", args.id));
    }

    if !args.force {
        let _ = writeln!(host.output(), "The following files belong to metric '{}':", args.id);
        for path in &existing {
            let _ = writeln!(host.output(), "  {path}");
        }
        let _ = writeln!(host.output(), "Re-run with --force to delete them");
        return Ok(());
    }

    match remove(&layout, &args.id) {
        Ok(removed) => {
            for path in removed {
                let _ = writeln!(host.output(), "Removed {path}");
            }
            Ok(())
        }
        Err(e) => fail(host, "Unable to remove metric", e),
    }
}
