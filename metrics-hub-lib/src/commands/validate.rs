use super::Host;
use super::common::{Context, GlobalArgs, fail};
use crate::Result;
use clap::Parser;
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Also fail when a configuration has no implementation bound to it
    #[arg(long)]
    pub strict: bool,
}

pub fn validate_metrics<H: Host>(host: &mut H, global: &GlobalArgs, args: &ValidateArgs) -> Result<()> {
    let context = match Context::load(global) {
        Ok(context) => context,
        Err(e) => return fail(host, "Configuration validation failed", e),
    };

    let registry = context.registry();
    let mut problems = registry.diagnostics().len();

    for diagnostic in registry.diagnostics() {
        let _ = writeln!(host.error(), "{}: {diagnostic}", diagnostic.kind());
    }

    for config in registry.list_all() {
        if registry.get_binding(&config.id).is_none() {
            let _ = writeln!(host.error(), "warning: no implementation bound to metric '{}'", config.id);
            if args.strict {
                problems += 1;
            }
        }
    }

    if problems > 0 {
        return fail(
            host,
            "Metric validation failed",
            app_err!("{problems} problem(s) found in '{}'", registry.root()),
        );
    }

    let _ = writeln!(
        host.output(),
        "All {} metric configurations in '{}' are valid",
        registry.list_all().len(),
        registry.root()
    );
    Ok(())
}
