//! Command dispatch logic for metrics-hub

use super::common::init_logging;
use super::{
    CallArgs, CreateArgs, GenerateArgs, GlobalArgs, InfoArgs, InitArgs, ListArgs, RemoveArgs, ValidateArgs, call_metric,
    create_metric, generate_metric, init_config, list_metrics, remove_metric, show_metric, validate_metrics,
};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "metrics-hub", author, version, long_about = None)]
#[command(about = "Develop, run, and scaffold metrics")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: HubSubcommand,
}

#[derive(Subcommand, Debug)]
enum HubSubcommand {
    /// List the available metrics
    List(ListArgs),
    /// Show the configuration of one metric
    Info(InfoArgs),
    /// Invoke a metric and print its classified result
    Call(Box<CallArgs>),
    /// Create the configuration and files of a new metric
    Create(Box<CreateArgs>),
    /// Regenerate the files of an existing metric from its configuration
    Generate(GenerateArgs),
    /// Delete the files of a metric
    Remove(RemoveArgs),
    /// Check every metric configuration and implementation
    Validate(ValidateArgs),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if the executed command fails
pub fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    init_logging(cli.global.log_level);

    let global = &cli.global;
    match &cli.command {
        HubSubcommand::List(args) => list_metrics(host, global, args),
        HubSubcommand::Info(args) => show_metric(host, global, args),
        HubSubcommand::Call(args) => call_metric(host, global, args),
        HubSubcommand::Create(args) => create_metric(host, global, args),
        HubSubcommand::Generate(args) => generate_metric(host, global, args),
        HubSubcommand::Remove(args) => remove_metric(host, global, args),
        HubSubcommand::Validate(args) => validate_metrics(host, global, args),
        HubSubcommand::Init(args) => init_config(host, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from(["metrics-hub", "list", "--metrics-dir", "defs", "--log-level", "debug"]);
        assert_eq!(cli.global.metrics_dir.as_deref().map(camino::Utf8Path::as_str), Some("defs"));
        assert!(matches!(cli.command, HubSubcommand::List(_)));
    }

    #[test]
    fn test_call_arguments() {
        let cli = Cli::parse_from(["metrics-hub", "call", "sum_demo", "-p", "values=1,2,3", "--format", "html", "--page"]);
        let HubSubcommand::Call(args) = cli.command else {
            panic!("expected the call subcommand");
        };
        assert_eq!(args.id, "sum_demo");
        assert_eq!(args.params, vec![("values".to_string(), "1,2,3".to_string())]);
        assert_eq!(args.format, Some(crate::reports::OutputFormat::Html));
        assert!(args.page);
    }

    #[test]
    fn test_create_template_names() {
        let cli = Cli::parse_from(["metrics-hub", "create", "Revenue", "--template", "multi_source", "--complex"]);
        let HubSubcommand::Create(args) = cli.command else {
            panic!("expected the create subcommand");
        };
        assert_eq!(args.template, crate::metrics::TemplateKind::MultiSource);
        assert_eq!(args.category, "general");
        assert!(args.complex);
    }
}
