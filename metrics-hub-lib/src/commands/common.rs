//! Argument handling and setup shared by every command.

use super::Host;
use super::config::Config;
use crate::Result;
use crate::metrics::{DiscoveryRoot, Registry};
use crate::scaffold::Layout;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use ohno::{AppError, IntoAppError};
use std::fs;
use std::io::{IsTerminal, Write, stdout};

/// Color mode configuration for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if the output is a terminal, otherwise don't use colors
    Auto,
}

impl ColorMode {
    #[must_use]
    pub fn use_colors(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => stdout().is_terminal(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments accepted by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to configuration file (default is `hub.toml`)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding metric configurations, overriding the configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub metrics_dir: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto", global = true)]
    pub color: ColorMode,
}

/// Configuration resolved for one command invocation.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
}

impl Context {
    /// Loads the configuration file and applies command-line overrides.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let root = Utf8PathBuf::from(".");
        let mut config = Config::load(&root, args.config.as_ref())?;

        if let Some(dir) = &args.metrics_dir {
            config.metrics_dir.clone_from(dir);
        }

        Ok(Self { config })
    }

    #[must_use]
    pub fn discovery_root(&self) -> DiscoveryRoot {
        DiscoveryRoot::new(self.config.metrics_dir.clone()).with_builtin()
    }

    /// Runs discovery over the configured directory and the built-in modules.
    #[must_use]
    pub fn registry(&self) -> Registry {
        Registry::discover(&self.discovery_root())
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.config.layout()
    }
}

pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // a logger installed by an earlier run in the same process stays in place
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Reports a failed command on the host's error stream and terminates with status 1.
pub fn fail<H: Host>(host: &mut H, what: &str, error: AppError) -> Result<()> {
    let _ = writeln!(host.error(), "❌ {what}: {error}");
    host.exit(1);
    Err(error)
}

/// Writes command output to a file when one is given, otherwise to the host.
pub fn emit<H: Host>(host: &mut H, path: Option<&Utf8PathBuf>, text: &str) -> Result<()> {
    if let Some(path) = path {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{parent}'"))?;
        }
        fs::write(path, text).into_app_err_with(|| format!("writing '{path}'"))?;
        let _ = writeln!(host.output(), "Wrote {path}");
    } else {
        let _ = write!(host.output(), "{text}");
        if !text.ends_with('\n') {
            let _ = writeln!(host.output());
        }
    }

    Ok(())
}
