use super::Host;
use super::common::fail;
use super::config::{CONFIG_FILE_NAME, Config};
use crate::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output configuration file path (default is `hub.toml` in the current directory)
    #[arg(value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn init_config<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(|| Utf8PathBuf::from(CONFIG_FILE_NAME));

    if output.exists() && !args.force {
        return fail(
            host,
            "Unable to generate configuration",
            app_err!("'{output}' already exists; use --force to replace it"),
        );
    }

    if let Err(e) = Config::save_default(&output) {
        return fail(host, "Unable to generate configuration", e);
    }

    let _ = writeln!(host.output(), "Generated default configuration file: {output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{TestHost, run};
    use std::fs;

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_init_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("hub.toml")).unwrap();

        let mut host = TestHost::new();
        run(&mut host, ["metrics-hub", "init", path.as_str()]).unwrap();
        assert_eq!(host.output_text(), format!("Generated default configuration file: {path}\n"));
        assert_eq!(fs::read_to_string(&path).unwrap(), super::super::config::DEFAULT_CONFIG_TOML);

        let mut host = TestHost::new();
        let result = run(&mut host, ["metrics-hub", "init", path.as_str()]);
        assert!(result.is_err());
        assert!(host.error_text().contains("already exists"));

        let mut host = TestHost::new();
        run(&mut host, ["metrics-hub", "init", path.as_str(), "--force"]).unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_invalid_toml_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("broken.toml")).unwrap();
        fs::write(&path, "metrics_dir = [\n").unwrap();

        let mut host = TestHost::new();
        let result = run(&mut host, ["metrics-hub", "-c", path.as_str(), "validate"]);

        assert!(result.is_err());
        assert!(host.error_text().contains("Configuration validation failed"));
    }
}
