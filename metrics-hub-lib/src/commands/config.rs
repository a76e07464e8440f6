use crate::Result;
use crate::reports::OutputFormat;
use crate::scaffold::Layout;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when `--config` is not given
pub const CONFIG_FILE_NAME: &str = "hub.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding metric configuration documents
    #[serde(default = "default_metrics_dir")]
    pub metrics_dir: Utf8PathBuf,

    /// Directory generated implementations are written to
    #[serde(default = "default_implementations_dir")]
    pub implementations_dir: Utf8PathBuf,

    /// Directory generated tests are written to
    #[serde(default = "default_tests_dir")]
    pub tests_dir: Utf8PathBuf,

    /// Directory generated deployment scripts are written to
    #[serde(default = "default_deploy_dir")]
    pub deploy_dir: Utf8PathBuf,

    /// Output format used by `call` when none is requested
    #[serde(default)]
    pub default_output_format: OutputFormat,
}

fn default_metrics_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("metrics")
}

fn default_implementations_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("src/metrics")
}

fn default_tests_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("tests")
}

fn default_deploy_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("deploy")
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(root: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading metrics-hub configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = root.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading metrics-hub configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// The directories the scaffolding generator writes to.
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout {
            metrics_dir: self.metrics_dir.clone(),
            implementations_dir: self.implementations_dir.clone(),
            tests_dir: self.tests_dir.clone(),
            deploy_dir: self.deploy_dir.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        let dirs = [
            ("metrics_dir", &self.metrics_dir),
            ("implementations_dir", &self.implementations_dir),
            ("tests_dir", &self.tests_dir),
            ("deploy_dir", &self.deploy_dir),
        ];

        for (key, dir) in dirs {
            if dir.as_str().trim().is_empty() {
                return Err(app_err!("{key} must not be empty"));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics_dir: default_metrics_dir(),
            implementations_dir: default_implementations_dir(),
            tests_dir: default_tests_dir(),
            deploy_dir: default_deploy_dir(),
            default_output_format: OutputFormat::default(),
        }
    }
}
