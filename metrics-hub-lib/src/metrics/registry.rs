use super::{MetricConfig, MetricFn, MetricImpl, MetricModule, MetricValue, Params};
use crate::error::HubError;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use walkdir::WalkDir;

const LOG_TARGET: &str = "  registry";

/// Where discovery looks for metrics: a configuration directory plus the metric
/// modules compiled into the program.
#[derive(Debug, Clone)]
pub struct DiscoveryRoot {
    config_dir: Utf8PathBuf,
    modules: Vec<MetricModule>,
}

impl DiscoveryRoot {
    #[must_use]
    pub fn new(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: MetricModule) -> Self {
        self.modules.push(module);
        self
    }

    #[must_use]
    pub fn with_modules(mut self, modules: &[MetricModule]) -> Self {
        self.modules.extend_from_slice(modules);
        self
    }

    /// Adds the metric modules shipped with this library.
    #[must_use]
    pub fn with_builtin(self) -> Self {
        self.with_modules(crate::builtin::MODULES)
    }

    #[must_use]
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    #[must_use]
    pub fn modules(&self) -> &[MetricModule] {
        &self.modules
    }
}

/// Catalog of metric configurations and implementations.
///
/// A registry is built once by [`Registry::discover`] and never changes afterwards.
/// Duplicate identifiers follow a last-write-wins policy for both configurations and
/// implementations: the later one replaces the earlier one and a warning is logged.
#[derive(Debug)]
pub struct Registry {
    root: Utf8PathBuf,
    configs: Vec<MetricConfig>,
    config_index: HashMap<String, usize>,
    functions: HashMap<String, MetricImpl>,
    diagnostics: Vec<HubError>,
}

impl Registry {
    fn empty(root: Utf8PathBuf) -> Self {
        Self {
            root,
            configs: Vec::new(),
            config_index: HashMap::new(),
            functions: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Discovers every configuration and implementation under `root`.
    ///
    /// Configuration documents (`*.yaml`, `*.yml`) are loaded recursively in path order.
    /// Malformed documents and failing modules are logged, recorded in
    /// [`Registry::diagnostics`], and skipped.
    #[must_use]
    pub fn discover(root: &DiscoveryRoot) -> Self {
        let mut registry = Self::empty(root.config_dir.clone());

        registry.load_configs(&root.config_dir);
        registry.load_modules(&root.modules);

        log::info!(
            target: LOG_TARGET,
            "Discovered {} configuration(s) and {} implementation(s) under '{}'",
            registry.configs.len(),
            registry.functions.len(),
            root.config_dir
        );

        registry
    }

    /// Builds a registry from configurations and implementations already in hand.
    ///
    /// Duplicates are resolved the same way discovery resolves them.
    #[must_use]
    pub fn from_parts(root: impl Into<Utf8PathBuf>, configs: Vec<MetricConfig>, impls: Vec<MetricImpl>) -> Self {
        let mut registry = Self::empty(root.into());
        for config in configs {
            registry.add_config(config, None);
        }

        for imp in impls {
            registry.bind(imp, "<direct>");
        }

        registry
    }

    fn load_configs(&mut self, dir: &Utf8Path) {
        if !dir.is_dir() {
            log::warn!(target: LOG_TARGET, "Metric configuration directory '{dir}' does not exist");
            return;
        }

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Unable to walk '{dir}': {e}");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                log::warn!(target: LOG_TARGET, "Skipping non UTF-8 path under '{dir}'");
                continue;
            };

            if !matches!(path.extension(), Some("yaml" | "yml")) {
                continue;
            }

            match MetricConfig::load(&path) {
                Ok(config) => self.add_config(config, Some(&path)),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Skipping configuration: {e}");
                    self.diagnostics.push(e);
                }
            }
        }
    }

    fn add_config(&mut self, config: MetricConfig, path: Option<&Utf8Path>) {
        let origin = path.map_or_else(String::new, |p| format!(" from '{p}'"));

        if let Some(&index) = self.config_index.get(&config.id) {
            log::warn!(target: LOG_TARGET, "Configuration for '{}'{origin} replaces an earlier one", config.id);
            if let Some(slot) = self.configs.get_mut(index) {
                *slot = config;
            }
        } else {
            log::debug!(target: LOG_TARGET, "Loaded configuration '{}'{origin}", config.id);
            let _ = self.config_index.insert(config.id.clone(), self.configs.len());
            self.configs.push(config);
        }
    }

    fn load_modules(&mut self, modules: &[MetricModule]) {
        for module in modules {
            if module.is_private() {
                log::debug!(target: LOG_TARGET, "Skipping private metric module '{}'", module.name());
                continue;
            }

            match module.load() {
                Ok(impls) => {
                    for imp in impls {
                        self.bind(imp, module.name());
                    }
                }
                Err(e) => {
                    let err = HubError::Import {
                        module: module.name().to_string(),
                        message: e.to_string(),
                    };
                    log::warn!(target: LOG_TARGET, "Skipping metric module: {err}");
                    self.diagnostics.push(err);
                }
            }
        }
    }

    fn bind(&mut self, imp: MetricImpl, module: &str) {
        if let Some(previous) = self.functions.insert(imp.id.to_string(), imp) {
            log::warn!(
                target: LOG_TARGET,
                "Implementation '{}' from module '{module}' replaces '{}' for metric '{}'",
                imp.function_name,
                previous.function_name,
                imp.id
            );
        } else {
            log::debug!(target: LOG_TARGET, "Bound metric '{}' to '{}'", imp.id, imp.function_name);
        }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    #[must_use]
    pub fn get_function(&self, id: &str) -> Option<MetricFn> {
        self.functions.get(id).map(|imp| imp.function)
    }

    #[must_use]
    pub fn get_binding(&self, id: &str) -> Option<&MetricImpl> {
        self.functions.get(id)
    }

    #[must_use]
    pub fn get_config(&self, id: &str) -> Option<&MetricConfig> {
        self.config_index.get(id).and_then(|&i| self.configs.get(i))
    }

    /// All loaded configurations in discovery order.
    ///
    /// Implementations without a configuration are callable but not listed.
    #[must_use]
    pub fn list_all(&self) -> &[MetricConfig] {
        &self.configs
    }

    /// Every identifier known through a configuration or an implementation, sorted.
    #[must_use]
    pub fn metric_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .configs
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.functions.keys().map(String::as_str))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Problems encountered during discovery.
    #[must_use]
    pub fn diagnostics(&self) -> &[HubError] {
        &self.diagnostics
    }

    /// Invokes a metric.
    ///
    /// When a configuration exists, every declared input that has a default and is
    /// missing from `params` receives that default first. A default of `null` still
    /// counts as a default. The implementation runs exactly once and its result or
    /// error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::UnknownMetric`] when no implementation is bound to `id`,
    /// and otherwise whatever the implementation returns.
    pub fn call_metric(&self, id: &str, mut params: Params) -> Result<MetricValue, HubError> {
        let binding = self.functions.get(id).ok_or_else(|| HubError::UnknownMetric(id.to_string()))?;

        if let Some(config) = self.get_config(id) {
            for input in &config.inputs {
                if let Some(default) = input.default_value()
                    && params.insert_if_absent(&input.name, default)
                {
                    log::trace!(target: LOG_TARGET, "Applied default for '{}' of metric '{id}'", input.name);
                }
            }
        }

        log::debug!(target: LOG_TARGET, "Calling metric '{id}' with {} parameter(s)", params.len());
        (binding.function)(&params)
    }
}
