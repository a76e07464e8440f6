use super::{CsvSource, DataSource, FetchRequest, ParquetSource, SqlSource, Table};
use crate::error::HubError;
use crate::metrics::{DataSourceSpec, SourceKind};
use core::fmt::{Debug, Formatter};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const LOG_TARGET: &str = "      data";

/// A post-fetch transformation applied to a source's table.
pub type Transformer = Box<dyn Fn(Table) -> Result<Table, HubError> + Send + Sync>;

/// Per-source fetch overrides used by [`DataTreatment::load_many`].
pub type FetchPlan = HashMap<String, FetchRequest>;

/// How [`DataTreatment::load_many_with`] reacts to a failing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Abort on the first failing source.
    #[default]
    FailFast,

    /// Load every source and report failures next to the tables that loaded.
    Partial,
}

/// Tables and per-source errors from a batched load.
#[derive(Debug, Default)]
pub struct PartialLoad {
    pub tables: BTreeMap<String, Table>,
    pub errors: BTreeMap<String, HubError>,
}

impl PartialLoad {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Named data sources with ordered transformer chains.
///
/// Sources and transformers are registered up front; loading never changes the
/// registrations, so a fully populated treatment can be shared between readers.
#[derive(Default)]
pub struct DataTreatment {
    sources: Vec<(String, Arc<dyn DataSource>)>,
    transformers: HashMap<String, Vec<Transformer>>,
}

impl Debug for DataTreatment {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataTreatment")
            .field("sources", &self.sources)
            .field(
                "transformers",
                &self.transformers.iter().map(|(k, v)| (k, v.len())).collect::<BTreeMap<_, _>>(),
            )
            .finish()
    }
}

impl DataTreatment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source, replacing any source already registered under `name`.
    pub fn register_source(&mut self, name: impl Into<String>, source: impl DataSource + 'static) -> &mut Self {
        self.register_shared(name, Arc::new(source))
    }

    /// Registers a source that is shared with other treatments.
    pub fn register_shared(&mut self, name: impl Into<String>, source: Arc<dyn DataSource>) -> &mut Self {
        let name = name.into();
        log::debug!(target: LOG_TARGET, "Registering data source '{name}'");

        if let Some(slot) = self.sources.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = source;
        } else {
            self.sources.push((name, source));
        }

        self
    }

    /// Registers a source described by a metric configuration.
    ///
    /// File descriptors become delimited or Parquet sources based on their extension
    /// and database descriptors become SQL sources. Any other descriptor fails with
    /// [`HubError::UnsupportedSource`].
    pub fn register_spec(&mut self, spec: &DataSourceSpec) -> Result<&mut Self, HubError> {
        let unsupported = |kind: String| HubError::UnsupportedSource {
            name: spec.name.clone(),
            kind,
        };

        match spec.kind {
            SourceKind::File => {
                let path = spec
                    .path
                    .as_deref()
                    .ok_or_else(|| HubError::validation(format!("file data source '{}' needs a 'path'", spec.name)))?;

                let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).unwrap_or_default();
                match extension.as_str() {
                    "csv" | "txt" => Ok(self.register_source(spec.name.clone(), CsvSource::new(path))),
                    "tsv" => Ok(self.register_source(spec.name.clone(), CsvSource::new(path).with_option("delimiter", "tab"))),
                    "parquet" | "pq" => Ok(self.register_source(spec.name.clone(), ParquetSource::new(path))),
                    _ => Err(unsupported(format!("file (.{extension})"))),
                }
            }

            SourceKind::Database => {
                let connection = spec
                    .connection
                    .as_deref()
                    .ok_or_else(|| HubError::validation(format!("database data source '{}' needs a 'connection'", spec.name)))?;
                let query = spec
                    .query
                    .as_deref()
                    .ok_or_else(|| HubError::validation(format!("database data source '{}' needs a 'query'", spec.name)))?;

                Ok(self.register_source(spec.name.clone(), SqlSource::new(connection, query)))
            }

            SourceKind::Api => Err(unsupported(spec.kind.to_string())),
        }
    }

    /// Appends a transformer to the chain of `name`; transformers run in the order added.
    pub fn add_transformer<F>(&mut self, name: impl Into<String>, transformer: F) -> &mut Self
    where
        F: Fn(Table) -> Result<Table, HubError> + Send + Sync + 'static,
    {
        self.transformers.entry(name.into()).or_default().push(Box::new(transformer));
        self
    }

    /// Names of the registered sources, in registration order.
    #[must_use]
    pub fn available_sources(&self) -> Vec<&str> {
        self.sources.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Fetches a table from `name`, then runs its transformer chain when asked to.
    pub fn load(&self, name: &str, request: &FetchRequest, apply_transformers: bool) -> Result<Table, HubError> {
        let source = self
            .sources
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, source)| source)
            .ok_or_else(|| HubError::UnknownSource(name.to_string()))?;

        log::debug!(target: LOG_TARGET, "Loading data source '{name}'");
        let mut table = source.fetch(request)?;

        if apply_transformers && let Some(chain) = self.transformers.get(name) {
            for transformer in chain {
                table = transformer(table)?;
            }
        }

        Ok(table)
    }

    /// Loads several sources, aborting on the first failure.
    ///
    /// `names` defaults to every registered source. `plan` supplies per-source fetch
    /// requests; sources missing from the plan are fetched with a default request.
    pub fn load_many(
        &self,
        names: Option<&[&str]>,
        plan: &FetchPlan,
        apply_transformers: bool,
    ) -> Result<BTreeMap<String, Table>, HubError> {
        self.load_many_with(LoadPolicy::FailFast, names, plan, apply_transformers)
            .map(|loaded| loaded.tables)
    }

    /// Loads several sources, collecting failures instead of aborting.
    #[must_use]
    pub fn load_many_partial(&self, names: Option<&[&str]>, plan: &FetchPlan, apply_transformers: bool) -> PartialLoad {
        let mut loaded = PartialLoad::default();
        for name in self.selected(names) {
            let request = plan.get(name).cloned().unwrap_or_default();
            match self.load(name, &request, apply_transformers) {
                Ok(table) => {
                    let _ = loaded.tables.insert(name.to_string(), table);
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Unable to load data source '{name}': {e}");
                    let _ = loaded.errors.insert(name.to_string(), e);
                }
            }
        }

        loaded
    }

    /// Loads several sources under an explicit failure policy.
    pub fn load_many_with(
        &self,
        policy: LoadPolicy,
        names: Option<&[&str]>,
        plan: &FetchPlan,
        apply_transformers: bool,
    ) -> Result<PartialLoad, HubError> {
        if policy == LoadPolicy::Partial {
            return Ok(self.load_many_partial(names, plan, apply_transformers));
        }

        let mut loaded = PartialLoad::default();
        for name in self.selected(names) {
            let request = plan.get(name).cloned().unwrap_or_default();
            let table = self.load(name, &request, apply_transformers)?;
            let _ = loaded.tables.insert(name.to_string(), table);
        }

        Ok(loaded)
    }

    fn selected<'a>(&'a self, names: Option<&'a [&'a str]>) -> Vec<&'a str> {
        names.map_or_else(|| self.available_sources(), <[&str]>::to_vec)
    }
}
