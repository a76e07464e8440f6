use super::MetricValue;
use crate::error::HubError;
use camino::Utf8Path;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use strum::{Display, EnumIter};

/// Declared shape of a metric input or output.
///
/// Configuration documents may use the historical tags `dataframe`, `plotly_figure`
/// and `plotly_table`; unknown tags make the whole document invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueType {
    #[serde(alias = "str", alias = "text")]
    String,

    #[serde(alias = "int")]
    Integer,

    #[serde(alias = "number")]
    Float,

    #[serde(alias = "bool")]
    Boolean,

    #[serde(alias = "list")]
    Array,

    #[serde(alias = "dict", alias = "map")]
    Object,

    #[serde(alias = "dataframe")]
    Table,

    #[serde(alias = "plotly_figure", alias = "plotly_table", alias = "plotly")]
    Chart,
}

/// Kind of a declared data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    Database,
    Api,
    File,
}

/// Scaffolding template a metric was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Scalar inputs and a single result
    #[default]
    Simple,

    /// Tabular data loaded through the data pipeline
    Dataframe,

    /// A chart built from the inputs
    Plotly,

    /// Several declared data sources combined into one result
    MultiSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,

    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: ValueType,

    #[serde(default = "default_required")]
    pub required: bool,

    /// Declared default; `Some(Null)` when the document says `default: null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParameterSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            required: true,
            default: None,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<MetricValue> {
        self.default.as_ref().map(MetricValue::from_json)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,

    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: ValueType,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl OutputSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: SourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl DataSourceSpec {
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::File,
            connection: None,
            endpoint: None,
            path: Some(path.into()),
            query: None,
        }
    }

    #[must_use]
    pub fn database(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Database,
            connection: Some(connection.into()),
            endpoint: None,
            path: None,
            query: None,
        }
    }

    #[must_use]
    pub fn api(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Api,
            connection: None,
            endpoint: Some(endpoint.into()),
            path: None,
            query: None,
        }
    }
}

/// Declarative description of a metric, loaded from one YAML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateKind>,

    #[serde(default)]
    pub inputs: Vec<ParameterSpec>,

    #[serde(default)]
    pub outputs: Vec<OutputSpec>,

    #[serde(default)]
    pub data_sources: Vec<DataSourceSpec>,

    #[serde(default)]
    pub complex: bool,
}

const fn default_required() -> bool {
    true
}

const fn default_value_type() -> ValueType {
    ValueType::String
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl MetricConfig {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            category: String::new(),
            template: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            data_sources: Vec::new(),
            complex: false,
        }
    }

    /// Loads and validates a configuration document.
    pub fn load(path: &Utf8Path) -> Result<Self, HubError> {
        let text = fs::read_to_string(path).map_err(|e| HubError::Configuration {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::parse(&text, path)
    }

    /// Parses and validates a configuration document; `path` is only used in errors.
    pub fn parse(text: &str, path: &Utf8Path) -> Result<Self, HubError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| HubError::Configuration {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate().map_err(|message| HubError::Configuration {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(config)
    }

    /// Serializes the configuration as a YAML document.
    pub fn to_yaml(&self) -> Result<String, HubError> {
        serde_yaml::to_string(self).map_err(|e| HubError::data(format!("serializing configuration '{}': {e}", self.id)))
    }

    #[must_use]
    pub fn input(&self, name: &str) -> Option<&ParameterSpec> {
        self.inputs.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }

    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("'id' must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.name.as_str()) {
                return Err(format!("input '{}' is declared more than once", input.name));
            }
        }

        Ok(())
    }
}
