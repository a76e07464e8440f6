use super::{MetricConfig, MetricValue, ValueType};
use crate::data::Table;
use crate::error::HubError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::{self, Entry};

/// Keyword arguments passed to a metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, MetricValue>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        let _ = self.values.insert(name.into(), value.into());
    }

    /// Inserts `value` only when `name` is absent; returns whether it was inserted.
    pub fn insert_if_absent(&mut self, name: &str, value: MetricValue) -> bool {
        match self.values.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                let _ = slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, MetricValue> {
        self.values.iter()
    }

    fn require(&self, name: &str) -> Result<&MetricValue, HubError> {
        self.values
            .get(name)
            .ok_or_else(|| HubError::validation(format!("missing required parameter '{name}'")))
    }

    fn mismatch(name: &str, expected: &str, value: &MetricValue) -> HubError {
        HubError::validation(format!("parameter '{name}' must be {expected}, got {}", value.type_name()))
    }

    pub fn str(&self, name: &str) -> Result<&str, HubError> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| Self::mismatch(name, "a string", value))
    }

    pub fn int(&self, name: &str) -> Result<i64, HubError> {
        let value = self.require(name)?;
        value.as_i64().ok_or_else(|| Self::mismatch(name, "an integer", value))
    }

    pub fn float(&self, name: &str) -> Result<f64, HubError> {
        let value = self.require(name)?;
        value.as_f64().ok_or_else(|| Self::mismatch(name, "a number", value))
    }

    pub fn bool(&self, name: &str) -> Result<bool, HubError> {
        let value = self.require(name)?;
        value.as_bool().ok_or_else(|| Self::mismatch(name, "a boolean", value))
    }

    pub fn list(&self, name: &str) -> Result<&[MetricValue], HubError> {
        let value = self.require(name)?;
        value.as_list().ok_or_else(|| Self::mismatch(name, "an array", value))
    }

    /// A list parameter whose items must all be numbers.
    pub fn numbers(&self, name: &str) -> Result<Vec<f64>, HubError> {
        self.list(name)?
            .iter()
            .map(|item| {
                item.as_f64()
                    .ok_or_else(|| HubError::validation(format!("parameter '{name}' must contain only numbers, found {}", item.type_name())))
            })
            .collect()
    }

    /// A table parameter; a JSON-style list of row objects is accepted too.
    pub fn table(&self, name: &str) -> Result<Table, HubError> {
        match self.require(name)? {
            MetricValue::Table(table) => Ok(table.clone()),
            value @ MetricValue::List(_) => {
                let records = value.to_json();
                Table::from_records(records.as_array().map(Vec::as_slice).unwrap_or_default())
            }
            value => Err(Self::mismatch(name, "a table", value)),
        }
    }

    /// The value of an optional parameter, treating an explicit null as absent.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&MetricValue> {
        self.values.get(name).filter(|v| **v != MetricValue::Null)
    }
}

impl<K: Into<String>, V: Into<MetricValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a MetricValue);
    type IntoIter = btree_map::Iter<'a, String, MetricValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Converts raw textual parameters into typed parameters.
///
/// With a configuration, each raw value is converted according to the declared type of
/// the matching input and undeclared names are dropped. Without one, values are passed
/// through as strings.
pub fn convert_params<K, V>(config: Option<&MetricConfig>, raw: impl IntoIterator<Item = (K, V)>) -> Result<Params, HubError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut params = Params::new();

    for (name, value) in raw {
        let (name, value) = (name.as_ref(), value.as_ref());
        match config {
            None => params.insert(name, value),
            Some(config) => {
                if let Some(spec) = config.input(name) {
                    params.insert(name, convert_value(name, spec.value_type, value)?);
                }
            }
        }
    }

    Ok(params)
}

/// Converts one raw value according to its declared type.
pub fn convert_value(name: &str, value_type: ValueType, raw: &str) -> Result<MetricValue, HubError> {
    let value = match value_type {
        ValueType::String => MetricValue::from(raw),

        ValueType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(MetricValue::Int)
            .map_err(|e| HubError::validation(format!("parameter '{name}' expects an integer, got '{raw}': {e}")))?,

        ValueType::Float => raw
            .trim()
            .parse::<f64>()
            .map(MetricValue::Float)
            .map_err(|e| HubError::validation(format!("parameter '{name}' expects a number, got '{raw}': {e}")))?,

        ValueType::Boolean => MetricValue::Bool(matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")),

        ValueType::Array => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => MetricValue::from_json(&Value::Array(items)),
            _ => MetricValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| {
                        serde_json::from_str::<Value>(item).map_or_else(|_| MetricValue::from(item), |v| MetricValue::from_json(&v))
                    })
                    .collect(),
            ),
        },

        ValueType::Object => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => MetricValue::from_json(&value),
            _ => MetricValue::Map(BTreeMap::from([("value".to_string(), MetricValue::from(raw))])),
        },

        ValueType::Table => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(records)) => MetricValue::Table(Table::from_records(&records)?),
            _ => MetricValue::Table(Table::from_csv_str(raw)?),
        },

        ValueType::Chart => serde_json::from_str::<Value>(raw).map_or_else(|_| MetricValue::from(raw), |v| MetricValue::from_json(&v)),
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ParameterSpec;

    fn config() -> MetricConfig {
        let mut config = MetricConfig::new("typed");
        config.inputs = vec![
            ParameterSpec::new("count", ValueType::Integer),
            ParameterSpec::new("ratio", ValueType::Float),
            ParameterSpec::new("enabled", ValueType::Boolean),
            ParameterSpec::new("numbers", ValueType::Array),
            ParameterSpec::new("options", ValueType::Object),
            ParameterSpec::new("label", ValueType::String),
        ];
        config
    }

    #[test]
    fn test_typed_conversion() {
        let params = convert_params(
            Some(&config()),
            [
                ("count", "42"),
                ("ratio", "0.25"),
                ("enabled", "Yes"),
                ("numbers", "1, 2, 3"),
                ("options", "plain"),
                ("label", "hello"),
                ("undeclared", "dropped"),
            ],
        )
        .unwrap();

        assert_eq!(params.int("count").unwrap(), 42);
        assert!((params.float("ratio").unwrap() - 0.25).abs() < f64::EPSILON);
        assert!(params.bool("enabled").unwrap());
        assert_eq!(params.numbers("numbers").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(params.get("options").unwrap().to_json(), serde_json::json!({"value": "plain"}));
        assert_eq!(params.str("label").unwrap(), "hello");
        assert!(!params.contains("undeclared"));
    }

    #[test]
    fn test_json_forms() {
        let params = convert_params(Some(&config()), [("numbers", "[4, 5.5]"), ("options", r#"{"mode": "fast"}"#)]).unwrap();
        assert_eq!(params.numbers("numbers").unwrap(), vec![4.0, 5.5]);
        assert_eq!(params.get("options").unwrap().to_json(), serde_json::json!({"mode": "fast"}));
    }

    #[test]
    fn test_bad_integer_is_validation_error() {
        let err = convert_params(Some(&config()), [("count", "many")]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn test_without_config_values_pass_through() {
        let params = convert_params(None, [("anything", "7")]).unwrap();
        assert_eq!(params.get("anything"), Some(&MetricValue::from("7")));
    }

    #[test]
    fn test_accessor_errors_name_parameter() {
        let params = Params::new().with("x", "text");
        let err = params.int("x").unwrap_err();
        assert_eq!(err.to_string(), "parameter 'x' must be an integer, got string");
        assert!(params.int("y").unwrap_err().to_string().contains("missing required parameter 'y'"));
    }

    #[test]
    fn test_table_from_records() {
        let params = Params::new().with("rows", MetricValue::from_json(&serde_json::json!([{"value": 1}, {"value": 2}])));
        let table = params.table("rows").unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.numeric_column("value").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_insert_if_absent() {
        let mut params = Params::new().with("p", 9_i64);
        assert!(!params.insert_if_absent("p", MetricValue::Int(5)));
        assert!(params.insert_if_absent("q", MetricValue::Null));
        assert_eq!(params.int("p").unwrap(), 9);
        assert_eq!(params.get("q"), Some(&MetricValue::Null));
    }
}
