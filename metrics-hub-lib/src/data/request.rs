use super::{Cell, Table};
use crate::error::HubError;
use std::collections::BTreeMap;

/// A single row-filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The cell must equal the value.
    Equals(Cell),

    /// The cell must equal one of the values.
    OneOf(Vec<Cell>),
}

impl Condition {
    #[must_use]
    pub fn matches(&self, cell: &Cell) -> bool {
        match self {
            Self::Equals(expected) => cell.same_value(expected),
            Self::OneOf(values) => values.iter().any(|v| cell.same_value(v)),
        }
    }
}

/// Row filter mapping column names to conditions; a row passes when every condition holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    conditions: Vec<(String, Condition)>,
}

impl RowFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equals(self, column: impl Into<String>, value: impl Into<Cell>) -> Self {
        self.with(column, Condition::Equals(value.into()))
    }

    #[must_use]
    pub fn one_of(self, column: impl Into<String>, values: Vec<Cell>) -> Self {
        self.with(column, Condition::OneOf(values))
    }

    /// Adds a condition, replacing any earlier condition on the same column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, condition: Condition) -> Self {
        let column = column.into();
        self.conditions.retain(|(c, _)| *c != column);
        self.conditions.push((column, condition));
        self
    }

    #[must_use]
    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Parameters of a single [`DataSource::fetch`](super::DataSource::fetch) call.
///
/// `options` override the read options stored in a source and `params` override the
/// query parameters a SQL source declares; in both cases the call-time value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchRequest {
    pub columns: Option<Vec<String>>,
    pub filters: Option<RowFilter>,
    pub options: BTreeMap<String, String>,
    pub params: BTreeMap<String, Cell>,
}

impl FetchRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: RowFilter) -> Self {
        self.filters = Some(filters);
        self
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Cell>) -> Self {
        let _ = self.params.insert(key.into(), value.into());
        self
    }

    /// Applies the row filter and then the column projection to a fetched table.
    pub fn shape(&self, table: Table) -> Result<Table, HubError> {
        let table = match &self.filters {
            Some(filters) if !filters.is_empty() => table.filter(filters)?,
            _ => table,
        };

        match &self.columns {
            Some(columns) => table.select(columns),
            None => Ok(table),
        }
    }
}

/// Merges call-time entries over stored defaults; call-time entries win.
#[must_use]
pub fn merge_over<V: Clone>(defaults: &BTreeMap<String, V>, overrides: &BTreeMap<String, V>) -> BTreeMap<String, V> {
    let mut merged = defaults.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
