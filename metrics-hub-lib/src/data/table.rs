use super::{Cell, CsvOptions, RowFilter};
use crate::error::HubError;
use crate::reports::html_escape;
use core::fmt::Write;
use serde_json::{Map, Value};

/// An in-memory table of named columns.
///
/// Every row holds exactly one cell per column, and column names are distinct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    ///
    /// The names are not checked; use [`Table::from_rows`] for columns that come from outside.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates a table from columns and rows, checking row arity and rejecting
    /// duplicate column names.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Cell>>) -> Result<Self, HubError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        table.check_distinct()?;
        for row in rows {
            table.push_row(row)?;
        }

        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), HubError> {
        if row.len() != self.columns.len() {
            return Err(HubError::data(format!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }

        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates over the cells of one column.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell>, HubError> {
        let index = self.require_column(name)?;
        Ok(self.rows.iter().filter_map(move |row| row.get(index)))
    }

    /// Numeric values of a column, skipping nulls.
    ///
    /// Fails with a validation error when a non-null cell is not a number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, HubError> {
        self.column(name)?
            .filter(|cell| !cell.is_null())
            .map(|cell| {
                cell.as_f64()
                    .ok_or_else(|| HubError::validation(format!("column '{name}' contains non-numeric value '{cell}'")))
            })
            .collect()
    }

    /// Projects the table onto the given columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, HubError> {
        let indices = names
            .iter()
            .map(|name| self.require_column(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().filter_map(|&i| row.get(i).cloned()).collect())
            .collect();

        let table = Self {
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            rows,
        };
        table.check_distinct()?;

        Ok(table)
    }

    /// Keeps the rows that satisfy every condition of the filter.
    pub fn filter(&self, filter: &RowFilter) -> Result<Self, HubError> {
        let conditions = filter
            .conditions()
            .iter()
            .map(|(column, condition)| Ok((self.require_column(column)?, condition)))
            .collect::<Result<Vec<_>, HubError>>()?;

        let rows = self
            .rows
            .iter()
            .filter(|row| {
                conditions
                    .iter()
                    .all(|(index, condition)| row.get(*index).is_some_and(|cell| condition.matches(cell)))
            })
            .cloned()
            .collect();

        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Renames a column, keeping its position.
    pub fn rename_column(mut self, from: &str, to: &str) -> Result<Self, HubError> {
        let index = self.require_column(from)?;
        if from != to && self.column_index(to).is_some() {
            return Err(HubError::data(format!("cannot rename column '{from}' to '{to}': a column with that name already exists")));
        }

        if let Some(column) = self.columns.get_mut(index) {
            to.clone_into(column);
        }

        Ok(self)
    }

    /// Converts the table into one JSON object per row, keyed by column name.
    #[must_use]
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.to_records().into_iter().map(Value::Object).collect())
    }

    /// Builds a table from a JSON array of row objects.
    ///
    /// Columns follow the order in which keys are first seen; missing keys become nulls.
    pub fn from_records(records: &[Value]) -> Result<Self, HubError> {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            let Value::Object(map) = record else {
                return Err(HubError::validation(format!("expected a row object, got '{record}'")));
            };

            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(Value::as_object)
            .map(|map| {
                columns
                    .iter()
                    .map(|column| map.get(column).map_or(Cell::Null, Cell::from_json))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Renders the table as comma-separated text with a header row.
    pub fn to_csv(&self) -> Result<String, HubError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .map_err(|e| HubError::data(format!("writing CSV header: {e}")))?;

        for row in &self.rows {
            writer
                .write_record(row.iter().map(ToString::to_string))
                .map_err(|e| HubError::data(format!("writing CSV row: {e}")))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| HubError::data(format!("flushing CSV output: {e}")))?;

        String::from_utf8(bytes).map_err(|e| HubError::data(format!("CSV output is not valid UTF-8: {e}")))
    }

    /// Parses comma-separated text with a header row, inferring cell types.
    pub fn from_csv_str(text: &str) -> Result<Self, HubError> {
        CsvOptions::default().read(text.as_bytes(), "<memory>")
    }

    /// Renders the table as an HTML `<table>` element.
    #[must_use]
    pub fn to_html(&self, classes: &str) -> String {
        let mut html = String::new();

        let _ = writeln!(html, "<table border=\"1\" class=\"dataframe {}\">", html_escape(classes));
        html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
        for column in &self.columns {
            let _ = writeln!(html, "      <th>{}</th>", html_escape(column));
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");

        for row in &self.rows {
            html.push_str("    <tr>\n");
            for cell in row {
                let _ = writeln!(html, "      <td>{}</td>", html_escape(&cell.to_string()));
            }
            html.push_str("    </tr>\n");
        }

        html.push_str("  </tbody>\n</table>");
        html
    }

    fn check_distinct(&self) -> Result<(), HubError> {
        for (index, column) in self.columns.iter().enumerate() {
            if self.columns.iter().take(index).any(|c| c == column) {
                return Err(HubError::data(format!("duplicate column name '{column}'")));
            }
        }

        Ok(())
    }

    fn require_column(&self, name: &str) -> Result<usize, HubError> {
        self.column_index(name)
            .ok_or_else(|| HubError::data(format!("column '{name}' not found; available columns: {}", self.columns.join(", "))))
    }
}
