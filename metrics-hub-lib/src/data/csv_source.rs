use super::request::merge_over;
use super::{Cell, DataSource, FetchRequest, Table};
use crate::error::HubError;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

const LOG_TARGET: &str = "      data";

/// Reader settings for delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub has_headers: bool,
    pub comment: Option<u8>,
    pub flexible: bool,
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_headers: true,
            comment: None,
            flexible: false,
            infer_types: true,
        }
    }
}

impl CsvOptions {
    /// Builds reader settings from string options such as `delimiter` or `has_headers`.
    pub fn from_map(options: &BTreeMap<String, String>) -> Result<Self, HubError> {
        let mut result = Self::default();

        for (key, value) in options {
            match key.as_str() {
                "delimiter" | "sep" => result.delimiter = parse_byte(key, value)?,
                "quote" | "quotechar" => result.quote = parse_byte(key, value)?,
                "comment" => result.comment = Some(parse_byte(key, value)?),
                "has_headers" | "header" => result.has_headers = parse_flag(key, value)?,
                "flexible" => result.flexible = parse_flag(key, value)?,
                "infer_types" => result.infer_types = parse_flag(key, value)?,
                _ => return Err(HubError::data(format!("unknown delimited-file read option '{key}'"))),
            }
        }

        Ok(result)
    }

    /// Reads delimited text into a table.
    ///
    /// Without a header row, columns are named by their zero-based position. Short rows
    /// are padded with nulls when `flexible` is set.
    pub fn read<R: Read>(&self, input: R, origin: &str) -> Result<Table, HubError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .comment(self.comment)
            .has_headers(self.has_headers)
            .flexible(self.flexible)
            .from_reader(input);

        let mut columns: Vec<String> = if self.has_headers {
            reader
                .headers()
                .map_err(|e| HubError::data(format!("reading header of '{origin}': {e}")))?
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| HubError::data(format!("reading '{origin}': {e}")))?;

            if !self.has_headers && record.len() > columns.len() {
                columns.extend((columns.len()..record.len()).map(|i| i.to_string()));
            }

            if record.len() > columns.len() {
                return Err(HubError::data(format!(
                    "'{origin}' has a row with {} fields but only {} columns",
                    record.len(),
                    columns.len()
                )));
            }

            rows.push(
                record
                    .iter()
                    .map(|field| if self.infer_types { Cell::infer(field) } else { Cell::Text(field.to_string()) })
                    .collect::<Vec<_>>(),
            );
        }

        for row in &mut rows {
            row.resize(columns.len(), Cell::Null);
        }

        Table::from_rows(columns, rows)
    }
}

fn parse_byte(key: &str, value: &str) -> Result<u8, HubError> {
    if value == "\\t" || value == "tab" {
        return Ok(b'\t');
    }

    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(HubError::data(format!("read option '{key}' must be a single ASCII character, got '{value}'"))),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, HubError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(HubError::data(format!("read option '{key}' must be a boolean, got '{value}'"))),
    }
}

/// A delimited text file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: Utf8PathBuf,
    options: BTreeMap<String, String>,
}

impl CsvSource {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: BTreeMap::new(),
        }
    }

    /// Stores a default read option; call-time options override it.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl DataSource for CsvSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Table, HubError> {
        let options = CsvOptions::from_map(&merge_over(&self.options, &request.options))?;
        log::debug!(target: LOG_TARGET, "Reading delimited file '{}'", self.path);

        let file = File::open(&self.path).map_err(|e| HubError::io(format!("opening '{}'", self.path), e))?;
        let table = options.read(file, self.path.as_str())?;

        request.shape(table)
    }
}
