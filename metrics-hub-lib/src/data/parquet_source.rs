use super::request::merge_over;
use super::{DataSource, FetchRequest, Table};
use crate::error::HubError;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;

/// A columnar Parquet file.
///
/// Reading requires the `parquet` feature; without it every fetch fails with
/// [`HubError::DependencyMissing`].
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: Utf8PathBuf,
    options: BTreeMap<String, String>,
}

impl ParquetSource {
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: BTreeMap::new(),
        }
    }

    /// Stores a default read option; call-time options override it.
    ///
    /// The only option understood is `row_limit`, capping the number of rows read.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.options.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn row_limit(options: &BTreeMap<String, String>) -> Result<Option<usize>, HubError> {
        let mut limit = None;
        for (key, value) in options {
            match key.as_str() {
                "row_limit" => {
                    limit = Some(
                        value
                            .parse()
                            .map_err(|e| HubError::data(format!("read option 'row_limit' must be a count, got '{value}': {e}")))?,
                    );
                }
                _ => return Err(HubError::data(format!("unknown Parquet read option '{key}'"))),
            }
        }

        Ok(limit)
    }
}

impl DataSource for ParquetSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Table, HubError> {
        let limit = Self::row_limit(&merge_over(&self.options, &request.options))?;
        let table = read::read_table(&self.path, limit)?;
        request.shape(table)
    }
}

#[cfg(feature = "parquet")]
mod read {
    use crate::data::{Cell, Table};
    use crate::error::HubError;
    use camino::Utf8Path;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use parquet::record::Field;
    use std::fs::File;

    const LOG_TARGET: &str = "      data";

    pub fn read_table(path: &Utf8Path, limit: Option<usize>) -> Result<Table, HubError> {
        log::debug!(target: LOG_TARGET, "Reading Parquet file '{path}'");

        let file = File::open(path).map_err(|e| HubError::io(format!("opening '{path}'"), e))?;
        let reader = SerializedFileReader::new(file).map_err(|e| HubError::data(format!("reading '{path}': {e}")))?;

        let columns: Vec<String> = reader
            .metadata()
            .file_metadata()
            .schema()
            .get_fields()
            .iter()
            .map(|field| field.name().to_string())
            .collect();

        let mut cells: Vec<Vec<Cell>> = Vec::new();
        let rows = reader
            .get_row_iter(None)
            .map_err(|e| HubError::data(format!("reading rows of '{path}': {e}")))?;

        for row in rows.take(limit.unwrap_or(usize::MAX)) {
            let row = row.map_err(|e| HubError::data(format!("reading row of '{path}': {e}")))?;
            cells.push(row.get_column_iter().map(|(_, field)| to_cell(field)).collect());
        }

        Table::from_rows(columns, cells)
    }

    fn to_cell(field: &Field) -> Cell {
        match field {
            Field::Null => Cell::Null,
            Field::Bool(b) => Cell::Bool(*b),
            Field::Byte(v) => Cell::Int(i64::from(*v)),
            Field::Short(v) => Cell::Int(i64::from(*v)),
            Field::Int(v) => Cell::Int(i64::from(*v)),
            Field::Long(v) => Cell::Int(*v),
            Field::UByte(v) => Cell::Int(i64::from(*v)),
            Field::UShort(v) => Cell::Int(i64::from(*v)),
            Field::UInt(v) => Cell::Int(i64::from(*v)),
            #[expect(clippy::cast_precision_loss, reason = "values beyond i64 are kept approximately")]
            Field::ULong(v) => i64::try_from(*v).map_or(Cell::Float(*v as f64), Cell::Int),
            Field::Float(v) => Cell::Float(f64::from(*v)),
            Field::Double(v) => Cell::Float(*v),
            Field::Str(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

#[cfg(not(feature = "parquet"))]
mod read {
    use crate::data::Table;
    use crate::error::HubError;
    use camino::Utf8Path;

    pub fn read_table(_path: &Utf8Path, _limit: Option<usize>) -> Result<Table, HubError> {
        Err(HubError::DependencyMissing {
            package: "parquet",
            feature: "parquet",
        })
    }
}
