use super::request::merge_over;
use super::{Cell, DataSource, FetchRequest, Table};
use crate::error::HubError;
use std::collections::BTreeMap;

const LOG_TARGET: &str = "      data";

/// A parameterized SQL query against a connection string.
///
/// The query names its parameters with `:name` placeholders. Declared parameters act as
/// defaults; the parameters of a [`FetchRequest`] override them. A connection is opened
/// for every fetch and closed before the fetch returns, on success and on failure alike.
///
/// Executing queries requires the `sql` feature; without it every fetch fails with
/// [`HubError::DependencyMissing`].
#[derive(Debug, Clone)]
pub struct SqlSource {
    connection: String,
    query: String,
    params: BTreeMap<String, Cell>,
}

impl SqlSource {
    #[must_use]
    pub fn new(connection: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            query: query.into(),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Cell>) -> Self {
        let _ = self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl DataSource for SqlSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Table, HubError> {
        let params = merge_over(&self.params, &request.params);
        let (sql, names) = number_placeholders(&self.query);

        let values = names
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| HubError::data(format!("no value supplied for query parameter ':{name}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(target: LOG_TARGET, "Running SQL query with {} parameter(s)", values.len());
        let table = backend::run(&self.connection, &sql, &values)?;
        request.shape(table)
    }
}

/// Rewrites `:name` placeholders into positional `$n` placeholders.
///
/// Returns the rewritten query and the parameter names by position. A name used more
/// than once keeps its first position. Quoted text and `::` casts are left untouched.
#[must_use]
pub fn number_placeholders(query: &str) -> (String, Vec<String>) {
    let mut sql = String::with_capacity(query.len());
    let mut names: Vec<String> = Vec::new();
    let mut chars = query.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            sql.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                sql.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                sql.push_str("::");
                let _ = chars.next();
            }
            ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        let _ = chars.next();
                    } else {
                        break;
                    }
                }

                let position = names.iter().position(|existing| *existing == name).unwrap_or_else(|| {
                    names.push(name);
                    names.len() - 1
                });
                sql.push('$');
                sql.push_str(&(position + 1).to_string());
            }
            _ => sql.push(c),
        }
    }

    (sql, names)
}

#[cfg(feature = "sql")]
mod backend {
    use crate::data::{Cell, Table};
    use crate::error::HubError;
    use sqlx::any::{AnyConnection, AnyRow, install_default_drivers};
    use sqlx::{Column, Connection, Executor, Row};

    pub fn run(connection: &str, sql: &str, values: &[Cell]) -> Result<Table, HubError> {
        install_default_drivers();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HubError::io("starting the SQL runtime", e))?;

        runtime.block_on(async {
            let mut conn = AnyConnection::connect(connection)
                .await
                .map_err(|e| HubError::data(format!("connecting to database: {e}")))?;

            let result = execute(&mut conn, sql, values).await;
            let closed = conn.close().await;

            let table = result?;
            closed.map_err(|e| HubError::data(format!("closing database connection: {e}")))?;
            Ok(table)
        })
    }

    async fn execute(conn: &mut AnyConnection, sql: &str, values: &[Cell]) -> Result<Table, HubError> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = match value {
                Cell::Null => query.bind(Option::<String>::None),
                Cell::Bool(b) => query.bind(*b),
                Cell::Int(i) => query.bind(*i),
                Cell::Float(f) => query.bind(*f),
                Cell::Text(s) => query.bind(s.clone()),
            };
        }

        let rows: Vec<AnyRow> = query
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| HubError::data(format!("executing query: {e}")))?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => (&mut *conn)
                .describe(sql)
                .await
                .map(|d| d.columns().iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default(),
        };

        let cells: Vec<Vec<Cell>> = rows.iter().map(|row| (0..row.len()).map(|i| decode(row, i)).collect()).collect();
        Table::from_rows(columns, cells)
    }

    fn decode(row: &AnyRow, index: usize) -> Cell {
        if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            return v.map_or(Cell::Null, Cell::Int);
        }

        if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            return v.map_or(Cell::Null, Cell::Float);
        }

        if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
            return v.map_or(Cell::Null, Cell::Bool);
        }

        row.try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map_or(Cell::Null, Cell::Text)
    }
}

#[cfg(not(feature = "sql"))]
mod backend {
    use crate::data::{Cell, Table};
    use crate::error::HubError;

    pub fn run(_connection: &str, _sql: &str, _values: &[Cell]) -> Result<Table, HubError> {
        Err(HubError::DependencyMissing {
            package: "sqlx",
            feature: "sql",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_placeholders() {
        let (sql, names) = number_placeholders("SELECT * FROM t WHERE a = :a AND b > :b OR a = :a");
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b > $2 OR a = $1");
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_placeholders_skip_casts_and_quotes() {
        let (sql, names) = number_placeholders("SELECT x::text, ':not_a_param' FROM t WHERE y = :y");
        assert_eq!(sql, "SELECT x::text, ':not_a_param' FROM t WHERE y = $1");
        assert_eq!(names, vec!["y".to_string()]);
    }

    #[test]
    fn test_missing_parameter_is_reported() {
        let source = SqlSource::new("sqlite::memory:", "SELECT :limit AS n");
        let err = source.fetch(&FetchRequest::new()).unwrap_err();
        assert!(err.to_string().contains(":limit"));
    }

    #[cfg(not(feature = "sql"))]
    #[test]
    fn test_missing_backend_names_package() {
        let source = SqlSource::new("sqlite::memory:", "SELECT 1 AS n");
        let err = source.fetch(&FetchRequest::new()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DependencyMissing);
        assert!(err.to_string().contains("sqlx"));
    }

    #[cfg(feature = "sql")]
    #[test]
    fn test_call_time_params_override_declared() {
        let source = SqlSource::new("sqlite::memory:", "SELECT :n AS n").with_param("n", 1_i64);
        let table = source.fetch(&FetchRequest::new().with_param("n", 9_i64)).unwrap();
        assert_eq!(table.columns(), ["n"]);
        assert_eq!(table.rows(), [vec![Cell::Int(9)]]);
    }

    #[cfg(feature = "sql")]
    #[test]
    fn test_malformed_query_propagates() {
        let source = SqlSource::new("sqlite::memory:", "SELEKT nothing");
        let err = source.fetch(&FetchRequest::new()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Data);
    }
}
