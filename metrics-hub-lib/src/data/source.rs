use super::{FetchRequest, Table};
use crate::error::HubError;
use core::fmt::Debug;

/// A stateless connector that produces tables.
///
/// Implementations must honor the column projection and row filter of the request
/// and must not share mutable state between concurrent calls.
pub trait DataSource: Debug + Send + Sync {
    /// Fetches a table.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::DependencyMissing`] when the backend was compiled out,
    /// and [`HubError::Data`] when the backend itself fails.
    fn fetch(&self, request: &FetchRequest) -> Result<Table, HubError>;
}

/// A source serving a fixed in-memory table.
#[derive(Debug, Clone)]
pub struct StaticSource {
    table: Table,
}

impl StaticSource {
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self { table }
    }
}

impl DataSource for StaticSource {
    fn fetch(&self, request: &FetchRequest) -> Result<Table, HubError> {
        request.shape(self.table.clone())
    }
}
