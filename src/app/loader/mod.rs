//! Database loading
//!
//! Corrected files are bulk-inserted into fixed, pre-existing tables inside
//! a per-snapshot schema. The pipeline only depends on the [`Loader`] trait;
//! [`PgLoader`] is the PostgreSQL implementation.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::LoadResult;

pub mod postgres;
pub mod routing;

pub use postgres::{DatabaseConfig, PgLoader};
pub use routing::{identifier_token, table_for, TABLE_ROUTES};

/// Database capability used by the pipeline
#[async_trait]
pub trait Loader: Send + Sync {
    /// Create `schema` if it does not exist
    ///
    /// Failure here aborts the whole load phase.
    async fn ensure_schema(&self, schema: &str) -> LoadResult<()>;

    /// Remove every row of `schema.table`
    async fn truncate(&self, schema: &str, table: &str) -> LoadResult<()>;

    /// Insert every row of the `;`-delimited `file` into `schema.table`,
    /// returning the number of rows sent
    async fn bulk_insert(&self, schema: &str, table: &str, file: &Path) -> LoadResult<u64>;

    /// Current row count of `schema.table`
    async fn count_rows(&self, schema: &str, table: &str) -> LoadResult<u64>;
}
