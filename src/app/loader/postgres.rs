//! PostgreSQL loader
//!
//! Rows are streamed to the server with `COPY ... FROM STDIN` in batches.
//! Each batch is parsed from the corrected file with the `csv` crate and
//! re-serialized, so quoting in the source survives and every field lands
//! in a text column unchanged.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolCopyExt, PgPoolOptions};
use tracing::debug;

use crate::app::loader::Loader;
use crate::constants::{encoding::UTF8_BOM, load};
use crate::errors::{LoadError, LoadResult};

type RowReader = csv::Reader<BufReader<File>>;

/// Connection settings for the destination database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Never written back to configuration files
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: String,
    pub max_connections: u32,
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// Rows per COPY batch
    pub batch_rows: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: load::DEFAULT_PORT,
            user: "postgres".to_string(),
            password: None,
            database: "cnpj".to_string(),
            max_connections: 2,
            acquire_timeout: Duration::from_secs(load::ACQUIRE_TIMEOUT_SECS),
            batch_rows: load::BATCH_ROWS,
        }
    }
}

impl DatabaseConfig {
    /// Driver connection options
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    /// `host:port/database` for log lines
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Loader backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgLoader {
    pool: PgPool,
    batch_rows: usize,
}

impl PgLoader {
    /// Create a loader; connections are opened on first use, so an
    /// unreachable server surfaces at `ensure_schema`
    pub fn new(config: &DatabaseConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(config.connect_options());

        Self {
            pool,
            batch_rows: config.batch_rows.max(1),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Send one batch through `COPY FROM STDIN`
    async fn copy_batch(&self, statement: &str, data: Vec<u8>) -> LoadResult<u64> {
        let mut copy = self.pool.copy_in_raw(statement).await?;
        let sent = copy.send(data).await.map(|_| ());
        if let Err(e) = sent {
            let _ = copy.abort(e.to_string()).await;
            return Err(e.into());
        }
        Ok(copy.finish().await?)
    }
}

#[async_trait]
impl Loader for PgLoader {
    async fn ensure_schema(&self, schema: &str) -> LoadResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema));
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn truncate(&self, schema: &str, table: &str) -> LoadResult<()> {
        let sql = format!("TRUNCATE TABLE {}", qualified_name(schema, table));
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn bulk_insert(&self, schema: &str, table: &str, file: &Path) -> LoadResult<u64> {
        let statement = copy_statement(schema, table);
        let batch_rows = self.batch_rows;

        let path = file.to_path_buf();
        let mut reader = run_blocking(move || open_reader(&path)).await?;
        let mut inserted: u64 = 0;

        loop {
            let (returned, data, rows) =
                run_blocking(move || read_batch(reader, batch_rows)).await?;
            reader = returned;
            if rows == 0 {
                break;
            }

            inserted += self.copy_batch(&statement, data).await?;
            debug!("Copied {} rows into {}.{}", inserted, schema, table);
        }

        Ok(inserted)
    }

    async fn count_rows(&self, schema: &str, table: &str) -> LoadResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", qualified_name(schema, table));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

async fn run_blocking<T, F>(task: F) -> LoadResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> LoadResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| LoadError::Task {
            reason: e.to_string(),
        })?
}

/// Open a corrected file for batch reading, skipping a leading BOM
fn open_reader(path: &Path) -> LoadResult<RowReader> {
    let mut input = BufReader::new(File::open(path)?);
    if input.fill_buf()?.starts_with(UTF8_BOM) {
        input.consume(UTF8_BOM.len());
    }

    Ok(ReaderBuilder::new()
        .delimiter(load::DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(input))
}

/// Read up to `max_rows` records and serialize them as COPY input
///
/// Blank lines are not records. The reader is handed back so the next
/// batch continues where this one stopped.
fn read_batch(mut reader: RowReader, max_rows: usize) -> LoadResult<(RowReader, Vec<u8>, usize)> {
    let mut writer = WriterBuilder::new()
        .delimiter(load::DELIMITER)
        .has_headers(false)
        .from_writer(Vec::new());
    let mut record = ByteRecord::new();
    let mut rows = 0;

    while rows < max_rows && reader.read_byte_record(&mut record)? {
        writer.write_byte_record(&record)?;
        rows += 1;
    }

    let data = writer
        .into_inner()
        .map_err(|e| LoadError::Io(e.into_error()))?;
    Ok((reader, data, rows))
}

/// Double-quoted SQL identifier
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn copy_statement(schema: &str, table: &str) -> String {
    format!(
        "COPY {} FROM STDIN WITH (FORMAT csv, DELIMITER '{}')",
        qualified_name(schema, table),
        load::DELIMITER as char
    )
}
