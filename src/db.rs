//! PostgreSQL sink for cleaned tables.

use crate::config::DbSettings;
use crate::error::{Result, ResultExt as _, ScourError};
use polars::prelude::*;
use secrecy::ExposeSecret as _;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr as _;
use tracing::info;

const COPY_CHUNK_ROWS: usize = 10_000;

/// Connection options from discrete settings.
pub fn connect_options(settings: &DbSettings) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(settings.password.expose_secret())
        .database(&settings.database)
}

/// Connection options from a `postgres://` URL.
pub fn connect_options_from_url(url: &str) -> Result<PgConnectOptions> {
    PgConnectOptions::from_str(url).context("Failed to parse database URL")
}

pub struct DbClient {
    pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn connect(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("Failed to connect to PostgreSQL (timeout after 10s)")?;
        Ok(Self { pool })
    }

    /// Replace `schema.table` with the contents of `df`.
    ///
    /// Drop, create and load run in one transaction, so a failed load leaves
    /// the previous table in place.
    pub async fn replace_table(&self, df: &DataFrame, schema: &str, table: &str) -> Result<u64> {
        let target = qualified_name(schema, table);
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {target}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to drop table '{target}'"))?;

        sqlx::query(&create_table_sql(&target, df))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to create table '{target}'"))?;

        let mut writer = tx
            .copy_in_raw(&format!(
                "COPY {target} FROM STDIN WITH (FORMAT csv, NULL '')"
            ))
            .await
            .context("Failed to initiate COPY command")?;

        let height = df.height();
        for start in (0..height).step_by(COPY_CHUNK_ROWS) {
            let len = COPY_CHUNK_ROWS.min(height - start);
            let offset = i64::try_from(start)
                .map_err(|e| ScourError::DataProcessing(format!("Row offset out of range: {e}")))?;
            let mut chunk = df.slice(offset, len);

            let mut buf = Vec::new();
            CsvWriter::new(&mut buf)
                .include_header(false)
                .with_separator(b',')
                .with_null_value(String::new())
                .finish(&mut chunk)
                .context("Failed to serialize table chunk to CSV")?;

            writer
                .send(buf)
                .await
                .context("Failed to send data chunk via COPY")?;
        }

        let rows = writer
            .finish()
            .await
            .context("Failed to finish COPY command")?;
        tx.commit().await?;

        info!("Wrote {rows} rows to {target}");
        Ok(rows)
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn qualified_name(schema: &str, table: &str) -> String {
    if schema.is_empty() {
        quote(table)
    } else {
        format!("{}.{}", quote(schema), quote(table))
    }
}

fn sql_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "BIGINT",
        DataType::Float32 | DataType::Float64 => "DOUBLE PRECISION",
        DataType::Boolean => "BOOLEAN",
        DataType::Date => "DATE",
        DataType::Datetime(_, _) => "TIMESTAMPTZ",
        _ => "TEXT",
    }
}

fn create_table_sql(target: &str, df: &DataFrame) -> String {
    let columns: Vec<String> = df
        .schema()
        .iter()
        .map(|(name, dtype)| format!("{} {}", quote(name), sql_type(dtype)))
        .collect();
    format!("CREATE TABLE {target} ({})", columns.join(", "))
}
