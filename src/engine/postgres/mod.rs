//! `PostgreSQL` Driver
//!
//! Implements [`ConnectionFactory`]/[`SqlConnection`] on top of
//! `tokio-postgres`.
//!
//! # Implementation Notes
//! - Statement shape is decided from the prepared statement's column list:
//!   columns present means row-producing, otherwise the execute path
//!   reports an affected-row count
//! - Cell values are rendered to text per column type; BYTEA is
//!   Base64-encoded, timestamps become ISO 8601
//! - The native protocol cursor is forward-only; scroll requests are
//!   honored by fully draining the result
//! - Built-in transport is plaintext (`NoTls`); a TLS trust request is a
//!   connection error rather than a silently ignored flag

use async_trait::async_trait;
use tokio_postgres::{Client, Config, NoTls, Row};

use crate::engine::{ConnectionFactory, SqlConnection, StatementOutcome};
use crate::error::{DriverDiagnostic, Result, SqlError};
use crate::input::{ConnectionDescriptor, CursorPolicy};
use crate::vendor::Vendor;

/// Factory opening `PostgreSQL` connections
pub struct PostgresFactory;

#[async_trait]
impl ConnectionFactory for PostgresFactory {
    async fn connect(
        &self,
        url: &str,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn SqlConnection>> {
        if descriptor.wants_tls() {
            return Err(SqlError::connection(
                "the built-in PostgreSQL driver does not configure TLS trust; register a TLS-capable factory",
            ));
        }

        let config = build_pg_config(url, descriptor)?;
        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            SqlError::connection(format!("Failed to connect to PostgreSQL: {e}"))
        })?;

        // Connection task errors are not logged to prevent credential leakage
        tokio::spawn(async move {
            let _ = connection.await;
        });

        Ok(Box::new(PostgresConnection { client }))
    }

    fn vendor(&self) -> Vendor {
        Vendor::Postgres
    }
}

/// Build the driver config from a candidate URL plus descriptor credentials
fn build_pg_config(url: &str, descriptor: &ConnectionDescriptor) -> Result<Config> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SqlError::connection(format!("Invalid PostgreSQL URL: {e}")))?;

    let host = parsed.host_str().unwrap_or(&descriptor.server).to_string();
    let port = parsed.port().unwrap_or(descriptor.port);
    let dbname = {
        let path = parsed.path().trim_start_matches('/');
        if path.is_empty() { descriptor.database.as_str() } else { path }.to_string()
    };

    let mut config = Config::new();
    config
        .host(&host)
        .port(port)
        .user(&descriptor.username)
        .password(&descriptor.password)
        .dbname(&dbname);
    Ok(config)
}

/// One live `PostgreSQL` connection
struct PostgresConnection {
    client: Client,
}

#[async_trait]
impl SqlConnection for PostgresConnection {
    async fn run(&mut self, sql: &str, _cursor: &CursorPolicy) -> Result<StatementOutcome> {
        let stmt = self.client.prepare(sql).await.map_err(to_driver_error)?;

        if stmt.columns().is_empty() {
            // Count-only path: INSERT/UPDATE/DELETE/DDL
            let affected = self.client.execute(&stmt, &[]).await.map_err(to_driver_error)?;
            Ok(StatementOutcome::Count(affected))
        } else {
            let rows = self.client.query(&stmt, &[]).await.map_err(to_driver_error)?;
            let mut lines = Vec::with_capacity(rows.len());
            for row in &rows {
                lines.push(render_row(row)?);
            }
            Ok(StatementOutcome::Rows(lines))
        }
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the client terminates the connection task.
        Ok(())
    }
}

/// Map a driver failure to a classified error, preserving SQLSTATE verbatim
fn to_driver_error(err: tokio_postgres::Error) -> SqlError {
    match err.as_db_error() {
        Some(db) => SqlError::driver(
            Vendor::Postgres.as_str(),
            // PostgreSQL has no numeric vendor code; SQLSTATE carries the class
            DriverDiagnostic::new(0, db.code().code(), db.message()),
        ),
        None => SqlError::connection(format!("PostgreSQL protocol error: {err}")),
    }
}

/// Render one row as a single tab-separated line
fn render_row(row: &Row) -> Result<String> {
    let mut cells = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        cells.push(cell_text(row, idx)?);
    }
    Ok(cells.join("\t"))
}

/// Convert a `PostgreSQL` cell to text
fn cell_text(row: &Row, idx: usize) -> Result<String> {
    use tokio_postgres::types::Type;

    let col_type = row.columns()[idx].type_();

    fn fetch<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get::<_, Option<T>>(idx).map_err(|e| {
            SqlError::generic(format!("Failed to read result column {idx}: {e}"))
        })
    }

    const NULL: &str = "NULL";

    let text = match *col_type {
        Type::BOOL => fetch::<bool>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        Type::INT2 => fetch::<i16>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        Type::INT4 => fetch::<i32>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        Type::INT8 => fetch::<i64>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        Type::FLOAT4 => fetch::<f32>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        Type::FLOAT8 => fetch::<f64>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => {
            fetch::<String>(row, idx)?.unwrap_or_else(|| NULL.into())
        }
        Type::JSON | Type::JSONB => {
            fetch::<serde_json::Value>(row, idx)?.map_or(NULL.into(), |v| v.to_string())
        }
        Type::BYTEA => fetch::<Vec<u8>>(row, idx)?.map_or(NULL.into(), |v| {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD.encode(&v)
        }),
        Type::TIMESTAMP => fetch::<chrono::NaiveDateTime>(row, idx)?
            .map_or(NULL.into(), |v| v.format("%Y-%m-%dT%H:%M:%S").to_string()),
        Type::TIMESTAMPTZ => fetch::<chrono::DateTime<chrono::Utc>>(row, idx)?
            .map_or(NULL.into(), |v| v.to_rfc3339()),
        Type::DATE => fetch::<chrono::NaiveDate>(row, idx)?
            .map_or(NULL.into(), |v| v.format("%Y-%m-%d").to_string()),
        Type::TIME => fetch::<chrono::NaiveTime>(row, idx)?
            .map_or(NULL.into(), |v| v.format("%H:%M:%S").to_string()),
        Type::UUID => fetch::<uuid::Uuid>(row, idx)?.map_or(NULL.into(), |v| v.to_string()),
        _ => fetch::<String>(row, idx)?.unwrap_or_else(|| NULL.into()),
    };

    Ok(text)
}
