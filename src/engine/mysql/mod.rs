//! `MySQL` Driver
//!
//! Implements [`ConnectionFactory`]/[`SqlConnection`] on top of
//! `mysql_async` (covers `MariaDB` as well).
//!
//! # Implementation Notes
//! - The wire protocol has no prepare-then-inspect step, so statement
//!   shape is decided from the leading keyword: SELECT/SHOW/DESCRIBE/WITH
//!   run through the row path, everything else through the count path
//! - Server errors carry a numeric code plus SQLSTATE; both are preserved
//!   verbatim in the driver diagnostic
//! - Trust-all TLS is supported natively; trust-store material requires a
//!   custom factory

use async_trait::async_trait;
use mysql_async::{prelude::*, Conn, OptsBuilder, Row, SslOpts, Value};

use crate::engine::{ConnectionFactory, SqlConnection, StatementOutcome};
use crate::error::{DriverDiagnostic, Result, SqlError};
use crate::input::{ConnectionDescriptor, CursorPolicy};
use crate::vendor::Vendor;

/// Factory opening `MySQL` connections
pub struct MySqlFactory;

#[async_trait]
impl ConnectionFactory for MySqlFactory {
    async fn connect(
        &self,
        url: &str,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn SqlConnection>> {
        let opts = build_mysql_opts(url, descriptor)?;
        let conn = Conn::new(opts)
            .await
            .map_err(|e| SqlError::connection(format!("Failed to connect to MySQL: {e}")))?;
        Ok(Box::new(MySqlConnection { conn: Some(conn) }))
    }

    fn vendor(&self) -> Vendor {
        Vendor::MySql
    }
}

/// Build driver options from a candidate URL plus descriptor credentials
fn build_mysql_opts(url: &str, descriptor: &ConnectionDescriptor) -> Result<OptsBuilder> {
    let parsed =
        url::Url::parse(url).map_err(|e| SqlError::connection(format!("Invalid MySQL URL: {e}")))?;

    let host = parsed.host_str().unwrap_or(&descriptor.server).to_string();
    let port = parsed.port().unwrap_or(descriptor.port);
    let database = {
        let path = parsed.path().trim_start_matches('/');
        if path.is_empty() { descriptor.database.as_str() } else { path }.to_string()
    };

    let mut opts = OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(port)
        .user(Some(descriptor.username.clone()))
        .pass(Some(descriptor.password.clone()))
        .db_name(Some(database));

    if descriptor.wants_tls() {
        if !descriptor.tls_trust_store_path.is_empty() {
            return Err(SqlError::connection(
                "the built-in MySQL driver supports trust-all TLS only; register a factory for trust-store material",
            ));
        }
        opts = opts.ssl_opts(SslOpts::default().with_danger_accept_invalid_certs(true));
    }

    Ok(opts)
}

/// One live `MySQL` connection
struct MySqlConnection {
    conn: Option<Conn>,
}

impl MySqlConnection {
    fn conn_mut(&mut self) -> Result<&mut Conn> {
        self.conn.as_mut().ok_or_else(|| SqlError::generic("MySQL connection already closed"))
    }
}

/// Whether the command's leading keyword marks a row-producing statement
fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start().to_ascii_uppercase();
    head.starts_with("SELECT")
        || head.starts_with("SHOW")
        || head.starts_with("DESCRIBE")
        || head.starts_with("DESC")
        || head.starts_with("EXPLAIN")
        || (head.starts_with("WITH") && head.contains("SELECT"))
}

#[async_trait]
impl SqlConnection for MySqlConnection {
    async fn run(&mut self, sql: &str, _cursor: &CursorPolicy) -> Result<StatementOutcome> {
        let conn = self.conn_mut()?;

        if returns_rows(sql) {
            let rows: Vec<Row> = conn.query(sql).await.map_err(to_driver_error)?;
            let mut lines = Vec::with_capacity(rows.len());
            for row in &rows {
                lines.push(render_row(row)?);
            }
            Ok(StatementOutcome::Rows(lines))
        } else {
            let result = conn.query_iter(sql).await.map_err(to_driver_error)?;
            let affected = result.affected_rows();
            drop(result);
            Ok(StatementOutcome::Count(affected))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect()
                .await
                .map_err(|e| SqlError::connection(format!("Failed to disconnect: {e}")))?;
        }
        Ok(())
    }
}

/// Map a driver failure to a classified error
///
/// Server-reported failures keep code and SQLSTATE verbatim; anything else
/// (broken pipe, protocol desync) is a connection failure.
fn to_driver_error(err: mysql_async::Error) -> SqlError {
    match err {
        mysql_async::Error::Server(server) => SqlError::driver(
            Vendor::MySql.as_str(),
            DriverDiagnostic::new(i32::from(server.code), server.state.clone(), server.message),
        ),
        other => SqlError::connection(format!("MySQL connection error: {other}")),
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

/// Convert a `MySQL` cell to text
fn cell_text(row: &Row, idx: usize) -> Result<String> {
    let value = row
        .as_ref(idx)
        .ok_or_else(|| SqlError::generic(format!("Failed to read result column {idx}")))?;

    let text = match value {
        Value::NULL => "NULL".to_string(),
        Value::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
        },
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, hour, minute, second, _micros) => {
            format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}")
        }
        Value::Time(neg, days, hours, minutes, seconds, _micros) => {
            let sign = if *neg { "-" } else { "" };
            let total_hours = u32::from(*days) * 24 + u32::from(*hours);
            format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}")
        }
    };

    Ok(text)
}
