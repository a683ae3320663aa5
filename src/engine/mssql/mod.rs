//! SQL Server Driver
//!
//! Implements [`ConnectionFactory`]/[`SqlConnection`] on top of `tiberius`
//! over a tokio TCP stream.
//!
//! # Implementation Notes
//! - TDS reports affected counts only through the execute path, so
//!   statement shape is decided from the leading keyword like the `MySQL`
//!   driver does
//! - Named instances ride in as an `instance` URL query parameter and map
//!   to the driver's instance name
//! - Trust-all maps to `trust_cert()`, a trust-store path to
//!   `trust_cert_ca()`; integrated authentication uses NTLM

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::engine::{ConnectionFactory, SqlConnection, StatementOutcome};
use crate::error::{DriverDiagnostic, Result, SqlError};
use crate::input::{AuthMode, ConnectionDescriptor, CursorPolicy};
use crate::vendor::Vendor;

/// Factory opening SQL Server connections
pub struct MsSqlFactory;

#[async_trait]
impl ConnectionFactory for MsSqlFactory {
    async fn connect(
        &self,
        url: &str,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn SqlConnection>> {
        let config = build_mssql_config(url, descriptor)?;

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| SqlError::connection(format!("Failed to connect to SQL Server: {e}")))?;
        tcp.set_nodelay(true).ok();

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| SqlError::connection(format!("Failed to authenticate: {e}")))?;

        Ok(Box::new(MsSqlConnection { client: Some(client) }))
    }

    fn vendor(&self) -> Vendor {
        Vendor::MsSql
    }
}

/// Build the driver config from a candidate URL plus descriptor credentials
fn build_mssql_config(url: &str, descriptor: &ConnectionDescriptor) -> Result<Config> {
    let parsed = url::Url::parse(url)
        .map_err(|e| SqlError::connection(format!("Invalid SQL Server URL: {e}")))?;

    let mut config = Config::new();
    config.host(parsed.host_str().unwrap_or(&descriptor.server));
    config.port(parsed.port().unwrap_or(descriptor.port));
    {
        let path = parsed.path().trim_start_matches('/');
        config.database(if path.is_empty() { &descriptor.database } else { path });
    }

    if let Some((_, instance)) = parsed.query_pairs().find(|(k, _)| k == "instance") {
        config.instance_name(instance.as_ref());
    }

    match descriptor.auth_mode {
        AuthMode::Sql => {
            config.authentication(AuthMethod::sql_server(
                &descriptor.username,
                &descriptor.password,
            ));
        }
        #[cfg(windows)]
        AuthMode::Integrated => {
            // NTLM; DOMAIN\user goes in the username field
            config.authentication(AuthMethod::windows(
                &descriptor.username,
                &descriptor.password,
            ));
        }
        #[cfg(not(windows))]
        AuthMode::Integrated => {
            return Err(SqlError::connection(
                "integrated authentication is only available on Windows hosts",
            ));
        }
    }

    if descriptor.wants_tls() {
        config.encryption(EncryptionLevel::Required);
        if descriptor.tls_trust_all {
            config.trust_cert();
        } else {
            config.trust_cert_ca(&descriptor.tls_trust_store_path);
        }
    }

    Ok(config)
}

/// One live SQL Server connection
struct MsSqlConnection {
    client: Option<Client<Compat<TcpStream>>>,
}

impl MsSqlConnection {
    fn client_mut(&mut self) -> Result<&mut Client<Compat<TcpStream>>> {
        self.client
            .as_mut()
            .ok_or_else(|| SqlError::generic("SQL Server connection already closed"))
    }
}

/// Whether the command's leading keyword marks a row-producing statement
fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start().to_ascii_uppercase();
    head.starts_with("SELECT")
        || head.starts_with("EXEC")
        || (head.starts_with("WITH") && head.contains("SELECT"))
}

#[async_trait]
impl SqlConnection for MsSqlConnection {
    async fn run(&mut self, sql: &str, _cursor: &CursorPolicy) -> Result<StatementOutcome> {
        let client = self.client_mut()?;

        if returns_rows(sql) {
            let results = client
                .simple_query(sql)
                .await
                .map_err(to_driver_error)?
                .into_results()
                .await
                .map_err(to_driver_error)?;

            let mut lines = Vec::new();
            for row in results.into_iter().flatten() {
                lines.push(render_row(&row));
            }
            Ok(StatementOutcome::Rows(lines))
        } else {
            let result = client.execute(sql, &[]).await.map_err(to_driver_error)?;
            Ok(StatementOutcome::Count(result.total()))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| SqlError::connection(format!("Failed to close connection: {e}")))?;
        }
        Ok(())
    }
}

/// Map a driver failure to a classified error
///
/// TDS carries a numeric error code plus a token state byte instead of a
/// SQLSTATE; the state byte fills the diagnostic's state slot.
fn to_driver_error(err: tiberius::error::Error) -> SqlError {
    match err {
        tiberius::error::Error::Server(token) => {
            let code = i32::try_from(token.code()).unwrap_or(i32::MAX);
            SqlError::driver(
                Vendor::MsSql.as_str(),
                DriverDiagnostic::new(code, token.state().to_string(), token.message().to_string()),
            )
        }
        other => SqlError::connection(format!("SQL Server connection error: {other}")),
    }
}

/// Render one row as a single tab-separated line
fn render_row(row: &tiberius::Row) -> String {
    let cells: Vec<String> = (0..row.columns().len()).map(|idx| cell_text(row, idx)).collect();
    cells.join("\t")
}

/// Convert a SQL Server cell to text
///
/// TDS rows are probed by type, typed columns before raw bytes so BIT does
/// not surface as binary.
fn cell_text(row: &tiberius::Row, idx: usize) -> String {
    if let Ok(Some(v)) = row.try_get::<bool, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<i16, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<i32, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<i64, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<f32, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<f64, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<&str, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<uuid::Uuid, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(bytes)) = row.try_get::<&[u8], _>(idx) {
        use base64::Engine;
        return base64::engine::general_purpose::STANDARD.encode(bytes);
    }
    "NULL".to_string()
}
