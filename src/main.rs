//! Omnisql CLI Entry Point
//!
//! Runs one SQL command against the target endpoint and prints the outcome
//! envelope as JSON. All output to stdout is JSON-only; logs go to stderr.
//!
//! The password is taken from `OMNISQL_PASSWORD` so it never appears in
//! the process argument list.

use std::collections::HashMap;
use std::process::ExitCode;

use clap::Parser;

use omnisql::input::params;
use omnisql::CommandEngine;

/// Omnisql - run one SQL command against any supported database vendor
#[derive(Parser)]
#[command(name = "omnisql")]
#[command(about = "Vendor-agnostic SQL command execution with a deterministic JSON outcome")]
#[command(version)]
struct Cli {
    /// Server host name or address
    #[arg(long)]
    server: String,

    /// Database vendor (oracle, mssql, mysql, postgres, sybase)
    #[arg(long, default_value = "oracle")]
    vendor: String,

    /// Login user
    #[arg(long)]
    username: String,

    /// Login secret, read from the environment
    #[arg(long, env = "OMNISQL_PASSWORD", hide_env_values = true)]
    password: String,

    /// Named instance (SQL Server)
    #[arg(long, default_value = "")]
    instance: String,

    /// Server port; the vendor default applies when omitted
    #[arg(long)]
    port: Option<u16>,

    /// Database / catalog name
    #[arg(long)]
    database: String,

    /// Authentication mode (sql, integrated)
    #[arg(long, default_value = "sql")]
    auth_mode: String,

    /// Explicit connection URL, bypassing vendor URL synthesis
    #[arg(long, default_value = "")]
    url_override: String,

    /// SQL command text, executed verbatim
    #[arg(long)]
    command: String,

    /// Trust any server certificate during the TLS handshake
    #[arg(long)]
    tls_trust_all: bool,

    /// Path to TLS trust-store material
    #[arg(long, default_value = "")]
    tls_trust_store_path: String,

    /// Trust-store secret, read from the environment
    #[arg(long, env = "OMNISQL_TRUST_STORE_SECRET", hide_env_values = true, default_value = "")]
    tls_trust_store_secret: String,

    /// Semicolon-separated key=value pooling properties
    #[arg(long, default_value = "")]
    pooling_properties: String,

    /// Cursor type (forward-only, scroll-insensitive, scroll-sensitive)
    #[arg(long, default_value = "forward-only")]
    cursor_type: String,

    /// Cursor concurrency (read-only, updatable)
    #[arg(long, default_value = "read-only")]
    cursor_concurrency: String,
}

impl Cli {
    fn into_params(self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(params::SERVER.to_string(), self.server);
        map.insert(params::VENDOR.to_string(), self.vendor);
        map.insert(params::USERNAME.to_string(), self.username);
        map.insert(params::PASSWORD.to_string(), self.password);
        map.insert(params::INSTANCE.to_string(), self.instance);
        if let Some(port) = self.port {
            map.insert(params::PORT.to_string(), port.to_string());
        }
        map.insert(params::DATABASE.to_string(), self.database);
        map.insert(params::AUTH_MODE.to_string(), self.auth_mode);
        map.insert(params::URL_OVERRIDE.to_string(), self.url_override);
        map.insert(params::COMMAND.to_string(), self.command);
        map.insert(params::TLS_TRUST_ALL.to_string(), self.tls_trust_all.to_string());
        map.insert(params::TLS_TRUST_STORE_PATH.to_string(), self.tls_trust_store_path);
        map.insert(params::TLS_TRUST_STORE_SECRET.to_string(), self.tls_trust_store_secret);
        map.insert(params::POOLING_PROPERTIES.to_string(), self.pooling_properties);
        map.insert(params::CURSOR_TYPE.to_string(), self.cursor_type);
        map.insert(params::CURSOR_CONCURRENCY.to_string(), self.cursor_concurrency);
        map
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("omnisql=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let engine = CommandEngine::new();
    let outcome = engine.run(&cli.into_params()).await;

    match serde_json::to_string(&outcome) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("failed to serialize outcome: {err}");
            return ExitCode::FAILURE;
        }
    }

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
