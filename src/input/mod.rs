//! Input Normalization
//!
//! Turns a raw string-keyed parameter map into a validated, fully-defaulted
//! [`ConnectionDescriptor`] and [`ExecutionRequest`]. All defaulting lives
//! here and nowhere else; both values are immutable once built.
//!
//! # Defaulting Rules
//! - `vendor` defaults to oracle; `authMode` to sql
//! - `instance`, `port`, `driverClassOverride`, `urlOverride` and the TLS
//!   trust fields default to empty
//! - cursor type and concurrency default silently on unrecognized tokens
//!   (leniency policy, not a validation error)
//!
//! The only hard validation failures are missing required endpoint fields
//! and an empty command text, both checked before any connection attempt.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::error::{Result, SqlError};
use crate::vendor::Vendor;

/// Parameter names of the external input contract
pub mod params {
    pub const SERVER: &str = "server";
    pub const VENDOR: &str = "vendor";
    pub const USERNAME: &str = "username";
    pub const PASSWORD: &str = "password";
    pub const INSTANCE: &str = "instance";
    pub const PORT: &str = "port";
    pub const DATABASE: &str = "database";
    pub const AUTH_MODE: &str = "authMode";
    pub const DRIVER_CLASS_OVERRIDE: &str = "driverClassOverride";
    pub const URL_OVERRIDE: &str = "urlOverride";
    pub const COMMAND: &str = "command";
    pub const TLS_TRUST_ALL: &str = "tlsTrustAll";
    pub const TLS_TRUST_STORE_PATH: &str = "tlsTrustStorePath";
    pub const TLS_TRUST_STORE_SECRET: &str = "tlsTrustStoreSecret";
    pub const POOLING_PROPERTIES: &str = "poolingProperties";
    pub const CURSOR_TYPE: &str = "cursorType";
    pub const CURSOR_CONCURRENCY: &str = "cursorConcurrency";
}

/// Authentication mode for the target endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Username/password credentials checked by the database
    Sql,
    /// OS-integrated authentication (SQL Server)
    Integrated,
}

impl AuthMode {
    /// Parse a mode token, defaulting to SQL-credential auth
    #[must_use]
    pub fn parse_or_default(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "integrated" | "windows" => Self::Integrated,
            _ => Self::Sql,
        }
    }
}

/// Result-cursor scroll policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorType {
    /// Cursor only moves forward (default)
    #[default]
    ForwardOnly,
    /// Scrollable, insensitive to concurrent changes
    ScrollInsensitive,
    /// Scrollable, sensitive to concurrent changes
    ScrollSensitive,
}

impl CursorType {
    /// Parse a cursor-type token; unrecognized tokens fall back to the default
    #[must_use]
    pub fn parse_or_default(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "scroll-insensitive" => Self::ScrollInsensitive,
            "scroll-sensitive" => Self::ScrollSensitive,
            _ => Self::ForwardOnly,
        }
    }
}

/// Result-cursor concurrency policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorConcurrency {
    /// Cursor cannot be used to update rows (default)
    #[default]
    ReadOnly,
    /// Cursor may update rows in place
    Updatable,
}

impl CursorConcurrency {
    /// Parse a concurrency token; unrecognized tokens fall back to the default
    #[must_use]
    pub fn parse_or_default(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "updatable" => Self::Updatable,
            _ => Self::ReadOnly,
        }
    }
}

/// Combined cursor policy handed to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPolicy {
    /// Scroll policy
    pub cursor_type: CursorType,
    /// Concurrency policy
    pub concurrency: CursorConcurrency,
}

/// Validated, fully-defaulted description of one target endpoint
///
/// Built once per invocation by [`normalize`]; never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Database vendor
    pub vendor: Vendor,
    /// Server host name or address
    pub server: String,
    /// Named instance, empty when not applicable
    pub instance: String,
    /// Server port (vendor default applied when the caller gave none)
    pub port: u16,
    /// Database / catalog name
    pub database: String,
    /// Authentication mode
    pub auth_mode: AuthMode,
    /// Login user
    pub username: String,
    /// Login secret; never logged, Debug output redacts it
    pub password: String,
    /// Opaque driver-class override, empty when absent
    pub driver_class_override: String,
    /// Explicit connection URL, empty when absent
    pub url_override: String,
    /// Trust any server certificate during the TLS handshake
    pub tls_trust_all: bool,
    /// Path to trust-store material, empty when absent
    pub tls_trust_store_path: String,
    /// Trust-store secret; never logged
    pub tls_trust_store_secret: String,
    /// Opaque passthrough to the pooling layer (sorted for stable pool keys)
    pub pooling_properties: BTreeMap<String, String>,
    /// Ordered, non-empty candidate endpoints for connection attempts
    pub candidate_urls: Vec<String>,
}

impl ConnectionDescriptor {
    /// Whether pooled acquisition was requested
    #[must_use]
    pub fn wants_pooling(&self) -> bool {
        !self.pooling_properties.is_empty()
    }

    /// Whether any TLS trust configuration was requested
    #[must_use]
    pub fn wants_tls(&self) -> bool {
        self.tls_trust_all || !self.tls_trust_store_path.is_empty()
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("vendor", &self.vendor)
            .field("server", &self.server)
            .field("instance", &self.instance)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("auth_mode", &self.auth_mode)
            .field("username", &self.username)
            .field("password", &"***")
            .field("url_override", &self.url_override)
            .field("tls_trust_all", &self.tls_trust_all)
            .field("tls_trust_store_path", &self.tls_trust_store_path)
            .field("pooling_properties", &self.pooling_properties)
            .field("candidate_urls", &self.candidate_urls)
            .finish()
    }
}

/// One SQL command plus its cursor policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Command text, executed verbatim
    pub command: String,
    /// Cursor policy for the result set
    pub cursor: CursorPolicy,
}

/// Fetch a parameter, treating absent and empty identically
fn get<'a>(raw: &'a HashMap<String, String>, key: &str) -> &'a str {
    raw.get(key).map(String::as_str).unwrap_or("").trim()
}

/// Fail with a validation error when a required field is empty
fn require(raw: &HashMap<String, String>, key: &str) -> Result<String> {
    let value = get(raw, key);
    if value.is_empty() {
        return Err(SqlError::validation(format!("{key} input is required")));
    }
    Ok(value.to_string())
}

/// Parse the semicolon-separated `key=value` pooling property set
///
/// Entries without `=` and empty keys are dropped rather than rejected; the
/// set is an opaque passthrough to the pooling layer.
fn parse_pooling_properties(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Normalize a raw parameter map into descriptor and request
///
/// Deterministic and idempotent: the same map always yields structurally
/// identical results. The command-text check runs after defaulting and
/// before any connection attempt.
pub fn normalize(raw: &HashMap<String, String>) -> Result<(ConnectionDescriptor, ExecutionRequest)> {
    let vendor = Vendor::parse_or_default(get(raw, params::VENDOR))?;

    let server = require(raw, params::SERVER)?;
    let database = require(raw, params::DATABASE)?;
    let username = require(raw, params::USERNAME)?;
    let password = require(raw, params::PASSWORD)?;

    let instance = get(raw, params::INSTANCE).to_string();
    let port = match get(raw, params::PORT) {
        "" => vendor.default_port(),
        text => text
            .parse::<u16>()
            .map_err(|_| SqlError::validation(format!("port input '{text}' is not a valid port number")))?,
    };

    let url_override = get(raw, params::URL_OVERRIDE).to_string();
    let candidate_urls = if url_override.is_empty() {
        vendor.synthesize_urls(&server, port, &database, &instance)
    } else {
        vec![url_override.clone()]
    };

    let descriptor = ConnectionDescriptor {
        vendor,
        server,
        instance,
        port,
        database,
        auth_mode: AuthMode::parse_or_default(get(raw, params::AUTH_MODE)),
        username,
        password,
        driver_class_override: get(raw, params::DRIVER_CLASS_OVERRIDE).to_string(),
        url_override,
        tls_trust_all: get(raw, params::TLS_TRUST_ALL).eq_ignore_ascii_case("true"),
        tls_trust_store_path: get(raw, params::TLS_TRUST_STORE_PATH).to_string(),
        tls_trust_store_secret: get(raw, params::TLS_TRUST_STORE_SECRET).to_string(),
        pooling_properties: parse_pooling_properties(get(raw, params::POOLING_PROPERTIES)),
        candidate_urls,
    };

    // Fail fast: checked after defaulting, before any I/O.
    let command = get(raw, params::COMMAND);
    if command.is_empty() {
        return Err(SqlError::validation("command input is empty"));
    }

    let request = ExecutionRequest {
        command: command.to_string(),
        cursor: CursorPolicy {
            cursor_type: CursorType::parse_or_default(get(raw, params::CURSOR_TYPE)),
            concurrency: CursorConcurrency::parse_or_default(get(raw, params::CURSOR_CONCURRENCY)),
        },
    };

    Ok((descriptor, request))
}
