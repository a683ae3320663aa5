//! Vendor Registry
//!
//! Closed set of supported database vendors. Each variant knows its
//! canonical name, default port, candidate-URL synthesis and whether the
//! vendor exposes a procedural console channel (`DBMS_OUTPUT`).
//!
//! Vendor dispatch is always on this enum, never on raw strings, so
//! exhaustiveness is checked by the compiler.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlError};

/// Supported database vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// Oracle Database
    Oracle,
    /// Microsoft SQL Server
    #[serde(rename = "mssql")]
    MsSql,
    /// `MySQL` database (includes `MariaDB`)
    #[serde(rename = "mysql")]
    MySql,
    /// `PostgreSQL` database
    Postgres,
    /// Sybase / SAP ASE
    Sybase,
}

impl Vendor {
    /// Parse a vendor token; absent or empty defaults to Oracle
    ///
    /// Unlike the cursor enums there is no silent fallback for a present
    /// but unrecognized token: that is a validation failure.
    pub fn parse_or_default(token: &str) -> Result<Self> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Ok(Self::Oracle);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "oracle" => Ok(Self::Oracle),
            "mssql" | "sqlserver" | "sql server" => Ok(Self::MsSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sybase" | "ase" => Ok(Self::Sybase),
            other => Err(SqlError::validation(format!(
                "Unknown database vendor '{other}' (expected oracle, mssql, mysql, postgres or sybase)"
            ))),
        }
    }

    /// Get the canonical vendor name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::MsSql => "mssql",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sybase => "sybase",
        }
    }

    /// Default server port used when the caller supplies none
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Oracle => 1521,
            Self::MsSql => 1433,
            Self::MySql => 3306,
            Self::Postgres => 5432,
            Self::Sybase => 5000,
        }
    }

    /// Whether the vendor has a procedural console side channel
    ///
    /// Only Oracle buffers `DBMS_OUTPUT` text during execution.
    #[must_use]
    pub const fn has_console_channel(&self) -> bool {
        matches!(self, Self::Oracle)
    }

    /// Synthesize the ordered candidate-URL list for a target endpoint
    ///
    /// Oracle yields two candidates (service-name form, then SID form);
    /// SQL Server with a named instance yields the instance-qualified URL
    /// before the plain one. All other vendors yield a single URL. The
    /// list is never empty.
    #[must_use]
    pub fn synthesize_urls(&self, server: &str, port: u16, database: &str, instance: &str) -> Vec<String> {
        match self {
            Self::Oracle => vec![
                format!("oracle://{server}:{port}/{database}"),
                format!("oracle://{server}:{port}/{database}?sid={database}"),
            ],
            Self::MsSql => {
                let mut urls = Vec::new();
                if !instance.is_empty() {
                    urls.push(format!("sqlserver://{server}:{port}/{database}?instance={instance}"));
                }
                urls.push(format!("sqlserver://{server}:{port}/{database}"));
                urls
            }
            Self::MySql => vec![format!("mysql://{server}:{port}/{database}")],
            Self::Postgres => vec![format!("postgres://{server}:{port}/{database}")],
            Self::Sybase => vec![format!("sybase://{server}:{port}/{database}")],
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_oracle() {
        assert_eq!(Vendor::parse_or_default("").unwrap(), Vendor::Oracle);
        assert_eq!(Vendor::parse_or_default("   ").unwrap(), Vendor::Oracle);
    }

    #[test]
    fn test_parse_known_tokens() {
        assert_eq!(Vendor::parse_or_default("Oracle").unwrap(), Vendor::Oracle);
        assert_eq!(Vendor::parse_or_default("MSSQL").unwrap(), Vendor::MsSql);
        assert_eq!(Vendor::parse_or_default("sqlserver").unwrap(), Vendor::MsSql);
        assert_eq!(Vendor::parse_or_default("MariaDB").unwrap(), Vendor::MySql);
        assert_eq!(Vendor::parse_or_default("postgresql").unwrap(), Vendor::Postgres);
        assert_eq!(Vendor::parse_or_default("sybase").unwrap(), Vendor::Sybase);
    }

    #[test]
    fn test_parse_unknown_token_fails() {
        let err = Vendor::parse_or_default("db2").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.message().contains("db2"));
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(Vendor::Oracle.default_port(), 1521);
        assert_eq!(Vendor::MsSql.default_port(), 1433);
        assert_eq!(Vendor::MySql.default_port(), 3306);
        assert_eq!(Vendor::Postgres.default_port(), 5432);
        assert_eq!(Vendor::Sybase.default_port(), 5000);
    }

    #[test]
    fn test_console_channel_flag() {
        assert!(Vendor::Oracle.has_console_channel());
        assert!(!Vendor::MsSql.has_console_channel());
        assert!(!Vendor::Postgres.has_console_channel());
    }

    #[test]
    fn test_oracle_synthesizes_two_candidates() {
        let urls = Vendor::Oracle.synthesize_urls("dbhost", 1521, "ORCL", "");
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "oracle://dbhost:1521/ORCL");
        assert!(urls[1].contains("sid=ORCL"));
    }

    #[test]
    fn test_mssql_instance_candidate_first() {
        let urls = Vendor::MsSql.synthesize_urls("dbhost", 1433, "master", "SQLEXPRESS");
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("instance=SQLEXPRESS"));
        assert_eq!(urls[1], "sqlserver://dbhost:1433/master");

        let plain = Vendor::MsSql.synthesize_urls("dbhost", 1433, "master", "");
        assert_eq!(plain, vec!["sqlserver://dbhost:1433/master"]);
    }

    #[test]
    fn test_single_candidate_vendors() {
        assert_eq!(
            Vendor::Postgres.synthesize_urls("h", 5432, "app", ""),
            vec!["postgres://h:5432/app"]
        );
        assert_eq!(Vendor::MySql.synthesize_urls("h", 3306, "app", ""), vec!["mysql://h:3306/app"]);
        assert_eq!(Vendor::Sybase.synthesize_urls("h", 5000, "app", ""), vec!["sybase://h:5000/app"]);
    }

    #[test]
    fn test_vendor_serialization() {
        assert_eq!(serde_json::to_string(&Vendor::Oracle).unwrap(), r#""oracle""#);
        assert_eq!(serde_json::to_string(&Vendor::MsSql).unwrap(), r#""mssql""#);
        assert_eq!(serde_json::to_string(&Vendor::Postgres).unwrap(), r#""postgres""#);
    }
}
