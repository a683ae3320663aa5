//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout Omnisql.
//! Every failure surfaces as exactly one of four classified kinds,
//! each with a stable error code for JSON output.
//!
//! # Error Categories
//! - `Validation`: malformed or missing input, surfaced before any I/O
//! - `Connection`: endpoint, authentication, or TLS trust failures
//! - `Driver`: vendor-reported statement failures, diagnostics preserved verbatim
//! - `Generic`: anything else (message only)

use thiserror::Error;

/// Vendor diagnostic payload carried by [`SqlError::Driver`]
///
/// Code, SQL state and message are captured verbatim from the driver so
/// callers can branch on vendor semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDiagnostic {
    /// Vendor-specific error code (0 when the driver reports none)
    pub code: i32,
    /// Five-character SQLSTATE where the vendor provides one, empty otherwise
    pub state: String,
    /// Driver error message, unmodified
    pub message: String,
}

impl DriverDiagnostic {
    /// Create a new diagnostic
    pub fn new(code: i32, state: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code, state: state.into(), message: message.into() }
    }

    /// Render as `code;state;message`, the wire shape of the `exception` output field
    #[must_use]
    pub fn render(&self) -> String {
        format!("{};{};{}", self.code, self.state, self.message)
    }
}

/// Main error type for Omnisql operations
#[derive(Error, Debug)]
pub enum SqlError {
    /// Invalid input or missing required parameters; no connection was attempted
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Endpoint, authentication, or TLS trust failure before statement execution
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Statement execution failure reported by the database
    #[error("Driver error ({vendor}): {}", diagnostic.message)]
    Driver {
        /// Canonical vendor name
        vendor: String,
        /// Vendor code, SQL state and message
        diagnostic: DriverDiagnostic,
    },

    /// Unexpected failure in formatting or elsewhere
    #[error("Unexpected error: {0}")]
    Generic(String),
}

impl SqlError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Driver { .. } => "DRIVER_ERROR",
            Self::Generic(_) => "GENERIC_ERROR",
        }
    }

    /// Human-readable error message (no credentials, no trust-store secrets)
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The `exception` field value: driver diagnostics verbatim, message otherwise
    #[must_use]
    pub fn exception_text(&self) -> String {
        match self {
            Self::Driver { diagnostic, .. } => diagnostic.render(),
            other => other.message(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a driver error carrying a vendor diagnostic
    pub fn driver(vendor: impl Into<String>, diagnostic: DriverDiagnostic) -> Self {
        Self::Driver { vendor: vendor.into(), diagnostic }
    }

    /// Create a generic error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic(message.into())
    }

    /// Relabel an arbitrary failure as a classified error
    ///
    /// Already-classified errors pass through untouched; anything else
    /// becomes [`SqlError::Generic`]. Classification never retries.
    pub fn classify(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(classified) => classified,
            Err(other) => Self::Generic(other.to_string()),
        }
    }
}

/// Result type alias for Omnisql operations
pub type Result<T> = std::result::Result<T, SqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SqlError::validation("test").error_code(), "VALIDATION_ERROR");
        assert_eq!(SqlError::connection("test").error_code(), "CONNECTION_ERROR");
        assert_eq!(
            SqlError::driver("oracle", DriverDiagnostic::new(942, "42000", "table or view does not exist"))
                .error_code(),
            "DRIVER_ERROR"
        );
        assert_eq!(SqlError::generic("test").error_code(), "GENERIC_ERROR");
    }

    #[test]
    fn test_driver_diagnostic_render() {
        let diag = DriverDiagnostic::new(1045, "28000", "Access denied for user");
        assert_eq!(diag.render(), "1045;28000;Access denied for user");
    }

    #[test]
    fn test_exception_text() {
        let err = SqlError::driver("mysql", DriverDiagnostic::new(1064, "42000", "syntax error"));
        assert_eq!(err.exception_text(), "1064;42000;syntax error");

        let err = SqlError::validation("command input is empty");
        assert!(err.exception_text().contains("command input is empty"));
    }

    #[test]
    fn test_classify_passthrough() {
        let classified = SqlError::classify(anyhow::Error::new(SqlError::connection("refused")));
        assert!(matches!(classified, SqlError::Connection(_)));
    }

    #[test]
    fn test_classify_generic() {
        let classified = SqlError::classify(anyhow::anyhow!("something odd"));
        assert!(matches!(classified, SqlError::Generic(_)));
        assert!(classified.message().contains("something odd"));
    }

    #[test]
    fn test_error_messages() {
        let err = SqlError::connection("host unreachable");
        assert!(err.message().contains("host unreachable"));

        let err = SqlError::driver("postgres", DriverDiagnostic::new(0, "42601", "syntax error at or near"));
        assert!(err.message().contains("postgres"));
        assert!(err.message().contains("syntax error"));
    }
}
