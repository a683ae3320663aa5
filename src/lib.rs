//! Omnisql - Vendor-Agnostic SQL Command Execution
//!
//! Omnisql runs one SQL command against any of the supported database
//! vendors and reports a deterministic, string-keyed outcome envelope. It
//! is built as a library first; the CLI binary is a thin wrapper over
//! [`CommandEngine`].
//!
//! # Core Principles
//! - One invocation, one terminal outcome (success or one classified error)
//! - Command text is executed verbatim (no rewriting, no parameterization)
//! - Every failure is one of four kinds: validation, connection, driver,
//!   generic
//! - Connections are scoped resources, released on every exit path
//!
//! # Module Organization
//! - [`error`] - The four-kind classified error type
//! - [`vendor`] - Vendor identity, ports and candidate-URL synthesis
//! - [`input`] - Parameter-map normalization and defaulting
//! - [`engine`] - Connection provider, keyed pooling and vendor drivers
//! - [`executor`] - Verbatim command execution and result-shape folding
//! - [`format`] - Output-text derivation rules
//! - [`output`] - The outcome envelope
//! - [`command`] - The invocation orchestrator

pub mod command;
pub mod engine;
pub mod error;
pub mod executor;
pub mod format;
pub mod input;
pub mod output;
pub mod vendor;

pub use command::CommandEngine;
pub use engine::{ConnectionFactory, ConnectionHandle, ConnectionProvider, SqlConnection, StatementOutcome};
pub use error::{DriverDiagnostic, Result, SqlError};
pub use executor::{ExecutionResult, NO_UPDATE_COUNT};
pub use format::FormattedOutput;
pub use input::{ConnectionDescriptor, CursorPolicy, ExecutionRequest};
pub use output::CommandOutcome;
pub use vendor::Vendor;
