//! Command Execution
//!
//! Runs one command verbatim over an open connection and folds the driver's
//! reported outcome into an [`ExecutionResult`]: rows, an affected-row
//! count, or neither. For vendors with a console side channel the buffered
//! procedural output is read after the statement and attached as the raw
//! scalar text.

use crate::engine::{SqlConnection, StatementOutcome};
use crate::error::Result;
use crate::input::ExecutionRequest;
use crate::vendor::Vendor;

/// Update count value meaning "not applicable"
///
/// Distinct from a legitimate count of 0 reported by the driver.
pub const NO_UPDATE_COUNT: i64 = -1;

/// Everything one execution produced, before formatting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Driver-reported affected-row count, or [`NO_UPDATE_COUNT`]
    pub update_count: i64,
    /// Rendered rows in driver order, one line each
    pub rows: Vec<String>,
    /// Buffered procedural console output (empty for vendors without one)
    pub console: String,
}

impl ExecutionResult {
    /// A result with no rows, no count and no console text
    #[must_use]
    pub fn empty() -> Self {
        Self { update_count: NO_UPDATE_COUNT, rows: Vec::new(), console: String::new() }
    }
}

/// Execute the request on an open connection
///
/// The command text runs verbatim, no rewriting or batching. Exactly one
/// of the three result shapes survives into the returned value.
pub async fn execute(
    conn: &mut dyn SqlConnection,
    vendor: Vendor,
    request: &ExecutionRequest,
) -> Result<ExecutionResult> {
    let outcome = conn.run(&request.command, &request.cursor).await?;

    let mut result = ExecutionResult::empty();
    match outcome {
        StatementOutcome::Rows(rows) => result.rows = rows,
        StatementOutcome::Count(n) => {
            result.update_count = i64::try_from(n).unwrap_or(i64::MAX);
        }
        StatementOutcome::None => {}
    }

    // Console output can accompany rows or counts and must be drained
    // even when the statement produced neither.
    if vendor.has_console_channel() {
        result.console = conn.console_output().await?;
    }

    Ok(result)
}
