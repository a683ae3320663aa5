//! Result Formatting
//!
//! Derives the normalized output text and the raw result text from one
//! [`ExecutionResult`]. The rules run in a fixed order and the first match
//! wins; the Oracle console rule comes first because procedural calls
//! report a sentinel update count at the same time.
//!
//! Token checks are plain substring matches against the command text, the
//! same leniency the vendors apply to these directives.

use crate::executor::{ExecutionResult, NO_UPDATE_COUNT};
use crate::vendor::Vendor;

/// Fixed raw result for console-producing procedural commands
pub const COMMAND_COMPLETED: &str = "Command completed successfully";

/// Output text when a statement yields neither rows nor a count
pub const NO_RESULTS: &str = "The command has no results!";

/// Console invocation token checked case-insensitively
const CONSOLE_TOKEN: &str = "dbms_output";

/// Row-count suppression directive checked case-insensitively
const NOCOUNT_TOKEN: &str = "SET NOCOUNT ON";

/// The two user-facing strings one invocation produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedOutput {
    /// Raw driver/echo text
    pub raw_result: String,
    /// Normalized output text
    pub output_text: String,
}

/// Apply the formatting rules in precedence order
#[must_use]
pub fn format(vendor: Vendor, command: &str, result: &ExecutionResult) -> FormattedOutput {
    if vendor.has_console_channel() && command.to_lowercase().contains(CONSOLE_TOKEN) {
        return FormattedOutput {
            raw_result: COMMAND_COMPLETED.to_string(),
            output_text: result.console.clone(),
        };
    }

    if result.rows.is_empty() {
        if result.update_count != NO_UPDATE_COUNT {
            return FormattedOutput {
                raw_result: result.console.clone(),
                output_text: format!("{} row(s) affected", result.update_count),
            };
        }
        let output_text = if command.to_uppercase().contains(NOCOUNT_TOKEN) {
            result.console.clone()
        } else {
            NO_RESULTS.to_string()
        };
        return FormattedOutput { raw_result: result.console.clone(), output_text };
    }

    let mut output_text = String::new();
    for row in &result.rows {
        output_text.push_str(row);
        output_text.push('\n');
    }
    FormattedOutput { raw_result: result.console.clone(), output_text }
}
