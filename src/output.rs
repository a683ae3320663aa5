//! Invocation Outcome Envelope
//!
//! The string-keyed result map one invocation terminates with. Success and
//! failure share the same shape; failure additionally populates the
//! exception field with the classified diagnostic.
//!
//! # Contract
//! - `returnCode`: "0" on success, "-1" on failure
//! - `returnResult`: raw driver/echo text, or the error message on failure
//! - `outputText`: normalized output text
//! - `updateCount`: stringified signed count, "-1" when not applicable
//! - `exception`: absent on success; `code;state;message` for driver
//!   errors, the plain message otherwise

use serde::{Deserialize, Serialize};

use crate::error::SqlError;
use crate::executor::NO_UPDATE_COUNT;
use crate::format::FormattedOutput;

/// Return code marking a successful invocation
pub const RETURN_CODE_SUCCESS: &str = "0";

/// Return code marking a failed invocation
pub const RETURN_CODE_FAILURE: &str = "-1";

/// Terminal outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    /// "0" or "-1"
    pub return_code: String,
    /// Raw driver/echo text, or the error message on failure
    pub return_result: String,
    /// Normalized output text
    pub output_text: String,
    /// Stringified affected-row count, "-1" when not applicable
    pub update_count: String,
    /// Classified failure payload, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl CommandOutcome {
    /// Build the success envelope
    #[must_use]
    pub fn success(formatted: FormattedOutput, update_count: i64) -> Self {
        Self {
            return_code: RETURN_CODE_SUCCESS.to_string(),
            return_result: formatted.raw_result,
            output_text: formatted.output_text,
            update_count: update_count.to_string(),
            exception: None,
        }
    }

    /// Build the failure envelope from a classified error
    #[must_use]
    pub fn failure(error: &SqlError) -> Self {
        Self {
            return_code: RETURN_CODE_FAILURE.to_string(),
            return_result: error.message(),
            output_text: String::new(),
            update_count: NO_UPDATE_COUNT.to_string(),
            exception: Some(error.exception_text()),
        }
    }

    /// Whether this outcome reports success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.return_code == RETURN_CODE_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverDiagnostic;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_envelope() {
        let outcome = CommandOutcome::success(
            FormattedOutput {
                raw_result: String::new(),
                output_text: "3 row(s) affected".to_string(),
            },
            3,
        );
        assert!(outcome.is_success());
        assert_eq!(outcome.update_count, "3");
        assert!(outcome.exception.is_none());
    }

    #[test]
    fn test_failure_envelope_carries_diagnostic() {
        let err = SqlError::driver(
            "oracle",
            DriverDiagnostic::new(942, "42000", "table or view does not exist"),
        );
        let outcome = CommandOutcome::failure(&err);
        assert!(!outcome.is_success());
        assert_eq!(outcome.update_count, "-1");
        assert_eq!(
            outcome.exception.as_deref(),
            Some("942;42000;table or view does not exist")
        );
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let outcome = CommandOutcome::failure(&SqlError::validation("command input is empty"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["returnCode"], "-1");
        assert!(json.get("outputText").is_some());
        assert!(json.get("updateCount").is_some());
    }
}
