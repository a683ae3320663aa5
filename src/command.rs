//! Invocation Orchestration
//!
//! One invocation is a strict sequence: normalize, acquire, execute,
//! format. Each stage either threads its result forward or produces
//! exactly one classified error ending the invocation; the connection is
//! released on both paths.

use std::collections::HashMap;

use crate::engine::ConnectionProvider;
use crate::error::Result;
use crate::output::CommandOutcome;
use crate::{executor, format, input};

/// The engine behind one command invocation
///
/// Holds the connection provider, and through it the keyed pools, so
/// repeated invocations with equivalent pooling descriptors reuse
/// connections.
pub struct CommandEngine {
    provider: ConnectionProvider,
}

impl CommandEngine {
    /// Engine with every compiled-in vendor driver registered
    #[must_use]
    pub fn new() -> Self {
        Self { provider: ConnectionProvider::with_builtin_factories() }
    }

    /// Engine over a caller-assembled provider
    ///
    /// Use this to register factories for vendors without a built-in
    /// driver, or to substitute test doubles.
    #[must_use]
    pub fn with_provider(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// The provider backing this engine
    #[must_use]
    pub fn provider(&self) -> &ConnectionProvider {
        &self.provider
    }

    /// Run one invocation, always producing a terminal envelope
    ///
    /// Never panics and never returns an error: every failure is
    /// classified into the envelope's exception field.
    pub async fn run(&self, params: &HashMap<String, String>) -> CommandOutcome {
        match self.try_run(params).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(code = err.error_code(), error = %err, "invocation failed");
                CommandOutcome::failure(&err)
            }
        }
    }

    /// Run one invocation, surfacing the classified error to the caller
    pub async fn try_run(&self, params: &HashMap<String, String>) -> Result<CommandOutcome> {
        let (descriptor, request) = input::normalize(params)?;

        tracing::info!(
            vendor = %descriptor.vendor,
            server = %descriptor.server,
            database = %descriptor.database,
            "executing command"
        );

        let mut handle = self.provider.acquire(&descriptor).await?;
        let executed =
            executor::execute(handle.connection_mut(), descriptor.vendor, &request).await;
        handle.release().await;
        let result = executed?;

        let formatted = format::format(descriptor.vendor, &request.command, &result);
        Ok(CommandOutcome::success(formatted, result.update_count))
    }
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::new()
    }
}
