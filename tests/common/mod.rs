//! Shared Test Doubles
//!
//! A scripted [`ConnectionFactory`]/[`SqlConnection`] pair used across the
//! integration suites. The factory counts physical connects and can be
//! told to fail specific candidate URLs; the connection replays a fixed
//! outcome and counts closes, so resource discipline is observable.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use omnisql::input::{ConnectionDescriptor, CursorPolicy};
use omnisql::{ConnectionFactory, Result, SqlConnection, SqlError, StatementOutcome, Vendor};

/// Shared counters exposing what the doubles observed
#[derive(Debug, Default)]
pub struct Probe {
    pub connects: AtomicU64,
    pub closes: AtomicU64,
    pub runs: AtomicU64,
}

impl Probe {
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

/// What the scripted connection should do on `run`
#[derive(Debug, Clone)]
pub enum Script {
    Rows(Vec<String>),
    Count(u64),
    Nothing,
    /// Fail with a driver diagnostic
    Fail(i32, String, String),
}

/// Scripted factory for one vendor
pub struct ScriptedFactory {
    vendor: Vendor,
    script: Script,
    console: String,
    failing_urls: HashSet<String>,
    pub probe: Arc<Probe>,
}

impl ScriptedFactory {
    pub fn new(vendor: Vendor, script: Script) -> Self {
        Self {
            vendor,
            script,
            console: String::new(),
            failing_urls: HashSet::new(),
            probe: Arc::new(Probe::default()),
        }
    }

    /// Console text the connection reports (for vendors with a console channel)
    pub fn with_console(mut self, text: &str) -> Self {
        self.console = text.to_string();
        self
    }

    /// Mark a candidate URL as unreachable
    pub fn failing_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }
}

#[async_trait]
impl ConnectionFactory for ScriptedFactory {
    async fn connect(
        &self,
        url: &str,
        _descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn SqlConnection>> {
        if self.failing_urls.contains(url) {
            return Err(SqlError::connection(format!("endpoint unreachable: {url}")));
        }
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedConnection {
            script: self.script.clone(),
            console: self.console.clone(),
            probe: Arc::clone(&self.probe),
        }))
    }

    fn vendor(&self) -> Vendor {
        self.vendor
    }
}

pub struct ScriptedConnection {
    script: Script,
    console: String,
    probe: Arc<Probe>,
}

#[async_trait]
impl SqlConnection for ScriptedConnection {
    async fn run(&mut self, _sql: &str, _cursor: &CursorPolicy) -> Result<StatementOutcome> {
        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Rows(rows) => Ok(StatementOutcome::Rows(rows.clone())),
            Script::Count(n) => Ok(StatementOutcome::Count(*n)),
            Script::Nothing => Ok(StatementOutcome::None),
            Script::Fail(code, state, message) => Err(SqlError::driver(
                "scripted",
                omnisql::DriverDiagnostic::new(*code, state.clone(), message.clone()),
            )),
        }
    }

    async fn console_output(&mut self) -> Result<String> {
        Ok(std::mem::take(&mut self.console))
    }

    async fn close(&mut self) -> Result<()> {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A complete, valid parameter map the individual tests tweak
pub fn base_params(vendor: &str) -> std::collections::HashMap<String, String> {
    let pairs = [
        ("server", "dbhost"),
        ("vendor", vendor),
        ("username", "svc"),
        ("password", "secret"),
        ("database", "app"),
        ("command", "SELECT 1"),
    ];
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}
