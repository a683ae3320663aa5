//! Keyed Connection Pooling
//!
//! Pools are created on demand, one per distinct descriptor identity
//! (server, port, database, credentials and the pooling-property set).
//! Semantically equivalent descriptors reuse the same pool across
//! invocations; pool identity never comes from process-wide globals.
//!
//! Recognized pooling properties:
//! - `max_size` — maximum open connections (default 8)
//! - `acquire_timeout_ms` — wait bound for a free slot (default 30000)
//!
//! Everything else in the property set participates in pool identity and
//! is otherwise passed through untouched. The engine implements no timers
//! of its own beyond the acquire bound delegated here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};

use crate::engine::{connect_via_candidates, ConnectionFactory, SqlConnection};
use crate::error::{Result, SqlError};
use crate::input::ConnectionDescriptor;
use crate::vendor::Vendor;

const DEFAULT_MAX_SIZE: usize = 8;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 30_000;

/// Pool identity, derived purely from the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    vendor: Vendor,
    server: String,
    port: u16,
    database: String,
    username: String,
    password: String,
    properties: Vec<(String, String)>,
}

impl PoolKey {
    fn from_descriptor(descriptor: &ConnectionDescriptor) -> Self {
        Self {
            vendor: descriptor.vendor,
            server: descriptor.server.clone(),
            port: descriptor.port,
            database: descriptor.database.clone(),
            username: descriptor.username.clone(),
            password: descriptor.password.clone(),
            // BTreeMap iteration order makes the key stable
            properties: descriptor
                .pooling_properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Acquire/release counters, readable for observability and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful acquisitions handed out
    pub acquires: u64,
    /// Connections returned to the pool
    pub releases: u64,
    /// Physical connections opened
    pub connects: u64,
}

#[derive(Debug, Default)]
struct AtomicPoolStats {
    acquires: AtomicU64,
    releases: AtomicU64,
    connects: AtomicU64,
}

impl AtomicPoolStats {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            acquires: self.acquires.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
        }
    }
}

/// One keyed connection pool
///
/// Idle connections are kept LIFO. A semaphore bounds the total number of
/// live connections; the permit taken on acquire is restored on release.
pub struct CommandPool {
    factory: Arc<dyn ConnectionFactory>,
    descriptor: ConnectionDescriptor,
    idle: Mutex<Vec<Box<dyn SqlConnection>>>,
    slots: Arc<Semaphore>,
    acquire_timeout: Duration,
    stats: AtomicPoolStats,
}

impl CommandPool {
    fn new(descriptor: &ConnectionDescriptor, factory: Arc<dyn ConnectionFactory>) -> Self {
        let max_size = descriptor
            .pooling_properties
            .get("max_size")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_SIZE);
        let acquire_timeout_ms = descriptor
            .pooling_properties
            .get("acquire_timeout_ms")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS);

        Self {
            factory,
            descriptor: descriptor.clone(),
            idle: Mutex::new(Vec::with_capacity(max_size)),
            slots: Arc::new(Semaphore::new(max_size)),
            acquire_timeout: Duration::from_millis(acquire_timeout_ms),
            stats: AtomicPoolStats::default(),
        }
    }

    /// Borrow a connection, opening a new one when no idle connection exists
    pub async fn acquire(&self) -> Result<Box<dyn SqlConnection>> {
        let permit = tokio::time::timeout(self.acquire_timeout, self.slots.acquire())
            .await
            .map_err(|_| {
                SqlError::connection(format!(
                    "timed out waiting for a pooled connection after {}ms",
                    self.acquire_timeout.as_millis()
                ))
            })?
            .map_err(|_| SqlError::connection("connection pool is closed"))?;

        let reused = self.idle.lock().await.pop();
        let conn = match reused {
            Some(conn) => conn,
            None => match connect_via_candidates(self.factory.as_ref(), &self.descriptor).await {
                Ok(conn) => {
                    self.stats.connects.fetch_add(1, Ordering::Relaxed);
                    conn
                }
                Err(err) => {
                    drop(permit);
                    return Err(err);
                }
            },
        };

        self.stats.acquires.fetch_add(1, Ordering::Relaxed);
        // Permit travels with the connection; restored by release().
        permit.forget();
        Ok(conn)
    }

    /// Return a connection to the idle set
    pub async fn release(&self, conn: Box<dyn SqlConnection>) {
        self.idle.lock().await.push(conn);
        self.slots.add_permits(1);
        self.stats.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the acquire/release counters
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Number of idle connections currently held
    pub async fn idle_count(&self) -> usize {
        self.idle.lock().await.len()
    }
}

/// Registry of pools keyed by descriptor identity
pub struct PoolRegistry {
    pools: std::sync::Mutex<HashMap<PoolKey, Arc<CommandPool>>>,
}

impl PoolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self { pools: std::sync::Mutex::new(HashMap::new()) }
    }

    /// Fetch the pool for a descriptor, creating it on first use
    pub fn get_or_create(
        &self,
        descriptor: &ConnectionDescriptor,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Arc<CommandPool> {
        let key = PoolKey::from_descriptor(descriptor);
        let mut pools = self.pools.lock().expect("pool registry lock poisoned");
        Arc::clone(
            pools
                .entry(key)
                .or_insert_with(|| Arc::new(CommandPool::new(descriptor, factory))),
        )
    }

    /// Fetch the pool for a descriptor without creating one
    #[must_use]
    pub fn get(&self, descriptor: &ConnectionDescriptor) -> Option<Arc<CommandPool>> {
        let key = PoolKey::from_descriptor(descriptor);
        self.pools.lock().expect("pool registry lock poisoned").get(&key).map(Arc::clone)
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
