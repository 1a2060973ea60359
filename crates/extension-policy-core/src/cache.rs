//! Time-bounded cache of connect params keyed by extension
//!
//! One coarse lock guards the whole map. It is held only for a single read or
//! write and never across a network call. Stale entries are ignored on read
//! and replaced by the next successful fetch; they are not evicted eagerly.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::types::{ConnectParams, ExtensionId};

struct CacheEntry {
    params: ConnectParams,
    fetched_at: Instant,
}

/// Concurrency-safe TTL cache of [`ConnectParams`]
pub struct ConnectParamsCache {
    entries: Mutex<HashMap<ExtensionId, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ConnectParamsCache {
    /// Create an empty cache with the given validity window
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Return the cached params if the entry is younger than the TTL
    pub fn get(&self, extension: &str) -> Option<ConnectParams> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        entries.get(extension).and_then(|entry| {
            if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                Some(entry.params)
            } else {
                None
            }
        })
    }

    /// Store params for an extension, replacing any previous entry
    pub fn put(&self, extension: impl Into<ExtensionId>, params: ConnectParams) {
        let entry = CacheEntry {
            params,
            fetched_at: self.clock.now(),
        };
        self.entries.lock().insert(extension.into(), entry);
    }

    /// Number of entries held, stale ones included
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validity window
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
