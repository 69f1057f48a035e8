//! Memoization of whole optimizer runs.
//!
//! The cache is an injected service: the optimizer works the same without
//! one, only slower on repeated identical requests.

use crate::optimizer::BrandResult;
use panelcut_core::{Error, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

/// SHA-256 of the canonical JSON of the cache-relevant inputs, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes `value` after sorting all object keys.
    pub fn from_value(value: &Value) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical_json(value).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes `value` with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Storage for optimizer results.
pub trait ResultCache: Send + Sync {
    /// Returns the cached results for `key`, if any.
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<Vec<BrandResult>>>>;

    /// Stores results under `key`, evicting as needed.
    fn put(&self, key: CacheKey, results: Arc<Vec<BrandResult>>) -> Result<()>;

    /// Returns the number of cached entries.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the cache.
    fn clear(&self);
}

/// Fixed-capacity cache that evicts the oldest entry first.
pub struct BoundedResultCache {
    entries: Mutex<VecDeque<(CacheKey, Arc<Vec<BrandResult>>)>>,
    capacity: usize,
}

impl BoundedResultCache {
    /// Default number of cached runs.
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Creates a new cache with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a new cache with the specified capacity (at least one entry).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache for BoundedResultCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Arc<Vec<BrandResult>>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to acquire cache lock: {}", e)))?;
        Ok(entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Arc::clone(v)))
    }

    fn put(&self, key: CacheKey, results: Arc<Vec<BrandResult>>) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to acquire cache lock: {}", e)))?;

        entries.retain(|(k, _)| *k != key);
        while entries.len() >= self.capacity {
            if let Some((evicted, _)) = entries.pop_front() {
                log::debug!("result cache full, evicting {}", evicted);
            }
        }
        entries.push_back((key, results));
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
