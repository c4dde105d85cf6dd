//! Memoized response cache for expensive derived artifacts
//!
//! Sits in front of the external artifact producer. Keys are deterministic
//! fingerprints of the request (category tag + canonicalized payload +
//! optional timeframe), so identical inputs always map to the same entry
//! regardless of how the caller's JSON happened to be ordered.
//!
//! Entries live for the life of the process: there is no TTL and no
//! eviction, and a `set` on an existing key overwrites. Callers must treat a
//! hit as a point-in-time snapshot, not a freshness guarantee. The store is
//! intentionally unbounded; see DESIGN.md for the resource-growth tradeoff.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::EngineError;
use crate::types::Timeframe;

/// A request for a derived artifact, as keyed by the cache
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    pub kind: ArtifactKind,
    /// Serialized reading context handed to the producer
    pub context: Value,
    /// Resolution the artifact should cover, where relevant
    pub timeframe: Option<Timeframe>,
}

impl ArtifactRequest {
    pub fn new(kind: ArtifactKind, context: Value) -> Self {
        Self {
            kind,
            context,
            timeframe: None,
        }
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    /// Deterministic cache key: `{category}:{blake3 hex}` over the canonical
    /// serialization of the context plus the timeframe tag.
    pub fn cache_key(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut canonical = String::new();
        write_canonical(&self.context, &mut canonical);
        hasher.update(canonical.as_bytes());
        match self.timeframe {
            Some(tf) => {
                hasher.update(&[1]);
                hasher.update(tf.as_str().as_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        format!("{}:{}", self.kind.as_str(), hasher.finalize().to_hex())
    }
}

/// Canonical JSON serialization: object keys emitted in sorted order at every
/// depth, so insertion order never leaks into the fingerprint.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // String keys always serialize cleanly
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_canonical(&map[*key], out);
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

/// One memoized artifact with its provenance instant
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub artifact: Artifact,
    pub created_at: DateTime<Utc>,
}

/// Produces artifacts on cache miss.
///
/// Implementations wrap the external generative/scoring service. Calls for
/// distinct keys may run concurrently; the cache imposes no mutual exclusion
/// on the populate path and no timeout, so a hung producer simply leaves its
/// key unpopulated.
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    /// Return the raw JSON document for the request. Shape validation happens
    /// in the cache, not here.
    async fn produce(&self, request: &ArtifactRequest) -> Result<Value, EngineError>;
}

/// Process-wide memoization store.
///
/// Construct once at startup and pass by reference to handlers; interior
/// locking keeps `&self` access safe across tasks. The lock is held only for
/// map operations, never across a producer call, so two concurrent misses on
/// the same key both compute and the second `set` wins.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key; a clone of the entry on hit, `None` on miss
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Store an artifact under a key, overwriting any previous value
    pub fn set(&self, key: &str, artifact: Artifact) {
        let entry = CacheEntry {
            key: key.to_string(),
            artifact,
            created_at: Utc::now(),
        };
        self.lock().insert(key.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serve the request from cache, or run the producer and memoize.
    ///
    /// The producer's response is validated against the expected artifact
    /// shape before anything is stored; a producer error or malformed
    /// document propagates to the caller and leaves the key untouched.
    pub async fn get_or_produce(
        &self,
        request: &ArtifactRequest,
        producer: &dyn ArtifactProducer,
    ) -> Result<Artifact, EngineError> {
        let key = request.cache_key();

        if let Some(entry) = self.get(&key) {
            debug!("serving {} response from cache", request.kind.as_str());
            return Ok(entry.artifact);
        }

        debug!("cache miss for {}, producing", request.kind.as_str());
        let raw = producer.produce(request).await?;
        let artifact = Artifact::from_response(request.kind, raw).map_err(|e| {
            warn!("producer returned malformed {} document: {e}", request.kind.as_str());
            e
        })?;

        self.set(&key, artifact.clone());
        Ok(artifact)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
