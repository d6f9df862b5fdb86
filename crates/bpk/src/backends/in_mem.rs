//! # Previously, on bucketpeek...
//!
//! 🎬 The object store was down. Docker had eaten MinIO again. And yet the tests had to run.
//! Someone had to pretend to be a bucket. Someone had to live entirely in RAM, gone the moment
//! you blink.
//!
//! That someone was this module.
//!
//! `InMemoryStore` keeps objects in a `HashMap` keyed by `(bucket, key)`, can be told to deny
//! specific objects or to insist on a credential pair, and reports what happened to it through
//! shared counters so tests can check "was anything read?" and "did anyone close me?" after the
//! store has been handed off to a session.
//!
//! ✅ No network calls. No disk I/O. Just vibes and heap memory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::trace;

use crate::backends::ObjectStore;
use crate::errors::PeekError;
use crate::resource::ResourcePath;
use crate::session::SessionConfig;

/// 📡 Shared view into an `InMemoryStore`'s life story. Clone it before giving the store away.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreStats {
    reads: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl InMemoryStoreStats {
    /// 📖 How many `get_object` calls reached the store.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// 🗑️ How many times `close` actually released something (idempotent calls don't count).
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// 📦 A bucket that never forgets. Unless the process exits. Then it forgets everything.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: HashMap<(String, String), Vec<u8>>,
    denied: HashSet<(String, String)>,
    required_credentials: Option<(String, String)>,
    stats: InMemoryStoreStats,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 📥 Put an object in the pretend bucket.
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), bytes.into());
        self
    }

    /// 🔒 Make reads of this object fail with `AccessDenied`, whether or not it exists.
    pub fn deny(mut self, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        self.denied.insert((bucket.into(), key.into()));
        self
    }

    /// 🔑 Only accept sessions configured with exactly this access/secret key pair.
    pub fn require_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.required_credentials = Some((access_key.into(), secret_key.into()));
        self
    }

    pub fn stats(&self) -> InMemoryStoreStats {
        self.stats.clone()
    }

    fn has_bucket(&self, bucket: &str) -> bool {
        self.objects.keys().any(|(b, _)| b == bucket)
            || self.denied.iter().any(|(b, _)| b == bucket)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn probe(&self, config: &SessionConfig) -> Result<(), PeekError> {
        match &self.required_credentials {
            Some((access_key, secret_key))
                if *access_key != config.access_key || *secret_key != config.secret_key =>
            {
                Err(PeekError::connection(
                    "the in-memory store rejected the access key / secret key pair",
                ))
            }
            _ => Ok(()),
        }
    }

    async fn get_object(&self, path: &ResourcePath) -> Result<Vec<u8>, PeekError> {
        if self.stats.is_closed() {
            return Err(PeekError::connection("in-memory store is closed"));
        }
        self.stats.reads.fetch_add(1, Ordering::SeqCst);

        let the_address = (path.bucket().to_string(), path.key().to_string());
        if self.denied.contains(&the_address) {
            return Err(PeekError::AccessDenied {
                path: path.to_string(),
                reason: "denied by the in-memory store".to_string(),
            });
        }
        if !self.has_bucket(path.bucket()) {
            return Err(PeekError::NotFound {
                path: path.to_string(),
            });
        }

        let the_bytes = self
            .objects
            .get(&the_address)
            .cloned()
            .ok_or_else(|| PeekError::NotFound {
                path: path.to_string(),
            })?;
        trace!("🧠 served {} bytes of {} straight from RAM", the_bytes.len(), path);
        Ok(the_bytes)
    }

    fn close(&mut self) -> Result<(), PeekError> {
        // -- 🔁 swap returns the old value: only the first close counts
        if !self.stats.closed.swap(true, Ordering::SeqCst) {
            self.stats.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
