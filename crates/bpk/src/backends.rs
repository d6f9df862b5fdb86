//! 🔌 Backends: where the bytes actually come from.
//!
//! 🪣 One trait, three ways to fetch an object: the S3 connector (the real deal), a local
//! directory laid out like a bucket (MinIO's filesystem mode, basically), and an in-memory map
//! for tests and for anyone embedding the library who already has the bytes.
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls (S3Store, LocalStore, InMemoryStore) → StoreBackend enum
//! - The session owns exactly one StoreBackend, the loader borrows it, the terminator closes it.
//! - Stores do NOT parse. They hand back raw bytes. The loader turns bytes into rows.
//!
//! 🦆 The duck is here because every file must have one. This is law. Do not question the duck.

use async_trait::async_trait;

use crate::errors::PeekError;
use crate::resource::ResourcePath;
use crate::session::SessionConfig;

pub(crate) mod in_mem;
pub(crate) mod local;
pub(crate) mod s3;

pub use in_mem::{InMemoryStore, InMemoryStoreStats};
pub use local::LocalStore;
pub use s3::S3Store;

/// 🚰 An object store the session can read from.
///
/// # Contract 📜
/// - `probe` is the connect-time handshake: endpoint reachable, credentials accepted. It runs
///   once, at session open, before any read.
/// - `get_object` returns the whole object or one of `NotFound` / `AccessDenied` / `Storage`.
/// - `close` releases connections and handles. Calling it twice is fine. Reading after it is not.
#[async_trait]
pub trait ObjectStore: std::fmt::Debug + Send + Sync {
    async fn probe(&self, config: &SessionConfig) -> Result<(), PeekError>;

    async fn get_object(&self, path: &ResourcePath) -> Result<Vec<u8>, PeekError>;

    fn close(&mut self) -> Result<(), PeekError>;
}

/// 🎭 The many faces of an object store, dispatched by enum so the session never has to care.
#[derive(Debug)]
pub enum StoreBackend {
    S3(S3Store),
    Local(LocalStore),
    InMemory(InMemoryStore),
}

#[async_trait]
impl ObjectStore for StoreBackend {
    async fn probe(&self, config: &SessionConfig) -> Result<(), PeekError> {
        match self {
            StoreBackend::S3(store) => store.probe(config).await,
            StoreBackend::Local(store) => store.probe(config).await,
            StoreBackend::InMemory(store) => store.probe(config).await,
        }
    }

    async fn get_object(&self, path: &ResourcePath) -> Result<Vec<u8>, PeekError> {
        match self {
            StoreBackend::S3(store) => store.get_object(path).await,
            StoreBackend::Local(store) => store.get_object(path).await,
            StoreBackend::InMemory(store) => store.get_object(path).await,
        }
    }

    fn close(&mut self) -> Result<(), PeekError> {
        match self {
            StoreBackend::S3(store) => store.close(),
            StoreBackend::Local(store) => store.close(),
            StoreBackend::InMemory(store) => store.close(),
        }
    }
}

impl StoreBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreBackend::S3(_) => "s3a",
            StoreBackend::Local(_) => "local",
            StoreBackend::InMemory(_) => "in_memory",
        }
    }
}
