//! 🎬 *[camera pans across a dimly lit docker network]*
//! 🎬 "In a world where every read needs a connection..."
//! 🎬 "One session dared to open, read once, and close on every exit path."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The session: owns the immutable connection config and the one storage backend built from
//! it. Opening it is the handshake (`probe`), stopping it releases the backend. `stop` is
//! idempotent, and `Drop` catches the sessions nobody remembered to stop (panics, early returns
//! in someone else's code) and releases them with a warning.
//!
//! 🧠 Knowledge graph:
//! - `SessionConfig`: the `[session]` section. Defaults mirror the MinIO docker-compose setup.
//! - `FilesystemImpl`: which adapter handles `s3a://`. `s3a` → `S3Store`, `local` → `LocalStore`.
//! - `AuthMode` + `authorization_enabled`: strict Kerberos-style auth is refused up front.
//! - `Session::open` → build backend → probe → live. `Session::stop` → close backend → done.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::backends::{LocalStore, ObjectStore, S3Store, StoreBackend};
use crate::errors::PeekError;

/// 🗂️ Which storage adapter answers for the `s3a` scheme.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilesystemImpl {
    /// 🪣 The AWS SDK connector. The Hadoop class name is accepted for old configs' sake.
    #[default]
    #[serde(rename = "s3a", alias = "org.apache.hadoop.fs.s3a.S3AFileSystem")]
    S3a,
    /// 📂 `<local_root>/<bucket>/<key>` on disk.
    #[serde(rename = "local", alias = "org.apache.hadoop.fs.LocalFileSystem")]
    Local,
}

/// 🔐 Authentication mode for the store connection. Only the relaxed ones are supported.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    #[serde(alias = "NOSASL")]
    Nosasl,
    #[serde(alias = "SIMPLE")]
    Simple,
    #[serde(alias = "KERBEROS")]
    Kerberos,
}

/// 🔧 The `[session]` section. Assembled completely before the session exists, then frozen
/// inside it.
#[derive(Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style_access: bool,
    pub filesystem_impl: FilesystemImpl,
    pub auth_mode: AuthMode,
    pub authorization_enabled: bool,
    pub region: String,
    /// 📂 Required when `filesystem_impl = "local"`, ignored otherwise.
    pub local_root: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            access_key: "minio".to_string(),
            secret_key: "minio123".to_string(),
            path_style_access: true,
            filesystem_impl: FilesystemImpl::S3a,
            auth_mode: AuthMode::Nosasl,
            authorization_enabled: false,
            region: "us-east-1".to_string(),
            local_root: None,
        }
    }
}

// 🤐 hand-written so the secret key never lands in a log line
impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("path_style_access", &self.path_style_access)
            .field("filesystem_impl", &self.filesystem_impl)
            .field("auth_mode", &self.auth_mode)
            .field("authorization_enabled", &self.authorization_enabled)
            .field("region", &self.region)
            .field("local_root", &self.local_root)
            .finish()
    }
}

impl SessionConfig {
    /// ✅ Refuse settings the connector cannot honor, before anything touches the network.
    pub fn validate(&self) -> Result<(), PeekError> {
        if self.auth_mode == AuthMode::Kerberos {
            return Err(PeekError::connection(
                "auth_mode = kerberos is not supported by the object-store connector; use nosasl or simple",
            ));
        }
        if self.authorization_enabled {
            return Err(PeekError::connection(
                "authorization_enabled = true is not supported by the object-store connector",
            ));
        }
        if self.region.trim().is_empty() {
            return Err(PeekError::connection("region must not be empty"));
        }
        if self.filesystem_impl == FilesystemImpl::Local && self.local_root.is_none() {
            return Err(PeekError::connection(
                "filesystem_impl = local needs local_root to point at a directory",
            ));
        }
        Ok(())
    }
}

/// 🎟️ A live connection to one object store. Read from it, then `stop` it.
#[derive(Debug)]
pub struct Session {
    app_name: String,
    config: SessionConfig,
    store: StoreBackend,
    stopped: bool,
}

impl Session {
    /// 🚀 Build the backend `filesystem_impl` asks for, shake hands with it, hand back a session.
    pub async fn open(app_name: &str, config: SessionConfig) -> Result<Self, PeekError> {
        config.validate()?;
        let the_store = match config.filesystem_impl {
            FilesystemImpl::S3a => StoreBackend::S3(S3Store::connect(&config).await?),
            FilesystemImpl::Local => {
                // -- validate() already insisted local_root is Some
                let the_root = config
                    .local_root
                    .clone()
                    .ok_or_else(|| PeekError::connection("local_root missing"))?;
                StoreBackend::Local(LocalStore::new(the_root))
            }
        };
        Self::with_store(app_name, config, the_store).await
    }

    /// 🔌 Open a session over a backend someone already built (an `InMemoryStore`, usually).
    pub async fn with_store(
        app_name: &str,
        config: SessionConfig,
        store: StoreBackend,
    ) -> Result<Self, PeekError> {
        config.validate()?;
        info!("🎬 opening session '{}' over the {} store", app_name, store.kind());
        debug!("🔧 session config: {:?}", config);

        let mut the_store = store;
        if let Err(err) = the_store.probe(&config).await {
            // -- 🧹 the session never existed, but the backend did. tidy up before leaving.
            let _ = the_store.close();
            return Err(err);
        }

        Ok(Self {
            app_name: app_name.to_string(),
            config,
            store: the_store,
            stopped: false,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        !self.stopped
    }

    /// 🚰 The backend, as long as the session is still alive.
    pub(crate) fn store(&self) -> Result<&StoreBackend, PeekError> {
        if self.stopped {
            return Err(PeekError::connection(format!(
                "session '{}' is stopped",
                self.app_name
            )));
        }
        Ok(&self.store)
    }

    /// 🗑️ Release everything. Safe to call more than once; only the first call does anything.
    pub fn stop(&mut self) -> Result<(), PeekError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.store.close()?;
        info!("🏁 session '{}' stopped", self.app_name);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.stopped {
            warn!(
                "⚠️ session '{}' dropped without stop(); releasing it now",
                self.app_name
            );
            if let Err(err) = self.stop() {
                warn!("💀 releasing session '{}' failed: {}", self.app_name, err);
            }
        }
    }
}
