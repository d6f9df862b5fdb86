//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The bucket was a directory all along. `<local_root>/<bucket>/<key>`, exactly the way MinIO
//! lays objects out on disk in filesystem mode. This backend reads from that layout with async
//! tokio I/O, so a laptop with a copy of the data can preview it without running an object store.
//!
//! 💀 Disk full → not our problem, we only read. 🦆

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::backends::ObjectStore;
use crate::errors::PeekError;
use crate::resource::ResourcePath;
use crate::session::SessionConfig;

/// 📂 A directory pretending to be an object store. Very convincingly.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    closed: bool,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            closed: false,
        }
    }

    /// 🧭 Map `bucket/key` onto the root. Keys that try to climb out with `..` are refused.
    fn object_path(&self, path: &ResourcePath) -> Result<PathBuf, PeekError> {
        let the_relative = Path::new(path.bucket()).join(path.key());
        let escapes = the_relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(PeekError::AccessDenied {
                path: path.to_string(),
                reason: "key escapes the local root".to_string(),
            });
        }
        Ok(self.root.join(the_relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn probe(&self, _config: &SessionConfig) -> Result<(), PeekError> {
        let the_metadata = tokio::fs::metadata(&self.root).await.map_err(|e| {
            PeekError::connection(format!(
                "local root '{}' is not reachable: {e}",
                self.root.display()
            ))
        })?;
        if !the_metadata.is_dir() {
            return Err(PeekError::connection(format!(
                "local root '{}' is not a directory",
                self.root.display()
            )));
        }
        debug!("📂 local store rooted at '{}' is open for business", self.root.display());
        Ok(())
    }

    async fn get_object(&self, path: &ResourcePath) -> Result<Vec<u8>, PeekError> {
        if self.closed {
            return Err(PeekError::connection("local store is closed"));
        }
        let the_file = self.object_path(path)?;
        let the_bytes = tokio::fs::read(&the_file)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PeekError::NotFound {
                    path: path.to_string(),
                },
                ErrorKind::PermissionDenied => PeekError::AccessDenied {
                    path: path.to_string(),
                    reason: e.to_string(),
                },
                _ => PeekError::Storage {
                    path: path.to_string(),
                    reason: format!("{}: {e}", the_file.display()),
                },
            })?;
        trace!("📖 hauled {} bytes out of '{}'", the_bytes.len(), the_file.display());
        Ok(the_bytes)
    }

    fn close(&mut self) -> Result<(), PeekError> {
        self.closed = true;
        Ok(())
    }
}
