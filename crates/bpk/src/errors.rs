//! 💀 errors.rs: every way a peek into a bucket can go sideways, with a name tag on each.
//!
//! The library seams (session, backends, loader) hand these back as typed values so callers can
//! `match` on them. Once they cross into `run()` they ride inside `anyhow` like everything else.

use thiserror::Error;

/// 🏷️ The failure taxonomy of a bucketpeek run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeekError {
    /// 🔌 The session could not be established: unreachable endpoint, rejected credentials,
    /// an unusable config, or a session that was already stopped.
    #[error("💀 connection/config error: {reason}")]
    ConnectionConfig { reason: String },

    /// 🕳️ Bucket or object is not where the path says it is.
    #[error("💀 not found: {path}")]
    NotFound { path: String },

    /// 🔒 The object exists (probably) but these credentials may not read it.
    #[error("💀 access denied reading {path}: {reason}")]
    AccessDenied { path: String, reason: String },

    /// 📄 The bytes arrived, but they are not delimited text we can make rows out of.
    #[error("💀 could not parse {path} as CSV: {reason}")]
    Parse { path: String, reason: String },

    /// 🧭 Bucket, key, or scheme do not make a valid `scheme://bucket/key` URI.
    #[error("💀 invalid resource path '{path}': {reason}")]
    InvalidResourcePath { path: String, reason: String },

    /// 🌩️ The store failed in a way that is none of the above (stream died mid-read, 5xx, ...).
    #[error("💀 storage error reading {path}: {reason}")]
    Storage { path: String, reason: String },
}

impl PeekError {
    pub(crate) fn connection(reason: impl Into<String>) -> Self {
        Self::ConnectionConfig {
            reason: reason.into(),
        }
    }

    /// 🔎 Dig a `PeekError` out of an `anyhow` chain, wherever it ended up under the context layers.
    pub fn find(err: &anyhow::Error) -> Option<&PeekError> {
        err.chain().find_map(|cause| cause.downcast_ref::<PeekError>())
    }

    /// 📡 True when the failure smells like "the service isn't there".
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionConfig { .. })
    }
}
