//! 🧭 Resource paths: `s3a://bucket/key`, the GPS coordinates of one sad little CSV.
//!
//! 🧠 Knowledge graph:
//! - `ResourceConfig`: what the TOML says (scheme, bucket, key). Serde defaults point at the
//!   World Bank shared-prosperity dataset, because that is the file everyone came here for.
//! - `ResourcePath`: the validated form. Bucket and key non-empty, bucket slash-free, scheme one
//!   of the Hadoop S3 family. If you hold one, it renders to a URI that parses back to itself.

use std::fmt;

use serde::Deserialize;

use crate::errors::PeekError;

/// 🏷️ Schemes the S3 connector answers to. `s3a` is the one everyone uses; the other two are
/// the grandparents who still get invited to dinner.
const KNOWN_SCHEMES: [&str; 3] = ["s3a", "s3", "s3n"];

/// 🔧 The `[resource]` section: which object to load.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ResourceConfig {
    pub scheme: String,
    pub bucket: String,
    /// 🗝️ Object key. `file_name` works too, for people who think in files and not keys.
    #[serde(alias = "file_name")]
    pub key: String,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            scheme: "s3a".to_string(),
            bucket: "shared-prosperity-data".to_string(),
            key: "WB_SHP.csv".to_string(),
        }
    }
}

impl ResourceConfig {
    /// ✅ Validate the three loose strings into a `ResourcePath`.
    pub fn resolve(&self) -> Result<ResourcePath, PeekError> {
        ResourcePath::new(&self.scheme, &self.bucket, &self.key)
    }
}

/// 📍 A validated `scheme://bucket/key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    scheme: String,
    bucket: String,
    key: String,
}

impl ResourcePath {
    pub fn new(scheme: &str, bucket: &str, key: &str) -> Result<Self, PeekError> {
        let the_rendering = format!("{scheme}://{bucket}/{key}");
        let invalid = |reason: &str| PeekError::InvalidResourcePath {
            path: the_rendering.clone(),
            reason: reason.to_string(),
        };

        let scheme = scheme.to_ascii_lowercase();
        if !KNOWN_SCHEMES.contains(&scheme.as_str()) {
            return Err(invalid("scheme must be one of s3a, s3, s3n"));
        }
        if bucket.trim().is_empty() {
            return Err(invalid("bucket name is empty"));
        }
        if bucket.contains('/') {
            return Err(invalid("bucket name may not contain '/'"));
        }
        if bucket.chars().any(char::is_whitespace) {
            return Err(invalid("bucket name may not contain whitespace"));
        }
        // -- 🗝️ a leading slash would make `s3a://b//k`, which S3 reads as key "/k". nobody wants that.
        let key = key.trim_start_matches('/');
        if key.trim().is_empty() {
            return Err(invalid("object key is empty"));
        }

        Ok(Self {
            scheme,
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// 🔍 Parse `scheme://bucket/key`. Keys may contain further slashes; the bucket may not.
    pub fn parse(uri: &str) -> Result<Self, PeekError> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| PeekError::InvalidResourcePath {
                path: uri.to_string(),
                reason: "expected scheme://bucket/key".to_string(),
            })?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| PeekError::InvalidResourcePath {
                path: uri.to_string(),
                reason: "missing object key after the bucket".to_string(),
            })?;
        Self::new(scheme, bucket, key)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 🫁 Hadoop picks a codec from the extension. So do we, but we only know one.
    pub fn is_gzipped(&self) -> bool {
        self.key.to_ascii_lowercase().ends_with(".gz")
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}
