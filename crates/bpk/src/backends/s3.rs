// ai
//! 🪣📡 S3 Store: the AWS SDK, pointed at whatever speaks S3. MinIO, Ceph, the real AWS,
//! a wiremock server pretending very hard.
//!
//! COLD OPEN. INT. DOCKER COMPOSE NETWORK. NIGHT.
//! A MinIO container hums at `http://minio:9000`. It holds one bucket. The bucket holds one CSV.
//! Nobody has looked at it in weeks. Tonight, someone will look at ten rows of it.
//!
//! 🧠 Knowledge graph:
//! - Client built from explicit session config: static credentials, custom endpoint, region,
//!   `force_path_style` (buckets in the URL path, the way MinIO likes it), retries disabled.
//! - `probe` = `ListBuckets`. Unreachable endpoint or rejected credentials → `ConnectionConfig`.
//!   An `AccessDenied` here just means the user can't list buckets, which proves the
//!   credentials themselves were accepted.
//! - `get_object` = `GetObject` → `ByteStream::collect()` → bytes. Errors are sorted into
//!   `NotFound` / `AccessDenied` / `Storage` by S3 error code, then HTTP status as a fallback.
//! - `close` drops the client, and with it the connection pool. Twice is fine.

use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tracing::{debug, info, trace, warn};

use crate::backends::ObjectStore;
use crate::errors::PeekError;
use crate::resource::ResourcePath;
use crate::session::SessionConfig;

// -- 🏷️ shows up in SDK debug logs next to the credentials, so you know who to blame
const CREDENTIALS_PROVIDER_NAME: &str = "bpk-session-config";

/// 🗂️ What kind of bad day the SDK is having.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum S3Failure {
    Connection,
    BadCredentials,
    Missing,
    Denied,
    Other,
}

/// 🕵️ Sort an SDK error into a bucket of misery. Error code first, HTTP status second, because
/// HEAD-style responses and some gateways only give us the status.
fn classify<E>(err: &SdkError<E>) -> S3Failure
where
    E: ProvideErrorMetadata,
{
    if matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ConstructionFailure(_)
    ) {
        return S3Failure::Connection;
    }

    let the_code = err.as_service_error().and_then(|e| e.code());
    let the_status = err.raw_response().map(|r| r.status().as_u16());
    trace!("🕵️ S3 said code={:?} status={:?}", the_code, the_status);

    match (the_code, the_status) {
        (
            Some(
                "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "InvalidToken" | "ExpiredToken",
            ),
            _,
        ) => S3Failure::BadCredentials,
        (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, Some(404)) => {
            S3Failure::Missing
        }
        (Some("AccessDenied" | "AllAccessDisabled"), _) | (_, Some(403)) => S3Failure::Denied,
        _ => S3Failure::Other,
    }
}

/// 🪣 The S3 connector. Holds one SDK client until the session says goodbye.
pub struct S3Store {
    client: Option<aws_sdk_s3::Client>,
    endpoint: String,
}

// 🐛 Debug skips the client: it is large, mostly opaque, and carries credentials somewhere inside.
impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("endpoint", &self.endpoint)
            .field("open", &self.client.is_some())
            .finish()
    }
}

impl S3Store {
    /// 🚀 Assemble an SDK client from the session config. No network traffic happens here;
    /// that is `probe`'s job.
    pub async fn connect(config: &SessionConfig) -> Result<Self, PeekError> {
        let the_endpoint = config.endpoint.trim().to_string();
        if !(the_endpoint.starts_with("http://") || the_endpoint.starts_with("https://")) {
            return Err(PeekError::connection(format!(
                "endpoint '{the_endpoint}' must start with http:// or https://"
            )));
        }
        if config.access_key.is_empty() || config.secret_key.is_empty() {
            return Err(PeekError::connection(
                "access_key and secret_key must both be set for the s3a filesystem",
            ));
        }

        let the_credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        // 🔧 Built from the S3 config builder alone, so no shared AWS config (env, profile files,
        // IMDS) is consulted. Whatever is not set here keeps the SDK's built-in default.
        let the_s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(the_endpoint.clone())
            .region(Region::new(config.region.clone()))
            .credentials_provider(the_credentials)
            .retry_config(RetryConfig::disabled())
            .force_path_style(config.path_style_access)
            .build();

        info!(
            "🪣 S3 client assembled for {} (region {}, path-style {})",
            the_endpoint, config.region, config.path_style_access
        );

        Ok(Self {
            client: Some(aws_sdk_s3::Client::from_conf(the_s3_config)),
            endpoint: the_endpoint,
        })
    }

    fn client(&self) -> Result<&aws_sdk_s3::Client, PeekError> {
        self.client
            .as_ref()
            .ok_or_else(|| PeekError::connection("S3 client already released"))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn probe(&self, _config: &SessionConfig) -> Result<(), PeekError> {
        let the_client = self.client()?;
        match the_client.list_buckets().send().await {
            Ok(the_listing) => {
                debug!(
                    "✅ {} answered ListBuckets with {} bucket(s)",
                    self.endpoint,
                    the_listing.buckets().len()
                );
                Ok(())
            }
            Err(err) => match classify(&err) {
                S3Failure::Denied => {
                    // -- 🔑 credentials accepted, listing not allowed. good enough to proceed.
                    warn!(
                        "⚠️ {} refused ListBuckets; credentials were accepted, continuing",
                        self.endpoint
                    );
                    Ok(())
                }
                S3Failure::BadCredentials => Err(PeekError::connection(format!(
                    "{} rejected the credentials: {}",
                    self.endpoint,
                    DisplayErrorContext(&err)
                ))),
                _ => Err(PeekError::connection(format!(
                    "could not reach object store at {}: {}",
                    self.endpoint,
                    DisplayErrorContext(&err)
                ))),
            },
        }
    }

    async fn get_object(&self, path: &ResourcePath) -> Result<Vec<u8>, PeekError> {
        let the_client = self.client()?;
        debug!("📡 GetObject {}", path);

        let the_response = the_client
            .get_object()
            .bucket(path.bucket())
            .key(path.key())
            .send()
            .await
            .map_err(|err| {
                let the_detail = DisplayErrorContext(&err).to_string();
                match classify(&err) {
                    S3Failure::Missing => PeekError::NotFound {
                        path: path.to_string(),
                    },
                    S3Failure::Denied => PeekError::AccessDenied {
                        path: path.to_string(),
                        reason: the_detail,
                    },
                    S3Failure::Connection | S3Failure::BadCredentials => {
                        PeekError::connection(format!("{path}: {the_detail}"))
                    }
                    S3Failure::Other => PeekError::Storage {
                        path: path.to_string(),
                        reason: the_detail,
                    },
                }
            })?;

        let the_bytes = the_response
            .body
            .collect()
            .await
            .map_err(|err| PeekError::Storage {
                path: path.to_string(),
                reason: format!("stream broke mid-read: {err}"),
            })?
            .into_bytes();

        trace!("🪣 hauled {} bytes from {}", the_bytes.len(), path);
        Ok(the_bytes.to_vec())
    }

    fn close(&mut self) -> Result<(), PeekError> {
        if self.client.take().is_some() {
            debug!("🗑️ S3 client for {} released", self.endpoint);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const EMPTY_BUCKET_LISTING: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Owner><ID>minio</ID><DisplayName>minio</DisplayName></Owner><Buckets></Buckets></ListAllMyBucketsResult>"#;

    fn s3_error_xml(code: &str, message: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>{code}</Code><Message>{message}</Message><RequestId>test</RequestId></Error>"#
        )
    }

    fn config_for(server: &MockServer) -> SessionConfig {
        SessionConfig {
            endpoint: server.uri(),
            ..SessionConfig::default()
        }
    }

    fn the_world_bank_path() -> ResourcePath {
        ResourcePath::new("s3a", "shared-prosperity-data", "WB_SHP.csv")
            .expect("💀 the canonical path should validate")
    }

    async fn a_cooperative_minio() -> MockServer {
        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(EMPTY_BUCKET_LISTING, "application/xml"),
            )
            .mount(&the_server)
            .await;
        the_server
    }

    #[tokio::test]
    async fn the_one_where_path_style_get_object_brings_home_the_bytes() {
        let the_server = a_cooperative_minio().await;
        Mock::given(method("GET"))
            .and(path("/shared-prosperity-data/WB_SHP.csv"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes("Country,Year,Value\nUSA,2020,1.5\n"),
            )
            .mount(&the_server)
            .await;

        let the_config = config_for(&the_server);
        let the_store = S3Store::connect(&the_config)
            .await
            .expect("💀 client assembly should not touch the network");
        the_store
            .probe(&the_config)
            .await
            .expect("💀 the fake MinIO said 200, the probe should agree");

        let the_bytes = the_store
            .get_object(&the_world_bank_path())
            .await
            .expect("💀 GetObject should have found the mock");
        assert_eq!(the_bytes, b"Country,Year,Value\nUSA,2020,1.5\n");
    }

    #[tokio::test]
    async fn the_one_where_no_such_key_means_not_found() {
        let the_server = a_cooperative_minio().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/shared-prosperity-data/.+"))
            .respond_with(ResponseTemplate::new(404).set_body_raw(
                s3_error_xml("NoSuchKey", "The specified key does not exist."),
                "application/xml",
            ))
            .mount(&the_server)
            .await;

        let the_store = S3Store::connect(&config_for(&the_server))
            .await
            .expect("💀 client assembly failed");
        let the_err = the_store
            .get_object(&the_world_bank_path())
            .await
            .expect_err("💀 a 404 should not be a success");
        assert!(matches!(the_err, PeekError::NotFound { .. }), "got {the_err:?}");
    }

    #[tokio::test]
    async fn the_one_where_access_denied_is_called_what_it_is() {
        let the_server = a_cooperative_minio().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/shared-prosperity-data/.+"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                s3_error_xml("AccessDenied", "Access Denied."),
                "application/xml",
            ))
            .mount(&the_server)
            .await;

        let the_store = S3Store::connect(&config_for(&the_server))
            .await
            .expect("💀 client assembly failed");
        let the_err = the_store
            .get_object(&the_world_bank_path())
            .await
            .expect_err("💀 a 403 should not be a success");
        assert!(matches!(the_err, PeekError::AccessDenied { .. }), "got {the_err:?}");
    }

    #[tokio::test]
    async fn the_one_where_an_internal_error_is_a_storage_problem() {
        let the_server = a_cooperative_minio().await;
        Mock::given(method("GET"))
            .and(path("/shared-prosperity-data/WB_SHP.csv"))
            .respond_with(ResponseTemplate::new(500).set_body_raw(
                s3_error_xml(
                    "InternalError",
                    "We encountered an internal error, please try again.",
                ),
                "application/xml",
            ))
            // -- 🔁 retries are off, so one request and done
            .expect(1)
            .mount(&the_server)
            .await;

        let the_store = S3Store::connect(&config_for(&the_server))
            .await
            .expect("💀 client assembly failed");
        let the_err = the_store
            .get_object(&the_world_bank_path())
            .await
            .expect_err("💀 a 500 should not be a success");
        match the_err {
            PeekError::Storage { path, reason } => {
                assert_eq!(path, "s3a://shared-prosperity-data/WB_SHP.csv");
                assert!(reason.contains("InternalError"), "got {reason}");
            }
            other => panic!("💀 expected Storage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn the_one_where_bad_credentials_fail_the_handshake_before_any_read() {
        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                s3_error_xml(
                    "InvalidAccessKeyId",
                    "The Access Key Id you provided does not exist in our records.",
                ),
                "application/xml",
            ))
            .mount(&the_server)
            .await;
        // -- 🚫 if anything tries to read an object, this mock makes the test fail on drop
        Mock::given(method("GET"))
            .and(path_regex(r"^/shared-prosperity-data/.*"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&the_server)
            .await;

        let the_config = config_for(&the_server);
        let the_store = S3Store::connect(&the_config)
            .await
            .expect("💀 client assembly failed");
        let the_err = the_store
            .probe(&the_config)
            .await
            .expect_err("💀 the fake MinIO rejected the key, the probe should too");
        assert!(the_err.is_connection(), "got {the_err:?}");
    }

    #[tokio::test]
    async fn the_one_where_listing_is_forbidden_but_the_keys_are_fine() {
        let the_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(403).set_body_raw(
                s3_error_xml("AccessDenied", "Access Denied."),
                "application/xml",
            ))
            .mount(&the_server)
            .await;

        let the_config = config_for(&the_server);
        let the_store = S3Store::connect(&the_config)
            .await
            .expect("💀 client assembly failed");
        the_store
            .probe(&the_config)
            .await
            .expect("💀 AccessDenied on ListBuckets still means the credentials were accepted");
    }

    #[tokio::test]
    async fn the_one_where_nobody_is_home_at_the_endpoint() {
        let the_config = SessionConfig {
            // -- 📡 port 1: the loneliest port on localhost
            endpoint: "http://127.0.0.1:1".to_string(),
            ..SessionConfig::default()
        };
        let the_store = S3Store::connect(&the_config)
            .await
            .expect("💀 client assembly should not need the network");
        let the_err = the_store
            .probe(&the_config)
            .await
            .expect_err("💀 nothing listens on port 1, the probe should fail");
        assert!(the_err.is_connection(), "got {the_err:?}");
    }

    #[tokio::test]
    async fn the_one_where_a_schemeless_endpoint_never_gets_a_client() {
        let the_config = SessionConfig {
            endpoint: "minio:9000".to_string(),
            ..SessionConfig::default()
        };
        let the_err = S3Store::connect(&the_config)
            .await
            .expect_err("💀 an endpoint without http:// should be rejected");
        assert!(the_err.is_connection());
    }

    #[tokio::test]
    async fn the_one_where_closing_releases_the_client_and_reads_stop() {
        let the_server = a_cooperative_minio().await;
        let mut the_store = S3Store::connect(&config_for(&the_server))
            .await
            .expect("💀 client assembly failed");

        the_store.close().expect("💀 first close");
        the_store.close().expect("💀 second close should be a no-op");

        let the_err = the_store
            .get_object(&the_world_bank_path())
            .await
            .expect_err("💀 a released client should not read");
        assert!(the_err.is_connection());
    }
}
