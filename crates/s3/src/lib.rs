//! Amazon S3 object-storage client for artifetch.
//!
//! Credentials come from the `aws` record when both keys are present and
//! from the default AWS provider chain (environment, profile, instance
//! metadata) otherwise. Setting `endpoint_url` targets an S3-compatible
//! store with path-style addressing.

use artifetch_engine::config::StorageConfig;
use artifetch_engine::storage::{ObjectStorageClient, StorageConnector, StoredObject};
use artifetch_engine::stream::ByteSource;
use artifetch_engine::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Provider name reported for credentials taken from the `aws` record.
const STATIC_PROVIDER: &str = "artifetch-config";

/// Connects [`S3Storage`] clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Connector;

impl S3Connector {
    /// Create a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageConnector for S3Connector {
    async fn connect(
        &self,
        config: &StorageConfig,
        region: &str,
    ) -> Result<Arc<dyn ObjectStorageClient>> {
        Ok(Arc::new(S3Storage::connect(config, region).await))
    }
}

/// An S3 client bound to one region.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Build a client for `region` from `config`.
    pub async fn connect(config: &StorageConfig, region: &str) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        if let Some((access_key_id, secret_access_key)) = config.static_credentials() {
            debug!(region, "Using configured S3 credentials");
            loader = loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                STATIC_PROVIDER,
            ));
        } else {
            debug!(region, "Using ambient S3 credentials");
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder
                .endpoint_url(endpoint.as_str().trim_end_matches('/'))
                .force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ObjectStorageClient for S3Storage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service))
                if service.err().is_not_found() || service.raw().status().as_u16() == 404 =>
            {
                debug!(bucket, "Bucket not found");
                Ok(false)
            }
            Err(e) => Err(Error::transfer(bucket, e)),
        }
    }

    async fn object(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>> {
        let context = format!("{bucket}/{key}");
        match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => Ok(Some(StoredObject {
                content_length: output.content_length().and_then(|n| u64::try_from(n).ok()),
                body: Box::new(ObjectBody {
                    context,
                    body: output.body,
                }),
            })),
            Err(SdkError::ServiceError(service)) if service.err().is_no_such_key() => {
                debug!(bucket, key, "Object not found");
                Ok(None)
            }
            Err(e) => Err(Error::transfer(context, e)),
        }
    }
}

struct ObjectBody {
    context: String,
    body: ByteStream,
}

#[async_trait]
impl ByteSource for ObjectBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        self.body
            .next()
            .await
            .transpose()
            .map_err(|e| Error::transfer(self.context.as_str(), e))
    }
}
