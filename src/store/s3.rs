//! S3 Object Store Implementation
//!
//! Production backend built on `aws-sdk-s3`.
//!
//! Supports:
//! - AWS S3
//! - S3-compatible services (MinIO, LocalStack, etc.)
//! - Custom endpoints (path-style addressing)
//!
//! Keys are passed through exactly as S3 returns them, so directory markers
//! keep their trailing `/` and keys with empty segments stay addressable.
//! Credentials come from the standard AWS provider chain.

use super::{ListPage, ObjectStore};
use crate::config::S3Config;
use crate::partition::DELIMITER;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use std::future::Future;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::pin::Pin;

// ListObjectsV2 rejects larger values
const MAX_KEYS_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Connect to `bucket` using the region and optional endpoint in `config`
    pub async fn new(bucket: &str, config: &S3Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        Self::from_client(Self::build_client(builder, config), bucket)
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, bucket: &str) -> Self {
        S3ObjectStore {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// Apply endpoint and retry settings. Retries are off: a failed object is
    /// reported and picked up by the next run.
    fn build_client(builder: aws_sdk_s3::config::Builder, config: &S3Config) -> Client {
        let mut builder = builder.retry_config(RetryConfig::disabled());

        // Use custom endpoint for S3-compatible services (MinIO)
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Client::from_conf(builder.build())
    }

    /// `x-amz-copy-source` value: bucket and key, URL-encoded per segment
    fn copy_source(&self, key: &str) -> String {
        let encoded: Vec<_> = key.split(DELIMITER).map(urlencoding::encode).collect();
        format!("{}/{}", self.bucket, encoded.join(DELIMITER))
    }

    /// Convert SDK errors to IoError
    fn map_error<E, R>(operation: &str, key: &str, err: SdkError<E, R>) -> IoError
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug,
    {
        let kind = match err.code() {
            Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket") => ErrorKind::NotFound,
            Some("AccessDenied") => ErrorKind::PermissionDenied,
            _ => ErrorKind::Other,
        };
        IoError::new(
            kind,
            format!("{} {}: {}", operation, key, DisplayErrorContext(&err)),
        )
    }
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .finish()
    }
}

impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The cursor is the opaque continuation token from the previous page
    fn list_page<'a>(
        &'a self,
        cursor: Option<&'a str>,
        page_size: usize,
    ) -> Pin<Box<dyn Future<Output = IoResult<ListPage>> + Send + 'a>> {
        Box::pin(async move {
            let max_keys = page_size.clamp(1, MAX_KEYS_LIMIT) as i32;
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(max_keys)
                .set_continuation_token(cursor.map(str::to_string))
                .send()
                .await
                .map_err(|e| Self::map_error("ListObjectsV2", &self.bucket, e))?;

            let keys = output
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .map(str::to_string)
                .collect();

            Ok(ListPage {
                keys,
                next_cursor: output.next_continuation_token().map(str::to_string),
                has_more: output.is_truncated().unwrap_or(false),
            })
        })
    }

    fn copy<'a>(
        &'a self,
        from: &'a str,
        to: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            self.client
                .copy_object()
                .bucket(&self.bucket)
                .copy_source(self.copy_source(from))
                .key(to)
                .send()
                .await
                .map_err(|e| Self::map_error("CopyObject", from, e))?;
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = IoResult<()>> + Send + 'a>> {
        Box::pin(async move {
            // S3 delete is idempotent - ignore not found errors
            match self
                .client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                Ok(_) => Ok(()),
                Err(e) => match Self::map_error("DeleteObject", key, e) {
                    e if e.kind() == ErrorKind::NotFound => Ok(()),
                    e => Err(e),
                },
            }
        })
    }
}
