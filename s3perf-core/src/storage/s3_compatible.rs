use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use secrecy::{ExposeSecret, SecretString};

use super::{ListedObject, ObjectStorage, StorageResult};
use crate::error::StorageError;

/// S3 rejects page sizes above this.
const MAX_PAGE_SIZE: usize = 1000;

/// Connection settings for an [`S3CompatibleStorage`].
#[derive(Debug)]
pub struct S3CompatibleConfig {
    /// Endpoint URL, such as `http://localhost:9000`.
    pub endpoint: String,
    /// Signing region.
    pub region: String,
    pub access_key: String,
    pub secret_key: SecretString,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`.
    pub path_style: bool,
    pub request_timeout: Option<Duration>,
}

/// Object storage backed by any S3-compatible endpoint.
pub struct S3CompatibleStorage {
    region: Region,
    credentials: Credentials,
    path_style: bool,
    request_timeout: Option<Duration>,
    /// Bucket handles are reused so that every request of a run shares one HTTP client.
    buckets: Mutex<HashMap<String, Box<Bucket>>>,
}

impl S3CompatibleStorage {
    /// Creates a new backend talking to the configured endpoint.
    pub fn new(config: S3CompatibleConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.expose_secret()),
            None,
            None,
            None,
        )
        .map_err(|cause| StorageError::Generic {
            context: "invalid credentials".into(),
            cause: Box::new(cause),
        })?;

        let region = Region::Custom {
            region: config.region,
            endpoint: config.endpoint,
        };

        Ok(Self {
            region,
            credentials,
            path_style: config.path_style,
            request_timeout: config.request_timeout,
            buckets: Mutex::new(HashMap::new()),
        })
    }

    fn bucket(&self, name: &str) -> StorageResult<Box<Bucket>> {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(bucket) = buckets.get(name) {
            return Ok(bucket.clone());
        }

        let mut bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(StorageError::s3(format!("failed to configure bucket `{name}`")))?;
        if self.path_style {
            bucket = bucket.with_path_style();
        }
        if let Some(timeout) = self.request_timeout {
            bucket = bucket
                .with_request_timeout(timeout)
                .map_err(StorageError::s3("failed to set request timeout"))?;
        }

        buckets.insert(name.to_owned(), bucket.clone());
        Ok(bucket)
    }
}

impl fmt::Debug for S3CompatibleStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3CompatibleStorage")
            .field("endpoint", &self.region.endpoint())
            .field("path_style", &self.path_style)
            .finish_non_exhaustive()
    }
}

fn ensure_success(context: impl FnOnce() -> String, status: u16) -> StorageResult<()> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::UnexpectedStatus {
            context: context(),
            status,
        })
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3CompatibleStorage {
    fn name(&self) -> &'static str {
        "s3-compatible"
    }

    #[tracing::instrument(level = "trace", fields(%bucket), skip_all)]
    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let handle = self.bucket(bucket)?;
        handle
            .exists()
            .await
            .map_err(StorageError::s3(format!("failed to check bucket `{bucket}`")))
    }

    #[tracing::instrument(level = "trace", fields(%bucket), skip_all)]
    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        tracing::debug!("Creating bucket");
        let config = BucketConfiguration::default();
        let region = self.region.clone();
        let credentials = self.credentials.clone();

        let response = if self.path_style {
            Bucket::create_with_path_style(bucket, region, credentials, config).await
        } else {
            Bucket::create(bucket, region, credentials, config).await
        }
        .map_err(StorageError::s3(format!("failed to create bucket `{bucket}`")))?;

        ensure_success(
            || format!("failed to create bucket `{bucket}`"),
            response.response_code,
        )
    }

    #[tracing::instrument(level = "trace", fields(%bucket, %name), skip_all)]
    async fn put(&self, bucket: &str, name: &str, payload: Bytes) -> StorageResult<()> {
        let response = self
            .bucket(bucket)?
            .put_object(name, &payload)
            .await
            .map_err(StorageError::s3(format!("failed to put `{name}`")))?;

        ensure_success(|| format!("failed to put `{name}`"), response.status_code())
    }

    #[tracing::instrument(level = "trace", fields(%bucket, %name), skip_all)]
    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes> {
        let response = self
            .bucket(bucket)?
            .get_object(name)
            .await
            .map_err(StorageError::s3(format!("failed to get `{name}`")))?;

        ensure_success(|| format!("failed to get `{name}`"), response.status_code())?;
        Ok(Bytes::from(response.to_vec()))
    }

    #[tracing::instrument(level = "trace", fields(%bucket, %max_keys), skip_all)]
    async fn list(&self, bucket: &str, max_keys: usize) -> StorageResult<Vec<ListedObject>> {
        let handle = self.bucket(bucket)?;
        let mut objects = Vec::new();
        let mut continuation_token = None;

        while objects.len() < max_keys {
            let page_size = (max_keys - objects.len()).min(MAX_PAGE_SIZE);
            let (page, status) = handle
                .list_page(String::new(), None, continuation_token, None, Some(page_size))
                .await
                .map_err(StorageError::s3(format!("failed to list bucket `{bucket}`")))?;
            ensure_success(|| format!("failed to list bucket `{bucket}`"), status)?;

            let remaining = max_keys - objects.len();
            objects.extend(page.contents.into_iter().take(remaining).map(|object| {
                ListedObject {
                    name: object.key,
                    size: object.size,
                }
            }));

            match page.next_continuation_token {
                Some(token) if page.is_truncated => continuation_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = objects.len(), "Listed objects");
        Ok(objects)
    }
}
