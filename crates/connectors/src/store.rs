use crate::error::ObjectStoreError;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    ClientOptions, ObjectStore, aws::AmazonS3Builder, local::LocalFileSystem,
    memory::InMemory, path::Path as ObjectPath, prefix::PrefixStore,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::debug;

/// Key-addressed binary storage used by the attachment and file exports.
#[async_trait]
pub trait ObjectSink: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

    /// Stores `bytes` under `key`, replacing any existing object.
    async fn put_bytes(&self, bytes: Bytes, key: &str) -> Result<(), ObjectStoreError>;
}

/// [`ObjectSink`] over any `object_store` backend.
#[derive(Debug, Clone)]
pub struct StoreSink {
    store: Arc<dyn ObjectStore>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        StoreSink { store }
    }

    /// Builds the backend named by `location` (see [`build_object_store`]).
    pub fn from_location(location: &str, timeout: Duration) -> Result<Self, ObjectStoreError> {
        Ok(StoreSink::new(build_object_store(location, timeout)?))
    }

    pub fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }
}

fn object_path(key: &str) -> Result<ObjectPath, ObjectStoreError> {
    ObjectPath::parse(key).map_err(|_| ObjectStoreError::InvalidKey(key.to_string()))
}

#[async_trait]
impl ObjectSink for StoreSink {
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        match self.store.head(&object_path(key)?).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_bytes(&self, bytes: Bytes, key: &str) -> Result<(), ObjectStoreError> {
        let size = bytes.len();
        self.store.put(&object_path(key)?, bytes.into()).await?;
        debug!(key, size, "Stored object");
        Ok(())
    }
}

/// Builds an object store from a location string.
///
/// - `s3://bucket[/prefix]`: S3 bucket; credentials and region come from the
///   standard `AWS_*` environment variables,
/// - `memory://`: process-local store,
/// - `file:///dir` or a plain path: local directory, created when missing.
pub fn build_object_store(
    location: &str,
    timeout: Duration,
) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
    let location = location.trim();

    if let Some(rest) = location.strip_prefix("s3://") {
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(ObjectStoreError::InvalidLocation(location.to_string()));
        }

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_client_options(ClientOptions::new().with_timeout(timeout))
            .build()?;
        return wrap_with_prefix(store, prefix);
    }

    if location.starts_with("memory://") {
        return Ok(Arc::new(InMemory::new()));
    }

    let dir = PathBuf::from(location.strip_prefix("file://").unwrap_or(location));
    if dir.as_os_str().is_empty() {
        return Err(ObjectStoreError::InvalidLocation(location.to_string()));
    }
    std::fs::create_dir_all(&dir)?;
    let store = LocalFileSystem::new_with_prefix(dir.canonicalize()?)?;
    Ok(Arc::new(store))
}

fn wrap_with_prefix<T: ObjectStore + 'static>(
    store: T,
    prefix: &str,
) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return Ok(Arc::new(store));
    }
    let prefix_path = object_path(prefix)?;
    Ok(Arc::new(PrefixStore::new(store, prefix_path)))
}
