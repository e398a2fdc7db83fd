use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::ObjectStore;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;

use archive_api::{
    SegmentId, SegmentStore, StorageError, normalize_prefix, parse_segment_name, partition_prefix,
};

/// Сегменты в Google Cloud Storage.
///
/// Service account берётся из `GOOGLE_SERVICE_ACCOUNT`. `latest` обходит
/// весь каталог partition'а, включая вложенные "папки".
pub struct GcsStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl GcsStore {
    pub fn new(bucket: &str, prefix: &str) -> Result<Self, StorageError> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::Config(format!("GCS bucket '{bucket}': {e}")))?;
        Ok(Self::with_store(bucket, prefix, Arc::new(store)))
    }

    pub fn with_store(bucket: &str, prefix: &str, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl SegmentStore for GcsStore {
    fn save(
        &self,
        segment: &SegmentId,
        content: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let key = segment.key(&self.prefix);
        Box::pin(async move {
            let bytes = content.len();
            self.store
                .put(&ObjectPath::from(key.as_str()), content.into())
                .await
                .map_err(|e| StorageError::Io(format!("GCS put {key}: {e}")))?;
            tracing::debug!(bucket = %self.bucket, key = %key, bytes, "gcs: object stored");
            Ok(())
        })
    }

    fn latest(
        &self,
        topic: &str,
        partition: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u64, StorageError>> + Send + '_>> {
        let dir = ObjectPath::from(partition_prefix(&self.prefix, topic, partition).as_str());
        Box::pin(async move {
            let objects: Vec<_> = match self.store.list(Some(&dir)).try_collect().await {
                Ok(objects) => objects,
                Err(object_store::Error::NotFound { .. }) => return Ok(0),
                Err(e) => return Err(StorageError::Io(format!("GCS list {dir}: {e}"))),
            };
            Ok(objects
                .iter()
                .filter_map(|meta| meta.location.filename().and_then(parse_segment_name))
                .map(|(_, end)| end)
                .max()
                .unwrap_or(0))
        })
    }
}
