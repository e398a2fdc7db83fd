use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;

use archive_api::{
    SegmentId, SegmentStore, StorageError, normalize_prefix, parse_segment_name, partition_prefix,
};

// ═══════════════════════════════════════════════════════════════
//  S3Store
// ═══════════════════════════════════════════════════════════════

/// Сегменты в S3-совместимом bucket'е.
///
/// Учётные данные и регион берутся из `AWS_*` окружения.
pub struct S3Store {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
}

impl S3Store {
    pub fn new(bucket: &str, prefix: &str) -> Result<Self, StorageError> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::Config(format!("S3 bucket '{bucket}': {e}")))?;
        Ok(Self::with_store(bucket, prefix, Arc::new(store)))
    }

    /// Поверх готового `ObjectStore` (например, `InMemory`).
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

fn storage_error(context: &str, e: object_store::Error) -> StorageError {
    match e {
        object_store::Error::NotFound { path, .. } => StorageError::NotFound(path),
        other => StorageError::Io(format!("{context}: {other}")),
    }
}

impl SegmentStore for S3Store {
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
                .map_err(|e| storage_error(&format!("S3 put {key}"), e))?;
            tracing::debug!(bucket = %self.bucket, key = %key, bytes, "s3: object stored");
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
            let objects: Vec<_> = self
                .store
                .list(Some(&dir))
                .try_collect()
                .await
                .map_err(|e| storage_error(&format!("S3 list {dir}"), e))?;

            let mut latest = 0;
            for meta in objects {
                match meta.location.filename().and_then(parse_segment_name) {
                    Some((_, end)) => latest = latest.max(end),
                    None => tracing::debug!(key = %meta.location, "s3: skipping non-segment object"),
                }
            }
            Ok(latest)
        })
    }
}
