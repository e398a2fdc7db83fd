use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::RwLock;

use archive_api::{
    SegmentId, SegmentStore, StorageError, normalize_prefix, parse_segment_name, partition_prefix,
};

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

/// In-memory хранилище сегментов. Ключи те же, что у облачных
/// бэкендов; для прогонов без внешних сервисов и для тестов.
pub struct MemoryStore {
    prefix: String,
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Все ключи в лексикографическом порядке.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).cloned()
    }

    /// Положить произвольный объект в обход формата сегментов.
    pub async fn insert(&self, key: &str, content: Bytes) {
        self.objects.write().await.insert(key.to_string(), content);
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("")
    }
}

impl SegmentStore for MemoryStore {
    fn save(
        &self,
        segment: &SegmentId,
        content: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>> {
        let key = segment.key(&self.prefix);
        Box::pin(async move {
            tracing::debug!(key = %key, bytes = content.len(), "memory: save");
            self.objects.write().await.insert(key, content);
            Ok(())
        })
    }

    fn latest(
        &self,
        topic: &str,
        partition: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u64, StorageError>> + Send + '_>> {
        let dir = partition_prefix(&self.prefix, topic, partition);
        Box::pin(async move {
            let objects = self.objects.read().await;
            let latest = objects
                .range(dir.clone()..)
                .map(|(key, _)| key)
                .take_while(|key| key.starts_with(&dir))
                .filter_map(|key| parse_segment_name(key))
                .map(|(_, end)| end)
                .max()
                .unwrap_or(0);
            Ok(latest)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(topic: &str, partition: u32, start: u64, end: u64) -> SegmentId {
        SegmentId {
            topic: topic.to_string(),
            partition,
            start,
            end,
        }
    }

    #[tokio::test]
    async fn latest_is_zero_without_segments() {
        let store = MemoryStore::new("archive");
        assert_eq!(store.latest("usage", 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn save_uses_prefixed_key() {
        let store = MemoryStore::new("archive");
        store
            .save(&seg("usage", 0, 0, 99), Bytes::from_static(b"xz"))
            .await
            .unwrap();
        assert_eq!(
            store.keys().await,
            vec!["archive/usage/0/000000000000-000000000099.json.xz".to_string()]
        );
        assert_eq!(
            store
                .get("archive/usage/0/000000000000-000000000099.json.xz")
                .await,
            Some(Bytes::from_static(b"xz"))
        );
    }

    #[tokio::test]
    async fn latest_is_max_end_offset_of_partition() {
        let store = MemoryStore::default();
        for (start, end) in [(0, 99), (100, 249), (250, 251)] {
            store
                .save(&seg("usage", 1, start, end), Bytes::new())
                .await
                .unwrap();
        }
        // соседние partition'ы и topic'и не учитываются
        store.save(&seg("usage", 10, 0, 9_999), Bytes::new()).await.unwrap();
        store.save(&seg("usage", 2, 0, 5_000), Bytes::new()).await.unwrap();
        store.save(&seg("usage2", 1, 0, 7_000), Bytes::new()).await.unwrap();

        assert_eq!(store.latest("usage", 1).await.unwrap(), 251);
        assert_eq!(store.latest("usage", 10).await.unwrap(), 9_999);
        assert_eq!(store.latest("usage", 3).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn latest_ignores_foreign_objects() {
        let store = MemoryStore::default();
        store.save(&seg("t", 0, 0, 9), Bytes::new()).await.unwrap();
        store.insert("t/0/README", Bytes::new()).await;
        store.insert("t/0/000000000010-garbage.json.xz", Bytes::new()).await;
        assert_eq!(store.latest("t", 0).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn latest_counts_nested_segments() {
        let store = MemoryStore::default();
        store.save(&seg("t", 0, 0, 9), Bytes::new()).await.unwrap();
        store.insert("t/0/old/000000000000-000000099999.json.xz", Bytes::new()).await;
        assert_eq!(store.latest("t", 0).await.unwrap(), 99_999);
    }
}
