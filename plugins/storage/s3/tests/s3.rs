use std::sync::Arc;

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;

use archive_api::{SegmentId, SegmentStore};
use storage_s3::S3Store;

fn seg(topic: &str, partition: u32, start: u64, end: u64) -> SegmentId {
    SegmentId {
        topic: topic.into(),
        partition,
        start,
        end,
    }
}

#[tokio::test]
async fn save_writes_segment_key() {
    let memory = Arc::new(InMemory::new());
    let store = S3Store::with_store("bucket", "backup", memory.clone());

    store
        .save(&seg("usage", 0, 0, 99), Bytes::from_static(b"xz-bytes"))
        .await
        .unwrap();

    let object = memory
        .get(&ObjectPath::from("backup/usage/0/000000000000-000000000099.json.xz"))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(object, Bytes::from_static(b"xz-bytes"));
}

#[tokio::test]
async fn latest_is_zero_for_empty_bucket() {
    let store = S3Store::with_store("bucket", "", Arc::new(InMemory::new()));
    assert_eq!(store.latest("usage", 0).await.unwrap(), 0);
}

#[tokio::test]
async fn latest_takes_max_end_and_skips_foreign_keys() {
    let memory = Arc::new(InMemory::new());
    let store = S3Store::with_store("bucket", "p/", memory.clone());

    for (start, end) in [(0, 99), (100, 1_234), (1_235, 1_300)] {
        store.save(&seg("usage", 2, start, end), Bytes::new()).await.unwrap();
    }
    store.save(&seg("usage", 20, 0, 50_000), Bytes::new()).await.unwrap();
    memory
        .put(&ObjectPath::from("p/usage/2/manifest.json"), Bytes::from_static(b"{}").into())
        .await
        .unwrap();
    memory
        .put(&ObjectPath::from("p/usage/2/99999999.tmp"), Bytes::new().into())
        .await
        .unwrap();

    assert_eq!(store.latest("usage", 2).await.unwrap(), 1_300);
    assert_eq!(store.latest("usage", 20).await.unwrap(), 50_000);
    assert_eq!(store.latest("other", 2).await.unwrap(), 0);
}
