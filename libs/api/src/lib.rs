mod error;
mod record;
mod segment;
mod util;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

pub use error::{FetchError, StorageError};
pub use record::{FetchOffset, Page, Record};
pub use segment::{
    OFFSET_WIDTH, SEGMENT_SUFFIX, SegmentId, normalize_prefix, parse_segment_name,
    partition_prefix, trailing_offset,
};
pub use util::{now_ms, now_secs};

// ════════════════════════════════════════════════════════════════
//  LogSource
// ════════════════════════════════════════════════════════════════

/// Постраничное чтение лога (topic, partition) по offset'у.
///
/// `Ok(None)`: данных сейчас больше нет. Это конец текущего прохода,
/// а не гарантия, что topic исчерпан навсегда.
pub trait LogSource: Send + Sync {
    fn get(
        &self,
        topic: &str,
        partition: u32,
        offset: FetchOffset,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Page>, FetchError>> + Send + '_>>;
}

// ════════════════════════════════════════════════════════════════
//  SegmentStore
// ════════════════════════════════════════════════════════════════

/// Хранилище архивных сегментов.
///
/// Все реализации обязаны использовать один и тот же формат ключа
/// (см. [`SegmentId::key`]) и одинаковую семантику `latest`.
/// Подключение и аутентификация скрыты в конструкторе бэкенда.
pub trait SegmentStore: Send + Sync {
    /// Записать один объект сегмента.
    fn save(
        &self,
        segment: &SegmentId,
        content: Bytes,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageError>> + Send + '_>>;

    /// Максимальный end-offset среди сегментов (topic, partition), 0 если их нет.
    fn latest(
        &self,
        topic: &str,
        partition: u32,
    ) -> Pin<Box<dyn Future<Output = Result<u64, StorageError>> + Send + '_>>;
}
