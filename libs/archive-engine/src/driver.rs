use std::sync::Arc;

use bytes::Bytes;

use archive_api::{FetchOffset, LogSource, SegmentId, SegmentStore};

use crate::encoder::{DEFAULT_COMPRESSION_LEVEL, SegmentEncoder};
use crate::error::ArchiveError;

/// Порог ротации по сжатому размеру: 256 MiB.
pub const DEFAULT_ROLLOVER_BYTES: u64 = 256 * 1024 * 1024;

// ═══════════════════════════════════════════════════════════════
//  StreamOptions / StreamSummary
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Сегмент закрывается, как только его сжатый размер достиг порога.
    pub rollover_bytes: u64,
    pub compression_level: u32,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            rollover_bytes: DEFAULT_ROLLOVER_BYTES,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Итог одного прохода.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Закоммиченные сегменты в порядке записи.
    pub segments: Vec<SegmentId>,
    pub records: u64,
    /// Offset, с которого следующий проход продолжил бы чтение.
    pub next_offset: u64,
}

// ═══════════════════════════════════════════════════════════════
//  OpenSegment
// ═══════════════════════════════════════════════════════════════

struct OpenSegment {
    start: u64,
    encoder: SegmentEncoder,
    /// Сумма дельт `write`, заголовок xz-потока не входит.
    compressed: u64,
}

impl OpenSegment {
    fn begin(start: u64, level: u32) -> Result<Self, ArchiveError> {
        Ok(Self {
            start,
            encoder: SegmentEncoder::with_level(level)?,
            compressed: 0,
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  StreamDriver
// ═══════════════════════════════════════════════════════════════

/// Экспорт одной (topic, partition) из лога в хранилище сегментов.
///
/// Один драйвер на partition, выполняется последовательно. Между
/// экземплярами нет общего состояния и нет блокировок: два драйвера
/// на одну partition могут записать пересекающиеся сегменты.
pub struct StreamDriver {
    source: Arc<dyn LogSource>,
    store: Arc<dyn SegmentStore>,
    options: StreamOptions,
}

impl StreamDriver {
    pub fn new(source: Arc<dyn LogSource>, store: Arc<dyn SegmentStore>) -> Self {
        Self {
            source,
            store,
            options: StreamOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Offset, с которого начинать.
    ///
    /// Явный offset берётся как есть, включая 0, даже если он попадает
    /// в уже заархивированный диапазон. Иначе `latest` из хранилища:
    /// 0 → начать с 0, `L` → начать с `L + 1`.
    pub async fn resume_offset(
        &self,
        topic: &str,
        partition: u32,
        explicit: Option<u64>,
    ) -> Result<u64, ArchiveError> {
        if let Some(offset) = explicit {
            tracing::info!(topic, partition, offset, "starting from explicit offset");
            return Ok(offset);
        }

        let latest = self.store.latest(topic, partition).await?;
        let offset = if latest == 0 { 0 } else { latest + 1 };
        tracing::info!(topic, partition, latest, offset, "resuming after archived segments");
        Ok(offset)
    }

    /// Определить начало и выгрузить всё, что доступно сейчас.
    pub async fn run(
        &self,
        topic: &str,
        partition: u32,
        explicit: Option<u64>,
    ) -> Result<StreamSummary, ArchiveError> {
        let start = self.resume_offset(topic, partition, explicit).await?;
        self.stream(topic, partition, start).await
    }

    /// Читать страницы с `start` до пустого ответа.
    ///
    /// Сегмент коммитится, когда его сжатый размер достиг
    /// `rollover_bytes`, и в конце, если в нём есть хотя бы одна запись.
    /// При ошибке открытый сегмент не сохраняется.
    pub async fn stream(
        &self,
        topic: &str,
        partition: u32,
        start: u64,
    ) -> Result<StreamSummary, ArchiveError> {
        let level = self.options.compression_level;
        let mut summary = StreamSummary {
            next_offset: start,
            ..StreamSummary::default()
        };
        let mut offset = start;
        let mut open = OpenSegment::begin(offset, level)?;

        loop {
            let page = match self
                .source
                .get(topic, partition, FetchOffset::Absolute(offset))
                .await?
            {
                Some(page) if !page.records.is_empty() => page,
                _ => break,
            };
            for record in &page.records {
                open.compressed += open.encoder.write(record)?;
            }
            summary.records += page.records.len() as u64;
            tracing::debug!(
                topic,
                partition,
                offset,
                records = page.records.len(),
                next_offset = page.next_offset,
                compressed = open.compressed,
                "page buffered"
            );
            offset = page.next_offset;
            summary.next_offset = offset;

            // новый encoder создаётся только после коммита полного
            if open.compressed >= self.options.rollover_bytes {
                let segment = self.commit(topic, partition, open).await?;
                summary.segments.push(segment);
                open = OpenSegment::begin(offset, level)?;
            }
        }

        if !open.encoder.is_empty() {
            let segment = self.commit(topic, partition, open).await?;
            summary.segments.push(segment);
        }

        tracing::info!(
            topic,
            partition,
            start,
            next_offset = summary.next_offset,
            records = summary.records,
            segments = summary.segments.len(),
            "stream exhausted"
        );
        Ok(summary)
    }

    async fn commit(
        &self,
        topic: &str,
        partition: u32,
        open: OpenSegment,
    ) -> Result<SegmentId, ArchiveError> {
        let segment = SegmentId::covering(topic, partition, open.start, open.encoder.records());
        let content = open.encoder.finish()?;
        let bytes = content.len();
        self.store.save(&segment, Bytes::from(content)).await?;
        tracing::info!(
            topic,
            partition,
            start = segment.start,
            end = segment.end,
            bytes,
            "segment committed"
        );
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_segment_counts_no_compressed_bytes() {
        let open = OpenSegment::begin(42, 9).unwrap();
        assert_eq!(open.start, 42);
        assert_eq!(open.compressed, 0);
        assert!(open.encoder.compressed_bytes() > 0);
    }

    #[test]
    fn default_options() {
        let options = StreamOptions::default();
        assert_eq!(options.rollover_bytes, 268_435_456);
        assert_eq!(options.compression_level, 9);
    }
}
