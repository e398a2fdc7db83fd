use std::io::{self, Write};

use xz2::write::XzEncoder;

use archive_api::Record;

/// xz preset 9: архив пишется один раз и читается редко.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

// ═══════════════════════════════════════════════════════════════
//  SegmentEncoder
// ═══════════════════════════════════════════════════════════════

/// Потоковый writer одного сегмента: JSON-массив записей, сжатый xz.
///
/// Сжатие идёт по мере записи, в памяти держится только уже сжатый
/// буфер. Encoder одноразовый: [`finish`](Self::finish) забирает его.
pub struct SegmentEncoder {
    inner: XzEncoder<Vec<u8>>,
    records: u64,
}

impl SegmentEncoder {
    /// Открыть массив с уровнем сжатия по умолчанию.
    pub fn begin() -> io::Result<Self> {
        Self::with_level(DEFAULT_COMPRESSION_LEVEL)
    }

    pub fn with_level(level: u32) -> io::Result<Self> {
        let mut inner = XzEncoder::new(Vec::new(), level);
        inner.write_all(b"[")?;
        Ok(Self { inner, records: 0 })
    }

    /// Дописать запись. Возвращает число сжатых байт, выданных
    /// компрессором за этот вызов (может быть 0).
    pub fn write(&mut self, record: &Record) -> io::Result<u64> {
        let before = self.inner.total_out();
        if self.records > 0 {
            self.inner.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.inner, record.as_value())?;
        self.records += 1;
        Ok(self.inner.total_out() - before)
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Сжатых байт на текущий момент, включая заголовок потока.
    pub fn compressed_bytes(&self) -> u64 {
        self.inner.total_out()
    }

    /// Закрыть массив и xz-поток, вернуть готовый объект.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        self.inner.write_all(b"]")?;
        self.inner.finish()
    }
}
