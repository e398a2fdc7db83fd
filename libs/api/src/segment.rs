// ════════════════════════════════════════════════════════════════
//  Segment key format
// ════════════════════════════════════════════════════════════════
//
//  {prefix}{topic}/{partition}/{start:012}-{end:012}.json.xz
//
//  Ширина 12 разрядов обязательна: лексикографический порядок ключей
//  должен совпадать с числовым, и уже заархивированные данные
//  лежат именно в таком формате.

pub const OFFSET_WIDTH: usize = 12;
pub const SEGMENT_SUFFIX: &str = ".json.xz";

/// Сегмент: закрытый диапазон offset'ов `[start, end]` одной (topic, partition).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentId {
    pub topic: String,
    pub partition: u32,
    pub start: u64,
    pub end: u64,
}

impl SegmentId {
    /// Сегмент из `count` записей, начинающийся со `start`. `count` ≥ 1.
    pub fn covering(topic: &str, partition: u32, start: u64, count: u64) -> Self {
        debug_assert!(count > 0, "segment must hold at least one record");
        Self {
            topic: topic.to_string(),
            partition,
            start,
            end: start + count - 1,
        }
    }

    /// Имя файла сегмента без каталога.
    pub fn file_name(&self) -> String {
        format!(
            "{:0w$}-{:0w$}{SEGMENT_SUFFIX}",
            self.start,
            self.end,
            w = OFFSET_WIDTH
        )
    }

    /// Полный ключ объекта. `prefix` должен быть нормализован.
    pub fn key(&self, prefix: &str) -> String {
        format!(
            "{}{}",
            partition_prefix(prefix, &self.topic, self.partition),
            self.file_name()
        )
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}[{}..={}]", self.topic, self.partition, self.start, self.end)
    }
}

/// Непустой префикс без завершающего `/` получает его.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// Каталог сегментов (topic, partition): `{prefix}{topic}/{partition}/`.
pub fn partition_prefix(prefix: &str, topic: &str, partition: u32) -> String {
    format!("{prefix}{topic}/{partition}/")
}

/// Строгий разбор последнего компонента ключа: `(start, end)`.
pub fn parse_segment_name(name: &str) -> Option<(u64, u64)> {
    let file = name.rsplit('/').next()?;
    let stem = file.strip_suffix(SEGMENT_SUFFIX)?;
    let (start, end) = stem.split_once('-')?;
    if start.len() != OFFSET_WIDTH || end.len() != OFFSET_WIDTH {
        return None;
    }
    if !start.bytes().all(|b| b.is_ascii_digit()) || !end.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((start.parse().ok()?, end.parse().ok()?))
}

/// Последняя группа цифр в имени объекта. Для ключей сегментов это end-offset.
pub fn trailing_offset(name: &str) -> Option<u64> {
    let bytes = name.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    name[start..end].parse().ok()
}
