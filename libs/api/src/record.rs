use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  FetchOffset
// ════════════════════════════════════════════════════════════════

/// Позиция, с которой запрашивается страница.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOffset {
    /// Абсолютный offset в partition.
    Absolute(u64),
    /// `n` позиций назад от самой свежей. На проводе: `-n`.
    FromLatest(u64),
}

impl FetchOffset {
    /// Самая свежая доступная позиция (`-1`).
    pub const LATEST: FetchOffset = FetchOffset::FromLatest(1);
}

impl From<i64> for FetchOffset {
    fn from(raw: i64) -> Self {
        if raw >= 0 {
            FetchOffset::Absolute(raw as u64)
        } else {
            FetchOffset::FromLatest(raw.unsigned_abs())
        }
    }
}

impl std::fmt::Display for FetchOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchOffset::Absolute(n) => write!(f, "{n}"),
            FetchOffset::FromLatest(n) => write!(f, "-{n}"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Record / Page
// ════════════════════════════════════════════════════════════════

/// Тело сообщения в том виде, в каком его вернул log API.
///
/// Архиватор содержимое не интерпретирует, только сериализует как есть.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub serde_json::Value);

impl Record {
    /// Timestamp сообщения в миллисекундах (поле `timestamp`), если есть.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.0.get("timestamp").and_then(serde_json::Value::as_i64)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Record {
    fn from(value: serde_json::Value) -> Self {
        Record(value)
    }
}

/// Непустая страница сообщений в порядке возрастания offset'ов.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    /// Offset для следующего запроса. Берётся из ответа API, не вычисляется.
    pub next_offset: u64,
}
