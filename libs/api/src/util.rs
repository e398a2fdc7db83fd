/// Текущее Unix-время в миллисекундах.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Текущее Unix-время в секундах.
pub fn now_secs() -> i64 {
    now_ms() / 1000
}
