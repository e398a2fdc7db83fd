use archive_api::{FetchError, StorageError};

/// Ошибка прохода архивации. Любая из них прерывает поток;
/// незакоммиченный открытый сегмент теряется.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("fetch: {0}")]
    Fetch(#[from] FetchError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("encode: {0}")]
    Encode(#[from] std::io::Error),
}
