use archive_api::{FetchError, StorageError};
use archive_engine::ArchiveError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("missing environment variables: {}", .0.join(" "))]
    MissingEnv(Vec<&'static str>),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),

    #[error("output: {0}")]
    Output(#[from] serde_json::Error),
}
