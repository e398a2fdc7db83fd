/// Ошибки обращения к log API.
///
/// `Transport` и `Server`: транзиентные, их повторяет retry-цикл клиента.
/// Наружу они выходят только завёрнутыми в `RetryExhausted`.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("server error: HTTP {status}")]
    Server { status: u16 },

    #[error("client error: HTTP {status} ({url})")]
    Client { status: u16, url: String },

    #[error("reached retry limit after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<FetchError> },

    #[error("decode: {0}")]
    Decode(String),

    #[error("config: {0}")]
    Config(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Server { .. })
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Ошибки бэкендов хранилища. На этом уровне не повторяются.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("io: {0}")]
    Io(String),

    #[error("not found: {0}")]
    NotFound(String),
}
