//! Клиент kafka-reporting API: постраничное чтение, метаданные topic'ов
//! и отправка сообщений, с общей retry-политикой.

mod client;
mod retry;
mod status;
mod wire;

pub use client::{ClientConfig, ReportingClient};
pub use retry::{
    Attempt, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy, Sleeper, TokioSleeper, retry,
};
pub use status::TopicStatus;
pub use wire::{ENVELOPE_VERSION, Envelope};
